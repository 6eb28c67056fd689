use std::ffi::CString;
use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::ParserError;
use crate::common::reader::Parseable;
use crate::common::types::CAaBox;
#[cfg(feature = "wotlk")]
use crate::m2::types::FOURCC_M2SKIN;
use crate::m2::types::{FOURCC_M2HEADER, M2Array, M2Asset, M2SkinProfile, M2Texture, M2TextureRaw, M2Version, M2Vertex};

pub struct M2Reader {}

impl M2Reader {
    /// Parses the header and resolves the arrays the explorer actually previews
    /// (name, vertices, textures, bounds). The remaining header arrays are read
    /// to keep the cursor in sync but left unresolved.
    pub fn parse_asset<R: Read + Seek>(rdr: &mut R) -> Result<M2Asset, ParserError> {
        let magic = rdr.read_u32::<LittleEndian>()?;
        if magic != FOURCC_M2HEADER {
            return Err(ParserError::InvalidMagicValue { magic });
        }

        let version = M2Version::parse(rdr)?;
        if version.major != 1 {
            return Err(ParserError::FormatError {
                reason: "M2Version.major MUST BE 1",
            });
        }

        #[cfg(feature = "wotlk")]
        if version.minor != 8 {
            return Err(ParserError::FormatError {
                reason: "M2Version.minor MUST BE 8 for WotLK",
            });
        }

        let name_array = M2Array::parse(rdr)?;
        let _global_flags = rdr.read_u32::<LittleEndian>()?;
        let _global_loops = M2Array::parse(rdr)?;
        let _sequences = M2Array::parse(rdr)?;
        let _sequence_lookups = M2Array::parse(rdr)?;
        #[cfg(not(feature = "wotlk"))] // <= TBC
        let _playable_animation_lookup = M2Array::parse(rdr)?;
        let _bones = M2Array::parse(rdr)?;
        let _bone_lookups = M2Array::parse(rdr)?;
        let vertices = M2Array::parse(rdr)?;
        #[cfg(not(feature = "wotlk"))] // <= TBC
        let _skin_profiles = M2Array::parse(rdr)?;
        #[cfg(feature = "wotlk")] // > TBC, skin profiles moved into .skin files
        let num_skin_profiles = rdr.read_u32::<LittleEndian>()?;
        let _colors = M2Array::parse(rdr)?;
        let textures = M2Array::parse(rdr)?;
        let _texture_weights = M2Array::parse(rdr)?;
        #[cfg(not(feature = "wotlk"))] // <= TBC
        let _texture_flipbooks = M2Array::parse(rdr)?;
        let _texture_transforms = M2Array::parse(rdr)?;
        let _texture_lookups = M2Array::parse(rdr)?;
        let _materials = M2Array::parse(rdr)?;
        let _bone_combos = M2Array::parse(rdr)?;
        let _texture_combos = M2Array::parse(rdr)?;
        let _texture_coord_combos = M2Array::parse(rdr)?;
        let _texture_weight_combos = M2Array::parse(rdr)?;
        let _texture_transform_combos = M2Array::parse(rdr)?;
        let bounding_box = CAaBox::parse(rdr)?;
        let bounding_sphere_radius = rdr.read_f32::<LittleEndian>()?;
        let _collision_box = CAaBox::parse(rdr)?;
        let _collision_sphere_radius = rdr.read_f32::<LittleEndian>()?;
        let _collision_indices = M2Array::parse(rdr)?;
        let _collision_positions = M2Array::parse(rdr)?;
        let _collision_face_normals = M2Array::parse(rdr)?;
        let _attachments = M2Array::parse(rdr)?;
        let _attachment_lookups = M2Array::parse(rdr)?;
        let _events = M2Array::parse(rdr)?;
        let _lights = M2Array::parse(rdr)?;
        let _cameras = M2Array::parse(rdr)?;
        let _camera_lookups = M2Array::parse(rdr)?;
        let _ribbon_emitters = M2Array::parse(rdr)?;
        let _particle_emitters = M2Array::parse(rdr)?;

        let name = M2Reader::resolve_array_string(rdr, &name_array)?;
        let vertices: Vec<M2Vertex> = M2Reader::resolve_array(rdr, &vertices)?;

        let raw_textures: Vec<M2TextureRaw> = M2Reader::resolve_array(rdr, &textures)?;
        let mut resolved_textures = Vec::with_capacity(raw_textures.len());
        for tex in &raw_textures {
            resolved_textures.push(M2Texture {
                texture_type: tex.texture_type,
                texture_flags: tex.texture_flags,
                filename: M2Reader::resolve_array_string(rdr, &tex.filename)?,
            });
        }

        Ok(M2Asset {
            version,
            name,
            vertices,
            #[cfg(feature = "wotlk")]
            num_skin_profiles,
            textures: resolved_textures,
            bounding_box,
            bounding_sphere_radius,
        })
    }

    pub fn parse_skin_profile<R: Read + Seek>(rdr: &mut R) -> Result<M2SkinProfile, ParserError> {
        #[cfg_attr(not(feature = "wotlk"), allow(unused_variables))]
        let magic = rdr.read_u32::<LittleEndian>()?;

        #[cfg(feature = "wotlk")] // > TBC
        if magic != FOURCC_M2SKIN {
            return Err(ParserError::InvalidMagicValue { magic });
        }

        let vertices = M2Array::parse(rdr)?;
        let indices = M2Array::parse(rdr)?;
        M2Array::parse(rdr)?; // bones
        M2Array::parse(rdr)?; // submeshes
        M2Array::parse(rdr)?; // batches
        let bone_count_max = rdr.read_u32::<LittleEndian>()?;

        Ok(M2SkinProfile {
            vertices: M2Reader::resolve_array(rdr, &vertices)?,
            indices: M2Reader::resolve_array(rdr, &indices)?,
            bone_count_max,
        })
    }

    fn resolve_array<T: Parseable<T>, R: Read + Seek>(rdr: &mut R, array: &M2Array) -> Result<Vec<T>, ParserError> {
        let size = array.size as usize;
        if size > 0 {
            rdr.seek(SeekFrom::Start(array.offset as u64))?;
        }

        let mut list: Vec<T> = Vec::with_capacity(size);
        for _ in 0..size {
            list.push(T::parse(rdr)?);
        }

        Ok(list)
    }

    fn resolve_array_string<R: Read + Seek>(rdr: &mut R, array: &M2Array) -> Result<String, ParserError> {
        let size = array.size as usize;
        if size == 0 {
            return Ok(String::new());
        }

        let mut buf: Vec<u8> = vec![0; size];
        rdr.seek(SeekFrom::Start(array.offset as u64))?;
        rdr.read_exact(&mut buf)?;

        let cstring = CString::from_vec_with_nul(buf).map_err(|_| ParserError::FormatError {
            reason: "M2Array<char> is not NUL terminated",
        })?;
        Ok(cstring.into_string()?)
    }
}
