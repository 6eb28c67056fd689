use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::ParserError;
use crate::common::reader::Parseable;
use crate::common::types::{C2Vector, C3Vector, CAaBox};

pub const FOURCC_M2HEADER: u32 = u32::from_le_bytes(*b"MD20");

#[cfg(feature = "wotlk")] // >= WOTLK, before that skins live inside the m2 itself
pub const FOURCC_M2SKIN: u32 = u32::from_le_bytes(*b"SKIN");

/// (element count, byte offset from the start of the file)
#[derive(Debug, Copy, Clone)]
pub(crate) struct M2Array {
    pub size: u32,
    pub offset: u32,
}

impl Parseable<M2Array> for M2Array {
    fn parse<R: Read>(rdr: &mut R) -> Result<M2Array, ParserError> {
        Ok(M2Array {
            size: rdr.read_u32::<LittleEndian>()?,
            offset: rdr.read_u32::<LittleEndian>()?,
        })
    }
}

#[derive(Debug, Copy, Clone)]
pub struct M2Version {
    pub major: u8, // always 1
    pub minor: u8, // classic: [0, 1], tbc: [4, 7], wotlk: 8
}

impl Parseable<M2Version> for M2Version {
    fn parse<R: Read>(rdr: &mut R) -> Result<M2Version, ParserError> {
        let array = rdr.read_u32::<LittleEndian>()?.to_le_bytes();
        Ok(M2Version {
            minor: array[0],
            major: array[1],
        })
    }
}

#[derive(Debug)]
pub struct M2Asset {
    pub version: M2Version,
    pub name: String,
    pub vertices: Vec<M2Vertex>,
    #[cfg(feature = "wotlk")] // > TBC, skin profiles moved into .skin files
    pub num_skin_profiles: u32,
    pub textures: Vec<M2Texture>,
    pub bounding_box: CAaBox,
    pub bounding_sphere_radius: f32,
}

#[derive(Debug, Copy, Clone)]
pub struct M2Vertex {
    /// friendly reminder that WoW is right handed (Z Up)
    pub position: C3Vector,
    pub bone_weights: [u8; 4],
    pub bone_indices: [u8; 4],
    pub normal: C3Vector,
    pub tex_coords: [C2Vector; 2],
}

impl Parseable<M2Vertex> for M2Vertex {
    fn parse<R: Read>(rdr: &mut R) -> Result<M2Vertex, ParserError> {
        Ok(M2Vertex {
            position: C3Vector::parse(rdr)?,
            bone_weights: rdr.read_u32::<LittleEndian>()?.to_le_bytes(),
            bone_indices: rdr.read_u32::<LittleEndian>()?.to_le_bytes(),
            normal: C3Vector::parse(rdr)?,
            tex_coords: [C2Vector::parse(rdr)?, C2Vector::parse(rdr)?],
        })
    }
}

#[derive(Debug)]
pub struct M2Texture {
    pub texture_type: u32,
    pub texture_flags: u32,
    /// empty for non-hardcoded types, those are resolved through the DBCs at runtime
    pub filename: String,
}

pub(crate) struct M2TextureRaw {
    pub texture_type: u32,
    pub texture_flags: u32,
    pub filename: M2Array,
}

impl Parseable<M2TextureRaw> for M2TextureRaw {
    fn parse<R: Read>(rdr: &mut R) -> Result<M2TextureRaw, ParserError> {
        Ok(M2TextureRaw {
            texture_type: rdr.read_u32::<LittleEndian>()?,
            texture_flags: rdr.read_u32::<LittleEndian>()?,
            filename: M2Array::parse(rdr)?,
        })
    }
}

/// A skin profile remaps the model's global vertex list into one LoD level:
/// `vertices` indexes into `M2Asset::vertices`, `indices` into `vertices`.
#[derive(Debug)]
pub struct M2SkinProfile {
    pub vertices: Vec<u16>,
    pub indices: Vec<u16>,
    pub bone_count_max: u32,
}
