use std::io::Read;

use bitflags::bitflags;
use byteorder::{LittleEndian, ReadBytesExt};

use crate::ParserError;
use crate::common::reader::{Parseable, StringBlock, read_chunk_array};
use crate::common::types::{C2Vector, C3Vector, CAaBox, CArgb, CImVector, MVerChunk};

// https://wowdev.wiki/WMO

#[derive(Debug)]
pub struct WMORootAsset {
    pub mver: MVerChunk,
    pub mohd: MOHDChunk,
    pub motx: MOTXChunk,
    pub momt: MOMTChunk,
    pub mogn: MOGNChunk,
    pub mogi: MOGIChunk,
}

/// Also known as SMOHeader
#[derive(Debug, Copy, Clone)]
pub struct MOHDChunk {
    pub n_textures: u32,
    pub n_groups: u32,
    pub n_portals: u32,
    pub n_lights: u32,
    pub n_doodad_names: u32,
    pub n_doodad_defs: u32,
    pub n_doodad_sets: u32,
    pub ambient_color: CArgb,
    pub wmo_id: u32,
    pub bounding_box: CAaBox,
    pub flags: u16,
    pub num_lod: u16,
}

impl Parseable<MOHDChunk> for MOHDChunk {
    fn parse<R: Read>(rdr: &mut R) -> Result<MOHDChunk, ParserError> {
        Ok(MOHDChunk {
            n_textures: rdr.read_u32::<LittleEndian>()?,
            n_groups: rdr.read_u32::<LittleEndian>()?,
            n_portals: rdr.read_u32::<LittleEndian>()?,
            n_lights: rdr.read_u32::<LittleEndian>()?,
            n_doodad_names: rdr.read_u32::<LittleEndian>()?,
            n_doodad_defs: rdr.read_u32::<LittleEndian>()?,
            n_doodad_sets: rdr.read_u32::<LittleEndian>()?,
            ambient_color: CArgb::parse(rdr)?,
            wmo_id: rdr.read_u32::<LittleEndian>()?,
            bounding_box: CAaBox::parse(rdr)?,
            flags: rdr.read_u16::<LittleEndian>()?,
            num_lod: rdr.read_u16::<LittleEndian>()?,
        })
    }
}

#[derive(Debug)]
pub struct MOTXChunk {
    pub textures: StringBlock,
}

impl Parseable<MOTXChunk> for MOTXChunk {
    fn parse<R: Read>(rdr: &mut R) -> Result<MOTXChunk, ParserError> {
        Ok(MOTXChunk {
            textures: StringBlock::parse(rdr)?,
        })
    }
}

/// Also known as SMOMaterial, 64 bytes on disk.
#[derive(Debug)]
pub struct WMOMaterial {
    pub flags: u32,
    pub shader: u32,
    pub blend_mode: u32,
    /// byte offset into the MOTX string block
    pub texture_1: u32,
    pub sidn_color: CImVector,
    pub frame_sidn_color: CImVector,
    pub texture_2: u32,
    pub diffuse_color: CImVector,
    pub ground_type: u32,
    pub texture_3: u32,
    pub color_2: u32,
    pub flags_2: u32,
    pub runtime_data: [u32; 4],
}

impl Parseable<WMOMaterial> for WMOMaterial {
    fn parse<R: Read>(rdr: &mut R) -> Result<WMOMaterial, ParserError> {
        let mut mat = WMOMaterial {
            flags: rdr.read_u32::<LittleEndian>()?,
            shader: rdr.read_u32::<LittleEndian>()?,
            blend_mode: rdr.read_u32::<LittleEndian>()?,
            texture_1: rdr.read_u32::<LittleEndian>()?,
            sidn_color: CImVector::parse(rdr)?,
            frame_sidn_color: CImVector::parse(rdr)?,
            texture_2: rdr.read_u32::<LittleEndian>()?,
            diffuse_color: CImVector::parse(rdr)?,
            ground_type: rdr.read_u32::<LittleEndian>()?,
            texture_3: rdr.read_u32::<LittleEndian>()?,
            color_2: rdr.read_u32::<LittleEndian>()?,
            flags_2: rdr.read_u32::<LittleEndian>()?,
            runtime_data: [0; 4],
        };

        for slot in mat.runtime_data.iter_mut() {
            *slot = rdr.read_u32::<LittleEndian>()?;
        }

        Ok(mat)
    }
}

#[derive(Debug)]
pub struct MOMTChunk {
    pub materials: Vec<WMOMaterial>,
}

impl Parseable<MOMTChunk> for MOMTChunk {
    fn parse<R: Read>(rdr: &mut R) -> Result<MOMTChunk, ParserError> {
        Ok(MOMTChunk {
            materials: read_chunk_array(rdr)?,
        })
    }
}

#[derive(Debug)]
pub struct MOGNChunk {
    pub group_names: StringBlock,
}

impl Parseable<MOGNChunk> for MOGNChunk {
    fn parse<R: Read>(rdr: &mut R) -> Result<MOGNChunk, ParserError> {
        Ok(MOGNChunk {
            group_names: StringBlock::parse(rdr)?,
        })
    }
}

#[derive(Debug)]
pub struct WMOGroupInfo {
    pub flags: WMOGroupFlags,
    pub bounding_box: CAaBox,
    pub name_offset: i32,
}

impl Parseable<WMOGroupInfo> for WMOGroupInfo {
    fn parse<R: Read>(rdr: &mut R) -> Result<WMOGroupInfo, ParserError> {
        Ok(WMOGroupInfo {
            flags: WMOGroupFlags::from_bits_retain(rdr.read_u32::<LittleEndian>()?),
            bounding_box: CAaBox::parse(rdr)?,
            name_offset: rdr.read_i32::<LittleEndian>()?,
        })
    }
}

#[derive(Debug)]
pub struct MOGIChunk {
    pub groups: Vec<WMOGroupInfo>,
}

impl Parseable<MOGIChunk> for MOGIChunk {
    fn parse<R: Read>(rdr: &mut R) -> Result<MOGIChunk, ParserError> {
        Ok(MOGIChunk {
            groups: read_chunk_array(rdr)?,
        })
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct WMOGroupFlags: u32 {
        const HAS_BSP_TREE = 0x1;
        const HAS_VERTEX_COLORS = 0x4;
        const EXTERIOR = 0x8;
        const EXTERIOR_LIT = 0x40;
        const UNREACHABLE = 0x80;
        const HAS_LIGHTS = 0x200;
        const HAS_DOODADS = 0x800;
        const HAS_WATER = 0x1000;
        const INTERIOR = 0x2000;
        const ALWAYS_DRAW = 0x10000;
        const SHOW_SKYBOX = 0x40000;
    }
}

#[derive(Debug)]
pub struct WMOGroupAsset {
    pub mver: MVerChunk,
    pub mogp: MOGPHeader,
    pub mopy: MOPYChunk,
    pub movi: MOVIChunk,
    pub movt: MOVTChunk,
    pub monr: MONRChunk,
    pub motv: MOTVChunk,
    pub moba: MOBAChunk,
}

/// The fixed 0x44 byte header at the start of the MOGP chunk; the geometry
/// sub-chunks follow it inside the same chunk payload.
#[derive(Debug)]
pub struct MOGPHeader {
    pub group_name_offset: i32,
    pub descriptive_name_offset: i32,
    pub flags: WMOGroupFlags,
    pub bounding_box: CAaBox,
    pub portal_start: u16,
    pub portal_count: u16,
    pub trans_batch_count: u16,
    pub int_batch_count: u16,
    pub ext_batch_count: u16,
    pub padding: u16,
    pub fog_ids: [u8; 4],
    pub group_liquid: u32,
    pub group_id: u32,
    pub flags_2: u32,
    pub unused: u32,
}

pub(crate) const MOGP_HEADER_SIZE: u64 = 0x44;

impl Parseable<MOGPHeader> for MOGPHeader {
    fn parse<R: Read>(rdr: &mut R) -> Result<MOGPHeader, ParserError> {
        Ok(MOGPHeader {
            group_name_offset: rdr.read_i32::<LittleEndian>()?,
            descriptive_name_offset: rdr.read_i32::<LittleEndian>()?,
            flags: WMOGroupFlags::from_bits_retain(rdr.read_u32::<LittleEndian>()?),
            bounding_box: CAaBox::parse(rdr)?,
            portal_start: rdr.read_u16::<LittleEndian>()?,
            portal_count: rdr.read_u16::<LittleEndian>()?,
            trans_batch_count: rdr.read_u16::<LittleEndian>()?,
            int_batch_count: rdr.read_u16::<LittleEndian>()?,
            ext_batch_count: rdr.read_u16::<LittleEndian>()?,
            padding: rdr.read_u16::<LittleEndian>()?,
            fog_ids: [rdr.read_u8()?, rdr.read_u8()?, rdr.read_u8()?, rdr.read_u8()?],
            group_liquid: rdr.read_u32::<LittleEndian>()?,
            group_id: rdr.read_u32::<LittleEndian>()?,
            flags_2: rdr.read_u32::<LittleEndian>()?,
            unused: rdr.read_u32::<LittleEndian>()?,
        })
    }
}

/// per-triangle material info
#[derive(Debug, Copy, Clone)]
pub struct WMOPolyMaterial {
    pub flags: u8,
    pub material_id: u8,
}

impl Parseable<WMOPolyMaterial> for WMOPolyMaterial {
    fn parse<R: Read>(rdr: &mut R) -> Result<WMOPolyMaterial, ParserError> {
        Ok(WMOPolyMaterial {
            flags: rdr.read_u8()?,
            material_id: rdr.read_u8()?,
        })
    }
}

#[derive(Debug)]
pub struct MOPYChunk {
    pub poly_materials: Vec<WMOPolyMaterial>,
}

impl Parseable<MOPYChunk> for MOPYChunk {
    fn parse<R: Read>(rdr: &mut R) -> Result<MOPYChunk, ParserError> {
        Ok(MOPYChunk {
            poly_materials: read_chunk_array(rdr)?,
        })
    }
}

#[derive(Debug)]
pub struct MOVIChunk {
    pub indices: Vec<u16>,
}

impl Parseable<MOVIChunk> for MOVIChunk {
    fn parse<R: Read>(rdr: &mut R) -> Result<MOVIChunk, ParserError> {
        Ok(MOVIChunk {
            indices: read_chunk_array(rdr)?,
        })
    }
}

#[derive(Debug)]
pub struct MOVTChunk {
    pub vertices: Vec<C3Vector>,
}

impl Parseable<MOVTChunk> for MOVTChunk {
    fn parse<R: Read>(rdr: &mut R) -> Result<MOVTChunk, ParserError> {
        Ok(MOVTChunk {
            vertices: read_chunk_array(rdr)?,
        })
    }
}

#[derive(Debug)]
pub struct MONRChunk {
    pub normals: Vec<C3Vector>,
}

impl Parseable<MONRChunk> for MONRChunk {
    fn parse<R: Read>(rdr: &mut R) -> Result<MONRChunk, ParserError> {
        Ok(MONRChunk {
            normals: read_chunk_array(rdr)?,
        })
    }
}

#[derive(Debug)]
pub struct MOTVChunk {
    pub tex_coords: Vec<C2Vector>,
}

impl Parseable<MOTVChunk> for MOTVChunk {
    fn parse<R: Read>(rdr: &mut R) -> Result<MOTVChunk, ParserError> {
        Ok(MOTVChunk {
            tex_coords: read_chunk_array(rdr)?,
        })
    }
}

/// Also known as SMOBatch, 24 bytes on disk.
#[derive(Debug)]
pub struct WMORenderBatch {
    pub bounding_box: [i16; 6],
    pub start_index: u32,
    pub index_count: u16,
    pub min_vertex: u16,
    pub max_vertex: u16,
    pub flags: u8,
    pub material_id: u8,
}

impl Parseable<WMORenderBatch> for WMORenderBatch {
    fn parse<R: Read>(rdr: &mut R) -> Result<WMORenderBatch, ParserError> {
        let mut bounding_box = [0i16; 6];
        for slot in bounding_box.iter_mut() {
            *slot = rdr.read_i16::<LittleEndian>()?;
        }

        Ok(WMORenderBatch {
            bounding_box,
            start_index: rdr.read_u32::<LittleEndian>()?,
            index_count: rdr.read_u16::<LittleEndian>()?,
            min_vertex: rdr.read_u16::<LittleEndian>()?,
            max_vertex: rdr.read_u16::<LittleEndian>()?,
            flags: rdr.read_u8()?,
            material_id: rdr.read_u8()?,
        })
    }
}

#[derive(Debug)]
pub struct MOBAChunk {
    pub batches: Vec<WMORenderBatch>,
}

impl Parseable<MOBAChunk> for MOBAChunk {
    fn parse<R: Read>(rdr: &mut R) -> Result<MOBAChunk, ParserError> {
        Ok(MOBAChunk {
            batches: read_chunk_array(rdr)?,
        })
    }
}
