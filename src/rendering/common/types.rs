use std::fmt::{Debug, Formatter};

use glam::{Vec2, Vec3, Vec4};

/// Renderer-agnostic mesh: what the importers emit and the backend turns into
/// GPU resources.
#[derive(Clone)]
pub struct Mesh {
    pub vertex_buffers: VertexBuffers,
    pub index_buffer: Vec<u32>,
}

impl Debug for Mesh {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ vertex_buffers: {:?}, ", self.vertex_buffers)?;
        write!(f, "index_buffer: [{}] }}", self.index_buffer.len())
    }
}

#[derive(Clone, Default)]
pub struct VertexBuffers {
    pub position_buffer: Vec<Vec3>,
    pub normals_buffer: Vec<Vec3>,
    pub texcoord_buffer: Vec<Vec2>,
}

impl Debug for VertexBuffers {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ position_buffer: [{}], ", self.position_buffer.len())?;
        write!(f, "normals_buffer: [{}], ", self.normals_buffer.len())?;
        write!(f, "texcoord_buffer: [{}] }}", self.texcoord_buffer.len())
    }
}

/// One shared vertex buffer, one index buffer per render batch. WMO groups
/// slice their batches out of a single buffer whose indices may exceed the
/// per-batch vertex range, so the batches have to share.
#[derive(Clone)]
pub struct MeshWithBatches {
    pub vertex_buffers: VertexBuffers,
    pub index_buffers: Vec<Vec<u32>>,
}

#[derive(Debug, Clone)]
pub enum AlbedoType {
    Value(Vec4),
    /// texture resolved separately, by name
    TextureWithName(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransparencyType {
    Opaque,
    Cutout { cutout: f32 },
    Blend,
}

#[derive(Debug, Clone)]
pub struct Material {
    pub albedo: AlbedoType,
    pub is_unlit: bool,
    pub transparency: TransparencyType,
}
