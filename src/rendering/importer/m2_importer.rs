use glam::{Vec2, Vec3, Vec4};
use image_blp::BlpImage;

use everrust_files::m2::types::{M2Asset, M2SkinProfile};

use crate::rendering::common::types::{AlbedoType, Material, Mesh, TransparencyType, VertexBuffers};

pub struct M2Importer {}

impl M2Importer {
    /// The skin profile is the remap: its `vertices` select from the model's
    /// global vertex list, its `indices` point into that selection.
    pub fn create_mesh(asset: &M2Asset, skin: &M2SkinProfile) -> Mesh {
        let mut positions = Vec::<Vec3>::with_capacity(skin.vertices.len());
        let mut normals = Vec::<Vec3>::with_capacity(skin.vertices.len());
        let mut uvs = Vec::<Vec2>::with_capacity(skin.vertices.len());

        for &v in &skin.vertices {
            let vert = &asset.vertices[v as usize];
            positions.push(Vec3::new(vert.position.x, vert.position.y, vert.position.z));
            normals.push(Vec3::new(vert.normal.x, vert.normal.y, vert.normal.z));
            uvs.push(Vec2::new(vert.tex_coords[0].x, vert.tex_coords[0].y));
        }

        Mesh {
            index_buffer: skin.indices.iter().map(|&i| i as u32).collect(),
            vertex_buffers: VertexBuffers {
                position_buffer: positions,
                normals_buffer: normals,
                texcoord_buffer: uvs,
            },
        }
    }

    pub fn create_material(blp: Option<&BlpImage>, texture_name: Option<&str>) -> Material {
        Material {
            albedo: match (blp, texture_name) {
                (Some(_), Some(name)) => AlbedoType::TextureWithName(name.to_string()),
                // untextured models render in a neutral grey
                _ => AlbedoType::Value(Vec4::new(0.6, 0.6, 0.6, 1.0)),
            },
            is_unlit: true,
            transparency: TransparencyType::Opaque,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use everrust_files::common::types::{C2Vector, C3Vector, CAaBox};
    use everrust_files::m2::types::{M2Asset, M2SkinProfile, M2Version, M2Vertex};

    fn vertex(x: f32, y: f32, z: f32) -> M2Vertex {
        M2Vertex {
            position: C3Vector { x, y, z },
            bone_weights: [0; 4],
            bone_indices: [0; 4],
            normal: C3Vector { x: 0.0, y: 0.0, z: 1.0 },
            tex_coords: [C2Vector { x: 0.0, y: 0.0 }, C2Vector { x: 0.0, y: 0.0 }],
        }
    }

    #[test]
    fn skin_remap_is_applied() {
        let asset = M2Asset {
            version: M2Version { major: 1, minor: 8 },
            name: "test".to_string(),
            vertices: vec![vertex(0.0, 0.0, 0.0), vertex(1.0, 0.0, 0.0), vertex(0.0, 1.0, 0.0)],
            num_skin_profiles: 1,
            textures: vec![],
            bounding_box: CAaBox {
                min: C3Vector { x: 0.0, y: 0.0, z: 0.0 },
                max: C3Vector { x: 1.0, y: 1.0, z: 0.0 },
            },
            bounding_sphere_radius: 1.0,
        };
        // the skin reverses the vertex order
        let skin = M2SkinProfile {
            vertices: vec![2, 1, 0],
            indices: vec![0, 1, 2],
            bone_count_max: 0,
        };

        let mesh = M2Importer::create_mesh(&asset, &skin);
        assert_eq!(mesh.vertex_buffers.position_buffer.len(), 3);
        assert_eq!(mesh.vertex_buffers.position_buffer[0], glam::Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(mesh.index_buffer, vec![0, 1, 2]);
        assert_eq!(mesh.vertex_buffers.normals_buffer.len(), 3);
    }
}
