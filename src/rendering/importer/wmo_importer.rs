use glam::{Vec2, Vec3, Vec4};
use itertools::Itertools;
use log::debug;

use everrust_files::wmo::types::{WMOGroupAsset, WMORootAsset};

use crate::rendering::common::types::{AlbedoType, Material, MeshWithBatches, TransparencyType, VertexBuffers};

pub struct WMOGroupImporter {}

impl WMOGroupImporter {
    /// Batches share the group's whole vertex buffer: batch indices have been
    /// observed to exceed the batch's own vertex range, so slicing the buffer
    /// per batch fails validation.
    pub fn create_batch_base(asset: &WMOGroupAsset) -> VertexBuffers {
        VertexBuffers {
            position_buffer: asset
                .movt
                .vertices
                .iter()
                .map(|v| Vec3::new(v.x, v.y, v.z))
                .collect(),
            normals_buffer: asset
                .monr
                .normals
                .iter()
                .map(|v| Vec3::new(v.x, v.y, v.z))
                .collect(),
            texcoord_buffer: asset
                .motv
                .tex_coords
                .iter()
                .map(|v| Vec2::new(v.x, v.y))
                .collect(),
        }
    }

    pub fn create_batch_indices(asset: &WMOGroupAsset, start_index: usize, index_count: usize) -> Vec<u32> {
        asset.movi.indices[start_index..start_index + index_count]
            .iter()
            .map(|&i| i as u32)
            .collect_vec()
    }

    /// One shared-buffer mesh per group plus the per-batch material, resolved
    /// against the root's material and texture tables.
    pub fn create_group_batches(root: &WMORootAsset, group: &WMOGroupAsset) -> (MeshWithBatches, Vec<Material>) {
        let indices = group
            .moba
            .batches
            .iter()
            .map(|batch| {
                WMOGroupImporter::create_batch_indices(group, batch.start_index as usize, batch.index_count as usize)
            })
            .collect_vec();

        let materials = group
            .moba
            .batches
            .iter()
            .map(|batch| Self::resolve_batch_material(root, batch.material_id))
            .collect_vec();

        (
            MeshWithBatches {
                vertex_buffers: Self::create_batch_base(group),
                index_buffers: indices,
            },
            materials,
        )
    }

    fn resolve_batch_material(root: &WMORootAsset, material_id: u8) -> Material {
        // 0xFF is no material
        let source = match material_id {
            0xFF => None,
            _ => root.momt.materials.get(material_id as usize),
        };

        let Some(source) = source else {
            return Material {
                albedo: AlbedoType::Value(Vec4::new(0.6, 0.6, 0.6, 1.0)),
                is_unlit: true,
                transparency: TransparencyType::Opaque,
            };
        };

        // texture_1 is a byte offset into the MOTX block; unused slots point at an empty name
        let texture_name = root
            .motx
            .textures
            .offset_lookup
            .get(&source.texture_1)
            .map(|&index| root.motx.textures.strings[index].clone())
            .filter(|name| !name.is_empty());

        Material {
            albedo: match texture_name {
                Some(name) => AlbedoType::TextureWithName(name),
                None => AlbedoType::Value(Vec4::new(
                    source.diffuse_color.r as f32 / 255.0,
                    source.diffuse_color.g as f32 / 255.0,
                    source.diffuse_color.b as f32 / 255.0,
                    source.diffuse_color.a as f32 / 255.0,
                )),
            },
            is_unlit: true,
            transparency: match source.blend_mode {
                0 => TransparencyType::Opaque,
                1 => TransparencyType::Cutout { cutout: 0.5 },
                other => {
                    debug!("Unknown blend mode: {}", other);
                    TransparencyType::Opaque
                }
            },
        }
    }

    /// `Path\Name.wmo` stores its groups as `Path\Name_000.wmo` and counting.
    pub fn group_path(root_path: &str, index: u32) -> String {
        let upper = root_path.to_uppercase();
        let stem = upper.trim_end_matches(".WMO");
        format!("{}_{:0>3}.wmo", stem, index)
    }
}

#[cfg(test)]
mod tests {
    use super::WMOGroupImporter;

    #[test]
    fn group_paths_count_zero_padded() {
        assert_eq!(
            WMOGroupImporter::group_path("World\\wmo\\Inn.wmo", 0),
            "WORLD\\WMO\\INN_000.wmo"
        );
        assert_eq!(
            WMOGroupImporter::group_path("World\\wmo\\Inn.wmo", 12),
            "WORLD\\WMO\\INN_012.wmo"
        );
    }
}
