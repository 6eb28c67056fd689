use image_blp::convert::blp_to_image;
use image_blp::{BlpDxtn, BlpImage, DxtnFormat};
use log::error;
use rend3::types::Texture;
use rend3_routine::pbr::{AlbedoComponent, PbrMaterial, Transparency};
use std::num::NonZeroU32;

use crate::rendering::common::types::{AlbedoType, Material, Mesh, MeshWithBatches, TransparencyType, VertexBuffers};

/// Converts the renderer-agnostic IR into rend3 resources.
pub struct Rend3BackendConverter {}

impl Rend3BackendConverter {
    fn create_mesh_internal(
        vertex_buffers: &VertexBuffers,
        indices: &[u32],
    ) -> Result<rend3::types::Mesh, anyhow::Error> {
        let mut builder = rend3::types::MeshBuilder::new(
            vertex_buffers.position_buffer.clone(),
            rend3::types::Handedness::Right,
        );
        builder = builder.with_indices(indices.to_vec());

        if !vertex_buffers.texcoord_buffer.is_empty() {
            builder = builder.with_vertex_texture_coordinates_0(vertex_buffers.texcoord_buffer.clone());
        }

        if !vertex_buffers.normals_buffer.is_empty() {
            builder = builder.with_vertex_normals(vertex_buffers.normals_buffer.clone());
        }

        Ok(builder.build()?)
    }

    pub fn create_mesh_from_ir(mesh: &Mesh) -> Result<rend3::types::Mesh, anyhow::Error> {
        Rend3BackendConverter::create_mesh_internal(&mesh.vertex_buffers, &mesh.index_buffer)
    }

    pub fn create_mesh_from_ir_batch(
        mesh: &MeshWithBatches,
        batch: usize,
    ) -> Result<rend3::types::Mesh, anyhow::Error> {
        Rend3BackendConverter::create_mesh_internal(&mesh.vertex_buffers, &mesh.index_buffers[batch])
    }

    pub fn create_material_from_ir(
        material: &Material,
        texture_handle: Option<rend3::types::Texture2DHandle>,
    ) -> PbrMaterial {
        if texture_handle.is_none() {
            if let AlbedoType::TextureWithName(name) = &material.albedo {
                error!("Material requires the presence of texture {name}");
            }
        }

        PbrMaterial {
            albedo: match (&material.albedo, texture_handle) {
                (AlbedoType::Value(rgba), _) => AlbedoComponent::Value(*rgba),
                (_, Some(handle)) => AlbedoComponent::Texture(handle),
                // the error above already fired, render screaming pink instead
                (_, None) => AlbedoComponent::Value(glam::Vec4::new(1.0, 0.0, 0.5, 1.0)),
            },
            transparency: match material.transparency {
                TransparencyType::Opaque => Transparency::Opaque,
                TransparencyType::Cutout { cutout } => Transparency::Cutout { cutout },
                TransparencyType::Blend => Transparency::Blend,
            },
            unlit: material.is_unlit,
            ..PbrMaterial::default()
        }
    }

    pub fn create_texture_from_ir(texture: &BlpImage, label: Option<&str>, mipmap_level: usize) -> Result<Texture, anyhow::Error> {
        let image = blp_to_image(texture, mipmap_level).map_err(|e| anyhow::anyhow!("BLP decode failed: {}", e))?;
        let image_dims = glam::UVec2::new(image.width(), image.height());
        let image_data = image.into_rgba8();

        Ok(Texture {
            label: label.map(|s| s.to_string()),
            data: image_data.into_raw(),
            format: rend3::types::TextureFormat::Rgba8UnormSrgb,
            size: image_dims,
            mip_count: rend3::types::MipmapCount::ONE,
            mip_source: rend3::types::MipmapSource::Uploaded,
        })
    }

    /// Upload this image as block compressed texture already containing mipmaps. This assumes a DXT format, otherwise
    /// use the more generic create_texture_from_ir.
    pub fn create_texture_from_ir_dxtn(
        texture: &BlpDxtn,
        label: Option<&str>,
        image_dims: (u32, u32),
    ) -> Result<Texture, anyhow::Error> {
        let mipmap_count = NonZeroU32::try_from(texture.images.len() as u32)?;

        let format = match texture.format {
            DxtnFormat::Dxt1 => rend3::types::TextureFormat::Bc1RgbaUnormSrgb,
            DxtnFormat::Dxt3 => rend3::types::TextureFormat::Bc2RgbaUnormSrgb,
            DxtnFormat::Dxt5 => rend3::types::TextureFormat::Bc3RgbaUnormSrgb,
        };

        let px_per_byte = match texture.format {
            DxtnFormat::Dxt1 => 2,
            DxtnFormat::Dxt3 | DxtnFormat::Dxt5 => 1,
        };

        // Due to some broken mip map layers (https://wowdev.wiki/BLP#Compressed_textures), we would have to re-allocate,
        // so we overshoot a bit (last levels are always 8/16 bytes)
        let mut buf = Vec::with_capacity(
            texture.images.iter().map(|img| img.content.len()).sum::<usize>() + 8 * texture.images.len(),
        );

        for (mip, image) in texture.images.iter().enumerate() {
            let real_size = ((image_dims.0 >> mip).max(1), (image_dims.1 >> mip).max(1));
            let physical_size = (real_size.0.div_ceil(4) * 4, real_size.1.div_ceil(4) * 4);
            let actual_size = image.content.len() as u32;
            let physical_accumulated_size = physical_size.0 * physical_size.1 / px_per_byte;

            buf.extend(&image.content);
            if physical_accumulated_size > actual_size {
                buf.extend(std::iter::repeat(0).take((physical_accumulated_size - actual_size) as usize));
            }
        }

        Ok(Texture {
            label: label.map(|s| s.to_string()),
            data: buf,
            format,
            size: glam::UVec2::new(image_dims.0, image_dims.1),
            mip_count: rend3::types::MipmapCount::Specific(mipmap_count),
            mip_source: rend3::types::MipmapSource::Uploaded,
        })
    }

    /// Dispatches on the BLP content type, preferring the pre-compressed upload path.
    pub fn create_texture(blp: &BlpImage, label: Option<&str>) -> Result<Texture, anyhow::Error> {
        use image_blp::BlpContent;
        match &blp.content {
            BlpContent::Dxt1(dxtn) | BlpContent::Dxt3(dxtn) | BlpContent::Dxt5(dxtn) => {
                Self::create_texture_from_ir_dxtn(dxtn, label, (blp.header.width, blp.header.height))
            }
            // TODO: technically even RAW1/RAW3 can have mipmaps
            _ => Self::create_texture_from_ir(blp, label, 0),
        }
    }
}
