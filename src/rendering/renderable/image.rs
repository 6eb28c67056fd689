use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use image_blp::BlpImage;
use rend3::Renderer;
use rend3::types::{MeshHandle, ObjectHandle, Texture2DHandle};

use crate::rendering::camera::{OrbitCamera, ProjectionKind};
use crate::rendering::common::types::{AlbedoType, Material, Mesh, TransparencyType, VertexBuffers};
use crate::rendering::rend3_backend::Rend3BackendConverter;
use crate::rendering::renderable::{ControlEvent, Lifecycle, LifecycleState, Renderable, RenderableError};

/// A BLP texture on a screen-facing quad, viewed orthographically. The only
/// per-type toggle is whether the alpha channel blends or gets ignored.
pub struct ImageRenderable {
    lifecycle: Lifecycle,
    name: String,
    blp: Arc<BlpImage>,
    alpha_blend: bool,
    // kept for the alpha toggle, which swaps the object's material
    renderer: Option<Arc<Renderer>>,
    texture: Option<Texture2DHandle>,
    mesh: Option<MeshHandle>,
    object: Option<ObjectHandle>,
}

impl ImageRenderable {
    pub fn new(name: String, blp: Arc<BlpImage>) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            name,
            blp,
            alpha_blend: true,
            renderer: None,
            texture: None,
            mesh: None,
            object: None,
        }
    }

    /// The image control page toggle. Recreates the object because rend3
    /// materials are immutable once added.
    pub fn set_alpha_blend(&mut self, enabled: bool) -> Result<(), RenderableError> {
        if self.alpha_blend == enabled {
            return Ok(());
        }
        self.alpha_blend = enabled;
        if self.lifecycle.is_initialized() {
            self.rebuild_object()?;
        }
        Ok(())
    }

    fn half_size(&self) -> Vec2 {
        let width = self.blp.header.width as f32;
        let height = self.blp.header.height as f32;
        let aspect = width / height.max(1.0);
        if aspect >= 1.0 {
            Vec2::new(1.0, 1.0 / aspect)
        } else {
            Vec2::new(aspect, 1.0)
        }
    }

    fn material(&self) -> Material {
        Material {
            albedo: AlbedoType::TextureWithName(self.name.clone()),
            is_unlit: true,
            transparency: if self.alpha_blend {
                TransparencyType::Blend
            } else {
                TransparencyType::Opaque
            },
        }
    }

    fn rebuild_object(&mut self) -> Result<(), RenderableError> {
        let renderer = self.renderer.as_ref().ok_or(RenderableError::Uninitialized)?;
        let mesh = self.mesh.as_ref().ok_or(RenderableError::Uninitialized)?;

        let material = Rend3BackendConverter::create_material_from_ir(&self.material(), self.texture.clone());
        let material_handle = renderer.add_material(material);
        let object = rend3::types::Object {
            mesh_kind: rend3::types::ObjectMeshKind::Static(mesh.clone()),
            material: material_handle,
            transform: Mat4::IDENTITY,
        };
        // dropping the old handle releases the previous object
        self.object = Some(renderer.add_object(object));
        Ok(())
    }
}

impl Renderable for ImageRenderable {
    fn initialize(&mut self, renderer: &Arc<Renderer>) -> Result<(), anyhow::Error> {
        self.lifecycle.begin_initialize()?;

        let texture = Rend3BackendConverter::create_texture(&self.blp, Some(&self.name))?;
        self.texture = Some(renderer.add_texture_2d(texture)?);

        let half = self.half_size();
        let mesh = Mesh {
            vertex_buffers: VertexBuffers {
                position_buffer: vec![
                    Vec3::new(-half.x, -half.y, 0.0),
                    Vec3::new(half.x, -half.y, 0.0),
                    Vec3::new(-half.x, half.y, 0.0),
                    Vec3::new(half.x, half.y, 0.0),
                ],
                normals_buffer: vec![Vec3::Z; 4],
                texcoord_buffer: vec![
                    Vec2::new(0.0, 1.0),
                    Vec2::new(1.0, 1.0),
                    Vec2::new(0.0, 0.0),
                    Vec2::new(1.0, 0.0),
                ],
            },
            index_buffer: vec![0, 1, 2, 2, 1, 3],
        };
        let mesh = Rend3BackendConverter::create_mesh_from_ir(&mesh)?;
        self.mesh = Some(renderer.add_mesh(mesh)?);

        self.renderer = Some(renderer.clone());
        self.rebuild_object()?;
        Ok(())
    }

    fn render(&mut self, _view: Mat4, _projection: Mat4, _camera: &OrbitCamera) -> Result<(), RenderableError> {
        self.lifecycle.ensure_renderable()
    }

    fn dispose(&mut self) {
        if self.lifecycle.dispose() {
            self.object = None;
            self.mesh = None;
            self.texture = None;
            self.renderer = None;
        }
    }

    fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    fn projection(&self) -> ProjectionKind {
        ProjectionKind::Orthographic
    }

    fn bounds(&self) -> Option<(Vec3, f32)> {
        let half = self.half_size();
        Some((Vec3::ZERO, half.x.max(half.y)))
    }

    fn control(&mut self, event: ControlEvent) -> Result<(), RenderableError> {
        match event {
            ControlEvent::ToggleAlphaBlend => self.set_alpha_blend(!self.alpha_blend),
        }
    }
}
