use std::collections::HashMap;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use rend3::Renderer;
use rend3::types::{ObjectHandle, Texture2DHandle};

use crate::rendering::camera::{OrbitCamera, ProjectionKind};
use crate::rendering::common::types::AlbedoType;
use crate::rendering::loader::wmo_loader::LoadedWMO;
use crate::rendering::rend3_backend::Rend3BackendConverter;
use crate::rendering::renderable::{Lifecycle, LifecycleState, Renderable, RenderableError};

/// A WMO building preview: every group's render batches, each with its own
/// material resolved against the root's texture table.
pub struct WorldModelRenderable {
    lifecycle: Lifecycle,
    model: LoadedWMO,
    objects: Vec<ObjectHandle>,
}

impl WorldModelRenderable {
    pub fn new(model: LoadedWMO) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            model,
            objects: vec![],
        }
    }
}

impl Renderable for WorldModelRenderable {
    fn initialize(&mut self, renderer: &Arc<Renderer>) -> Result<(), anyhow::Error> {
        self.lifecycle.begin_initialize()?;

        let mut texture_handles: HashMap<&str, Texture2DHandle> = HashMap::new();
        for (name, blp) in &self.model.textures {
            let texture = Rend3BackendConverter::create_texture(blp, Some(name))?;
            texture_handles.insert(name.as_str(), renderer.add_texture_2d(texture)?);
        }

        for group in &self.model.groups {
            for (batch, material) in group.materials.iter().enumerate() {
                let mesh = Rend3BackendConverter::create_mesh_from_ir_batch(&group.mesh, batch)?;
                let mesh_handle = renderer.add_mesh(mesh)?;

                let texture_handle = match &material.albedo {
                    AlbedoType::TextureWithName(name) => texture_handles.get(name.as_str()).cloned(),
                    _ => None,
                };
                let material = Rend3BackendConverter::create_material_from_ir(material, texture_handle);
                let material_handle = renderer.add_material(material);

                let object = rend3::types::Object {
                    mesh_kind: rend3::types::ObjectMeshKind::Static(mesh_handle),
                    material: material_handle,
                    transform: Mat4::IDENTITY,
                };
                self.objects.push(renderer.add_object(object));
            }
        }

        Ok(())
    }

    fn render(&mut self, _view: Mat4, _projection: Mat4, _camera: &OrbitCamera) -> Result<(), RenderableError> {
        self.lifecycle.ensure_renderable()
    }

    fn dispose(&mut self) {
        if self.lifecycle.dispose() {
            self.objects.clear();
        }
    }

    fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    fn projection(&self) -> ProjectionKind {
        ProjectionKind::Perspective
    }

    fn bounds(&self) -> Option<(Vec3, f32)> {
        let bb = &self.model.bounding_box;
        let center = bb.center();
        let radius = (bb.diagonal() * 0.5).max(0.1);
        Some((Vec3::new(center.x, center.y, center.z), radius))
    }
}
