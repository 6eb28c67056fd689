use std::sync::Arc;

use glam::{Mat4, Vec3};
use rend3::Renderer;
use rend3::types::ObjectHandle;

use crate::rendering::camera::{OrbitCamera, ProjectionKind};
use crate::rendering::loader::m2_loader::LoadedM2;
use crate::rendering::rend3_backend::Rend3BackendConverter;
use crate::rendering::renderable::{Lifecycle, LifecycleState, Renderable, RenderableError};

/// An m2 doodad/creature model preview: one mesh, one material, first LoD.
pub struct GameModelRenderable {
    lifecycle: Lifecycle,
    model: LoadedM2,
    objects: Vec<ObjectHandle>,
}

impl GameModelRenderable {
    pub fn new(model: LoadedM2) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            model,
            objects: vec![],
        }
    }
}

impl Renderable for GameModelRenderable {
    fn initialize(&mut self, renderer: &Arc<Renderer>) -> Result<(), anyhow::Error> {
        self.lifecycle.begin_initialize()?;

        let texture_handle = match &self.model.blp {
            Some(blp) => {
                let texture = Rend3BackendConverter::create_texture(blp, Some(&self.model.name))?;
                Some(renderer.add_texture_2d(texture)?)
            }
            None => None,
        };

        let mesh = Rend3BackendConverter::create_mesh_from_ir(&self.model.mesh)?;
        let mesh_handle = renderer.add_mesh(mesh)?;

        let material = Rend3BackendConverter::create_material_from_ir(&self.model.material, texture_handle);
        let material_handle = renderer.add_material(material);

        let object = rend3::types::Object {
            mesh_kind: rend3::types::ObjectMeshKind::Static(mesh_handle),
            material: material_handle,
            transform: Mat4::IDENTITY,
        };
        self.objects.push(renderer.add_object(object));

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
