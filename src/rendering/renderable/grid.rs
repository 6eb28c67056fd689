use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};
use rend3::Renderer;
use rend3::types::ObjectHandle;

use crate::rendering::camera::{OrbitCamera, ProjectionKind};
use crate::rendering::common::types::{AlbedoType, Material, Mesh, TransparencyType, VertexBuffers};
use crate::rendering::rend3_backend::Rend3BackendConverter;
use crate::rendering::renderable::{Lifecycle, LifecycleState, Renderable, RenderableError};

/// Ground-plane orientation helper shown when nothing is loaded. rend3 only
/// draws triangles, so every grid line is a thin quad.
pub struct GridRenderable {
    lifecycle: Lifecycle,
    half_extent: f32,
    step: f32,
    objects: Vec<ObjectHandle>,
}

const LINE_HALF_WIDTH: f32 = 0.01;

impl GridRenderable {
    pub fn new(half_extent: f32, step: f32) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            half_extent,
            step,
            objects: vec![],
        }
    }

    fn build_mesh(&self) -> Mesh {
        let mut positions = Vec::new();
        let mut indices = Vec::new();

        let mut push_quad = |a: Vec3, b: Vec3, c: Vec3, d: Vec3| {
            let base = positions.len() as u32;
            positions.extend_from_slice(&[a, b, c, d]);
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 1, base + 3]);
        };

        let mut line = -self.half_extent;
        while line <= self.half_extent {
            // along Y
            push_quad(
                Vec3::new(line - LINE_HALF_WIDTH, -self.half_extent, 0.0),
                Vec3::new(line + LINE_HALF_WIDTH, -self.half_extent, 0.0),
                Vec3::new(line - LINE_HALF_WIDTH, self.half_extent, 0.0),
                Vec3::new(line + LINE_HALF_WIDTH, self.half_extent, 0.0),
            );
            // along X
            push_quad(
                Vec3::new(-self.half_extent, line - LINE_HALF_WIDTH, 0.0),
                Vec3::new(-self.half_extent, line + LINE_HALF_WIDTH, 0.0),
                Vec3::new(self.half_extent, line - LINE_HALF_WIDTH, 0.0),
                Vec3::new(self.half_extent, line + LINE_HALF_WIDTH, 0.0),
            );
            line += self.step;
        }

        Mesh {
            vertex_buffers: VertexBuffers {
                position_buffer: positions,
                normals_buffer: vec![],
                texcoord_buffer: vec![],
            },
            index_buffer: indices,
        }
    }
}

impl Renderable for GridRenderable {
    fn initialize(&mut self, renderer: &Arc<Renderer>) -> Result<(), anyhow::Error> {
        self.lifecycle.begin_initialize()?;

        let mesh = Rend3BackendConverter::create_mesh_from_ir(&self.build_mesh())?;
        let mesh_handle = renderer.add_mesh(mesh)?;

        let material = Rend3BackendConverter::create_material_from_ir(
            &Material {
                albedo: AlbedoType::Value(Vec4::new(0.45, 0.45, 0.45, 1.0)),
                is_unlit: true,
                transparency: TransparencyType::Opaque,
            },
            None,
        );
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
        Some((Vec3::ZERO, self.half_extent))
    }
}
