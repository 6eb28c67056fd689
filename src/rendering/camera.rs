use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec2, Vec3, Vec3A};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionKind {
    /// orbit camera around the framed asset
    Perspective,
    /// flat pan/zoom, used for image previews
    Orthographic,
}

/// Camera state for the preview viewport. WoW assets are right handed with Z
/// up, so the orbit math sticks to that convention.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    projection: ProjectionKind,
    pub yaw: f32,
    pub pitch: f32,
    distance: f32,
    center: Vec3A,
    /// half height of the orthographic view volume
    ortho_extent: f32,
    pan_offset: Vec2,
}

const MIN_DISTANCE: f32 = 0.05;
const MIN_EXTENT: f32 = 0.01;
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;
const ORBIT_SENSITIVITY: f32 = 0.008;
const PAN_SENSITIVITY: f32 = 0.002;

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            projection: ProjectionKind::Perspective,
            yaw: -0.75,
            pitch: -0.4,
            distance: 10.0,
            center: Vec3A::ZERO,
            ortho_extent: 2.0,
            pan_offset: Vec2::ZERO,
        }
    }
}

impl OrbitCamera {
    pub fn projection(&self) -> ProjectionKind {
        self.projection
    }

    pub fn set_projection(&mut self, projection: ProjectionKind) {
        self.projection = projection;
    }

    /// Repositions the camera so a bounding sphere fills the view.
    pub fn frame(&mut self, center: Vec3, radius: f32) {
        let radius = radius.max(MIN_EXTENT);
        self.center = center.into();
        self.distance = (radius * 2.2).max(MIN_DISTANCE);
        self.ortho_extent = radius * 1.1;
        self.pan_offset = Vec2::ZERO;
    }

    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * ORBIT_SENSITIVITY;
        self.pitch = (self.pitch - dy * ORBIT_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        let scale = self.ortho_extent * PAN_SENSITIVITY;
        self.pan_offset += Vec2::new(-dx, dy) * scale;
    }

    pub fn zoom(&mut self, amount: f32) {
        let factor = 0.9f32.powf(amount);
        self.distance = (self.distance * factor).max(MIN_DISTANCE);
        self.ortho_extent = (self.ortho_extent * factor).max(MIN_EXTENT);
    }

    fn eye(&self) -> Vec3A {
        let direction = Vec3A::new(
            self.pitch.cos() * self.yaw.cos(),
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
        );
        self.center + direction * self.distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        match self.projection {
            ProjectionKind::Perspective => Mat4::look_at_rh(self.eye().into(), self.center.into(), Vec3::Z),
            ProjectionKind::Orthographic => {
                let center = Vec3::new(self.pan_offset.x, self.pan_offset.y, 0.0);
                Mat4::look_at_rh(center + Vec3::Z * 10.0, center, Vec3::Y)
            }
        }
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        match self.projection {
            ProjectionKind::Perspective => Mat4::perspective_rh(45f32.to_radians(), aspect, 0.05, 10_000.0),
            ProjectionKind::Orthographic => {
                let half_height = self.ortho_extent;
                let half_width = half_height * aspect;
                Mat4::orthographic_rh(-half_width, half_width, -half_height, half_height, 0.05, 100.0)
            }
        }
    }

    pub fn to_rend3_camera(&self) -> rend3::types::Camera {
        rend3::types::Camera {
            projection: match self.projection {
                ProjectionKind::Perspective => rend3::types::CameraProjection::Perspective {
                    vfov: 45.0,
                    near: 0.05,
                },
                ProjectionKind::Orthographic => rend3::types::CameraProjection::Orthographic {
                    size: Vec3A::new(self.ortho_extent * 2.0, self.ortho_extent * 2.0, 100.0),
                },
            },
            view: self.view_matrix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_stays_clamped() {
        let mut camera = OrbitCamera::default();
        for _ in 0..10_000 {
            camera.orbit(0.0, -50.0);
        }
        assert!(camera.pitch <= PITCH_LIMIT);

        for _ in 0..10_000 {
            camera.orbit(0.0, 50.0);
        }
        assert!(camera.pitch >= -PITCH_LIMIT);
    }

    #[test]
    fn zoom_never_collapses() {
        let mut camera = OrbitCamera::default();
        for _ in 0..1_000 {
            camera.zoom(5.0);
        }
        let view = camera.view_matrix();
        // still an invertible view transform
        assert!(view.determinant().abs() > 1e-6);
    }

    #[test]
    fn framing_scales_with_the_asset() {
        let mut small = OrbitCamera::default();
        small.frame(Vec3::ZERO, 1.0);
        let mut large = OrbitCamera::default();
        large.frame(Vec3::ZERO, 100.0);
        assert!(large.distance > small.distance);
        assert!(large.ortho_extent > small.ortho_extent);
    }
}
