use std::sync::Arc;

use glam::{Mat4, Vec3};
use rend3::Renderer;
use thiserror::Error;

use crate::rendering::camera::{OrbitCamera, ProjectionKind};

pub mod game_model;
pub mod grid;
pub mod image;
pub mod world_model;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RenderableError {
    #[error("the renderable was already disposed")]
    Disposed,
    #[error("initialize must be called before render")]
    Uninitialized,
    #[error("initialize must only be called once")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Initialized,
    Disposed,
}

/// The Created → Initialized → Disposed state machine every renderable shares.
/// Use after dispose is a programming error and fails loudly instead of
/// silently skipping the draw.
#[derive(Debug)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Created,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == LifecycleState::Initialized
    }

    pub fn begin_initialize(&mut self) -> Result<(), RenderableError> {
        match self.state {
            LifecycleState::Created => {
                self.state = LifecycleState::Initialized;
                Ok(())
            }
            LifecycleState::Initialized => Err(RenderableError::AlreadyInitialized),
            LifecycleState::Disposed => Err(RenderableError::Disposed),
        }
    }

    pub fn ensure_renderable(&self) -> Result<(), RenderableError> {
        match self.state {
            LifecycleState::Initialized => Ok(()),
            LifecycleState::Created => Err(RenderableError::Uninitialized),
            LifecycleState::Disposed => Err(RenderableError::Disposed),
        }
    }

    /// Transitions to Disposed; `true` only on the first call so resource
    /// release happens exactly once.
    pub fn dispose(&mut self) -> bool {
        if self.state == LifecycleState::Disposed {
            return false;
        }
        self.state = LifecycleState::Disposed;
        true
    }
}

/// Per-type toggle a control page sends to the active render target.
/// Renderables ignore events that don't apply to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// image page: blend the alpha channel vs. render it opaque
    ToggleAlphaBlend,
}

/// One previewable asset in the viewport. GPU resources are allocated in
/// `initialize` (exactly once) and released in `dispose`; rend3 frees them
/// when the handles drop. Construction and initialize may run off the UI
/// thread because rend3's resource creation is internally synchronized.
/// On platforms where the GL context pins resource creation to one thread,
/// initialize has to be marshalled there instead.
pub trait Renderable: Send {
    fn initialize(&mut self, renderer: &Arc<Renderer>) -> Result<(), anyhow::Error>;

    /// Per-frame hook. Static renderables only validate their lifecycle here,
    /// the retained objects do the actual drawing.
    fn render(&mut self, view: Mat4, projection: Mat4, camera: &OrbitCamera) -> Result<(), RenderableError>;

    fn dispose(&mut self);

    fn state(&self) -> LifecycleState;

    fn is_initialized(&self) -> bool {
        self.state() == LifecycleState::Initialized
    }

    /// Static content needs no redraw per tick once painted.
    fn is_static(&self) -> bool {
        true
    }

    fn projection(&self) -> ProjectionKind {
        ProjectionKind::Perspective
    }

    /// Bounding sphere `(center, radius)` used to frame the camera on adopt.
    fn bounds(&self) -> Option<(Vec3, f32)> {
        None
    }

    fn control(&mut self, _event: ControlEvent) -> Result<(), RenderableError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_exactly_once() {
        let mut lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Created);
        assert!(lifecycle.begin_initialize().is_ok());
        assert_eq!(
            lifecycle.begin_initialize(),
            Err(RenderableError::AlreadyInitialized)
        );
    }

    #[test]
    fn render_before_initialize_fails() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.ensure_renderable(), Err(RenderableError::Uninitialized));
    }

    #[test]
    fn render_after_dispose_fails_loudly() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.begin_initialize().unwrap();
        assert!(lifecycle.dispose());
        assert_eq!(lifecycle.ensure_renderable(), Err(RenderableError::Disposed));
        assert_eq!(lifecycle.begin_initialize(), Err(RenderableError::Disposed));
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.begin_initialize().unwrap();
        assert!(lifecycle.dispose());
        assert!(!lifecycle.dispose());
    }
}
