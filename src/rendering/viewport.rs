use std::sync::Arc;

use glam::{UVec2, Vec2};
use log::{error, trace};
use rend3::Renderer;
use winit::event::MouseButton;

use crate::rendering::camera::{OrbitCamera, ProjectionKind};
use crate::rendering::renderable::Renderable;

/// What the cooperative idle callback decided for this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickResult {
    /// stop polling, the viewport is gone or shutting down
    Stop,
    /// nothing to paint, keep polling
    Idle,
    /// paint one frame now
    Render,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragKind {
    Orbit,
    Pan,
}

/// Cursor change the window should apply after a mouse event. Perspective
/// orbiting hides the pointer for the duration of the drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorRequest {
    NoChange,
    Hide,
    Show,
}

/// Owns the single active render target and the camera; paints lazily from
/// the event loop's idle callback. All mutation happens on the UI thread,
/// background loads only hand finished renderables over.
pub struct ViewportRenderer {
    pub camera: OrbitCamera,
    render_target: Option<Box<dyn Renderable>>,
    initialized: bool,
    shutting_down: bool,
    movement_enabled: bool,
    pending_redraw: bool,
    drag: Option<DragKind>,
}

impl Default for ViewportRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportRenderer {
    pub fn new() -> Self {
        Self {
            camera: OrbitCamera::default(),
            render_target: None,
            initialized: false,
            shutting_down: false,
            movement_enabled: true,
            pending_redraw: false,
            drag: None,
        }
    }

    /// Called once the renderer exists (rend3-framework setup).
    pub fn notify_initialized(&mut self) {
        self.initialized = true;
        self.pending_redraw = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn has_render_target(&self) -> bool {
        self.render_target.is_some()
    }

    pub fn begin_shutdown(&mut self) {
        self.shutting_down = true;
    }

    /// window configure/resize and state toggles land here
    pub fn mark_dirty(&mut self) {
        self.pending_redraw = true;
    }

    pub fn movement_enabled(&self) -> bool {
        self.movement_enabled
    }

    pub fn set_movement_enabled(&mut self, enabled: bool) {
        self.movement_enabled = enabled;
        if !enabled {
            self.drag = None;
        }
    }

    pub fn toggle_projection(&mut self) {
        let next = match self.camera.projection() {
            ProjectionKind::Perspective => ProjectionKind::Orthographic,
            ProjectionKind::Orthographic => ProjectionKind::Perspective,
        };
        self.camera.set_projection(next);
        self.drag = None;
        self.mark_dirty();
    }

    /// Adopts `new` (which may be `None` for "nothing rendered") and disposes
    /// the detached previous target exactly once.
    pub fn set_render_target(&mut self, new: Option<Box<dyn Renderable>>) {
        if let Some(mut previous) = self.render_target.take() {
            previous.dispose();
        }

        if let Some(target) = &new {
            self.camera.set_projection(target.projection());
            if let Some((center, radius)) = target.bounds() {
                self.camera.frame(center, radius);
            }
        }

        self.render_target = new;
        self.drag = None;
        self.pending_redraw = true;
    }

    pub fn render_target_mut(&mut self) -> Option<&mut Box<dyn Renderable>> {
        self.render_target.as_mut()
    }

    /// One cooperative idle tick: never blocks, never paints by itself.
    pub fn tick(&mut self) -> TickResult {
        if self.shutting_down {
            return TickResult::Stop;
        }
        if !self.initialized {
            return TickResult::Stop;
        }
        if self.render_target.is_none() && !self.pending_redraw {
            return TickResult::Idle;
        }
        TickResult::Render
    }

    /// Pushes the camera to the renderer and gives the target its per-frame
    /// hook; the caller executes the render graph afterwards. Clears the
    /// dirty flag.
    pub fn prepare_frame(&mut self, renderer: &Arc<Renderer>, resolution: UVec2) {
        renderer.set_camera_data(self.camera.to_rend3_camera());

        if let Some(target) = self.render_target.as_mut() {
            let aspect = resolution.x as f32 / resolution.y.max(1) as f32;
            let view = self.camera.view_matrix();
            let projection = self.camera.projection_matrix(aspect);
            if let Err(err) = target.render(view, projection, &self.camera) {
                // lifecycle violation; surface it, don't hide it
                error!("Render target failed to render: {}", err);
            }
        }

        self.pending_redraw = false;
    }

    /// Projection-gated drag start/stop. Perspective orbits on the right
    /// button only (cursor hidden while dragging); orthographic pans on
    /// either the left or middle button.
    pub fn handle_mouse_button(&mut self, button: MouseButton, pressed: bool) -> CursorRequest {
        if !self.movement_enabled {
            self.drag = None;
            return CursorRequest::NoChange;
        }

        if pressed {
            let started = match self.camera.projection() {
                ProjectionKind::Perspective => matches!(button, MouseButton::Right).then_some(DragKind::Orbit),
                ProjectionKind::Orthographic => {
                    matches!(button, MouseButton::Left | MouseButton::Middle).then_some(DragKind::Pan)
                }
            };
            if let Some(kind) = started {
                trace!("Starting {:?} drag", kind);
                self.drag = Some(kind);
                return match kind {
                    DragKind::Orbit => CursorRequest::Hide,
                    DragKind::Pan => CursorRequest::NoChange,
                };
            }
            return CursorRequest::NoChange;
        }

        if self.drag.take().is_some() {
            return CursorRequest::Show;
        }
        CursorRequest::NoChange
    }

    pub fn handle_cursor_moved(&mut self, delta: Vec2) {
        let Some(drag) = self.drag else {
            return;
        };
        match drag {
            DragKind::Orbit => self.camera.orbit(delta.x, delta.y),
            DragKind::Pan => self.camera.pan(delta.x, delta.y),
        }
        self.pending_redraw = true;
    }

    pub fn handle_cursor_left(&mut self) -> CursorRequest {
        if self.drag.take().is_some() {
            return CursorRequest::Show;
        }
        CursorRequest::NoChange
    }

    pub fn handle_scroll(&mut self, amount: f32) {
        if !self.movement_enabled {
            return;
        }
        self.camera.zoom(amount);
        self.pending_redraw = true;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use glam::Mat4;
    use rend3::Renderer;

    use super::*;
    use crate::rendering::renderable::{Lifecycle, LifecycleState, RenderableError};

    struct StubRenderable {
        lifecycle: Lifecycle,
        projection: ProjectionKind,
        disposals: Arc<AtomicUsize>,
        renders: Arc<AtomicUsize>,
    }

    impl StubRenderable {
        fn new(projection: ProjectionKind) -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let disposals = Arc::new(AtomicUsize::new(0));
            let renders = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    lifecycle: Lifecycle::new(),
                    projection,
                    disposals: disposals.clone(),
                    renders: renders.clone(),
                },
                disposals,
                renders,
            )
        }
    }

    impl Renderable for StubRenderable {
        fn initialize(&mut self, _renderer: &Arc<Renderer>) -> Result<(), anyhow::Error> {
            self.lifecycle.begin_initialize()?;
            Ok(())
        }

        fn render(&mut self, _view: Mat4, _projection: Mat4, _camera: &OrbitCamera) -> Result<(), RenderableError> {
            self.lifecycle.ensure_renderable()?;
            self.renders.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn dispose(&mut self) {
            if self.lifecycle.dispose() {
                self.disposals.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn state(&self) -> LifecycleState {
            self.lifecycle.state()
        }

        fn projection(&self) -> ProjectionKind {
            self.projection
        }
    }

    #[test]
    fn replaced_targets_are_disposed_exactly_once() {
        let mut viewport = ViewportRenderer::new();
        let (first, first_disposals, _) = StubRenderable::new(ProjectionKind::Perspective);
        let (second, second_disposals, _) = StubRenderable::new(ProjectionKind::Perspective);

        viewport.set_render_target(Some(Box::new(first)));
        viewport.set_render_target(Some(Box::new(second)));
        assert_eq!(first_disposals.load(Ordering::SeqCst), 1);
        assert_eq!(second_disposals.load(Ordering::SeqCst), 0);

        // adopting "nothing" still disposes the previous target
        viewport.set_render_target(None);
        assert_eq!(second_disposals.load(Ordering::SeqCst), 1);
        assert!(!viewport.has_render_target());

        viewport.set_render_target(None);
        assert_eq!(second_disposals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tick_stops_when_shut_down_or_uninitialized() {
        let mut viewport = ViewportRenderer::new();
        assert_eq!(viewport.tick(), TickResult::Stop);

        viewport.notify_initialized();
        assert_ne!(viewport.tick(), TickResult::Stop);

        viewport.begin_shutdown();
        assert_eq!(viewport.tick(), TickResult::Stop);
    }

    #[test]
    fn idle_without_target_and_redraw_does_no_render_work() {
        let mut viewport = ViewportRenderer::new();
        viewport.notify_initialized();
        viewport.pending_redraw = false;

        let (stub, _, renders) = StubRenderable::new(ProjectionKind::Perspective);
        drop(stub); // never adopted, the viewport has no target at all

        assert_eq!(viewport.tick(), TickResult::Idle);
        assert_eq!(viewport.tick(), TickResult::Idle);
        assert_eq!(renders.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dirty_flag_requests_a_render_even_without_a_target() {
        let mut viewport = ViewportRenderer::new();
        viewport.notify_initialized();
        viewport.pending_redraw = false;
        viewport.mark_dirty();
        assert_eq!(viewport.tick(), TickResult::Render);
    }

    #[test]
    fn adopting_a_target_applies_its_projection() {
        let mut viewport = ViewportRenderer::new();
        let (image_like, _, _) = StubRenderable::new(ProjectionKind::Orthographic);
        viewport.set_render_target(Some(Box::new(image_like)));
        assert_eq!(viewport.camera.projection(), ProjectionKind::Orthographic);
    }

    #[test]
    fn perspective_orbits_on_the_right_button_only() {
        let mut viewport = ViewportRenderer::new();
        viewport.camera.set_projection(ProjectionKind::Perspective);

        assert_eq!(
            viewport.handle_mouse_button(MouseButton::Left, true),
            CursorRequest::NoChange
        );
        assert_eq!(
            viewport.handle_mouse_button(MouseButton::Right, true),
            CursorRequest::Hide
        );
        let yaw_before = viewport.camera.yaw;
        viewport.handle_cursor_moved(Vec2::new(10.0, 0.0));
        assert_ne!(viewport.camera.yaw, yaw_before);

        assert_eq!(
            viewport.handle_mouse_button(MouseButton::Right, false),
            CursorRequest::Show
        );
    }

    #[test]
    fn orthographic_pans_on_either_button() {
        let mut viewport = ViewportRenderer::new();
        viewport.camera.set_projection(ProjectionKind::Orthographic);

        assert_eq!(
            viewport.handle_mouse_button(MouseButton::Left, true),
            CursorRequest::NoChange
        );
        viewport.handle_mouse_button(MouseButton::Left, false);
        assert_eq!(
            viewport.handle_mouse_button(MouseButton::Middle, true),
            CursorRequest::NoChange
        );
        // the pan drag is active even though the cursor stays visible
        viewport.handle_cursor_moved(Vec2::new(5.0, 5.0));
        assert!(viewport.pending_redraw);
    }

    #[test]
    fn disabled_movement_ignores_drags() {
        let mut viewport = ViewportRenderer::new();
        viewport.set_movement_enabled(false);
        assert_eq!(
            viewport.handle_mouse_button(MouseButton::Right, true),
            CursorRequest::NoChange
        );
        let yaw_before = viewport.camera.yaw;
        viewport.handle_cursor_moved(Vec2::new(10.0, 0.0));
        assert_eq!(viewport.camera.yaw, yaw_before);
    }

    #[test]
    fn leaving_the_window_restores_the_cursor() {
        let mut viewport = ViewportRenderer::new();
        viewport.camera.set_projection(ProjectionKind::Perspective);
        viewport.handle_mouse_button(MouseButton::Right, true);
        assert_eq!(viewport.handle_cursor_left(), CursorRequest::Show);
        assert_eq!(viewport.handle_cursor_left(), CursorRequest::NoChange);
    }
}
