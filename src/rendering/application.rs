use std::sync::Arc;
use std::sync::mpsc::Receiver;

use glam::{UVec2, Vec2};
use log::{error, info, warn};
use rend3::Renderer;
use rend3::types::{Handedness, PresentMode, SampleCount, Surface, TextureFormat};
use rend3_framework::{DefaultRoutines, Event, UserResizeEvent};
use rend3_routine::base::BaseRenderGraph;
use winit::event::{ElementState, KeyboardInput, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::Window;

use crate::audio::playback::AudioPlaybackManager;
use crate::explorer::reference::{FileKind, FileReference};
use crate::explorer::tree::NodeTree;
use crate::io::common::loader::RawAssetLoader;
use crate::loading::{ControlPage, LoadOutcome, LoadPipeline, LoadedContent};
use crate::rendering::renderable::grid::GridRenderable;
use crate::rendering::renderable::{ControlEvent, Renderable};
use crate::rendering::viewport::{CursorRequest, TickResult, ViewportRenderer};
use crate::settings::GameVersion;

// keyboard scancodes, set 1
const SCANCODE_ESC: u32 = 1;
const SCANCODE_P: u32 = 25;
const SCANCODE_A: u32 = 30;
const SCANCODE_M: u32 = 50;

/// The explorer's window-side half: drives the viewport from the event loop,
/// drains finished loads onto the UI thread and forwards input. Selection
/// normally comes from the tree view; the CLI's initial file goes through the
/// same request path.
pub struct ExplorerApplication {
    viewport: ViewportRenderer,
    pipeline: LoadPipeline,
    outcomes: Receiver<LoadOutcome>,
    audio: Option<AudioPlaybackManager>,
    tree: Arc<NodeTree>,
    package_group: Arc<dyn RawAssetLoader + Send + Sync>,
    version: GameVersion,
    control_page: ControlPage,
    status: Option<String>,
    status_dirty: bool,
    initial_file: Option<String>,
    last_cursor: Option<Vec2>,
}

impl ExplorerApplication {
    pub fn new(
        pipeline: LoadPipeline,
        outcomes: Receiver<LoadOutcome>,
        audio: Option<AudioPlaybackManager>,
        tree: Arc<NodeTree>,
        package_group: Arc<dyn RawAssetLoader + Send + Sync>,
        version: GameVersion,
        initial_file: Option<String>,
    ) -> Self {
        Self {
            viewport: ViewportRenderer::new(),
            pipeline,
            outcomes,
            audio,
            tree,
            package_group,
            version,
            control_page: ControlPage::None,
            status: None,
            status_dirty: false,
            initial_file,
            last_cursor: None,
        }
    }

    /// The window title doubles as the status bar.
    fn set_status(&mut self, status: Option<String>) {
        if let Some(message) = &status {
            info!("{}", message);
        }
        self.status = status;
        self.status_dirty = true;
    }

    fn refresh_title(&mut self, window: &Window) {
        if !self.status_dirty {
            return;
        }
        self.status_dirty = false;
        match &self.status {
            Some(status) => window.set_title(&format!("Everrust: Archive Explorer - {}", status)),
            None => window.set_title("Everrust: Archive Explorer"),
        }
    }

    /// Resolves an archive path and dispatches it to the pipeline keyed by
    /// its file kind.
    fn request_selection(&mut self, renderer: &Arc<Renderer>, path: &str) {
        let Some(offset) = self.tree.node_by_path(path) else {
            self.set_status(Some(format!("{} does not exist in any mounted archive", path)));
            return;
        };

        let reference = match FileReference::for_node(&self.package_group, &self.tree, offset) {
            Ok(Some(reference)) => reference,
            Ok(None) => return,
            Err(err) => {
                error!("Resolving {} failed: {}", path, err);
                return;
            }
        };

        match reference.kind() {
            FileKind::Audio => {
                self.set_status(Some(format!("Loading {}...", reference.file_path)));
                self.pipeline.request_audio(reference);
            }
            FileKind::Data => {
                self.set_status(Some(format!("No previewer for {}", reference.file_path)));
            }
            _ => {
                self.set_status(Some(format!("Loading {}...", reference.file_path)));
                self.pipeline
                    .request_preview(reference, renderer.clone(), self.version);
            }
        }
    }

    /// Completed loads arrive here, on the UI thread. The token is
    /// re-validated before anything touches the viewport, so a superseded
    /// load can never swap late.
    fn drain_outcomes(&mut self) {
        while let Ok(outcome) = self.outcomes.try_recv() {
            if !self.pipeline.is_current(outcome.class, outcome.token) {
                info!("Dropping superseded load of {}", outcome.file_path);
                continue;
            }

            match outcome.result {
                Ok(LoadedContent::Visual { renderable, page }) => {
                    self.viewport.set_render_target(Some(renderable));
                    self.control_page = page;
                    self.set_status(None);
                }
                Ok(LoadedContent::Audio { sound }) => {
                    match &mut self.audio {
                        Some(audio) => {
                            if let Err(err) = audio.play(sound) {
                                self.set_status(Some(format!("Playback failed: {}", err)));
                                continue;
                            }
                            self.control_page = ControlPage::Audio;
                        }
                        None => warn!("Audio subsystem unavailable, dropping {}", outcome.file_path),
                    }
                    self.set_status(None);
                }
                Err(err) => {
                    // the previous render target stays intact
                    error!("Loading {} failed: {:#}", outcome.file_path, err);
                    self.set_status(Some(format!("Failed to load {}", outcome.file_path)));
                }
            }
        }
    }

    fn handle_key(&mut self, scancode: u32) {
        match scancode {
            SCANCODE_ESC => {
                self.viewport.set_render_target(None);
                self.control_page = ControlPage::None;
                if let Some(audio) = &mut self.audio {
                    audio.stop();
                }
            }
            SCANCODE_P => self.viewport.toggle_projection(),
            SCANCODE_A => {
                if self.control_page == ControlPage::Image {
                    if let Some(target) = self.viewport.render_target_mut() {
                        if let Err(err) = target.control(ControlEvent::ToggleAlphaBlend) {
                            error!("Control toggle failed: {}", err);
                        }
                        self.viewport.mark_dirty();
                    }
                }
            }
            SCANCODE_M => {
                let enabled = !self.viewport.movement_enabled();
                self.viewport.set_movement_enabled(enabled);
            }
            _ => {}
        }
    }

    fn apply_cursor_request(window: &Window, request: CursorRequest) {
        match request {
            CursorRequest::Hide => window.set_cursor_visible(false),
            CursorRequest::Show => window.set_cursor_visible(true),
            CursorRequest::NoChange => {}
        }
    }
}

impl rend3_framework::App for ExplorerApplication {
    const HANDEDNESS: Handedness = Handedness::Right;

    fn register_logger(&mut self) {
        // intentionally no-opped, env_logger is initialized in main.
    }

    fn sample_count(&self) -> SampleCount {
        SampleCount::One
    }

    fn present_mode(&self) -> PresentMode {
        PresentMode::AutoVsync
    }

    fn setup(
        &mut self,
        _event_loop: &EventLoop<UserResizeEvent<()>>,
        _window: &Window,
        renderer: &Arc<Renderer>,
        _routines: &Arc<DefaultRoutines>,
        _surface_format: TextureFormat,
    ) {
        self.viewport.notify_initialized();

        // grid as the default target until something loads; small enough to
        // initialize right here on the UI thread
        let mut grid = GridRenderable::new(5.0, 1.0);
        match grid.initialize(renderer) {
            Ok(()) => self.viewport.set_render_target(Some(Box::new(grid))),
            Err(err) => error!("Grid initialization failed: {}", err),
        }

        if let Some(path) = self.initial_file.take() {
            self.request_selection(renderer, &path);
        }
    }

    fn handle_event(
        &mut self,
        window: &Window,
        renderer: &Arc<Renderer>,
        routines: &Arc<DefaultRoutines>,
        base_rendergraph: &BaseRenderGraph,
        surface: Option<&Arc<Surface>>,
        resolution: UVec2,
        event: Event<'_, ()>,
        control_flow: impl FnOnce(ControlFlow),
    ) {
        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                self.viewport.begin_shutdown();
                control_flow(ControlFlow::Exit);
            }
            // the event loop's idle phase doubles as the cooperative render tick
            Event::MainEventsCleared => {
                self.drain_outcomes();
                self.refresh_title(window);
                match self.viewport.tick() {
                    TickResult::Render => window.request_redraw(),
                    TickResult::Idle | TickResult::Stop => {}
                }
            }
            Event::RedrawRequested(_) => {
                self.viewport.prepare_frame(renderer, resolution);

                // Get a frame
                let frame = surface.unwrap().get_current_texture().unwrap();

                // Swap the instruction buffers so that our frame's changes can be processed.
                renderer.swap_instruction_buffers();
                // Evaluate our frame's world-change instructions
                let mut eval_output = renderer.evaluate_instructions();

                // Lock the routines
                let pbr_routine = rend3_framework::lock(&routines.pbr);
                let tonemapping_routine = rend3_framework::lock(&routines.tonemapping);

                // Build a rendergraph
                let mut graph = rend3::graph::RenderGraph::new();

                // Import the surface texture into the render graph.
                let frame_handle = graph.add_imported_render_target(
                    &frame,
                    0..1,
                    rend3::graph::ViewportRect::from_size(resolution),
                );
                // Add the default rendergraph without a skybox
                base_rendergraph.add_to_graph(
                    &mut graph,
                    &eval_output,
                    &pbr_routine,
                    None,
                    &tonemapping_routine,
                    frame_handle,
                    resolution,
                    self.sample_count(),
                    glam::Vec4::ZERO,
                    glam::Vec4::new(0.05, 0.05, 0.08, 1.0), // dark neutral backdrop
                );

                // Dispatch a render using the built up rendergraph!
                graph.execute(renderer, &mut eval_output);

                // Present the frame
                frame.present();
            }
            Event::WindowEvent {
                event: WindowEvent::Resized(_),
                ..
            } => {
                self.viewport.mark_dirty();
            }
            Event::WindowEvent {
                event: WindowEvent::Focused(focus),
                ..
            } => {
                if !focus {
                    Self::apply_cursor_request(window, self.viewport.handle_cursor_left());
                }
            }
            Event::WindowEvent {
                event: WindowEvent::MouseInput { state, button, .. },
                ..
            } => {
                let pressed = state == ElementState::Pressed;
                let request = self.viewport.handle_mouse_button(button, pressed);
                Self::apply_cursor_request(window, request);
            }
            Event::WindowEvent {
                event: WindowEvent::CursorMoved { position, .. },
                ..
            } => {
                let current = Vec2::new(position.x as f32, position.y as f32);
                if let Some(last) = self.last_cursor {
                    self.viewport.handle_cursor_moved(current - last);
                }
                self.last_cursor = Some(current);
            }
            Event::WindowEvent {
                event: WindowEvent::CursorLeft { .. },
                ..
            } => {
                self.last_cursor = None;
                Self::apply_cursor_request(window, self.viewport.handle_cursor_left());
            }
            Event::WindowEvent {
                event: WindowEvent::MouseWheel { delta, .. },
                ..
            } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(physical) => physical.y as f32 / 50.0,
                };
                self.viewport.handle_scroll(amount);
            }
            Event::WindowEvent {
                event:
                    WindowEvent::KeyboardInput {
                        input: KeyboardInput {
                            scancode, state, ..
                        },
                        ..
                    },
                ..
            } => {
                if state == ElementState::Pressed {
                    self.handle_key(scancode);
                }
            }
            // Other events we don't care about
            _ => {}
        }
    }
}
