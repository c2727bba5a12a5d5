//! Winit-based Application Runner
//!
//! Glue between a [winit](https://crates.io/crates/winit) event loop, the wgpu
//! [`Renderer`] and the [`Application`] frame loop.
//!
//! - [`App`]: builder for configuring and launching the editor shell
//! - [`AppHandler`]: trait users implement to build their scene and docks
//! - `AppRunner`: internal `ApplicationHandler`
//!
//! Per redraw the runner ticks the application, lets the handler update,
//! renders the scene and resets transient input. Window resizes and dropped
//! files are queued in the [`TaskSystem`](crate::task::TaskSystem) for the
//! next tick. Any error from the tick or the renderer ends the session.
//!
//! # Example
//!
//! ```rust,ignore
//! use toy_app::winit::{App, AppHandler};
//!
//! struct Editor;
//!
//! impl AppHandler for Editor {
//!     fn init(app: &mut Application, _window: &Arc<Window>) -> Self {
//!         app.scene_mut().add_static_mesh("Cube", Arc::new(Model::cube("cube", 0.5)), Transform::IDENTITY);
//!         Editor
//!     }
//! }
//!
//! fn main() -> toy_core::Result<()> {
//!     App::new().with_title("Editor").run::<Editor>()
//! }
//! ```

use std::sync::Arc;
use std::time::Instant;

use toy_core::{Result, ToyError};
use toy_render::{Renderer, RendererSettings};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
pub use winit::window::{Window, WindowId};

use crate::application::{Application, FrameListeners, FrameState};
use crate::input::Input;
use crate::picking::{PickOutcome, Viewport};
use crate::settings::EditorSettings;
use crate::task::PendingEvent;

pub mod input_adapter;

/// Window and engine configuration for [`App`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub renderer: RendererSettings,
    pub editor: EditorSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Toy Engine".into(),
            width: 1280,
            height: 720,
            renderer: RendererSettings::default(),
            editor: EditorSettings::default(),
        }
    }
}

/// Application behavior plugged into the runner.
///
/// # Lifecycle
///
/// 1. [`frame_listeners`](Self::frame_listeners) - before the application exists
/// 2. [`init`](Self::init) - once the window and renderer are up
/// 3. [`on_event`](Self::on_event) - for each window event
/// 4. [`update`](Self::update) - each frame, after the application tick
pub trait AppHandler: Sized + 'static {
    /// Listeners installed into the frame loop at construction.
    fn frame_listeners() -> FrameListeners {
        FrameListeners::default()
    }

    fn init(app: &mut Application, window: &Arc<Window>) -> Self;

    /// Return `true` to consume the event and skip default handling.
    #[allow(unused_variables)]
    fn on_event(&mut self, app: &mut Application, window: &Arc<Window>, event: &WindowEvent) -> bool {
        false
    }

    #[allow(unused_variables)]
    fn update(&mut self, app: &mut Application, window: &Arc<Window>, frame: &FrameState) {}
}

/// Handler that leaves the scene empty apart from the editor camera.
pub struct DefaultHandler;

impl AppHandler for DefaultHandler {
    fn init(_app: &mut Application, _window: &Arc<Window>) -> Self {
        Self
    }
}

pub struct App {
    config: AppConfig,
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: RendererSettings) -> Self {
        self.config.renderer = settings;
        self
    }

    #[must_use]
    pub fn with_editor_settings(mut self, settings: EditorSettings) -> Self {
        self.config.editor = settings;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Blocks until the window closes or a frame fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the event loop cannot be created, or the first
    /// error that ended the session.
    pub fn run<H: AppHandler>(self) -> Result<()> {
        let event_loop = EventLoop::new().map_err(|e| ToyError::WindowError(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut runner = AppRunner::<H>::new(self.config);
        event_loop
            .run_app(&mut runner)
            .map_err(|e| ToyError::WindowError(e.to_string()))?;

        match runner.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

struct AppRunner<H: AppHandler> {
    config: AppConfig,

    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    app: Option<Application>,
    user_state: Option<H>,
    input: Input,

    start_time: Instant,
    last_loop_time: Instant,
    failure: Option<ToyError>,
}

impl<H: AppHandler> AppRunner<H> {
    fn new(config: AppConfig) -> Self {
        let now = Instant::now();
        Self {
            config,
            window: None,
            renderer: None,
            app: None,
            user_state: None,
            input: Input::new(),
            start_time: now,
            last_loop_time: now,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: ToyError) {
        log::error!("Fatal frame error: {err}");
        self.failure.get_or_insert(err);
        event_loop.exit();
    }

    fn init_engine(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.width,
                self.config.height,
            ));

        let window = event_loop
            .create_window(attributes)
            .map_err(|e| ToyError::WindowError(e.to_string()))?;
        let window = Arc::new(window);
        self.window = Some(Arc::clone(&window));

        log::info!("Initializing Renderer Backend...");
        let size = window.inner_size();
        let renderer = pollster::block_on(Renderer::new(
            Arc::clone(&window),
            &self.config.renderer,
            size.width,
            size.height,
        ))?;

        let mut app = Application::new(self.config.editor.clone(), H::frame_listeners());
        app.set_viewport(Viewport::full(size.width, size.height));
        self.input.inject_resize(size.width, size.height);

        self.user_state = Some(H::init(&mut app, &window));
        self.renderer = Some(renderer);
        self.app = Some(app);

        let now = Instant::now();
        self.start_time = now;
        self.last_loop_time = now;
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let now = Instant::now();
        let time = now.duration_since(self.start_time).as_secs_f32();
        let dt = now.duration_since(self.last_loop_time).as_secs_f32();
        self.last_loop_time = now;

        let (Some(window), Some(renderer), Some(app), Some(user_state)) = (
            &self.window,
            &mut self.renderer,
            &mut self.app,
            &mut self.user_state,
        ) else {
            return Ok(());
        };

        let frame = FrameState {
            time,
            dt,
            frame_count: app.frame_count(),
        };

        if let PickOutcome::Select(entity) = app.tick(&self.input, dt, renderer.readback_mut())? {
            log::trace!("Picked {entity:?}");
        }
        user_state.update(app, window, &frame);
        renderer.render(app.scene(), app.editor_view_projection())?;

        self.input.start_frame();
        window.request_redraw();
        Ok(())
    }
}

impl<H: AppHandler> ApplicationHandler for AppRunner<H> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init_engine(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let (Some(window), Some(app), Some(user_state)) =
            (&self.window, &mut self.app, &mut self.user_state)
        else {
            return;
        };

        if user_state.on_event(app, window, &event) {
            return;
        }

        input_adapter::process_window_event(&mut self.input, &event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size.width, size.height);
                }
                app.set_viewport(Viewport::full(size.width, size.height));
                app.tasks_mut().push(PendingEvent::Resize {
                    width: size.width,
                    height: size.height,
                });
            }
            WindowEvent::DroppedFile(path) => {
                app.tasks_mut().push(PendingEvent::FileDrop(vec![path]));
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw() {
                    self.fail(event_loop, err);
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(app) = &mut self.app {
            app.shutdown();
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.app.is_some()
            && let Some(window) = &self.window
        {
            window.request_redraw();
        }
    }
}
