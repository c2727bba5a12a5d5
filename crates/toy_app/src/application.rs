//! Application Frame Loop
//!
//! [`Application`] owns the [`SubsystemContext`] and the [`Scene`] and drives
//! one frame per [`Application::tick`], always in this order:
//!
//! 1. drain the [`TaskSystem`] (resize / file-drop dispatch), then clear it
//! 2. editor camera: aspect sync and fly controller
//! 3. frustum culling against the editor camera
//! 4. picking (may block on a GPU readback)
//! 5. dock ticks, `on_frame_update`, `on_frame_render`
//!
//! Rendering itself stays with the window layer, which owns the GPU.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut listeners = FrameListeners::default();
//! listeners.set_on_frame_update(|scene, frame| { /* ... */ })?;
//!
//! let mut app = Application::new(EditorSettings::default(), listeners);
//! app.set_viewport(Viewport::full(1280, 720));
//! let outcome = app.tick(&input, dt, renderer.readback_mut())?;
//! ```

use std::path::PathBuf;

use glam::{Mat4, Vec2};
use toy_core::{Result, SubsystemContext, ToyError};
use toy_render::EntityIdReadback;
use toy_scene::{Camera, Scene, Transform};

use crate::docking::{DockContext, DockingSystem};
use crate::editing::EditingSystem;
use crate::input::Input;
use crate::picking::{PickOutcome, PickingSystem, Viewport};
use crate::settings::EditorSettings;
use crate::task::{PendingEvent, TaskSystem};

/// Per-frame timing information.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameState {
    /// Total elapsed time since the application started (in seconds).
    pub time: f32,
    /// Delta time since the last frame (in seconds).
    pub dt: f32,
    /// Number of frames ticked before this one.
    pub frame_count: u64,
}

pub type FrameUpdateListener = Box<dyn FnMut(&mut Scene, &FrameState)>;
pub type FrameRenderListener = Box<dyn FnMut(&Scene, &FrameState)>;
pub type FileDropListener = Box<dyn FnMut(&[PathBuf])>;

/// Frame-phase hooks handed to [`Application::new`]. Each slot accepts one
/// listener; a second assignment is rejected.
#[derive(Default)]
pub struct FrameListeners {
    on_frame_update: Option<FrameUpdateListener>,
    on_frame_render: Option<FrameRenderListener>,
    on_file_drop: Option<FileDropListener>,
}

fn assign_once<T>(slot: &mut Option<T>, value: T, name: &'static str) -> Result<()> {
    if slot.is_some() {
        log::warn!("Frame listener '{name}' is already set");
        return Err(ToyError::ListenerAlreadySet(name));
    }
    *slot = Some(value);
    Ok(())
}

impl FrameListeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_on_frame_update(
        &mut self,
        listener: impl FnMut(&mut Scene, &FrameState) + 'static,
    ) -> Result<()> {
        assign_once(&mut self.on_frame_update, Box::new(listener), "on_frame_update")
    }

    pub fn set_on_frame_render(
        &mut self,
        listener: impl FnMut(&Scene, &FrameState) + 'static,
    ) -> Result<()> {
        assign_once(&mut self.on_frame_render, Box::new(listener), "on_frame_render")
    }

    pub fn set_on_file_drop(&mut self, listener: impl FnMut(&[PathBuf]) + 'static) -> Result<()> {
        assign_once(&mut self.on_file_drop, Box::new(listener), "on_file_drop")
    }
}

impl std::fmt::Debug for FrameListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameListeners")
            .field("on_frame_update", &self.on_frame_update.is_some())
            .field("on_frame_render", &self.on_frame_render.is_some())
            .field("on_file_drop", &self.on_file_drop.is_some())
            .finish()
    }
}

pub struct Application {
    context: SubsystemContext,
    scene: Scene,
    listeners: FrameListeners,
    viewport: Viewport,
    time: f32,
    frame_count: u64,
}

impl Application {
    /// Initializes the context and registers the task, picking, editing and
    /// docking subsystems. The editor camera is created in the new scene.
    #[must_use]
    pub fn new(settings: EditorSettings, listeners: FrameListeners) -> Self {
        let mut context = SubsystemContext::new();
        context.initialize();

        let mut scene = Scene::new();

        context.add(TaskSystem::new());
        context.add(PickingSystem::new());
        context.add(EditingSystem::new(&mut scene, &settings));
        context.add(DockingSystem::new());

        log::info!("Application ready: {:?}", context.creation_order());

        Self {
            context,
            scene,
            listeners,
            viewport: Viewport::full(1280, 720),
            time: 0.0,
            frame_count: 0,
        }
    }

    /// Runs one frame. `readback` gives picking access to the entity-ID
    /// target rendered by the previous frame.
    pub fn tick(
        &mut self,
        input: &Input,
        dt: f32,
        readback: &mut dyn EntityIdReadback,
    ) -> Result<PickOutcome> {
        self.time += dt;
        let frame = FrameState {
            time: self.time,
            dt,
            frame_count: self.frame_count,
        };

        self.drain_tasks();

        let editing = self.context.get_mut::<EditingSystem>();
        let camera_entity = editing.editor_camera();
        if let Some(camera) = self.scene.try_component_mut::<Camera>(camera_entity) {
            camera.set_aspect(self.viewport.size.x, self.viewport.size.y);
        }
        editing.update_camera(&mut self.scene, input, dt);

        if let Some(frustum) = editing.camera_frustum(&self.scene) {
            self.scene.frustum_culling(&frustum);
        }

        let (picking, editing) = self.context.get2_mut::<PickingSystem, EditingSystem>();
        let outcome = picking.update(input, &self.viewport, readback, &self.scene, editing)?;

        let (docking, editing) = self.context.get2_mut::<DockingSystem, EditingSystem>();
        docking.tick(&mut DockContext {
            scene: &mut self.scene,
            editing,
            frame: &frame,
        });

        if let Some(on_update) = self.listeners.on_frame_update.as_mut() {
            on_update(&mut self.scene, &frame);
        }
        if let Some(on_render) = self.listeners.on_frame_render.as_mut() {
            on_render(&self.scene, &frame);
        }

        self.frame_count += 1;
        Ok(outcome)
    }

    fn drain_tasks(&mut self) {
        let (tasks, docking) = self.context.get2_mut::<TaskSystem, DockingSystem>();
        for event in tasks.get_pending_events() {
            match event {
                PendingEvent::Resize { width, height } => {
                    log::debug!("Resize to {width}x{height}");
                    docking.dispatch_resize(*width, *height);
                }
                PendingEvent::FileDrop(paths) => {
                    log::info!("Dropped {} file(s)", paths.len());
                    docking.dispatch_file_drop(paths);
                    if let Some(on_drop) = self.listeners.on_file_drop.as_mut() {
                        on_drop(paths.as_slice());
                    }
                }
                PendingEvent::None => {}
            }
        }
        tasks.clear();
    }

    /// View-projection of the editor camera, identity if it lost its camera.
    #[must_use]
    pub fn editor_view_projection(&self) -> Mat4 {
        let entity = self.context.get::<EditingSystem>().editor_camera();
        match (
            self.scene.try_component::<Camera>(entity),
            self.scene.try_component::<Transform>(entity),
        ) {
            (Some(camera), Some(transform)) => camera.view_projection(transform),
            _ => Mat4::IDENTITY,
        }
    }

    #[inline]
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[inline]
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> &SubsystemContext {
        &self.context
    }

    #[inline]
    pub fn context_mut(&mut self) -> &mut SubsystemContext {
        &mut self.context
    }

    #[inline]
    pub fn tasks_mut(&mut self) -> &mut TaskSystem {
        self.context.get_mut::<TaskSystem>()
    }

    #[inline]
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Zero-sized viewports are ignored (minimized windows).
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport.size.cmple(Vec2::ZERO).any() {
            return;
        }
        self.viewport = viewport;
    }

    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Disposes the context. Further subsystem access is fatal.
    pub fn shutdown(&mut self) {
        self.context.dispose();
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("scene", &self.scene)
            .field("viewport", &self.viewport)
            .field("frame_count", &self.frame_count)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}
