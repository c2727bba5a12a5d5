//! Docking System
//!
//! Editor panels as capability sets. A [`Dock`] carries only the hooks it
//! needs (`on_tick`, `on_file_drop`, `on_resize`); the docking system calls
//! whichever are present, in registration order.

use std::borrow::Cow;
use std::path::PathBuf;

use smallvec::SmallVec;
use toy_core::{Subsystem, SubsystemSlot};
use toy_scene::Scene;

use crate::application::FrameState;
use crate::editing::EditingSystem;

/// What a dock sees during its per-frame tick.
pub struct DockContext<'a> {
    pub scene: &'a mut Scene,
    pub editing: &'a mut EditingSystem,
    pub frame: &'a FrameState,
}

pub type TickHook = Box<dyn FnMut(&mut DockContext<'_>)>;
pub type FileDropHook = Box<dyn FnMut(&[PathBuf])>;
pub type ResizeHook = Box<dyn FnMut(u32, u32)>;

pub struct Dock {
    name: Cow<'static, str>,
    on_tick: Option<TickHook>,
    on_file_drop: Option<FileDropHook>,
    on_resize: Option<ResizeHook>,
}

impl Dock {
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            on_tick: None,
            on_file_drop: None,
            on_resize: None,
        }
    }

    #[must_use]
    pub fn on_tick(mut self, hook: impl FnMut(&mut DockContext<'_>) + 'static) -> Self {
        self.on_tick = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn on_file_drop(mut self, hook: impl FnMut(&[PathBuf]) + 'static) -> Self {
        self.on_file_drop = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn on_resize(mut self, hook: impl FnMut(u32, u32) + 'static) -> Self {
        self.on_resize = Some(Box::new(hook));
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Dock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dock")
            .field("name", &self.name)
            .field("on_tick", &self.on_tick.is_some())
            .field("on_file_drop", &self.on_file_drop.is_some())
            .field("on_resize", &self.on_resize.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct DockingSystem {
    docks: SmallVec<[Dock; 8]>,
}

impl Subsystem for DockingSystem {
    const SLOT: SubsystemSlot = SubsystemSlot::Docking;
}

impl DockingSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dock(&mut self, dock: Dock) {
        log::debug!("Registered dock '{}'", dock.name);
        self.docks.push(dock);
    }

    pub fn tick(&mut self, ctx: &mut DockContext<'_>) {
        for hook in self.docks.iter_mut().filter_map(|d| d.on_tick.as_mut()) {
            hook(ctx);
        }
    }

    pub fn dispatch_file_drop(&mut self, paths: &[PathBuf]) {
        for hook in self.docks.iter_mut().filter_map(|d| d.on_file_drop.as_mut()) {
            hook(paths);
        }
    }

    pub fn dispatch_resize(&mut self, width: u32, height: u32) {
        for hook in self.docks.iter_mut().filter_map(|d| d.on_resize.as_mut()) {
            hook(width, height);
        }
    }

    pub fn dock_names(&self) -> impl Iterator<Item = &str> {
        self.docks.iter().map(Dock::name)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.docks.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docks.is_empty()
    }
}
