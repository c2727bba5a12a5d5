//! Toy App
//!
//! Frame loop and editor subsystems of the Toy engine:
//!
//! - [`input`]: platform-agnostic keyboard and mouse state
//! - [`task`]: per-frame engine event queue
//! - [`picking`]: GPU-readback entity picking
//! - [`editing`]: selection, gizmo and editor camera
//! - [`docking`]: editor panels as hook sets
//! - [`application`]: the per-frame driver tying them together
//! - `winit` (feature `winit`): window runner

pub mod application;
pub mod docking;
pub mod editing;
pub mod input;
pub mod picking;
pub mod settings;
pub mod task;

#[cfg(feature = "winit")]
pub mod winit;

pub use application::{Application, FrameListeners, FrameState};
pub use docking::{Dock, DockContext, DockingSystem};
pub use editing::EditingSystem;
pub use input::{ButtonState, Input, Key, MouseButton};
pub use picking::{PickOutcome, PickingSystem, StagingState, Viewport};
pub use settings::{CameraSettings, EditorSettings, GizmoOperation, GizmoSettings};
pub use task::{PendingEvent, TaskSystem};
