//! Toy Engine
//!
//! Umbrella crate re-exporting the engine layers:
//!
//! - [`toy_core`]: subsystem context, type registry, errors, math
//! - [`toy_scene`]: entity store, components, culling and traversal
//! - [`toy_render`]: wgpu context, entity-ID target and readback
//! - [`toy_app`]: frame loop, picking, editing, docking, window runner
//!
//! Most programs only need the [`prelude`].

pub use toy_app;
pub use toy_core;
pub use toy_render;
pub use toy_scene;

pub use toy_app::{Application, EditingSystem, FrameListeners, PickOutcome, PickingSystem};
pub use toy_core::{Result, SubsystemContext, ToyError};
pub use toy_scene::{Entity, Scene};

#[cfg(feature = "winit")]
pub use toy_app::winit::{App, AppConfig, AppHandler};

pub mod prelude {
    pub use toy_app::{
        Application, ButtonState, Dock, DockContext, DockingSystem, EditingSystem,
        EditorSettings, FrameListeners, FrameState, GizmoOperation, Input, Key, MouseButton,
        PendingEvent, PickOutcome, PickingSystem, TaskSystem, Viewport,
    };
    pub use toy_core::{
        BoundingBox, Frustum, Ray, Result, Subsystem, SubsystemContext, SubsystemSlot, ToyError,
    };
    pub use toy_render::{EntityIdReadback, RendererSettings};
    pub use toy_scene::{
        Camera, CameraKind, Entity, MeshFlags, Model, PointLight, Scene, StaticMesh, SubMesh, Tag,
        Transform,
    };

    #[cfg(feature = "winit")]
    pub use toy_app::winit::{App, AppConfig, AppHandler, Window};
}
