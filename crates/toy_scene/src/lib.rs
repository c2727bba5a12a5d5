//! Toy Scene
//!
//! The entity-component store of the Toy engine.
//!
//! - [`Entity`]: versioned handle, bound to the [`Scene`] that issued it
//! - [`components`]: built-in components
//! - [`Scene`]: storage, skybox slot, frustum culling and render traversal
//! - [`Effect`]: the rendering capability the traversal calls into

pub mod components;
pub mod effect;
pub mod entity;
pub mod model;
pub mod scene;

mod storage;

pub use components::{
    Camera, CameraKind, Component, MeshFlags, OrthographicProjection, PerspectiveProjection,
    PointLight, Projection, StaticMesh, Tag, Transform,
};
pub use effect::{DrawItem, Effect};
pub use entity::{
    BACKGROUND_ID, Entity, EntityKey, FIRST_ENTITY_ID, SENTINEL_ID, SceneId, is_reserved_id,
};
pub use model::{Model, SubMesh};
pub use scene::Scene;
