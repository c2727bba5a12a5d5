//! Built-in components.
//!
//! - [`Tag`]: display name + stable uuid
//! - [`Transform`]: position / rotation / scale (matrices are derived)
//! - [`Camera`]: polymorphic projection + role tag
//! - [`StaticMesh`]: model reference + per-submesh visibility
//! - [`PointLight`]: light source feeding the illuminant list

pub mod camera;
pub mod light;
pub mod static_mesh;
pub mod tag;
pub mod transform;

pub use camera::{Camera, CameraKind, OrthographicProjection, PerspectiveProjection, Projection};
pub use light::PointLight;
pub use static_mesh::{MeshFlags, StaticMesh};
pub use tag::Tag;
pub use transform::Transform;

/// Marker for types that can be attached to an entity.
///
/// At most one instance of each component type exists per entity.
pub trait Component: 'static {}

impl Component for Tag {}
impl Component for Transform {}
impl Component for Camera {}
impl Component for StaticMesh {}
impl Component for PointLight {}
