//! Toy Core
//!
//! Foundational pieces shared by every Toy crate:
//!
//! - [`type_registry`]: compile-time type → stable runtime hash
//! - [`subsystem`]: the singleton subsystem container and its lifecycle
//! - [`math`]: bounding boxes, frusta and rays
//! - [`errors`]: the recoverable error type

pub mod errors;
pub mod math;
pub mod subsystem;
pub mod type_registry;

pub use errors::{Result, ToyError, fatal};
pub use math::{BoundingBox, Frustum, Ray};
pub use subsystem::{ContextState, Subsystem, SubsystemContext, SubsystemSet, SubsystemSlot};
pub use type_registry::{TypeHash, TypeRegistry, type_hash};
