//! Toy Render
//!
//! The GPU layer of the Toy engine, built on wgpu:
//!
//! - [`WgpuContext`]: device, queue and surface
//! - [`EntityIdTarget`]: the `u32`-per-pixel entity-ID render target
//! - [`EntityIdReadback`]: staging readback seam used by picking, with the
//!   wgpu implementation [`WgpuEntityIdReadback`]
//! - [`Renderer`]: draws the scene's visible lists and presents

pub mod bounds_pass;
pub mod context;
pub mod entity_id;
pub mod readback;
pub mod renderer;
pub mod settings;

pub use context::WgpuContext;
pub use entity_id::EntityIdTarget;
pub use readback::{
    EntityIdReadback, ID_BYTES_PER_PIXEL, WgpuEntityIdReadback, padded_bytes_per_row, unpack_rows,
};
pub use renderer::Renderer;
pub use settings::RendererSettings;
