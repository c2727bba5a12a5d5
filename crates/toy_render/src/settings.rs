//! Renderer Settings
//!
//! Consumed once when the [`WgpuContext`](crate::WgpuContext) is created.
//!
//! ```rust,ignore
//! use toy_render::RendererSettings;
//!
//! let settings = RendererSettings {
//!     vsync: false,
//!     ..Default::default()
//! };
//! ```

/// Global configuration for renderer initialization.
///
/// | Field              | Description                          | Default           |
/// |--------------------|--------------------------------------|-------------------|
/// | `vsync`            | Vertical sync enabled                | `true`            |
/// | `backends`         | Forced wgpu backend (or auto)        | `None`            |
/// | `power_preference` | GPU adapter selection strategy       | `HighPerformance` |
/// | `clear_color`      | Preview clear color                  | Dark grey         |
/// | `required_features`| Required wgpu features               | Empty             |
/// | `required_limits`  | Required wgpu limits                 | Default           |
/// | `depth_format`     | Depth buffer format                  | `Depth32Float`    |
/// | `entity_id_format` | Entity-ID target format              | `R32Uint`         |
#[derive(Debug, Clone)]
pub struct RendererSettings {
    /// When `true`, the frame rate is capped to the display refresh rate.
    pub vsync: bool,

    /// `None` lets wgpu choose the best available backend for the platform.
    pub backends: Option<wgpu::Backends>,

    pub power_preference: wgpu::PowerPreference,

    pub clear_color: wgpu::Color,

    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,

    pub depth_format: wgpu::TextureFormat,

    /// Format of the entity-ID target. Must be a single-channel 32-bit
    /// unsigned format; picking reads it back as `u32` per pixel.
    pub entity_id_format: wgpu::TextureFormat,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            vsync: true,
            backends: None,
            power_preference: wgpu::PowerPreference::HighPerformance,
            clear_color: wgpu::Color {
                r: 0.08,
                g: 0.08,
                b: 0.09,
                a: 1.0,
            },
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            depth_format: wgpu::TextureFormat::Depth32Float,
            entity_id_format: wgpu::TextureFormat::R32Uint,
        }
    }
}
