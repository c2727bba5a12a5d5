//! Error Types
//!
//! This module defines the recoverable error type shared by every Toy crate.
//!
//! # Overview
//!
//! [`ToyError`] covers the failure modes that a caller can reasonably react to:
//! - GPU initialization and readback failures
//! - Window / event loop failures
//! - Settings I/O and parsing
//! - Scene slot conflicts and frame-listener misconfiguration
//!
//! Contract violations (registering a subsystem twice, reading a component that
//! is not attached, ...) are *not* represented here. Those are programmer errors
//! and abort the frame loop with a logged panic.
//!
//! # Usage
//!
//! ```rust,ignore
//! use toy_core::errors::{Result, ToyError};
//!
//! fn load() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the Toy engine.
#[derive(Error, Debug)]
pub enum ToyError {
    // ========================================================================
    // GPU & Rendering Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(String),

    /// Surface creation or configuration failed.
    #[error("Surface error: {0}")]
    SurfaceError(String),

    /// Mapping the staging buffer (or waiting on the device) failed.
    #[error("GPU readback failed: {0}")]
    ReadbackFailed(String),

    // ========================================================================
    // Window Errors
    // ========================================================================
    /// Window creation or event loop error.
    #[error("Window system error: {0}")]
    WindowError(String),

    // ========================================================================
    // Scene Errors
    // ========================================================================
    /// A skybox entity already occupies the scene's skybox slot.
    #[error("Skybox slot already occupied by entity '{existing}'")]
    SkyboxOccupied {
        /// Name of the entity currently holding the slot
        existing: String,
    },

    // ========================================================================
    // Application Errors
    // ========================================================================
    /// A frame listener slot was assigned twice.
    #[error("Frame listener '{0}' is already registered")]
    ListenerAlreadySet(&'static str),

    // ========================================================================
    // I/O & Format Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Alias for `Result<T, ToyError>`.
pub type Result<T> = std::result::Result<T, ToyError>;

/// Logs `message` at error level, then panics with it.
///
/// Used for contract violations: registering a subsystem twice, looking one
/// up before initialization, reading a component that is not attached.
#[cold]
#[track_caller]
pub fn fatal(message: &str) -> ! {
    log::error!("{message}");
    panic!("{message}");
}
