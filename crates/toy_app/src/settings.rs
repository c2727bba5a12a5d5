//! Editor Settings
//!
//! Gizmo snapping and editor-camera tuning, persisted as JSON. Every field is
//! optional in the file; missing fields take their defaults.
//!
//! ```json
//! {
//!   "gizmo": { "operation": "rotate", "rotation_snap_degrees": 45.0 },
//!   "camera": { "move_speed": 10.0 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use toy_core::Result;

/// Active gizmo operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GizmoOperation {
    #[default]
    Translate,
    Rotate,
    Scale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GizmoSettings {
    pub operation: GizmoOperation,
    pub snapping: bool,
    /// Per-axis translation step in world units.
    pub translation_snap: [f32; 3],
    pub rotation_snap_degrees: f32,
    /// Uniform scale step.
    pub scale_snap: f32,
}

impl Default for GizmoSettings {
    fn default() -> Self {
        Self {
            operation: GizmoOperation::Translate,
            snapping: false,
            translation_snap: [0.5; 3],
            rotation_snap_degrees: 15.0,
            scale_snap: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// World units per second.
    pub move_speed: f32,
    /// Radians per pixel of right-drag.
    pub look_sensitivity: f32,
    /// World units per pixel of middle-drag.
    pub pan_sensitivity: f32,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub initial_position: [f32; 3],
    pub initial_target: [f32; 3],
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            look_sensitivity: 0.003,
            pan_sensitivity: 0.01,
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
            initial_position: [0.0, 3.0, 8.0],
            initial_target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub gizmo: GizmoSettings,
    pub camera: CameraSettings,
}

impl EditorSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads settings from `path`, falling back to defaults when the file does
    /// not exist. A file that exists but fails to parse is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No editor settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&text)?;
        log::info!("Loaded editor settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}
