use glam::Vec3;

/// Omnidirectional light. `range` is the radius used for frustum tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: Vec3,
    pub intensity: f32,
    pub range: f32,
}

impl PointLight {
    #[must_use]
    pub fn new(color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            color,
            intensity,
            range,
        }
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self::new(Vec3::ONE, 1.0, 10.0)
    }
}
