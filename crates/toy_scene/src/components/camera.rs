use std::fmt::Debug;

use glam::{Mat4, Vec2, Vec3, Vec4};
use toy_core::{Frustum, Ray};

use super::transform::Transform;

/// Projection capability of a [`Camera`].
///
/// Implementations produce a `[0, 1]` depth range right-handed projection,
/// which is what wgpu expects.
pub trait Projection: Debug + Send + Sync {
    fn projection_matrix(&self, aspect: f32) -> Mat4;
    fn near(&self) -> f32;
    fn far(&self) -> f32;
    fn clone_box(&self) -> Box<dyn Projection>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveProjection {
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveProjection {
    /// `fov_y` in degrees.
    #[must_use]
    pub fn new(fov_y: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y_radians: fov_y.to_radians(),
            near,
            far,
        }
    }
}

impl Default for PerspectiveProjection {
    fn default() -> Self {
        Self::new(45.0, 0.1, 1000.0)
    }
}

impl Projection for PerspectiveProjection {
    fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, aspect, self.near, self.far)
    }

    fn near(&self) -> f32 {
        self.near
    }

    fn far(&self) -> f32 {
        self.far
    }

    fn clone_box(&self) -> Box<dyn Projection> {
        Box::new(*self)
    }
}

/// Orthographic projection; `height` is the full vertical extent of the view
/// volume, the width follows from the aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthographicProjection {
    pub height: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection for OrthographicProjection {
    fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let h = self.height * 0.5;
        let w = h * aspect;
        Mat4::orthographic_rh(-w, w, -h, h, self.near, self.far)
    }

    fn near(&self) -> f32 {
        self.near
    }

    fn far(&self) -> f32 {
        self.far
    }

    fn clone_box(&self) -> Box<dyn Projection> {
        Box::new(*self)
    }
}

/// Role of a camera entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraKind {
    /// The editor's free-flying camera. Writes the sentinel ID.
    Editor,
    #[default]
    Scene,
}

/// Camera component: a polymorphic projection plus a role tag.
///
/// The view matrix is derived from the owning entity's [`Transform`] on
/// demand; the component itself caches nothing.
#[derive(Debug)]
pub struct Camera {
    pub kind: CameraKind,
    pub projection: Box<dyn Projection>,
    pub aspect: f32,
}

impl Clone for Camera {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            projection: self.projection.clone_box(),
            aspect: self.aspect,
        }
    }
}

impl Camera {
    #[must_use]
    pub fn new(kind: CameraKind, projection: impl Projection + 'static, aspect: f32) -> Self {
        Self {
            kind,
            projection: Box::new(projection),
            aspect,
        }
    }

    /// Perspective camera, `fov_y` in degrees.
    #[must_use]
    pub fn perspective(kind: CameraKind, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::new(kind, PerspectiveProjection::new(fov_y, near, far), aspect)
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.aspect = width / height;
        }
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.projection_matrix(self.aspect)
    }

    /// View matrix = inverse of the world transform.
    #[inline]
    #[must_use]
    pub fn view_matrix(&self, transform: &Transform) -> Mat4 {
        transform.matrix_as_mat4().inverse()
    }

    #[inline]
    #[must_use]
    pub fn view_projection(&self, transform: &Transform) -> Mat4 {
        self.projection_matrix() * self.view_matrix(transform)
    }

    #[must_use]
    pub fn frustum(&self, transform: &Transform) -> Frustum {
        Frustum::from_matrix(self.view_projection(transform))
    }

    /// World-space ray through `screen` (pixels, origin top-left) of a
    /// viewport of `viewport` pixels.
    #[must_use]
    pub fn screen_ray(&self, transform: &Transform, screen: Vec2, viewport: Vec2) -> Ray {
        let ndc_x = 2.0 * screen.x / viewport.x - 1.0;
        let ndc_y = 1.0 - 2.0 * screen.y / viewport.y;

        let inv = self.view_projection(transform).inverse();
        let unproject = |z: f32| -> Vec3 {
            let p: Vec4 = inv * Vec4::new(ndc_x, ndc_y, z, 1.0);
            p.truncate() / p.w
        };

        let near = unproject(0.0);
        let far = unproject(1.0);
        Ray::new(near, far - near)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_ray_follows_forward_axis() {
        let camera = Camera::perspective(CameraKind::Scene, 60.0, 1.0, 0.1, 100.0);
        let transform = Transform::from_position(Vec3::new(0.0, 0.0, 5.0));
        let ray = camera.screen_ray(&transform, Vec2::new(50.0, 50.0), Vec2::new(100.0, 100.0));

        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
        assert!((ray.origin.z - 4.9).abs() < 1e-3);
    }

    #[test]
    fn clone_keeps_projection() {
        let camera = Camera::new(
            CameraKind::Editor,
            OrthographicProjection {
                height: 10.0,
                near: 0.5,
                far: 50.0,
            },
            2.0,
        );
        let copy = camera.clone();
        assert_eq!(copy.kind, CameraKind::Editor);
        assert_eq!(copy.projection.near(), 0.5);
        assert_eq!(copy.projection_matrix(), camera.projection_matrix());
    }
}
