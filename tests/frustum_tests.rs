//! Frustum and Bounds Tests
//!
//! Tests for:
//! - Frustum plane extraction from camera view-projection
//! - Frustum-sphere and frustum-AABB intersection
//! - Bounding box transform and union
//! - Ray-box intersection
//! - Projection variants

use glam::{Affine3A, Quat, Vec2, Vec3};

use toy::toy_core::{BoundingBox, Frustum, Ray};
use toy::toy_scene::{
    Camera, CameraKind, OrthographicProjection, PerspectiveProjection, Projection, Transform,
};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn approx_vec(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

/// Perspective camera at the origin looking down -Z, near 0.1, far 100.
fn origin_frustum() -> Frustum {
    let camera = Camera::perspective(CameraKind::Scene, 90.0, 1.0, 0.1, 100.0);
    camera.frustum(&Transform::IDENTITY)
}

// ============================================================================
// Frustum-Sphere
// ============================================================================

#[test]
fn sphere_in_front_is_inside() {
    assert!(origin_frustum().intersects_sphere(Vec3::new(0.0, 0.0, -10.0), 1.0));
}

#[test]
fn sphere_behind_is_outside() {
    assert!(!origin_frustum().intersects_sphere(Vec3::new(0.0, 0.0, 10.0), 1.0));
}

#[test]
fn sphere_beyond_far_is_outside() {
    assert!(!origin_frustum().intersects_sphere(Vec3::new(0.0, 0.0, -200.0), 1.0));
}

#[test]
fn sphere_straddling_side_plane_is_inside() {
    // With a 90 degree fov the right plane passes through x = 10 at z = -10.
    assert!(origin_frustum().intersects_sphere(Vec3::new(10.5, 0.0, -10.0), 1.0));
    assert!(!origin_frustum().intersects_sphere(Vec3::new(13.0, 0.0, -10.0), 1.0));
}

// ============================================================================
// Frustum-AABB
// ============================================================================

#[test]
fn box_in_front_is_inside() {
    let bbox = BoundingBox::new(Vec3::new(-1.0, -1.0, -6.0), Vec3::new(1.0, 1.0, -4.0));
    assert!(origin_frustum().intersects_aabb(&bbox));
}

#[test]
fn box_behind_is_outside() {
    let bbox = BoundingBox::new(Vec3::new(-1.0, -1.0, 4.0), Vec3::new(1.0, 1.0, 6.0));
    assert!(!origin_frustum().intersects_aabb(&bbox));
}

#[test]
fn box_enclosing_camera_is_inside() {
    let bbox = BoundingBox::from_half_extents(Vec3::splat(500.0));
    assert!(origin_frustum().intersects_aabb(&bbox));
}

#[test]
fn moved_camera_sees_moved_box() {
    let camera = Camera::perspective(CameraKind::Scene, 60.0, 1.0, 0.1, 100.0);
    let mut transform = Transform::from_position(Vec3::new(50.0, 0.0, 0.0));
    transform.look_at(Vec3::new(50.0, 0.0, -10.0), Vec3::Y);
    let frustum = camera.frustum(&transform);

    let there = BoundingBox::new(Vec3::new(49.0, -1.0, -11.0), Vec3::new(51.0, 1.0, -9.0));
    let origin = BoundingBox::new(Vec3::new(-1.0, -1.0, -11.0), Vec3::new(1.0, 1.0, -9.0));
    assert!(frustum.intersects_aabb(&there));
    assert!(!frustum.intersects_aabb(&origin));
}

// ============================================================================
// Bounding boxes
// ============================================================================

#[test]
fn union_covers_both_boxes() {
    let a = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
    let b = BoundingBox::new(Vec3::splat(-2.0), Vec3::splat(-1.0));
    let u = a.union(&b);
    assert_eq!(u.min, Vec3::splat(-2.0));
    assert_eq!(u.max, Vec3::ONE);
    assert!(u.contains_point(Vec3::splat(-0.5)));
}

#[test]
fn rotated_box_grows() {
    let bbox = BoundingBox::from_half_extents(Vec3::splat(1.0));
    let rotated = bbox.transform(&Affine3A::from_quat(Quat::from_rotation_y(
        std::f32::consts::FRAC_PI_4,
    )));
    let expected = std::f32::consts::SQRT_2;
    assert!(approx(rotated.max.x, expected), "got {}", rotated.max.x);
    assert!(approx(rotated.max.y, 1.0));
    assert!(approx_vec(rotated.center(), Vec3::ZERO));
}

// ============================================================================
// Rays
// ============================================================================

#[test]
fn ray_reports_entry_distance() {
    let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
    let bbox = BoundingBox::from_half_extents(Vec3::ONE);
    let t = ray.intersect_aabb(&bbox).expect("ray should hit");
    assert!(approx(t, 9.0), "t = {t}");
    assert!(approx_vec(ray.at(t), Vec3::new(0.0, 0.0, 1.0)));
}

#[test]
fn parallel_ray_outside_slab_misses() {
    let ray = Ray::new(Vec3::new(5.0, 0.0, 10.0), Vec3::NEG_Z);
    assert!(ray.intersect_aabb(&BoundingBox::from_half_extents(Vec3::ONE)).is_none());
}

#[test]
fn screen_corner_ray_diverges_from_forward() {
    let camera = Camera::perspective(CameraKind::Editor, 90.0, 1.0, 0.1, 100.0);
    let ray = camera.screen_ray(&Transform::IDENTITY, Vec2::ZERO, Vec2::new(100.0, 100.0));
    // Top-left corner of a 90 degree square frustum.
    let expected = Vec3::new(-1.0, 1.0, -1.0).normalize();
    assert!(approx_vec(ray.direction, expected), "got {}", ray.direction);
}

// ============================================================================
// Projections
// ============================================================================

#[test]
fn perspective_depth_maps_near_to_zero_and_far_to_one() {
    let projection = PerspectiveProjection::new(60.0, 0.5, 50.0);
    let m = projection.projection_matrix(1.0);
    let near = m.project_point3(Vec3::new(0.0, 0.0, -0.5));
    let far = m.project_point3(Vec3::new(0.0, 0.0, -50.0));
    assert!(approx(near.z, 0.0), "near z = {}", near.z);
    assert!(approx(far.z, 1.0), "far z = {}", far.z);
    assert!(approx(projection.near(), 0.5) && approx(projection.far(), 50.0));
}

#[test]
fn orthographic_keeps_parallel_rays() {
    let camera = Camera::new(
        CameraKind::Scene,
        OrthographicProjection {
            height: 10.0,
            near: 0.1,
            far: 100.0,
        },
        1.0,
    );
    let a = camera.screen_ray(&Transform::IDENTITY, Vec2::new(0.0, 0.0), Vec2::splat(100.0));
    let b = camera.screen_ray(&Transform::IDENTITY, Vec2::new(90.0, 40.0), Vec2::splat(100.0));
    assert!(approx_vec(a.direction, b.direction));
    assert!(approx_vec(a.direction, Vec3::NEG_Z));
}
