//! Editing System
//!
//! Editor state: the current selection, the permanent editor camera, gizmo
//! configuration, and the fly-camera controller.
//!
//! Construct exactly once per scene. Each construction creates a new editor
//! camera entity and nothing reconciles duplicates.

use glam::{EulerRot, Quat, Vec2, Vec3};
use toy_core::{Frustum, Subsystem, SubsystemSlot};
use toy_scene::{Camera, CameraKind, Entity, Scene, Transform};

use crate::input::{Input, Key, MouseButton};
use crate::settings::{CameraSettings, EditorSettings, GizmoOperation, GizmoSettings};

const MAX_PITCH: f32 = 89.0 * std::f32::consts::PI / 180.0;
const MIN_SCALE: f32 = 1e-3;

#[inline]
fn snap(value: f32, step: f32) -> f32 {
    if step > 0.0 {
        (value / step).round() * step
    } else {
        value
    }
}

pub struct EditingSystem {
    selected: Entity,
    editor_camera: Entity,
    gizmo: GizmoSettings,
    camera: CameraSettings,
    manipulating: bool,
    yaw: f32,
    pitch: f32,
}

impl Subsystem for EditingSystem {
    const SLOT: SubsystemSlot = SubsystemSlot::Editing;
}

impl EditingSystem {
    /// Creates the editor camera entity in `scene`, looking from the
    /// configured initial position at the initial target.
    pub fn new(scene: &mut Scene, settings: &EditorSettings) -> Self {
        let cam = &settings.camera;
        let position = Vec3::from_array(cam.initial_position);
        let target = Vec3::from_array(cam.initial_target);

        let editor_camera = scene.create_entity("Editor Camera");
        let mut transform = Transform::from_position(position);
        transform.look_at(target, Vec3::Y);
        *scene.get_component_mut::<Transform>(editor_camera) = transform;
        scene.add_component(
            editor_camera,
            Camera::perspective(CameraKind::Editor, cam.fov_y_degrees, 16.0 / 9.0, cam.near, cam.far),
        );

        let forward = transform.forward();
        let yaw = (-forward.x).atan2(-forward.z);
        let pitch = forward.y.clamp(-1.0, 1.0).asin();

        log::info!("Editor camera {editor_camera:?} created at {position}");

        Self {
            selected: Entity::INVALID,
            editor_camera,
            gizmo: settings.gizmo.clone(),
            camera: cam.clone(),
            manipulating: false,
            yaw,
            pitch,
        }
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Selects the entity with numeric identifier `id`. Reserved and
    /// unresolvable identifiers clear the selection.
    pub fn select(&mut self, scene: &Scene, id: u32) -> Option<Entity> {
        let entity = scene.get_entity(id);
        self.selected = entity.unwrap_or(Entity::INVALID);
        log::debug!("Selected {:?}", self.selected);
        entity
    }

    pub fn select_entity(&mut self, entity: Entity) {
        self.selected = entity;
    }

    pub fn unselect(&mut self) {
        self.selected = Entity::INVALID;
    }

    /// The selection, or [`Entity::INVALID`].
    #[inline]
    #[must_use]
    pub fn get_selected_entity(&self) -> Entity {
        self.selected
    }

    #[inline]
    #[must_use]
    pub fn editor_camera(&self) -> Entity {
        self.editor_camera
    }

    /// Frustum of the editor camera, `None` if its components are gone.
    #[must_use]
    pub fn camera_frustum(&self, scene: &Scene) -> Option<Frustum> {
        let camera = scene.try_component::<Camera>(self.editor_camera)?;
        let transform = scene.try_component::<Transform>(self.editor_camera)?;
        Some(camera.frustum(transform))
    }

    // ========================================================================
    // Gizmo
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn gizmo(&self) -> &GizmoSettings {
        &self.gizmo
    }

    pub fn gizmo_mut(&mut self) -> &mut GizmoSettings {
        &mut self.gizmo
    }

    pub fn set_gizmo_operation(&mut self, operation: GizmoOperation) {
        self.gizmo.operation = operation;
    }

    #[inline]
    #[must_use]
    pub fn gizmo_operation(&self) -> GizmoOperation {
        self.gizmo.operation
    }

    pub fn set_snapping(&mut self, enabled: bool) {
        self.gizmo.snapping = enabled;
    }

    /// Set while a gizmo drag is in progress; picking is suspended meanwhile.
    pub fn set_manipulating(&mut self, manipulating: bool) {
        self.manipulating = manipulating;
    }

    #[inline]
    #[must_use]
    pub fn is_manipulating(&self) -> bool {
        self.manipulating
    }

    /// Applies `delta` to the selected entity's transform according to the
    /// active operation:
    /// - translate: world units per axis
    /// - rotate: degrees per axis (XYZ euler), applied in world space
    /// - scale: added to the current scale, clamped to stay positive
    ///
    /// With snapping on, `delta` is rounded to the operation's step first.
    /// Returns `false` when nothing is selected.
    pub fn manipulate(&mut self, scene: &mut Scene, delta: Vec3) -> bool {
        let Some(transform) = scene.try_component_mut::<Transform>(self.selected) else {
            return false;
        };

        let g = &self.gizmo;
        match g.operation {
            GizmoOperation::Translate => {
                let step = Vec3::from_array(g.translation_snap);
                let d = if g.snapping {
                    Vec3::new(snap(delta.x, step.x), snap(delta.y, step.y), snap(delta.z, step.z))
                } else {
                    delta
                };
                transform.position += d;
            }
            GizmoOperation::Rotate => {
                let d = if g.snapping {
                    delta.map(|v| snap(v, g.rotation_snap_degrees))
                } else {
                    delta
                };
                let q = Quat::from_euler(
                    EulerRot::XYZ,
                    d.x.to_radians(),
                    d.y.to_radians(),
                    d.z.to_radians(),
                );
                transform.rotation = (q * transform.rotation).normalize();
            }
            GizmoOperation::Scale => {
                let d = if g.snapping {
                    delta.map(|v| snap(v, g.scale_snap))
                } else {
                    delta
                };
                transform.scale = (transform.scale + d).max(Vec3::splat(MIN_SCALE));
            }
        }
        true
    }

    // ========================================================================
    // Camera controller
    // ========================================================================

    /// Fly camera: WASD + QE movement (Shift for 3x), right-drag look,
    /// middle-drag pan, scroll dolly. Frozen while manipulating.
    pub fn update_camera(&mut self, scene: &mut Scene, input: &Input, dt: f32) {
        if self.manipulating {
            return;
        }
        let Some(transform) = scene.try_component_mut::<Transform>(self.editor_camera) else {
            return;
        };

        let delta: Vec2 = input.mouse_delta();
        if input.get_mouse_button(MouseButton::Right) && delta != Vec2::ZERO {
            self.yaw -= delta.x * self.camera.look_sensitivity;
            self.pitch = (self.pitch - delta.y * self.camera.look_sensitivity)
                .clamp(-MAX_PITCH, MAX_PITCH);
            transform.rotation = Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0);
        }

        let forward = transform.forward();
        let right = transform.right();
        let up = transform.up();

        if input.get_mouse_button(MouseButton::Middle) && delta != Vec2::ZERO {
            let pan = self.camera.pan_sensitivity;
            transform.position += (-right * delta.x + up * delta.y) * pan;
        }

        let mut dir = Vec3::ZERO;
        if input.get_key(Key::W) {
            dir += forward;
        }
        if input.get_key(Key::S) {
            dir -= forward;
        }
        if input.get_key(Key::D) {
            dir += right;
        }
        if input.get_key(Key::A) {
            dir -= right;
        }
        if input.get_key(Key::E) {
            dir += Vec3::Y;
        }
        if input.get_key(Key::Q) {
            dir -= Vec3::Y;
        }

        let speed = if input.shift() {
            self.camera.move_speed * 3.0
        } else {
            self.camera.move_speed
        };
        transform.position += dir.normalize_or_zero() * speed * dt;

        let scroll = input.scroll_delta().y;
        if scroll != 0.0 {
            transform.position += forward * scroll * self.camera.move_speed * 0.1;
        }
    }
}

impl std::fmt::Debug for EditingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditingSystem")
            .field("selected", &self.selected)
            .field("editor_camera", &self.editor_camera)
            .field("operation", &self.gizmo.operation)
            .field("manipulating", &self.manipulating)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_rounds_to_nearest_step() {
        assert_eq!(snap(0.74, 0.5), 0.5);
        assert_eq!(snap(0.76, 0.5), 1.0);
        assert_eq!(snap(-0.3, 0.5), -0.5);
        assert_eq!(snap(0.3, 0.0), 0.3);
    }

    #[test]
    fn editor_camera_looks_at_target() {
        let mut scene = Scene::new();
        let editing = EditingSystem::new(&mut scene, &EditorSettings::default());
        let transform = scene.get_component::<Transform>(editing.editor_camera());
        let expected = (Vec3::ZERO - Vec3::new(0.0, 3.0, 8.0)).normalize();
        assert!((transform.forward() - expected).length() < 1e-4);
    }

    #[test]
    fn right_drag_keeps_forward_consistent_with_yaw_pitch() {
        let mut scene = Scene::new();
        let mut editing = EditingSystem::new(&mut scene, &EditorSettings::default());
        let before = scene
            .get_component::<Transform>(editing.editor_camera())
            .forward();

        let mut input = Input::new();
        input.inject_mouse_button(MouseButton::Right, crate::input::ButtonState::Pressed);
        input.inject_mouse_position(100.0, 100.0);
        input.inject_mouse_position(100.0, 101.0);
        editing.update_camera(&mut scene, &input, 0.0);

        let after = scene
            .get_component::<Transform>(editing.editor_camera())
            .forward();
        assert!((before - after).length() < 1e-2, "a one pixel drag should not jump the view");
    }

    #[test]
    fn scale_never_reaches_zero() {
        let mut scene = Scene::new();
        let mut editing = EditingSystem::new(&mut scene, &EditorSettings::default());
        let e = scene.create_entity("box");
        editing.select_entity(e);
        editing.set_gizmo_operation(GizmoOperation::Scale);
        assert!(editing.manipulate(&mut scene, Vec3::splat(-5.0)));
        assert!(scene.get_component::<Transform>(e).scale.min_element() > 0.0);
    }
}
