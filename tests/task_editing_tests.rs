//! Task, Editing, Docking and Frame Loop Tests
//!
//! Tests for:
//! - TaskSystem ordering and clearing
//! - EditingSystem selection, gizmo snapping and camera controller
//! - DockingSystem hook dispatch
//! - Application tick ordering and listeners
//! - EditorSettings JSON loading

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use glam::Vec3;

use toy::toy_app::{
    Application, ButtonState, Dock, DockingSystem, EditingSystem, EditorSettings,
    FrameListeners, GizmoOperation, Input, Key, PendingEvent, TaskSystem, Viewport,
};
use toy::toy_core::{Result, ToyError};
use toy::toy_render::EntityIdReadback;
use toy::toy_scene::{Camera, CameraKind, Entity, Scene, Transform};

const EPSILON: f32 = 1e-4;

fn approx_vec(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

/// Routes engine logs through the test harness. Safe to call from every test.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Readback without a target; picking always skips.
struct Headless;

impl EntityIdReadback for Headless {
    fn target_size(&self) -> (u32, u32) {
        (0, 0)
    }
    fn recreate_staging(&mut self, _width: u32, _height: u32) -> Result<()> {
        Ok(())
    }
    fn copy_target_to_staging(&mut self) -> Result<()> {
        Ok(())
    }
    fn read_staging(&mut self, _read: &mut dyn FnMut(&[u8], usize)) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// TaskSystem
// ============================================================================

#[test]
fn pending_events_keep_push_order() {
    let mut tasks = TaskSystem::new();
    tasks.push(PendingEvent::Resize {
        width: 800,
        height: 600,
    });
    tasks.push(PendingEvent::FileDrop(vec![PathBuf::from("a.gltf")]));

    assert_eq!(
        tasks.get_pending_events(),
        [
            PendingEvent::Resize {
                width: 800,
                height: 600
            },
            PendingEvent::FileDrop(vec![PathBuf::from("a.gltf")]),
        ]
    );

    tasks.clear();
    assert!(tasks.get_pending_events().is_empty());
}

#[test]
fn reading_does_not_drain() {
    let mut tasks = TaskSystem::new();
    tasks.push(PendingEvent::None);
    let _ = tasks.get_pending_events();
    assert_eq!(tasks.len(), 1);
}

#[test]
fn assign_appends_a_batch() {
    let mut tasks = TaskSystem::new();
    tasks.push(PendingEvent::None);
    tasks.assign([
        PendingEvent::Resize {
            width: 1,
            height: 2,
        },
        PendingEvent::FileDrop(Vec::new()),
    ]);
    assert_eq!(tasks.len(), 3);
    assert_eq!(tasks.get_pending_events()[0], PendingEvent::None);
}

// ============================================================================
// EditingSystem
// ============================================================================

fn editing_fixture() -> (Scene, EditingSystem, Entity) {
    init_logging();
    let mut scene = Scene::new();
    let editing = EditingSystem::new(&mut scene, &EditorSettings::default());
    let target = scene.create_entity("target");
    (scene, editing, target)
}

#[test]
fn editor_camera_is_created_once_with_editor_kind() {
    let (scene, editing, _) = editing_fixture();
    let camera = editing.editor_camera();
    assert!(scene.is_alive(camera));
    assert_eq!(scene.get_component::<Camera>(camera).kind, CameraKind::Editor);
    assert_eq!(scene.name_of(camera), Some("Editor Camera"));
}

#[test]
fn select_by_id_resolves_or_clears() {
    let (scene, mut editing, target) = editing_fixture();

    assert_eq!(editing.select(&scene, target.id()), Some(target));
    assert_eq!(editing.get_selected_entity(), target);

    assert_eq!(editing.select(&scene, 1), None);
    assert_eq!(editing.get_selected_entity(), Entity::INVALID);
}

#[test]
fn snapped_translation_rounds_per_axis() {
    let (mut scene, mut editing, target) = editing_fixture();
    editing.select_entity(target);
    editing.set_snapping(true);
    editing.gizmo_mut().translation_snap = [0.5, 1.0, 0.25];

    assert!(editing.manipulate(&mut scene, Vec3::new(0.7, 1.4, 0.3)));
    let position = scene.get_component::<Transform>(target).position;
    assert!(approx_vec(position, Vec3::new(0.5, 1.0, 0.25)), "got {position}");
}

#[test]
fn unsnapped_translation_is_exact() {
    let (mut scene, mut editing, target) = editing_fixture();
    editing.select_entity(target);
    editing.set_snapping(false);
    editing.manipulate(&mut scene, Vec3::new(0.7, 1.4, 0.3));
    let position = scene.get_component::<Transform>(target).position;
    assert!(approx_vec(position, Vec3::new(0.7, 1.4, 0.3)));
}

#[test]
fn snapped_rotation_uses_degree_steps() {
    let (mut scene, mut editing, target) = editing_fixture();
    editing.select_entity(target);
    editing.set_snapping(true);
    editing.set_gizmo_operation(GizmoOperation::Rotate);
    editing.gizmo_mut().rotation_snap_degrees = 15.0;

    editing.manipulate(&mut scene, Vec3::new(0.0, 50.0, 0.0));

    let forward = scene.get_component::<Transform>(target).forward();
    let expected = glam::Quat::from_rotation_y(45f32.to_radians()) * Vec3::NEG_Z;
    assert!(approx_vec(forward, expected), "got {forward}, want {expected}");
}

#[test]
fn manipulate_without_selection_does_nothing() {
    let (mut scene, mut editing, target) = editing_fixture();
    assert!(!editing.manipulate(&mut scene, Vec3::ONE));
    assert_eq!(*scene.get_component::<Transform>(target), Transform::IDENTITY);
}

#[test]
fn fly_camera_moves_along_forward() {
    let (mut scene, mut editing, _) = editing_fixture();
    let camera = editing.editor_camera();
    let start = *scene.get_component::<Transform>(camera);

    let mut input = Input::new();
    input.inject_key(Key::W, ButtonState::Pressed);
    editing.update_camera(&mut scene, &input, 1.0);

    let moved = scene.get_component::<Transform>(camera).position - start.position;
    let speed = EditorSettings::default().camera.move_speed;
    assert!(approx_vec(moved, start.forward() * speed), "moved {moved}");
}

#[test]
fn camera_is_frozen_while_manipulating() {
    let (mut scene, mut editing, _) = editing_fixture();
    let camera = editing.editor_camera();
    let start = *scene.get_component::<Transform>(camera);

    let mut input = Input::new();
    input.inject_key(Key::W, ButtonState::Pressed);
    editing.set_manipulating(true);
    editing.update_camera(&mut scene, &input, 1.0);

    assert_eq!(*scene.get_component::<Transform>(camera), start);
}

// ============================================================================
// DockingSystem
// ============================================================================

#[test]
fn docks_receive_only_the_hooks_they_have() {
    let seen = Rc::new(RefCell::new(Vec::<String>::new()));

    let mut docking = DockingSystem::new();
    let log = Rc::clone(&seen);
    docking.add_dock(Dock::new("Console").on_file_drop(move |paths| {
        log.borrow_mut().push(format!("console:{}", paths.len()));
    }));
    let log = Rc::clone(&seen);
    docking.add_dock(Dock::new("Viewport").on_resize(move |w, h| {
        log.borrow_mut().push(format!("viewport:{w}x{h}"));
    }));

    docking.dispatch_resize(640, 480);
    docking.dispatch_file_drop(&[PathBuf::from("a"), PathBuf::from("b")]);

    assert_eq!(*seen.borrow(), ["viewport:640x480", "console:2"]);
    assert_eq!(docking.dock_names().collect::<Vec<_>>(), ["Console", "Viewport"]);
}

// ============================================================================
// Application
// ============================================================================

#[test]
fn tick_dispatches_and_clears_pending_events() {
    let resizes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&resizes);

    let mut app = Application::new(EditorSettings::default(), FrameListeners::new());
    app.context_mut()
        .get_mut::<DockingSystem>()
        .add_dock(Dock::new("Viewport").on_resize(move |w, h| sink.borrow_mut().push((w, h))));

    app.tasks_mut().assign([
        PendingEvent::Resize {
            width: 800,
            height: 600,
        },
        PendingEvent::Resize {
            width: 1024,
            height: 768,
        },
    ]);
    app.tick(&Input::new(), 0.016, &mut Headless).unwrap();

    assert_eq!(*resizes.borrow(), [(800, 600), (1024, 768)]);
    assert!(app.tasks_mut().is_empty(), "queue must not survive the tick");

    app.tick(&Input::new(), 0.016, &mut Headless).unwrap();
    assert_eq!(resizes.borrow().len(), 2, "events are delivered once");
}

#[test]
fn listeners_run_after_docks_in_phase_order() {
    let order = Rc::new(RefCell::new(Vec::new()));

    let mut listeners = FrameListeners::new();
    let log = Rc::clone(&order);
    listeners
        .set_on_frame_update(move |_, frame| log.borrow_mut().push(format!("update {}", frame.frame_count)))
        .unwrap();
    let log = Rc::clone(&order);
    listeners
        .set_on_frame_render(move |_, frame| log.borrow_mut().push(format!("render {}", frame.frame_count)))
        .unwrap();

    let mut app = Application::new(EditorSettings::default(), listeners);
    let log = Rc::clone(&order);
    app.context_mut()
        .get_mut::<DockingSystem>()
        .add_dock(Dock::new("Hierarchy").on_tick(move |ctx| {
            log.borrow_mut().push(format!("dock {}", ctx.frame.frame_count));
        }));

    app.tick(&Input::new(), 0.016, &mut Headless).unwrap();
    app.tick(&Input::new(), 0.016, &mut Headless).unwrap();

    assert_eq!(
        *order.borrow(),
        ["dock 0", "update 0", "render 0", "dock 1", "update 1", "render 1"]
    );
    assert_eq!(app.frame_count(), 2);
}

#[test]
fn double_listener_registration_is_rejected() {
    let mut listeners = FrameListeners::new();
    listeners.set_on_file_drop(|_| {}).unwrap();
    let err = listeners.set_on_file_drop(|_| {}).unwrap_err();
    assert!(matches!(err, ToyError::ListenerAlreadySet("on_file_drop")));
}

#[test]
fn tick_culls_with_the_editor_camera() {
    let mut app = Application::new(EditorSettings::default(), FrameListeners::new());
    let model = std::sync::Arc::new(toy::toy_scene::Model::cube("cube", 0.5));
    let visible = app
        .scene_mut()
        .add_static_mesh("visible", std::sync::Arc::clone(&model), Transform::IDENTITY);
    app.scene_mut().add_static_mesh(
        "behind",
        model,
        Transform::from_position(Vec3::new(0.0, 0.0, 100.0)),
    );
    app.set_viewport(Viewport::full(800, 600));

    app.tick(&Input::new(), 0.016, &mut Headless).unwrap();

    assert_eq!(app.scene().entities_in_viewer(), [visible]);
    let camera = app.context().get::<EditingSystem>().editor_camera();
    let aspect = app.scene().get_component::<Camera>(camera).aspect;
    assert!((aspect - 800.0 / 600.0).abs() < EPSILON);
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn settings_fill_missing_fields_with_defaults() {
    let settings = EditorSettings::from_json_str(r#"{ "gizmo": { "operation": "scale" } }"#).unwrap();
    assert_eq!(settings.gizmo.operation, GizmoOperation::Scale);
    assert_eq!(settings.camera, EditorSettings::default().camera);
}

#[test]
fn saved_settings_use_lowercase_operations_and_nested_sections() {
    let mut settings = EditorSettings::default();
    settings.gizmo.operation = GizmoOperation::Rotate;
    settings.camera.move_speed = 12.5;

    let value: serde_json::Value =
        serde_json::from_str(&settings.to_json_string().unwrap()).unwrap();
    assert_eq!(value["gizmo"]["operation"], "rotate");
    assert_eq!(value["camera"]["move_speed"], 12.5);

    let edited = serde_json::json!({
        "gizmo": { "snapping": true, "translation_snap": [1.0, 0.25, 1.0] }
    });
    let loaded = EditorSettings::from_json_str(&edited.to_string()).unwrap();
    assert!(loaded.gizmo.snapping);
    assert_eq!(loaded.gizmo.translation_snap, [1.0, 0.25, 1.0]);
    assert_eq!(loaded.gizmo.operation, GizmoOperation::Translate);
}

#[test]
fn missing_settings_file_yields_defaults() {
    let settings = EditorSettings::load("definitely/not/here.json").unwrap();
    assert_eq!(settings, EditorSettings::default());
}

#[test]
fn malformed_settings_are_an_error() {
    let err = EditorSettings::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, ToyError::JsonError(_)));
}
