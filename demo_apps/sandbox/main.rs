//! Sandbox editor shell.
//!
//! Builds a small scene (ground, a row of cubes, a point light, a skybox)
//! and registers three docks that log what they see:
//!
//! - Hierarchy: reports selection changes
//! - Console: reports dropped files
//! - Viewport: reports resizes
//!
//! Controls: right-drag to look, middle-drag to pan, WASD/QE to fly (Shift
//! for speed), left-click to pick. `1`/`2`/`3` switch the gizmo between
//! translate, rotate and scale; `Delete` destroys the selection.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use glam::Vec3;
use toy::prelude::*;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

const CONFIG_PATH: &str = "sandbox_settings.json";

struct Sandbox {
    cubes: Vec<Entity>,
}

impl Sandbox {
    fn build_scene(scene: &mut Scene) -> Vec<Entity> {
        let ground = Arc::new(Model::cube("ground", 0.5));
        scene.add_static_mesh(
            "Ground",
            ground,
            Transform::from_position(Vec3::new(0.0, -0.55, 0.0))
                .with_scale(Vec3::new(20.0, 0.1, 20.0)),
        );

        let cube = Arc::new(Model::cube("cube", 0.5));
        let cubes = (0..5)
            .map(|i| {
                let x = (i as f32 - 2.0) * 2.0;
                scene.add_static_mesh(
                    format!("Cube {i}"),
                    Arc::clone(&cube),
                    Transform::from_position(Vec3::new(x, 0.0, 0.0)),
                )
            })
            .collect();

        let light = scene.create_entity("Point Light");
        scene.get_component_mut::<Transform>(light).position = Vec3::new(0.0, 4.0, 2.0);
        scene.add_component(light, PointLight::new(Vec3::new(1.0, 0.95, 0.8), 2.0, 15.0));

        if let Err(err) = scene.create_skybox("Skybox", Arc::new(Model::cube("skybox", 500.0))) {
            log::warn!("Skybox not created: {err}");
        }

        cubes
    }

    fn docks() -> [Dock; 3] {
        let last_selection = Rc::new(Cell::new(Entity::INVALID));
        let hierarchy = Dock::new("Hierarchy").on_tick(move |ctx| {
            let selected = ctx.editing.get_selected_entity();
            if selected != last_selection.get() {
                last_selection.set(selected);
                match ctx.scene.name_of(selected) {
                    Some(name) => log::info!("[Hierarchy] selected '{name}'"),
                    None => log::info!("[Hierarchy] selection cleared"),
                }
            }
        });

        let console = Dock::new("Console").on_file_drop(|paths| {
            for path in paths {
                log::info!("[Console] dropped {}", path.display());
            }
        });

        let viewport = Dock::new("Viewport").on_resize(|width, height| {
            log::info!("[Viewport] {width}x{height}");
        });

        [hierarchy, console, viewport]
    }
}

impl AppHandler for Sandbox {
    fn frame_listeners() -> FrameListeners {
        let mut listeners = FrameListeners::new();
        let result = listeners.set_on_frame_update(|scene, frame| {
            if frame.frame_count % 600 == 0 {
                log::debug!(
                    "frame {}: {} in view, {} lights",
                    frame.frame_count,
                    scene.entities_in_viewer().len(),
                    scene.illuminant_entities_in_viewer().len()
                );
            }
        });
        if let Err(err) = result {
            log::warn!("{err}");
        }
        listeners
    }

    fn init(app: &mut Application, _window: &Arc<Window>) -> Self {
        let cubes = Self::build_scene(app.scene_mut());

        let docking = app.context_mut().get_mut::<DockingSystem>();
        for dock in Self::docks() {
            docking.add_dock(dock);
        }

        log::info!("Sandbox scene ready with {} entities", app.scene().len());
        Self { cubes }
    }

    fn on_event(&mut self, app: &mut Application, _window: &Arc<Window>, event: &WindowEvent) -> bool {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return false;
        };
        if event.state != ElementState::Pressed {
            return false;
        }

        match event.physical_key {
            PhysicalKey::Code(KeyCode::Digit1) => {
                app.context_mut()
                    .get_mut::<EditingSystem>()
                    .set_gizmo_operation(GizmoOperation::Translate);
            }
            PhysicalKey::Code(KeyCode::Digit2) => {
                app.context_mut()
                    .get_mut::<EditingSystem>()
                    .set_gizmo_operation(GizmoOperation::Rotate);
            }
            PhysicalKey::Code(KeyCode::Digit3) => {
                app.context_mut()
                    .get_mut::<EditingSystem>()
                    .set_gizmo_operation(GizmoOperation::Scale);
            }
            PhysicalKey::Code(KeyCode::Delete) => {
                let editing = app.context().get::<EditingSystem>();
                let selected = editing.get_selected_entity();
                if selected == editing.editor_camera() {
                    return false;
                }
                if app.scene_mut().destroy_entity(selected) {
                    self.cubes.retain(|e| *e != selected);
                    app.context_mut().get_mut::<EditingSystem>().unselect();
                }
            }
            _ => return false,
        }
        true
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let editor = EditorSettings::load(CONFIG_PATH)?;

    App::new()
        .with_title("Toy Sandbox")
        .with_editor_settings(editor)
        .run::<Sandbox>()?;
    Ok(())
}
