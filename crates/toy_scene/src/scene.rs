//! Scene: the entity-component store and its visibility traversal.
//!
//! A [`Scene`] owns
//! - the entity arena and one secondary-map column per component type
//! - the cache of general (non-skybox) static mesh entities, appended when a
//!   [`StaticMesh`] is attached rather than recomputed per frame
//! - the per-frame visible lists rebuilt by [`Scene::frustum_culling`]
//! - the skybox slot
//! - the derived scene bounds, valid after the most recent culling pass
//!
//! Render traversals only walk the cached visible lists; they never re-test
//! visibility.

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::sync::Arc;

use glam::{Affine3A, Vec2};
use rustc_hash::FxHashMap;
use toy_core::{BoundingBox, Frustum, Result, ToyError, fatal};

use crate::components::{Camera, Component, MeshFlags, PointLight, StaticMesh, Tag, Transform};
use crate::effect::{DrawItem, Effect};
use crate::entity::{Entity, EntityArena, EntityKey, SceneId};
use crate::model::Model;
use crate::storage::{Column, ComponentColumn};

type ColumnMap = FxHashMap<TypeId, Box<dyn ComponentColumn>>;

fn column<T: Component>(columns: &ColumnMap) -> Option<&Column<T>> {
    columns
        .get(&TypeId::of::<T>())
        .and_then(|c| c.as_any().downcast_ref::<Column<T>>())
}

fn column_mut<T: Component>(columns: &mut ColumnMap) -> Option<&mut Column<T>> {
    columns
        .get_mut(&TypeId::of::<T>())
        .and_then(|c| c.as_any_mut().downcast_mut::<Column<T>>())
}

fn column_or_insert<T: Component>(columns: &mut ColumnMap) -> &mut Column<T> {
    let boxed = columns
        .entry(TypeId::of::<T>())
        .or_insert_with(|| Box::new(Column::<T>::new()));
    match boxed.as_any_mut().downcast_mut::<Column<T>>() {
        Some(column) => column,
        None => fatal(&format!(
            "component column for '{}' has the wrong type",
            std::any::type_name::<T>()
        )),
    }
}

#[inline]
fn is<T: 'static, U: 'static>() -> bool {
    TypeId::of::<T>() == TypeId::of::<U>()
}

pub struct Scene {
    id: SceneId,
    arena: EntityArena,
    columns: ColumnMap,

    general_static_meshes: Vec<Entity>,
    entities_in_viewer: Vec<Entity>,
    illuminant_entities_in_viewer: Vec<Entity>,

    skybox: Option<Entity>,
    scene_bounds: Option<BoundingBox>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        let id = SceneId::next();
        log::debug!("Created scene {}", id.raw());
        Self {
            id,
            arena: EntityArena::new(),
            columns: FxHashMap::default(),
            general_static_meshes: Vec::new(),
            entities_in_viewer: Vec::new(),
            illuminant_entities_in_viewer: Vec::new(),
            skybox: None,
            scene_bounds: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    // ========================================================================
    // Entity lifecycle
    // ========================================================================

    /// Allocates a new entity carrying a [`Tag`] and an identity [`Transform`].
    pub fn create_entity(&mut self, name: impl Into<Cow<'static, str>>) -> Entity {
        let entity = self.arena.allocate(self.id);
        let key = self.require_key(entity, "create_entity");

        self.insert_component(key, entity, Tag::new(name));
        self.insert_component(key, entity, Transform::default());

        log::trace!("Created {entity:?}");
        entity
    }

    /// Releases `entity` and all of its components.
    ///
    /// Returns `false` if the handle is stale or belongs to another scene.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        let Some(key) = self.live_key(entity) else {
            log::warn!("destroy_entity: {entity:?} is not alive in scene {}", self.id.raw());
            return false;
        };

        for col in self.columns.values_mut() {
            col.remove_entity(key);
        }

        self.general_static_meshes.retain(|e| *e != entity);
        self.entities_in_viewer.retain(|e| *e != entity);
        self.illuminant_entities_in_viewer.retain(|e| *e != entity);
        if self.skybox == Some(entity) {
            log::debug!("Skybox {entity:?} destroyed, slot cleared");
            self.skybox = None;
        }

        self.arena.release(key);
        log::trace!("Destroyed {entity:?}");
        true
    }

    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.live_key(entity).is_some()
    }

    /// Resolves a numeric identifier read from the entity-ID buffer.
    ///
    /// The reserved identifiers `0` and `1` never resolve.
    #[must_use]
    pub fn get_entity(&self, id: u32) -> Option<Entity> {
        self.arena
            .resolve(id)
            .map(|key| Entity::new(self.id, id, key))
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.arena
            .iter()
            .map(move |(key, id)| Entity::new(self.id, id, key))
    }

    /// First entity whose [`Tag`] name equals `name`.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<Entity> {
        self.view::<Tag>()
            .find(|(_, tag)| tag.name == name)
            .map(|(entity, _)| entity)
    }

    #[must_use]
    pub fn name_of(&self, entity: Entity) -> Option<&str> {
        self.try_component::<Tag>(entity).map(|tag| tag.name.as_ref())
    }

    // ========================================================================
    // Components
    // ========================================================================

    /// Attaches `value` to `entity`.
    ///
    /// Fatal if the entity is dead or already has a `T`.
    #[track_caller]
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) -> &mut T {
        let key = self.require_key(entity, "add_component");
        if column::<T>(&self.columns).is_some_and(|c| c.contains(key)) {
            fatal(&format!(
                "{entity:?} already has a '{}' component",
                std::any::type_name::<T>()
            ));
        }
        self.insert_component(key, entity, value)
    }

    /// Attaches `value`, replacing any existing `T`.
    #[track_caller]
    pub fn add_or_replace_component<T: Component>(&mut self, entity: Entity, value: T) -> &mut T {
        let key = self.require_key(entity, "add_or_replace_component");
        self.insert_component(key, entity, value)
    }

    /// Detaches and returns the `T` of `entity`, if any.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let key = self.live_key(entity)?;
        let removed = column_mut::<T>(&mut self.columns)?.remove(key);

        if removed.is_some() {
            if is::<T, StaticMesh>() {
                self.general_static_meshes.retain(|e| *e != entity);
                self.entities_in_viewer.retain(|e| *e != entity);
                if self.skybox == Some(entity) {
                    self.skybox = None;
                }
            } else if is::<T, PointLight>() {
                self.illuminant_entities_in_viewer.retain(|e| *e != entity);
            }
        }
        removed
    }

    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.live_key(entity)
            .is_some_and(|key| column::<T>(&self.columns).is_some_and(|c| c.contains(key)))
    }

    /// Fatal if `entity` has no `T`; check [`has_component`](Self::has_component)
    /// or use [`try_component`](Self::try_component) when presence is not
    /// guaranteed.
    #[track_caller]
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> &T {
        match self.try_component::<T>(entity) {
            Some(value) => value,
            None => Self::missing_component::<T>(entity),
        }
    }

    #[track_caller]
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        let Some(key) = self.live_key(entity) else {
            Self::missing_component::<T>(entity);
        };
        match column_mut::<T>(&mut self.columns).and_then(|c| c.get_mut(key)) {
            Some(value) => value,
            None => Self::missing_component::<T>(entity),
        }
    }

    #[must_use]
    pub fn try_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        let key = self.live_key(entity)?;
        column::<T>(&self.columns)?.get(key)
    }

    pub fn try_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let key = self.live_key(entity)?;
        column_mut::<T>(&mut self.columns)?.get_mut(key)
    }

    /// Iterates every `(entity, &T)`. Order is storage order.
    pub fn view<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        column::<T>(&self.columns)
            .into_iter()
            .flat_map(Column::iter)
    }

    pub fn view_mut<T: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        column_mut::<T>(&mut self.columns)
            .into_iter()
            .flat_map(Column::iter_mut)
    }

    // ========================================================================
    // Static meshes & skybox
    // ========================================================================

    /// Creates an entity rendering `model` at `transform`.
    pub fn add_static_mesh(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        model: Arc<Model>,
        transform: Transform,
    ) -> Entity {
        let entity = self.create_entity(name);
        *self.get_component_mut::<Transform>(entity) = transform;
        self.add_component(entity, StaticMesh::new(model));
        entity
    }

    /// Creates the skybox entity. Fails if the slot is already occupied; use
    /// [`replace_skybox`](Self::replace_skybox) to swap it.
    pub fn create_skybox(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        model: Arc<Model>,
    ) -> Result<Entity> {
        if let Some(existing) = self.skybox.filter(|e| self.is_alive(*e)) {
            let existing = self.name_of(existing).unwrap_or_default().to_string();
            return Err(ToyError::SkyboxOccupied { existing });
        }
        Ok(self.spawn_skybox(name, model))
    }

    /// Destroys the current skybox entity (if any) and creates a new one.
    pub fn replace_skybox(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        model: Arc<Model>,
    ) -> Entity {
        if let Some(old) = self.skybox.take() {
            log::info!("Replacing skybox {old:?}");
            self.destroy_entity(old);
        }
        self.spawn_skybox(name, model)
    }

    #[inline]
    #[must_use]
    pub fn skybox(&self) -> Option<Entity> {
        self.skybox
    }

    fn spawn_skybox(&mut self, name: impl Into<Cow<'static, str>>, model: Arc<Model>) -> Entity {
        let entity = self.create_entity(name);
        // Attaching a SKYBOX mesh claims the slot.
        self.add_component(
            entity,
            StaticMesh::new(model).with_flags(MeshFlags::SKYBOX),
        );
        entity
    }

    // ========================================================================
    // Visibility
    // ========================================================================

    /// Recomputes per-submesh and aggregate visibility of every general static
    /// mesh against `frustum`, rebuilds the visible lists, and refreshes the
    /// scene bounds.
    ///
    /// Must run once per frame before any render traversal.
    pub fn frustum_culling(&mut self, frustum: &Frustum) {
        self.entities_in_viewer.clear();
        self.illuminant_entities_in_viewer.clear();

        let mut bounds: Option<BoundingBox> = None;
        let mesh_key = TypeId::of::<StaticMesh>();
        let transform_key = TypeId::of::<Transform>();

        if let [Some(meshes), Some(transforms)] =
            self.columns.get_disjoint_mut([&mesh_key, &transform_key])
        {
            let meshes = meshes.as_any_mut().downcast_mut::<Column<StaticMesh>>();
            let transforms = transforms.as_any().downcast_ref::<Column<Transform>>();

            if let (Some(meshes), Some(transforms)) = (meshes, transforms) {
                let world_of = |entity: Entity| {
                    transforms
                        .for_entity(entity)
                        .map_or(Affine3A::IDENTITY, Transform::matrix)
                };

                for &entity in &self.general_static_meshes {
                    let Some(mesh) = meshes.for_entity_mut(entity) else {
                        continue;
                    };
                    let world = world_of(entity);
                    let model = Arc::clone(&mesh.model);

                    mesh.submodel_in_frustum.clear();
                    mesh.submodel_in_frustum.resize(model.submesh_count(), false);

                    let mut any_visible = false;
                    for (i, submesh) in model.submeshes().iter().enumerate() {
                        let world_box = submesh.bounds.transform(&world);
                        bounds = Some(bounds.map_or(world_box, |b| b.union(&world_box)));

                        let visible = frustum.intersects_aabb(&world_box);
                        mesh.submodel_in_frustum[i] = visible;
                        any_visible |= visible;
                    }

                    mesh.in_frustum = any_visible;
                    if any_visible {
                        self.entities_in_viewer.push(entity);
                    }
                }

                if let Some(sky) = self.skybox.and_then(|e| meshes.for_entity_mut(e)) {
                    let count = sky.model.submesh_count();
                    sky.submodel_in_frustum.clear();
                    sky.submodel_in_frustum.resize(count, true);
                    sky.in_frustum = true;
                }
            }
        }

        if let (Some(lights), Some(transforms)) = (
            column::<PointLight>(&self.columns),
            column::<Transform>(&self.columns),
        ) {
            for (entity, light) in lights.iter() {
                let center = transforms
                    .for_entity(entity)
                    .map_or(glam::Vec3::ZERO, |t| t.position);
                if frustum.intersects_sphere(center, light.range) {
                    self.illuminant_entities_in_viewer.push(entity);
                }
            }
        }

        self.scene_bounds = bounds;
    }

    /// Entities with at least one submesh inside the frustum of the last
    /// culling pass.
    #[inline]
    #[must_use]
    pub fn entities_in_viewer(&self) -> &[Entity] {
        &self.entities_in_viewer
    }

    #[inline]
    #[must_use]
    pub fn illuminant_entities_in_viewer(&self) -> &[Entity] {
        &self.illuminant_entities_in_viewer
    }

    /// World-space bounds of all general static meshes as of the last culling
    /// pass. `None` before the first pass or for a scene without meshes.
    #[inline]
    #[must_use]
    pub fn scene_bounds(&self) -> Option<BoundingBox> {
        self.scene_bounds
    }

    // ========================================================================
    // Render traversal
    // ========================================================================

    /// Draws every visible submesh of the visible entities.
    pub fn render_static_mesh<E: Effect + ?Sized>(&self, effect: &mut E) {
        self.draw_visible(effect, |_| true);
    }

    /// Like [`render_static_mesh`](Self::render_static_mesh), restricted to
    /// shadow casters. Camera proxies never cast shadows.
    pub fn render_static_mesh_shadow<E: Effect + ?Sized>(&self, effect: &mut E) {
        self.draw_visible(effect, |flags| {
            flags.contains(MeshFlags::CAST_SHADOW) && !flags.contains(MeshFlags::CAMERA)
        });
    }

    pub fn render_skybox<E: Effect + ?Sized>(&self, effect: &mut E) {
        let Some(entity) = self.skybox else {
            return;
        };
        let Some(mesh) = self.try_component::<StaticMesh>(entity) else {
            return;
        };
        let world = self.world_matrix(entity);
        for (i, submesh) in mesh.model.submeshes().iter().enumerate() {
            effect.draw(&DrawItem {
                entity,
                world,
                model: &mesh.model,
                submesh_index: i,
                submesh,
                flags: mesh.flags,
            });
        }
    }

    fn draw_visible<E, F>(&self, effect: &mut E, filter: F)
    where
        E: Effect + ?Sized,
        F: Fn(MeshFlags) -> bool,
    {
        let Some(meshes) = column::<StaticMesh>(&self.columns) else {
            return;
        };

        for &entity in &self.entities_in_viewer {
            let Some(mesh) = meshes.for_entity(entity) else {
                continue;
            };
            if !filter(mesh.flags) {
                continue;
            }
            let world = self.world_matrix(entity);
            let visible = mesh.model.submeshes().iter().zip(&mesh.submodel_in_frustum);
            for (i, (submesh, _)) in visible.enumerate().filter(|(_, (_, v))| **v) {
                effect.draw(&DrawItem {
                    entity,
                    world,
                    model: &mesh.model,
                    submesh_index: i,
                    submesh,
                    flags: mesh.flags,
                });
            }
        }
    }

    // ========================================================================
    // CPU picking
    // ========================================================================

    /// Casts a ray from `camera` through `screen` (viewport pixels, origin
    /// top-left) and returns the nearest visible entity whose submesh bounds
    /// it hits.
    ///
    /// Only considers entities of the last culling pass. Camera proxies are
    /// skipped.
    #[must_use]
    pub fn pick_entity(&self, camera: Entity, screen: Vec2, viewport: Vec2) -> Option<Entity> {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }
        let cam = self.try_component::<Camera>(camera)?;
        let cam_transform = self.try_component::<Transform>(camera)?;
        let ray = cam.screen_ray(cam_transform, screen, viewport);
        let meshes = column::<StaticMesh>(&self.columns)?;

        let mut nearest: Option<(f32, Entity)> = None;
        for &entity in &self.entities_in_viewer {
            let Some(mesh) = meshes.for_entity(entity) else {
                continue;
            };
            if mesh.is_camera() {
                continue;
            }
            let world = self.world_matrix(entity);
            let hits = mesh
                .model
                .submeshes()
                .iter()
                .zip(&mesh.submodel_in_frustum)
                .filter(|(_, visible)| **visible)
                .filter_map(|(submesh, _)| ray.intersect_aabb(&submesh.bounds.transform(&world)));

            for t in hits {
                if nearest.is_none_or(|(best, _)| t < best) {
                    nearest = Some((t, entity));
                }
            }
        }

        nearest.map(|(_, entity)| entity)
    }

    // ------------------------------------------------------------------------

    fn world_matrix(&self, entity: Entity) -> Affine3A {
        self.try_component::<Transform>(entity)
            .map_or(Affine3A::IDENTITY, Transform::matrix)
    }

    /// Key of `entity` if it is alive in this scene.
    #[inline]
    fn live_key(&self, entity: Entity) -> Option<EntityKey> {
        if entity.scene() != self.id {
            return None;
        }
        entity.key().filter(|key| self.arena.contains(*key))
    }

    #[track_caller]
    fn require_key(&self, entity: Entity, op: &str) -> EntityKey {
        match self.live_key(entity) {
            Some(key) => key,
            None => fatal(&format!(
                "Scene::{op}: {entity:?} is not alive in scene {}",
                self.id.raw()
            )),
        }
    }

    #[track_caller]
    fn insert_component<T: Component>(
        &mut self,
        key: EntityKey,
        entity: Entity,
        value: T,
    ) -> &mut T {
        let skybox_flag = (&value as &dyn Any)
            .downcast_ref::<StaticMesh>()
            .map(StaticMesh::is_skybox);
        if skybox_flag == Some(true) {
            self.check_skybox_slot(entity);
        }

        column_or_insert::<T>(&mut self.columns).insert(key, entity, value);

        if let Some(is_skybox) = skybox_flag {
            self.on_static_mesh_attached(entity, is_skybox);
        }

        match column_mut::<T>(&mut self.columns).and_then(|c| c.get_mut(key)) {
            Some(value) => value,
            None => Self::missing_component::<T>(entity),
        }
    }

    /// A second skybox only comes in through [`replace_skybox`](Self::replace_skybox).
    #[track_caller]
    fn check_skybox_slot(&self, entity: Entity) {
        if let Some(current) = self.skybox.filter(|e| *e != entity && self.is_alive(*e)) {
            fatal(&format!(
                "{entity:?} cannot take the skybox slot held by {current:?}, use Scene::replace_skybox"
            ));
        }
    }

    /// Files a freshly attached mesh under the skybox slot or the general
    /// list. Runs on replacement too, since the flags may have changed.
    fn on_static_mesh_attached(&mut self, entity: Entity, is_skybox: bool) {
        if is_skybox {
            self.general_static_meshes.retain(|e| *e != entity);
            self.entities_in_viewer.retain(|e| *e != entity);
            self.skybox = Some(entity);
            return;
        }

        if self.skybox == Some(entity) {
            log::debug!("{entity:?} no longer carries a skybox mesh, slot cleared");
            self.skybox = None;
        }
        if !self.general_static_meshes.contains(&entity) {
            self.general_static_meshes.push(entity);
        }
    }

    #[cold]
    #[track_caller]
    fn missing_component<T: Component>(entity: Entity) -> ! {
        fatal(&format!(
            "{entity:?} has no '{}' component",
            std::any::type_name::<T>()
        ))
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("entities", &self.arena.len())
            .field("general_static_meshes", &self.general_static_meshes.len())
            .field("entities_in_viewer", &self.entities_in_viewer.len())
            .field("skybox", &self.skybox)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaced_mesh_is_not_listed_twice() {
        let mut scene = Scene::new();
        let model = Arc::new(Model::cube("cube", 0.5));
        let e = scene.add_static_mesh("a", Arc::clone(&model), Transform::default());
        scene.add_or_replace_component(e, StaticMesh::new(model));
        assert_eq!(scene.general_static_meshes, vec![e]);
    }

    #[test]
    fn skybox_is_not_a_general_mesh() {
        let mut scene = Scene::new();
        let sky = scene
            .create_skybox("sky", Arc::new(Model::cube("sky", 100.0)))
            .unwrap();
        assert!(scene.general_static_meshes.is_empty());
        assert_eq!(scene.skybox(), Some(sky));
    }

    #[test]
    fn skybox_flag_moves_entity_between_list_and_slot() {
        let mut scene = Scene::new();
        let model = Arc::new(Model::cube("cube", 0.5));
        let e = scene.add_static_mesh("a", Arc::clone(&model), Transform::default());

        scene.add_or_replace_component(
            e,
            StaticMesh::new(Arc::clone(&model)).with_flags(MeshFlags::SKYBOX),
        );
        assert!(scene.general_static_meshes.is_empty());
        assert_eq!(scene.skybox, Some(e));

        scene.add_or_replace_component(e, StaticMesh::new(model));
        assert_eq!(scene.general_static_meshes, vec![e]);
        assert_eq!(scene.skybox, None);
    }

    #[test]
    fn removing_mesh_drops_it_from_cache() {
        let mut scene = Scene::new();
        let e = scene.add_static_mesh(
            "a",
            Arc::new(Model::cube("cube", 0.5)),
            Transform::default(),
        );
        assert!(scene.remove_component::<StaticMesh>(e).is_some());
        assert!(scene.general_static_meshes.is_empty());
    }
}
