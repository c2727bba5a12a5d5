//! Entity handles and the arena that issues them.
//!
//! An [`Entity`] is `(scene, id, key)`:
//! - `scene` makes handles from different [`Scene`](crate::Scene)s unequal
//! - `id` is the numeric identifier written into the entity-ID buffer
//! - `key` is the versioned [`SlotMap`] key, so a stale handle never aliases
//!   the entity that later reuses its id
//!
//! Ids [`BACKGROUND_ID`] and [`SENTINEL_ID`] are reserved and never handed out.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use slotmap::{Key, SlotMap, new_key_type};
use toy_core::fatal;

new_key_type! {
    /// Arena key of an entity. Component columns are keyed by it.
    pub struct EntityKey;
}

/// Entity-ID buffer value for "no entity" (cleared background).
pub const BACKGROUND_ID: u32 = 0;
/// Entity-ID buffer value written by the skybox and the editor camera.
pub const SENTINEL_ID: u32 = 1;
/// First id the arena hands out.
pub const FIRST_ENTITY_ID: u32 = 2;

/// Returns `true` for identifiers that never name a user-selectable entity.
#[inline]
#[must_use]
pub const fn is_reserved_id(id: u32) -> bool {
    id < FIRST_ENTITY_ID
}

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique identity of a scene.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SceneId(u32);

impl SceneId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Versioned handle into a [`Scene`](crate::Scene).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    scene: SceneId,
    id: u32,
    key: Option<EntityKey>,
}

impl Entity {
    /// The empty handle. Never equal to a handle issued by any scene.
    pub const INVALID: Entity = Entity {
        scene: SceneId(0),
        id: BACKGROUND_ID,
        key: None,
    };

    pub(crate) const fn new(scene: SceneId, id: u32, key: EntityKey) -> Self {
        Self {
            scene,
            id,
            key: Some(key),
        }
    }

    /// Numeric identifier as written into the entity-ID buffer.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u32 {
        self.id
    }

    /// Arena key, `None` only for [`Entity::INVALID`].
    #[inline]
    #[must_use]
    pub const fn key(self) -> Option<EntityKey> {
        self.key
    }

    #[inline]
    #[must_use]
    pub const fn scene(self) -> SceneId {
        self.scene
    }

    /// `false` only for [`Entity::INVALID`]. Liveness is a scene query, see
    /// [`Scene::is_alive`](crate::Scene::is_alive).
    #[inline]
    #[must_use]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(key) = self.key else {
            return f.write_str("Entity(INVALID)");
        };
        // High half of the ffi form is the slot version.
        let version = key.data().as_ffi() >> 32;
        write!(f, "Entity({}v{}@{})", self.id, version, self.scene.raw())
    }
}

/// Entity arena plus the id table used to resolve ID-buffer values.
///
/// Ids are recycled FIFO, so a pixel read from last frame's ID buffer rarely
/// resolves to a freshly created entity. Keys are never recycled without a
/// version bump, which is what makes stale handles detectable.
#[derive(Debug)]
pub(crate) struct EntityArena {
    slots: SlotMap<EntityKey, u32>,
    by_id: Vec<Option<EntityKey>>,
    free_ids: VecDeque<u32>,
}

impl EntityArena {
    pub(crate) fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            by_id: vec![None; FIRST_ENTITY_ID as usize],
            free_ids: VecDeque::new(),
        }
    }

    pub(crate) fn allocate(&mut self, scene: SceneId) -> Entity {
        let id = match self.free_ids.pop_front() {
            Some(id) => id,
            None => {
                let Ok(id) = u32::try_from(self.by_id.len()) else {
                    fatal("entity id space exhausted");
                };
                self.by_id.push(None);
                id
            }
        };

        let key = self.slots.insert(id);
        self.by_id[id as usize] = Some(key);
        Entity::new(scene, id, key)
    }

    /// Frees the slot behind `key`. Returns `false` if it was already free.
    pub(crate) fn release(&mut self, key: EntityKey) -> bool {
        let Some(id) = self.slots.remove(key) else {
            return false;
        };
        self.by_id[id as usize] = None;
        self.free_ids.push_back(id);
        true
    }

    #[inline]
    pub(crate) fn contains(&self, key: EntityKey) -> bool {
        self.slots.contains_key(key)
    }

    /// Key of the live entity currently holding `id`.
    pub(crate) fn resolve(&self, id: u32) -> Option<EntityKey> {
        if is_reserved_id(id) {
            return None;
        }
        self.by_id.get(id as usize).copied().flatten()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (EntityKey, u32)> + '_ {
        self.slots.iter().map(|(key, &id)| (key, id))
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> (EntityArena, SceneId) {
        (EntityArena::new(), SceneId::next())
    }

    #[test]
    fn first_id_skips_reserved_ids() {
        let (mut arena, scene) = arena();
        let e = arena.allocate(scene);
        assert_eq!(e.id(), FIRST_ENTITY_ID);
        assert_eq!(arena.resolve(e.id()), e.key());
    }

    #[test]
    fn recycled_id_gets_a_fresh_key() {
        let (mut arena, scene) = arena();
        let a = arena.allocate(scene);
        let key_a = a.key().unwrap();
        assert!(arena.release(key_a));

        let b = arena.allocate(scene);
        assert_eq!(a.id(), b.id());
        assert_ne!(a, b, "recycled id must not alias the old handle");
        assert!(!arena.contains(key_a));
        assert!(arena.contains(b.key().unwrap()));
        assert_eq!(arena.resolve(b.id()), b.key());
    }

    #[test]
    fn free_ids_are_reused_fifo() {
        let (mut arena, scene) = arena();
        let a = arena.allocate(scene);
        let b = arena.allocate(scene);
        arena.release(a.key().unwrap());
        arena.release(b.key().unwrap());
        assert_eq!(arena.allocate(scene).id(), a.id());
        assert_eq!(arena.allocate(scene).id(), b.id());
    }

    #[test]
    fn reserved_ids_never_resolve() {
        let (mut arena, scene) = arena();
        arena.allocate(scene);
        assert_eq!(arena.resolve(BACKGROUND_ID), None);
        assert_eq!(arena.resolve(SENTINEL_ID), None);
        assert_eq!(arena.resolve(999), None);
    }

    #[test]
    fn double_release_is_rejected() {
        let (mut arena, scene) = arena();
        let key = arena.allocate(scene).key().unwrap();
        assert!(arena.release(key));
        assert!(!arena.release(key));
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn invalid_handle_has_no_key() {
        assert_eq!(Entity::INVALID.key(), None);
        assert!(!Entity::INVALID.is_valid());
        assert_eq!(format!("{:?}", Entity::INVALID), "Entity(INVALID)");
    }
}
