//! Per-type component storage.
//!
//! Each component type lives in its own [`Column`], a [`SparseSecondaryMap`]
//! keyed by the [`EntityKey`] of the owning entity. Rows also remember their
//! owner handle so views can yield `(Entity, &T)` without a trip through the
//! arena.

use std::any::Any;

use slotmap::SparseSecondaryMap;

use crate::entity::{Entity, EntityKey};

/// Type-erased view of a column, used by entity destruction.
pub(crate) trait ComponentColumn: Any {
    fn remove_entity(&mut self, key: EntityKey) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Row<T> {
    owner: Entity,
    value: T,
}

pub(crate) struct Column<T> {
    rows: SparseSecondaryMap<EntityKey, Row<T>>,
}

impl<T> Column<T> {
    pub(crate) fn new() -> Self {
        Self {
            rows: SparseSecondaryMap::new(),
        }
    }

    #[inline]
    pub(crate) fn contains(&self, key: EntityKey) -> bool {
        self.rows.contains_key(key)
    }

    /// Inserts or replaces. Returns the previous value.
    pub(crate) fn insert(&mut self, key: EntityKey, owner: Entity, value: T) -> Option<T> {
        self.rows
            .insert(key, Row { owner, value })
            .map(|row| row.value)
    }

    pub(crate) fn remove(&mut self, key: EntityKey) -> Option<T> {
        self.rows.remove(key).map(|row| row.value)
    }

    #[inline]
    pub(crate) fn get(&self, key: EntityKey) -> Option<&T> {
        self.rows.get(key).map(|row| &row.value)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, key: EntityKey) -> Option<&mut T> {
        self.rows.get_mut(key).map(|row| &mut row.value)
    }

    /// Row of a handle taken from one of the scene's entity lists.
    #[inline]
    pub(crate) fn for_entity(&self, entity: Entity) -> Option<&T> {
        self.get(entity.key()?)
    }

    #[inline]
    pub(crate) fn for_entity_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.get_mut(entity.key()?)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.rows.values().map(|row| (row.owner, &row.value))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.rows
            .values_mut()
            .map(|row| (row.owner, &mut row.value))
    }
}

impl<T: 'static> ComponentColumn for Column<T> {
    fn remove_entity(&mut self, key: EntityKey) -> bool {
        self.remove(key).is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
