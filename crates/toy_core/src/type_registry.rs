//! Type Registry
//!
//! Maps a compile-time type to a stable runtime identifier ([`TypeHash`]).
//!
//! The hash is the xxh3 digest of the type's fully qualified name, so it is
//! stable for a given build and readable in logs through [`TypeRegistry::name_of`].
//! Every registration also records the [`TypeId`] so that two distinct types
//! hashing to the same value are caught instead of silently aliasing.

use std::any::{TypeId, type_name};
use std::fmt;

use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::xxh3_64;

use crate::errors::fatal;

/// Stable runtime identifier of a Rust type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHash(u64);

impl TypeHash {
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

/// Computes the [`TypeHash`] of `T` without registering it.
#[inline]
#[must_use]
pub fn type_hash<T: ?Sized + 'static>() -> TypeHash {
    TypeHash(xxh3_64(type_name::<T>().as_bytes()))
}

#[derive(Debug, Clone, Copy)]
struct TypeRecord {
    id: TypeId,
    name: &'static str,
}

/// Registry of every type hashed so far.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    records: FxHashMap<TypeHash, TypeRecord>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` and returns its hash.
    ///
    /// Registering the same type again is a no-op. A different type producing
    /// the same hash is a fatal error.
    pub fn register<T: ?Sized + 'static>(&mut self) -> TypeHash {
        let hash = type_hash::<T>();
        let record = TypeRecord {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        };

        match self.records.get(&hash) {
            Some(existing) if existing.id != record.id => fatal(&format!(
                "Type hash collision: '{}' and '{}' both hash to {hash:?}",
                existing.name, record.name
            )),
            Some(_) => {}
            None => {
                self.records.insert(hash, record);
            }
        }

        hash
    }

    /// Returns the type name behind a registered hash.
    #[must_use]
    pub fn name_of(&self, hash: TypeHash) -> Option<&'static str> {
        self.records.get(&hash).map(|r| r.name)
    }

    #[must_use]
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.records
            .get(&type_hash::<T>())
            .is_some_and(|r| r.id == TypeId::of::<T>())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Alpha;
    struct Beta;

    #[test]
    fn hash_is_stable_per_type() {
        assert_eq!(type_hash::<Alpha>(), type_hash::<Alpha>());
        assert_ne!(type_hash::<Alpha>(), type_hash::<Beta>());
    }

    #[test]
    fn register_records_name() {
        let mut registry = TypeRegistry::new();
        let hash = registry.register::<Alpha>();
        assert!(registry.contains::<Alpha>());
        assert!(!registry.contains::<Beta>());
        assert!(registry.name_of(hash).unwrap().ends_with("Alpha"));
    }

    #[test]
    fn register_twice_is_idempotent() {
        let mut registry = TypeRegistry::new();
        let a = registry.register::<Alpha>();
        let b = registry.register::<Alpha>();
        assert_eq!(a, b);
        assert_eq!(registry.len(), 1);
    }
}
