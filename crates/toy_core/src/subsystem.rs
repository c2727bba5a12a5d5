//! Subsystem Context
//!
//! A minimal dependency-injection container owning the engine's singleton
//! services (task queue, picking, editing, docking, ...).
//!
//! Every subsystem type claims one [`SubsystemSlot`] at compile time through
//! [`Subsystem::SLOT`]. Storage is a fixed array indexed by that slot, so a
//! lookup is a single index plus a downcast, and no runtime hash map is
//! involved. The [`TypeRegistry`] hash of each stored type is kept for
//! diagnostics and to detect two types claiming the same slot.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──initialize()──▶ Running ──dispose()──▶ Disposed
//! ```
//!
//! `add` / `get` / `remove` require `Running`. The context is one-shot: it
//! cannot be re-initialized once disposed. Subsystems are dropped in reverse
//! creation order.
//!
//! Registration is single-threaded and must happen before the frame loop
//! starts; the context is not designed for concurrent initialization.

use std::any::{Any, type_name};
use std::fmt;

use crate::errors::fatal;
use crate::type_registry::{TypeHash, TypeRegistry};

/// Compile-time enumerated storage slot of a subsystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum SubsystemSlot {
    Task,
    Picking,
    Editing,
    Docking,
    /// Slots reserved for application-defined subsystems.
    User0,
    User1,
    User2,
    User3,
}

impl SubsystemSlot {
    pub const COUNT: usize = 8;

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A process-wide singleton service stored in a [`SubsystemContext`].
pub trait Subsystem: Any {
    /// The slot this subsystem type occupies.
    const SLOT: SubsystemSlot;
}

/// Global lifecycle state of a [`SubsystemContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextState {
    Idle,
    Running,
    Disposed,
}

struct Entry {
    hash: TypeHash,
    name: &'static str,
    instance: Box<dyn Any>,
}

/// Owner of every registered subsystem.
pub struct SubsystemContext {
    state: ContextState,
    slots: [Option<Entry>; SubsystemSlot::COUNT],
    creation_order: Vec<SubsystemSlot>,
    types: TypeRegistry,
}

impl SubsystemContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ContextState::Idle,
            slots: std::array::from_fn(|_| None),
            creation_order: Vec::new(),
            types: TypeRegistry::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> ContextState {
        self.state
    }

    /// Transitions `Idle → Running`.
    #[track_caller]
    pub fn initialize(&mut self) {
        match self.state {
            ContextState::Idle => {
                self.state = ContextState::Running;
                log::info!("Subsystem context initialized");
            }
            ContextState::Running => fatal("SubsystemContext::initialize called twice"),
            ContextState::Disposed => {
                fatal("SubsystemContext cannot be re-initialized after dispose");
            }
        }
    }

    /// Drops every subsystem in reverse creation order and transitions to
    /// `Disposed`. Calling it again is a no-op.
    pub fn dispose(&mut self) {
        if self.state == ContextState::Disposed {
            return;
        }

        while let Some(slot) = self.creation_order.pop() {
            if let Some(entry) = self.slots[slot.index()].take() {
                log::debug!("Disposing subsystem '{}'", entry.name);
                drop(entry);
            }
        }

        self.state = ContextState::Disposed;
        log::info!("Subsystem context disposed");
    }

    /// Stores `instance` as the single instance of `S`.
    ///
    /// Fatal if `S` is already present or the context is not running.
    #[track_caller]
    pub fn add<S: Subsystem>(&mut self, instance: S) -> &mut S {
        self.ensure_vacant::<S>();
        self.insert(instance)
    }

    /// Like [`add`](Self::add), but constructs the instance with access to the
    /// subsystems registered so far. The slot is checked before `build` runs.
    #[track_caller]
    pub fn add_with<S, F>(&mut self, build: F) -> &mut S
    where
        S: Subsystem,
        F: FnOnce(&mut Self) -> S,
    {
        self.ensure_vacant::<S>();
        let instance = build(self);
        self.ensure_vacant::<S>();
        self.insert(instance)
    }

    #[track_caller]
    pub fn get<S: Subsystem>(&self) -> &S {
        self.ensure_running("get", type_name::<S>());
        match self.slots[S::SLOT.index()].as_ref() {
            Some(entry) => Self::downcast_ref::<S>(entry),
            None => fatal(&format!("Subsystem '{}' is not registered", type_name::<S>())),
        }
    }

    #[track_caller]
    pub fn get_mut<S: Subsystem>(&mut self) -> &mut S {
        self.ensure_running("get_mut", type_name::<S>());
        match self.slots[S::SLOT.index()].as_mut() {
            Some(entry) => Self::downcast_mut::<S>(entry),
            None => fatal(&format!("Subsystem '{}' is not registered", type_name::<S>())),
        }
    }

    /// Mutable access to two distinct subsystems at once.
    #[track_caller]
    pub fn get2_mut<A: Subsystem, B: Subsystem>(&mut self) -> (&mut A, &mut B) {
        self.ensure_running("get2_mut", type_name::<A>());
        let Ok([a, b]) = self
            .slots
            .get_disjoint_mut([A::SLOT.index(), B::SLOT.index()])
        else {
            fatal(&format!(
                "get2_mut requires two distinct subsystems, got '{}' twice",
                type_name::<A>()
            ));
        };

        let (Some(a), Some(b)) = (a.as_mut(), b.as_mut()) else {
            fatal(&format!(
                "Subsystems '{}' and '{}' must both be registered",
                type_name::<A>(),
                type_name::<B>()
            ));
        };

        (Self::downcast_mut::<A>(a), Self::downcast_mut::<B>(b))
    }

    /// Non-fatal lookup. Returns `None` when absent or when the context is not
    /// running.
    #[must_use]
    pub fn try_get<S: Subsystem>(&self) -> Option<&S> {
        if self.state != ContextState::Running {
            return None;
        }
        self.slots[S::SLOT.index()]
            .as_ref()
            .and_then(|entry| entry.instance.downcast_ref::<S>())
    }

    /// Destroys the instance of `S`.
    ///
    /// No-op once the context is disposed, fatal if `S` is absent.
    #[track_caller]
    pub fn remove<S: Subsystem>(&mut self) {
        if self.state == ContextState::Disposed {
            return;
        }
        self.ensure_running("remove", type_name::<S>());

        let slot = S::SLOT;
        let Some(entry) = self.slots[slot.index()].take() else {
            fatal(&format!("Subsystem '{}' is not registered", type_name::<S>()));
        };
        if !entry.instance.is::<S>() {
            let name = entry.name;
            self.slots[slot.index()] = Some(entry);
            fatal(&format!(
                "Slot {slot:?} holds '{name}', not '{}'",
                type_name::<S>()
            ));
        }

        self.creation_order.retain(|s| *s != slot);
        log::debug!("Removed subsystem '{}'", entry.name);
    }

    /// Returns `true` if `S` is present.
    #[must_use]
    pub fn has<S: Subsystem>(&self) -> bool {
        self.slots[S::SLOT.index()]
            .as_ref()
            .is_some_and(|entry| entry.instance.is::<S>())
    }

    /// Returns `true` only if every subsystem of the tuple `T` is present.
    #[must_use]
    pub fn has_all<T: SubsystemSet>(&self) -> bool {
        T::all_present(self)
    }

    /// Registered subsystem type names in creation order.
    #[must_use]
    pub fn creation_order(&self) -> Vec<&'static str> {
        self.creation_order
            .iter()
            .filter_map(|slot| self.slots[slot.index()].as_ref().map(|e| e.name))
            .collect()
    }

    /// Name of the type registered under `hash`, if any.
    #[must_use]
    pub fn type_name_of(&self, hash: TypeHash) -> Option<&'static str> {
        self.types.name_of(hash)
    }

    // ------------------------------------------------------------------------

    #[track_caller]
    fn ensure_running(&self, op: &str, name: &str) {
        if self.state != ContextState::Running {
            fatal(&format!(
                "SubsystemContext::{op}::<{name}> called while context is {:?}",
                self.state
            ));
        }
    }

    #[track_caller]
    fn ensure_vacant<S: Subsystem>(&self) {
        self.ensure_running("add", type_name::<S>());
        if let Some(existing) = &self.slots[S::SLOT.index()] {
            if existing.instance.is::<S>() {
                fatal(&format!(
                    "Subsystem '{}' is already registered",
                    type_name::<S>()
                ));
            }
            fatal(&format!(
                "Slot {:?} requested by '{}' is already claimed by '{}'",
                S::SLOT,
                type_name::<S>(),
                existing.name
            ));
        }
    }

    fn insert<S: Subsystem>(&mut self, instance: S) -> &mut S {
        let hash = self.types.register::<S>();
        let name = type_name::<S>();
        log::info!("Registered subsystem '{name}' ({hash:?})");

        self.creation_order.push(S::SLOT);
        let entry = self.slots[S::SLOT.index()].insert(Entry {
            hash,
            name,
            instance: Box::new(instance),
        });
        Self::downcast_mut::<S>(entry)
    }

    #[track_caller]
    fn downcast_ref<S: Subsystem>(entry: &Entry) -> &S {
        match entry.instance.downcast_ref::<S>() {
            Some(s) => s,
            None => fatal(&format!(
                "Slot {:?} holds '{}' ({:?}), not '{}'",
                S::SLOT,
                entry.name,
                entry.hash,
                type_name::<S>()
            )),
        }
    }

    #[track_caller]
    fn downcast_mut<S: Subsystem>(entry: &mut Entry) -> &mut S {
        let (name, hash) = (entry.name, entry.hash);
        match entry.instance.downcast_mut::<S>() {
            Some(s) => s,
            None => fatal(&format!(
                "Slot {:?} holds '{name}' ({hash:?}), not '{}'",
                S::SLOT,
                type_name::<S>()
            )),
        }
    }
}

impl Default for SubsystemContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SubsystemContext {
    fn drop(&mut self) {
        if self.state == ContextState::Running {
            self.dispose();
        }
    }
}

impl fmt::Debug for SubsystemContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubsystemContext")
            .field("state", &self.state)
            .field("subsystems", &self.creation_order())
            .finish()
    }
}

/// A tuple of subsystem types, used by [`SubsystemContext::has_all`].
pub trait SubsystemSet {
    fn all_present(ctx: &SubsystemContext) -> bool;
}

macro_rules! impl_subsystem_set {
    ($($name:ident),+) => {
        impl<$($name: Subsystem),+> SubsystemSet for ($($name,)+) {
            fn all_present(ctx: &SubsystemContext) -> bool {
                $(ctx.has::<$name>())&&+
            }
        }
    };
}

impl_subsystem_set!(A);
impl_subsystem_set!(A, B);
impl_subsystem_set!(A, B, C);
impl_subsystem_set!(A, B, C, D);
impl_subsystem_set!(A, B, C, D, E);

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    struct Counter(u32);
    impl Subsystem for Counter {
        const SLOT: SubsystemSlot = SubsystemSlot::User0;
    }

    struct Other;
    impl Subsystem for Other {
        const SLOT: SubsystemSlot = SubsystemSlot::User1;
    }

    struct Impostor;
    impl Subsystem for Impostor {
        const SLOT: SubsystemSlot = SubsystemSlot::User0;
    }

    struct DropLogger {
        label: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
    }
    impl Drop for DropLogger {
        fn drop(&mut self) {
            self.log.borrow_mut().push(self.label);
        }
    }

    struct TrackedA(DropLogger);
    impl Subsystem for TrackedA {
        const SLOT: SubsystemSlot = SubsystemSlot::User2;
    }
    struct TrackedB(DropLogger);
    impl Subsystem for TrackedB {
        const SLOT: SubsystemSlot = SubsystemSlot::User3;
    }

    fn running() -> SubsystemContext {
        let mut ctx = SubsystemContext::new();
        ctx.initialize();
        ctx
    }

    #[test]
    fn add_then_get() {
        let mut ctx = running();
        ctx.add(Counter(3)).0 += 1;
        assert_eq!(ctx.get::<Counter>().0, 4);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_add_is_fatal() {
        let mut ctx = running();
        ctx.add(Counter(0));
        ctx.add(Counter(1));
    }

    #[test]
    #[should_panic(expected = "already claimed")]
    fn slot_collision_is_fatal() {
        let mut ctx = running();
        ctx.add(Counter(0));
        ctx.add(Impostor);
    }

    #[test]
    #[should_panic(expected = "Idle")]
    fn get_before_initialize_is_fatal() {
        let ctx = SubsystemContext::new();
        let _ = ctx.get::<Counter>();
    }

    #[test]
    #[should_panic(expected = "not registered")]
    fn get_unregistered_is_fatal() {
        let ctx = running();
        let _ = ctx.get::<Counter>();
    }

    #[test]
    fn has_all_requires_every_type() {
        let mut ctx = running();
        ctx.add(Counter(0));
        assert!(ctx.has::<Counter>());
        assert!(ctx.has_all::<(Counter,)>());
        assert!(!ctx.has_all::<(Counter, Other)>());
        ctx.add(Other);
        assert!(ctx.has_all::<(Counter, Other)>());
    }

    #[test]
    fn remove_after_dispose_is_noop() {
        let mut ctx = running();
        ctx.add(Counter(0));
        ctx.dispose();
        ctx.remove::<Counter>();
        assert_eq!(ctx.state(), ContextState::Disposed);
    }

    #[test]
    #[should_panic(expected = "not registered")]
    fn remove_missing_is_fatal() {
        let mut ctx = running();
        ctx.remove::<Counter>();
    }

    #[test]
    #[should_panic(expected = "re-initialized")]
    fn reinitialize_after_dispose_is_fatal() {
        let mut ctx = running();
        ctx.dispose();
        ctx.initialize();
    }

    #[test]
    fn dispose_drops_in_reverse_creation_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut ctx = running();
        ctx.add(TrackedA(DropLogger { label: "a", log: log.clone() }));
        ctx.add(TrackedB(DropLogger { label: "b", log: log.clone() }));
        ctx.dispose();
        assert_eq!(*log.borrow(), vec!["b", "a"]);
    }

    #[test]
    fn get2_mut_borrows_both() {
        let mut ctx = running();
        ctx.add(Counter(1));
        ctx.add(Other);
        let (counter, _other) = ctx.get2_mut::<Counter, Other>();
        counter.0 = 7;
        assert_eq!(ctx.get::<Counter>().0, 7);
    }

    #[test]
    fn add_with_sees_earlier_subsystems() {
        let mut ctx = running();
        ctx.add(Counter(5));
        ctx.add_with(|ctx| {
            assert_eq!(ctx.get::<Counter>().0, 5);
            Other
        });
        assert_eq!(ctx.creation_order().len(), 2);
    }
}
