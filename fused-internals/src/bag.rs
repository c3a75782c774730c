//! Per-owner property bags.
//!
//! A bag holds two namespaces that never overlap:
//!
//! - **named** slots keyed by property name, written by explicit and
//!   type-derived access;
//! - **cached** cells keyed by [`TypeId`], written only through
//!   [`CachedCell::get_or_init`].
//!
//! Every method takes the bag lock for the shortest possible time and
//! hands displaced values back to the caller, so no destructor or
//! constructor ever runs while the lock is held.

use alloc::borrow::Cow;
use core::{any::TypeId, fmt};

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;
use triomphe::Arc;

use crate::{
    identity::Liveness,
    slot::RawSlot,
    sync::{Once, RwLock},
};

type NamedSlots = HashMap<Cow<'static, str>, RawSlot, FxBuildHasher>;
type CachedCells = HashMap<TypeId, Arc<CachedCell>, FxBuildHasher>;

#[derive(Default)]
struct Slots {
    named: NamedSlots,
    cached: CachedCells,
}

/// The property bag of a single owner.
pub struct RawBag {
    liveness: Liveness,
    slots: RwLock<Slots>,
}

impl RawBag {
    /// Creates an empty bag guarded by `liveness`.
    #[must_use]
    pub fn new(liveness: Liveness) -> Self {
        Self {
            liveness,
            slots: RwLock::new(Slots::default()),
        }
    }

    /// Returns whether the owner of this bag still exists.
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }

    /// Returns the slot stored under `name`.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<RawSlot> {
        self.slots.read().named.get(name).cloned()
    }

    /// Stores `slot` under `name`, returning the slot it replaced.
    pub fn insert_named(&self, name: Cow<'static, str>, slot: RawSlot) -> Option<RawSlot> {
        self.slots.write().named.insert(name, slot)
    }

    /// Removes the slot stored under `name`.
    pub fn remove_named(&self, name: &str) -> Option<RawSlot> {
        self.slots.write().named.remove(name)
    }

    /// Returns the cached cell for `type_id`, creating an empty one if
    /// needed.
    ///
    /// Concurrent callers for the same `type_id` receive the same cell.
    #[must_use]
    pub fn cached_cell(&self, type_id: TypeId) -> Arc<CachedCell> {
        if let Some(cell) = self.slots.read().cached.get(&type_id) {
            return Arc::clone(cell);
        }

        let mut slots = self.slots.write();
        Arc::clone(
            slots
                .cached
                .entry(type_id)
                .or_insert_with(|| Arc::new(CachedCell::new())),
        )
    }

    /// Number of named slots.
    #[must_use]
    pub fn named_len(&self) -> usize {
        self.slots.read().named.len()
    }

    /// Number of cached cells, initialised or not.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.slots.read().cached.len()
    }
}

impl fmt::Debug for RawBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.read();
        f.debug_struct("RawBag")
            .field("liveness", &self.liveness)
            .field("named", &slots.named.len())
            .field("cached", &slots.cached.len())
            .finish()
    }
}

/// Storage for one lazily constructed value.
///
/// The cell is initialised at most once, even under concurrent first use.
pub struct CachedCell(Once<RawSlot>);

impl CachedCell {
    #[must_use]
    fn new() -> Self {
        Self(Once::new())
    }

    /// Returns the stored slot, running `init` if the cell is empty.
    ///
    /// `init` must not request the same cell again.
    pub fn get_or_init(&self, init: impl FnOnce() -> RawSlot) -> &RawSlot {
        self.0.get_or_init(init)
    }

    /// Returns the stored slot without initialising the cell.
    #[must_use]
    pub fn get(&self) -> Option<&RawSlot> {
        self.0.get()
    }
}

impl fmt::Debug for CachedCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CachedCell").field(&self.0.get()).finish()
    }
}
