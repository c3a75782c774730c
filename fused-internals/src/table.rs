//! The sharded owner table.
//!
//! Owners are distributed across a power-of-two number of shards by their
//! [`Identity`]. A shard lock is only held to find, insert or remove a bag
//! handle; slot reads and writes then go through the bag's own lock, so
//! operations on different owners only meet on that short shard access.
//!
//! # Reclamation
//!
//! Entries whose owner has died are removed in three ways:
//!
//! - [`RawTable::remove`] drops one owner's bag immediately;
//! - [`RawTable::sweep`] scans every shard;
//! - inserting a bag into a shard whose length has reached its sweep
//!   threshold sweeps that shard first. The threshold is then reset to
//!   twice the number of surviving entries, bounded below by the configured
//!   floor, which keeps the cost amortized constant per insertion.
//!
//! Removed bags are always dropped after the shard lock is released.

use alloc::{boxed::Box, vec::Vec};
use core::{fmt, hash::BuildHasher};

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;
use triomphe::Arc;

use crate::{
    bag::RawBag,
    identity::{Identity, Liveness},
    sync::RwLock,
};

struct ShardMap {
    entries: HashMap<Identity, Arc<RawBag>, FxBuildHasher>,
    sweep_at: usize,
}

impl ShardMap {
    /// Moves the bags of dead owners out of the map.
    fn take_dead(&mut self, floor: usize) -> Vec<Arc<RawBag>> {
        let dead: Vec<_> = self
            .entries
            .extract_if(|_, bag| !bag.is_alive())
            .map(|(_, bag)| bag)
            .collect();
        self.sweep_at = floor.max(self.entries.len().saturating_mul(2));
        dead
    }
}

/// Identity-keyed table of property bags.
pub struct RawTable {
    shards: Box<[RwLock<ShardMap>]>,
    mask: usize,
    sweep_floor: usize,
}

impl RawTable {
    /// Creates a table with `shards` shards (rounded up to a power of two)
    /// and the given minimum sweep threshold.
    #[must_use]
    pub fn new(shards: usize, sweep_floor: usize) -> Self {
        let shard_count = shards.max(1).next_power_of_two();
        let sweep_floor = sweep_floor.max(1);
        let shards = (0..shard_count)
            .map(|_| {
                RwLock::new(ShardMap {
                    entries: HashMap::with_hasher(FxBuildHasher),
                    sweep_at: sweep_floor,
                })
            })
            .collect();

        Self {
            shards,
            mask: shard_count - 1,
            sweep_floor,
        }
    }

    /// Number of shards.
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// The configured minimum sweep threshold.
    #[must_use]
    pub fn sweep_floor(&self) -> usize {
        self.sweep_floor
    }

    #[inline]
    fn shard(&self, identity: Identity) -> &RwLock<ShardMap> {
        // Allocation addresses share their low bits, so hash before masking.
        let index = (FxBuildHasher.hash_one(identity) as usize) & self.mask;
        &self.shards[index]
    }

    /// Returns the bag of `identity` without creating one.
    #[must_use]
    pub fn get(&self, identity: Identity) -> Option<Arc<RawBag>> {
        self.shard(identity).read().entries.get(&identity).cloned()
    }

    /// Returns the bag of `identity`, creating it with the liveness token
    /// produced by `liveness` if it does not exist yet.
    pub fn get_or_insert(
        &self,
        identity: Identity,
        liveness: impl FnOnce() -> Liveness,
    ) -> Arc<RawBag> {
        let shard = self.shard(identity);
        if let Some(bag) = shard.read().entries.get(&identity) {
            return Arc::clone(bag);
        }

        let mut reclaimed = Vec::new();
        let bag = {
            let mut map = shard.write();
            if let Some(bag) = map.entries.get(&identity) {
                Arc::clone(bag)
            } else {
                if map.entries.len() >= map.sweep_at {
                    reclaimed = map.take_dead(self.sweep_floor);
                    tracing::debug!(
                        reclaimed = reclaimed.len(),
                        remaining = map.entries.len(),
                        "swept shard before insert"
                    );
                }
                let bag = Arc::new(RawBag::new(liveness()));
                map.entries.insert(identity, Arc::clone(&bag));
                tracing::trace!(owner = ?identity, "created property bag");
                bag
            }
        };
        drop(reclaimed);
        bag
    }

    /// Removes the bag of `identity`, returning it.
    pub fn remove(&self, identity: Identity) -> Option<Arc<RawBag>> {
        let removed = self.shard(identity).write().entries.remove(&identity);
        if removed.is_some() {
            tracing::trace!(owner = ?identity, "detached property bag");
        }
        removed
    }

    /// Removes every entry whose owner has died and returns how many were
    /// removed.
    pub fn sweep(&self) -> usize {
        let mut reclaimed = 0;
        for shard in self.shards.iter() {
            let dead = shard.write().take_dead(self.sweep_floor);
            reclaimed += dead.len();
        }
        if reclaimed > 0 {
            tracing::debug!(reclaimed, remaining = self.len(), "swept table");
        }
        reclaimed
    }

    /// Number of entries, including dead ones that have not been swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().entries.len()).sum()
    }

    /// Returns whether the table holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().entries.is_empty())
    }
}

impl fmt::Debug for RawTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawTable")
            .field("shards", &self.shards.len())
            .field("sweep_floor", &self.sweep_floor)
            .field("entries", &self.len())
            .finish()
    }
}
