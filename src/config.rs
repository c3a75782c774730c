//! Table configuration.
//!
//! A [`TableConfig`] controls how a [`FuseTable`] is laid out. The defaults
//! suit most programs; tune them when many threads attach properties to
//! many short-lived owners at once.
//!
//! ```
//! use fused::TableConfig;
//!
//! let table = TableConfig::new().shards(64).sweep_floor(256).build();
//! assert_eq!(table.config().shard_count(), 64);
//! ```
//!
//! The process-wide table used by [`FuseExt`] can be configured once, before
//! its first use, with [`TableConfig::install_global`].
//!
//! [`FuseTable`]: crate::FuseTable
//! [`FuseExt`]: crate::FuseExt

use crate::{FuseTable, global};

/// Default number of shards.
pub const DEFAULT_SHARDS: usize = 16;

/// Default minimum shard size before an insertion sweeps dead owners.
pub const DEFAULT_SWEEP_FLOOR: usize = 64;

/// Builder for [`FuseTable`] layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableConfig {
    shards: usize,
    sweep_floor: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TableConfig {
    /// The default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            shards: DEFAULT_SHARDS,
            sweep_floor: DEFAULT_SWEEP_FLOOR,
        }
    }

    /// Sets the number of shards. Rounded up to a power of two, at least 1.
    ///
    /// Owners in different shards never contend on table access.
    #[must_use]
    pub const fn shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Sets the shard size at which inserting a new owner first removes the
    /// entries of dead owners. At least 1.
    ///
    /// Lower values reclaim memory sooner at the cost of more frequent scans.
    #[must_use]
    pub const fn sweep_floor(mut self, sweep_floor: usize) -> Self {
        self.sweep_floor = sweep_floor;
        self
    }

    /// The number of shards a table built from this configuration will have.
    #[must_use]
    pub const fn shard_count(&self) -> usize {
        let shards = if self.shards == 0 { 1 } else { self.shards };
        shards.next_power_of_two()
    }

    /// The effective sweep floor.
    #[must_use]
    pub const fn effective_sweep_floor(&self) -> usize {
        if self.sweep_floor == 0 { 1 } else { self.sweep_floor }
    }

    /// Builds a new table with this configuration.
    #[must_use]
    pub fn build(self) -> FuseTable {
        FuseTable::with_config(self)
    }

    /// Makes this the configuration of the process-wide table.
    ///
    /// # Errors
    ///
    /// Fails if the process-wide table already exists, either because it was
    /// installed before or because [`FuseTable::global`] was already called.
    /// The rejected configuration is handed back in the error.
    ///
    /// # Examples
    ///
    /// ```standalone_crate
    /// use fused::{FuseTable, TableConfig};
    ///
    /// TableConfig::new()
    ///     .shards(4)
    ///     .install_global()
    ///     .expect("global table already initialised");
    ///
    /// assert_eq!(FuseTable::global().config().shard_count(), 4);
    /// assert!(TableConfig::new().install_global().is_err());
    /// ```
    pub fn install_global(self) -> Result<(), GlobalTableInitializedError> {
        global::install(self)
    }
}

/// Error returned when configuring the process-wide table after it was
/// created.
///
/// Contains the configuration that was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalTableInitializedError(pub TableConfig);

impl core::fmt::Display for GlobalTableInitializedError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "the global fuse table is already initialised")
    }
}

impl core::error::Error for GlobalTableInitializedError {}
