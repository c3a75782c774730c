//! The attachment store.
//!
//! A [`FuseTable`] maps owner identities to property bags. Every bag has two
//! namespaces:
//!
//! - **named** slots, written by [`set_named`](FuseTable::set_named) and
//!   [`set_typed`](FuseTable::set_typed). Typed access is named access under
//!   [`property_name::<T>()`](property_name).
//! - **cached** cells, one per type, written only by
//!   [`cached`](FuseTable::cached) and [`cached_with`](FuseTable::cached_with).
//!
//! The two namespaces are separate maps, so a named or typed property can
//! never alias a cached one, whatever name it is stored under.
//!
//! # Reading
//!
//! Reads are type-checked. A slot holding a `u32` read as a `String` behaves
//! exactly as if the slot were empty. Reads never create a bag.
//!
//! # Lifetimes
//!
//! The table never holds a strong reference to an owner. When an owner dies,
//! its bag stays in the table until one of the following removes it:
//!
//! - [`detach`](FuseTable::detach), called while the owner is still alive;
//! - [`sweep`](FuseTable::sweep);
//! - the automatic sweep that runs when a shard fills up with new owners
//!   (see [`TableConfig::sweep_floor`]).
//!
//! Attached values are dropped when their bag is removed, or earlier if they
//! are overwritten or removed, unless callers still hold handles to them.
//! A value that itself holds a strong handle to its owner keeps the owner
//! alive, and with it the value.

use alloc::{borrow::Cow, sync::Arc};
use core::any::{Any, TypeId, type_name};

use fused_internals::{RawSlot, RawTable};

use crate::{config::TableConfig, global, lookup_error::LookupError, owner::Owner};

/// The property name used by typed access for values of type `T`.
///
/// This is [`core::any::type_name`], so it is stable within one build of a
/// program but not across compiler versions. Two distinct types that happen
/// to print the same name share a slot; reads stay type-checked, so the
/// wrong type is never returned.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use fused::{FuseTable, property_name};
///
/// let table = FuseTable::new();
/// let owner = Arc::new(());
/// table.set_typed(&owner, 7_u16);
///
/// assert_eq!(property_name::<u16>(), "u16");
/// assert_eq!(table.get_named::<u16>(&owner, property_name::<u16>()).as_deref(), Some(&7));
/// ```
#[must_use]
pub fn property_name<T: ?Sized>() -> &'static str {
    type_name::<T>()
}

/// An identity-keyed, weakly held store of properties.
///
/// Most programs use the process-wide table through [`FuseExt`]; create a
/// table of your own when the properties should go away with some scope.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use fused::FuseTable;
///
/// #[derive(Default)]
/// struct Visits(std::sync::atomic::AtomicUsize);
///
/// let table = FuseTable::new();
/// let page: Arc<str> = Arc::from("/index.html");
///
/// table.set_named(&page, "title", String::from("Home"));
/// assert_eq!(table.get_named::<String>(&page, "title").as_deref().map(String::as_str), Some("Home"));
/// assert!(table.get_named::<i32>(&page, "title").is_none());
///
/// let visits = table.cached::<Visits>(&page);
/// visits.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
/// assert!(Arc::ptr_eq(&visits, &table.cached::<Visits>(&page)));
/// ```
///
/// [`FuseExt`]: crate::FuseExt
pub struct FuseTable {
    raw: RawTable,
    config: TableConfig,
}

impl Default for FuseTable {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for FuseTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FuseTable")
            .field("config", &self.config)
            .field("tracked_owners", &self.raw.len())
            .finish()
    }
}

impl FuseTable {
    /// Creates an empty table with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TableConfig::new())
    }

    /// Creates an empty table with the given configuration.
    #[must_use]
    pub fn with_config(config: TableConfig) -> Self {
        Self {
            raw: RawTable::new(config.shard_count(), config.effective_sweep_floor()),
            config,
        }
    }

    /// The process-wide table.
    ///
    /// Created with the default configuration on first use, unless
    /// [`TableConfig::install_global`] ran first.
    #[must_use]
    pub fn global() -> &'static Self {
        global::table()
    }

    /// The configuration this table was created with.
    #[must_use]
    pub fn config(&self) -> TableConfig {
        self.config
    }

    /// Attaches `value` to `owner` under `name`, replacing any value stored
    /// under that name.
    ///
    /// The replaced value is dropped after the table's locks are released.
    pub fn set_named<V>(
        &self,
        owner: &(impl Owner + ?Sized),
        name: impl Into<Cow<'static, str>>,
        value: V,
    ) where
        V: Any + Send + Sync,
    {
        self.set_named_shared(owner, name, Arc::new(value));
    }

    /// Like [`set_named`](Self::set_named), for a value that is already
    /// shared. Later reads return handles to this same allocation.
    pub fn set_named_shared<V>(
        &self,
        owner: &(impl Owner + ?Sized),
        name: impl Into<Cow<'static, str>>,
        value: Arc<V>,
    ) where
        V: Any + Send + Sync,
    {
        let bag = self.raw.get_or_insert(owner.identity(), || owner.liveness());
        let _replaced = bag.insert_named(name.into(), RawSlot::new(value));
    }

    /// Returns the value attached to `owner` under `name`, if there is one
    /// and it is a `V`.
    ///
    /// Never creates a bag for `owner`.
    #[must_use]
    pub fn get_named<V>(&self, owner: &(impl Owner + ?Sized), name: &str) -> Option<Arc<V>>
    where
        V: Any + Send + Sync,
    {
        self.try_get_named(owner, name).ok()
    }

    /// Like [`get_named`](Self::get_named), but explains a miss.
    ///
    /// # Errors
    ///
    /// - [`LookupError::NoProperty`] if nothing is attached under `name`.
    /// - [`LookupError::TypeMismatch`] if the attached value is not a `V`.
    pub fn try_get_named<V>(
        &self,
        owner: &(impl Owner + ?Sized),
        name: &str,
    ) -> Result<Arc<V>, LookupError>
    where
        V: Any + Send + Sync,
    {
        let slot = self
            .raw
            .get(owner.identity())
            .and_then(|bag| bag.named(name))
            .ok_or_else(LookupError::no_property::<V>)?;

        slot.downcast::<V>()
            .ok_or_else(|| LookupError::type_mismatch::<V>(slot.type_name()))
    }

    /// Removes the value attached to `owner` under `name`.
    ///
    /// Returns whether a value was removed. Reading the name afterwards
    /// yields nothing, exactly as if it had never been set.
    pub fn remove_named(&self, owner: &(impl Owner + ?Sized), name: &str) -> bool {
        self.raw
            .get(owner.identity())
            .and_then(|bag| bag.remove_named(name))
            .is_some()
    }

    /// Attaches `value` under the name derived from `V`.
    ///
    /// An owner holds at most one typed value per type; setting another
    /// replaces it.
    pub fn set_typed<V>(&self, owner: &(impl Owner + ?Sized), value: V)
    where
        V: Any + Send + Sync,
    {
        self.set_named(owner, property_name::<V>(), value);
    }

    /// Returns the value attached under the name derived from `V`.
    #[must_use]
    pub fn get_typed<V>(&self, owner: &(impl Owner + ?Sized)) -> Option<Arc<V>>
    where
        V: Any + Send + Sync,
    {
        self.get_named(owner, property_name::<V>())
    }

    /// Like [`get_typed`](Self::get_typed), but explains a miss.
    ///
    /// # Errors
    ///
    /// See [`try_get_named`](Self::try_get_named).
    pub fn try_get_typed<V>(&self, owner: &(impl Owner + ?Sized)) -> Result<Arc<V>, LookupError>
    where
        V: Any + Send + Sync,
    {
        self.try_get_named(owner, property_name::<V>())
    }

    /// Removes the value attached under the name derived from `V`.
    pub fn remove_typed<V>(&self, owner: &(impl Owner + ?Sized)) -> bool
    where
        V: Any,
    {
        self.remove_named(owner, property_name::<V>())
    }

    /// Returns the `T` cached on `owner`, creating it with
    /// [`Default::default`] on first use.
    ///
    /// Every call for the same owner and type returns the same instance for
    /// as long as the owner lives. Concurrent first calls construct exactly
    /// one `T` and all receive it.
    ///
    /// Cached values live apart from named and typed values:
    /// `set_typed::<T>` and `cached::<T>` on the same owner never see each
    /// other's value.
    ///
    /// # Deadlocks
    ///
    /// `T::default` may use the table freely, except to request the same
    /// `T` for the same owner, which would wait for itself.
    pub fn cached<T>(&self, owner: &(impl Owner + ?Sized)) -> Arc<T>
    where
        T: Any + Send + Sync + Default,
    {
        self.cached_with(owner, T::default)
    }

    /// Like [`cached`](Self::cached), constructing the value with `init`
    /// when it does not exist yet.
    ///
    /// `init` is not called when a value is already cached.
    pub fn cached_with<T>(&self, owner: &(impl Owner + ?Sized), init: impl FnOnce() -> T) -> Arc<T>
    where
        T: Any + Send + Sync,
    {
        let bag = self.raw.get_or_insert(owner.identity(), || owner.liveness());
        let cell = bag.cached_cell(TypeId::of::<T>());
        let slot = cell.get_or_init(|| {
            tracing::trace!(
                owner = ?owner.identity(),
                ty = type_name::<T>(),
                "constructing cached value"
            );
            RawSlot::new(Arc::new(init()))
        });

        slot.downcast::<T>()
            .expect("cached cells are keyed by the TypeId of their value")
    }

    /// Removes every property of `owner`, dropping the values immediately.
    ///
    /// Call this from an owner's teardown path to release its properties
    /// without waiting for a sweep. Returns whether `owner` had a bag.
    /// Writes racing with the detach may land in the discarded bag.
    pub fn detach(&self, owner: &(impl Owner + ?Sized)) -> bool {
        self.raw.remove(owner.identity()).is_some()
    }

    /// Drops the bags of all owners that have died, returning how many were
    /// removed.
    pub fn sweep(&self) -> usize {
        self.raw.sweep()
    }

    /// The number of owners the table currently holds a bag for, including
    /// dead owners that have not been swept yet.
    #[must_use]
    pub fn tracked_owners(&self) -> usize {
        self.raw.len()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec::Vec};
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default, Debug)]
    struct Counter(AtomicUsize);

    #[derive(Debug, PartialEq)]
    struct Person {
        first_name: String,
    }

    fn person(name: &str) -> Person {
        Person {
            first_name: String::from(name),
        }
    }

    #[test]
    fn test_named_round_trip() {
        let table = FuseTable::new();
        let owner = Arc::new(());
        table.set_named(&owner, "Test", "Value");
        assert_eq!(table.get_named::<&str>(&owner, "Test").as_deref(), Some(&"Value"));
    }

    #[test]
    fn test_unassigned_property_is_none() {
        let table = FuseTable::new();
        let owner = Arc::new(());
        assert!(table.get_named::<String>(&owner, "Invalid").is_none());
        assert_eq!(table.tracked_owners(), 0);
    }

    #[test]
    fn test_type_mismatch_is_none() {
        let table = FuseTable::new();
        let owner = Arc::new(());
        table.set_named(&owner, "StringProperty", String::from("StringValue"));

        assert!(table.get_named::<Option<i32>>(&owner, "StringProperty").is_none());
        assert!(table.get_named::<i32>(&owner, "StringProperty").is_none());
        assert_eq!(
            table.try_get_named::<i32>(&owner, "StringProperty"),
            Err(LookupError::type_mismatch::<i32>(type_name::<String>()))
        );
        assert!(table.get_named::<String>(&owner, "StringProperty").is_some());
    }

    #[test]
    fn test_set_named_is_idempotent() {
        let table = FuseTable::new();
        let owner = Arc::new(());
        table.set_named(&owner, "k", 1_u8);
        table.set_named(&owner, "k", 1_u8);
        assert_eq!(table.get_named::<u8>(&owner, "k").as_deref(), Some(&1));
        assert_eq!(table.tracked_owners(), 1);
    }

    #[test]
    fn test_owned_names() {
        let table = FuseTable::new();
        let owner = Arc::new(());
        for i in 0..4_u32 {
            table.set_named(&owner, alloc::format!("slot-{i}"), i);
        }
        let values: Vec<_> = (0..4_u32)
            .filter_map(|i| table.get_named::<u32>(&owner, &alloc::format!("slot-{i}")))
            .map(|v| *v)
            .collect();
        assert_eq!(values, [0, 1, 2, 3]);
    }

    #[test]
    fn test_set_named_shared_returns_same_allocation() {
        let table = FuseTable::new();
        let owner = Arc::new(());
        let value = Arc::new(person("Grace"));
        table.set_named_shared(&owner, "p", Arc::clone(&value));

        let read = table.get_named::<Person>(&owner, "p");
        assert!(read.is_some_and(|read| Arc::ptr_eq(&read, &value)));
    }

    #[test]
    fn test_remove_named() {
        let table = FuseTable::new();
        let owner = Arc::new(());
        assert!(!table.remove_named(&owner, "k"));

        table.set_named(&owner, "k", 5_i64);
        assert!(table.remove_named(&owner, "k"));
        assert!(table.get_named::<i64>(&owner, "k").is_none());
        assert_eq!(
            table.try_get_named::<i64>(&owner, "k"),
            Err(LookupError::no_property::<i64>())
        );
    }

    #[test]
    fn test_typed_overwrite() {
        let table = FuseTable::new();
        let owner = Arc::new(());
        table.set_typed(&owner, person("Brendan"));
        assert_eq!(table.get_typed::<Person>(&owner).as_deref(), Some(&person("Brendan")));

        table.set_typed(&owner, person("Roberto"));
        assert_eq!(table.get_typed::<Person>(&owner).as_deref(), Some(&person("Roberto")));

        assert!(table.remove_typed::<Person>(&owner));
        assert!(table.get_typed::<Person>(&owner).is_none());
    }

    #[test]
    fn test_typed_is_named_under_type_name() {
        let table = FuseTable::new();
        let owner = Arc::new(());
        table.set_named(&owner, property_name::<u32>(), 11_u32);
        assert_eq!(table.get_typed::<u32>(&owner).as_deref(), Some(&11));
        assert_eq!(
            table.try_get_typed::<u64>(&owner),
            Err(LookupError::no_property::<u64>())
        );
    }

    #[test]
    fn test_cached_returns_same_instance() {
        let table = FuseTable::new();
        let owner = Arc::new(());
        let first = table.cached::<Counter>(&owner);
        let second = table.cached::<Counter>(&owner);
        assert!(Arc::ptr_eq(&first, &second));

        first.0.fetch_add(3, Ordering::Relaxed);
        assert_eq!(second.0.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_cached_distinct_owners() {
        let table = FuseTable::new();
        let a = Arc::new(1_u8);
        let b = Arc::new(1_u8);
        assert!(!Arc::ptr_eq(&table.cached::<Counter>(&a), &table.cached::<Counter>(&b)));
    }

    #[test]
    fn test_cached_with_runs_init_once() {
        let table = FuseTable::new();
        let owner = Arc::new(());
        let mut calls = 0;
        let first = table.cached_with(&owner, || {
            calls += 1;
            person("Grace")
        });
        let second = table.cached_with(&owner, || {
            calls += 1;
            person("Ada")
        });
        assert_eq!(calls, 1);
        assert_eq!(first.first_name, "Grace");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_cached_and_typed_namespaces_are_separate() {
        let table = FuseTable::new();
        let owner = Arc::new(());

        table.set_typed(&owner, Counter(AtomicUsize::new(10)));
        let cached = table.cached::<Counter>(&owner);
        assert_eq!(cached.0.load(Ordering::Relaxed), 0);

        cached.0.store(99, Ordering::Relaxed);
        let typed = table.get_typed::<Counter>(&owner);
        assert_eq!(typed.map(|c| c.0.load(Ordering::Relaxed)), Some(10));

        table.set_typed(&owner, Counter(AtomicUsize::new(20)));
        assert!(Arc::ptr_eq(&cached, &table.cached::<Counter>(&owner)));
    }

    #[test]
    fn test_cached_init_may_use_table() {
        #[derive(Default)]
        struct Inner;

        let table = FuseTable::new();
        let owner = Arc::new(());
        let outer: Arc<Arc<Inner>> = table.cached_with(&owner, || {
            table.set_named(&owner, "side", 1_u8);
            table.cached::<Inner>(&owner)
        });

        assert!(Arc::ptr_eq(&outer, &table.cached::<Arc<Inner>>(&owner)));
        assert!(Arc::ptr_eq(&*outer, &table.cached::<Inner>(&owner)));
        assert!(table.get_named::<u8>(&owner, "side").is_some());
    }

    #[test]
    fn test_detach_and_sweep() {
        let table = FuseTable::new();
        let kept = Arc::new(());
        let detached = Arc::new(());
        let dropped = Arc::new(());
        for owner in [&kept, &detached, &dropped] {
            table.set_named(owner, "k", 0_u8);
        }
        assert_eq!(table.tracked_owners(), 3);

        assert!(table.detach(&detached));
        assert!(!table.detach(&detached));
        assert!(table.get_named::<u8>(&detached, "k").is_none());

        drop(dropped);
        assert_eq!(table.sweep(), 1);
        assert_eq!(table.tracked_owners(), 1);
        assert!(table.get_named::<u8>(&kept, "k").is_some());
    }

    #[test]
    fn test_static_owner() {
        static LIMITS: [u32; 2] = [10, 20];
        let table = FuseTable::new();
        let owner: &'static [u32; 2] = &LIMITS;
        table.set_named(&owner, "note", "static");
        assert_eq!(table.sweep(), 0);
        assert_eq!(table.get_named::<&str>(&owner, "note").as_deref(), Some(&"static"));
    }

    #[test]
    fn test_unsized_owner() {
        let table = FuseTable::new();
        let owner: Arc<str> = Arc::from("Grace Hopper");
        table.set_typed(&owner, 1906_u16);
        assert_eq!(table.get_typed::<u16>(&Arc::clone(&owner)).as_deref(), Some(&1906));
    }

    #[test]
    fn test_send_sync() {
        static_assertions::assert_impl_all!(FuseTable: Send, Sync);
    }
}
