//! Integration tests for the fused-internals crate.
//!
//! ## Table and bag tests
//! - `test_bag_lifecycle`: bags are created lazily and found again by
//!   identity
//! - `test_value_equal_owners_are_distinct`: identity, not equality, keys
//!   the table
//! - `test_overwrite_drops_previous_value`: displaced values are dropped
//!   exactly once
//!
//! ## Memory management tests
//! - `test_remove_drops_attached_values`: explicit teardown releases values
//!   immediately
//! - `test_sweep_drops_values_of_dead_owners`: values of dead owners are
//!   released by a sweep and never before their owner dies
//! - `test_table_does_not_keep_owner_alive`: the owner's value is dropped as
//!   soon as the last strong handle goes away
//! - `test_drop_may_reenter_table`: a value's destructor can use the table
//!
//! ## Concurrency tests
//! - `test_concurrent_cached_cell_initialises_once`
//! - `test_independent_owners_in_parallel`

use std::{
    any::TypeId,
    borrow::Cow,
    sync::{
        Arc, Barrier,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use fused_internals::{Identity, Liveness, RawSlot, RawTable};

fn identity_of<T: ?Sized>(owner: &Arc<T>) -> Identity {
    Identity::from_ptr(Arc::as_ptr(owner))
}

fn tracked<T>(owner: &Arc<T>) -> impl FnOnce() -> Liveness + '_
where
    T: ?Sized + Send + Sync + 'static,
{
    move || Liveness::tracking(Arc::downgrade(owner))
}

struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_bag_lifecycle() {
    let table = RawTable::new(8, 16);
    let owner = Arc::new(String::from("owner"));
    let id = identity_of(&owner);

    assert!(table.get(id).is_none());
    let bag = table.get_or_insert(id, tracked(&owner));
    bag.insert_named(Cow::Borrowed("greeting"), RawSlot::new(Arc::new("hello")));

    let found = table.get(id).and_then(|bag| bag.named("greeting"));
    assert_eq!(found.and_then(|s| s.downcast::<&str>()).as_deref(), Some(&"hello"));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_value_equal_owners_are_distinct() {
    let table = RawTable::new(8, 16);
    let first = Arc::new(String::from("same"));
    let second = Arc::new(String::from("same"));
    assert_eq!(first, second);

    table
        .get_or_insert(identity_of(&first), tracked(&first))
        .insert_named(Cow::Borrowed("k"), RawSlot::new(Arc::new(1_u8)));

    assert!(table.get(identity_of(&second)).is_none());
    let second_bag = table.get_or_insert(identity_of(&second), tracked(&second));
    assert!(second_bag.named("k").is_none());
    assert_eq!(table.len(), 2);
}

#[test]
fn test_overwrite_drops_previous_value() {
    let drops = Arc::new(AtomicUsize::new(0));
    let table = RawTable::new(1, 16);
    let owner = Arc::new(());
    let bag = table.get_or_insert(identity_of(&owner), tracked(&owner));

    bag.insert_named(Cow::Borrowed("v"), RawSlot::new(Arc::new(DropCounter(Arc::clone(&drops)))));
    assert_eq!(drops.load(Ordering::SeqCst), 0);

    let previous =
        bag.insert_named(Cow::Borrowed("v"), RawSlot::new(Arc::new(DropCounter(Arc::clone(&drops)))));
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    drop(previous);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_remove_drops_attached_values() {
    let drops = Arc::new(AtomicUsize::new(0));
    let table = RawTable::new(1, 16);
    let owner = Arc::new(());
    let id = identity_of(&owner);

    table
        .get_or_insert(id, tracked(&owner))
        .insert_named(Cow::Borrowed("v"), RawSlot::new(Arc::new(DropCounter(Arc::clone(&drops)))));

    let removed = table.remove(id);
    assert!(removed.is_some());
    drop(removed);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert!(table.is_empty());
}

#[test]
fn test_sweep_drops_values_of_dead_owners() {
    let drops = Arc::new(AtomicUsize::new(0));
    let table = RawTable::new(4, 64);

    let owners: Vec<_> = (0..10).map(Arc::new).collect();
    for owner in &owners {
        let cell = table
            .get_or_insert(identity_of(owner), tracked(owner))
            .cached_cell(TypeId::of::<DropCounter>());
        cell.get_or_init(|| RawSlot::new(Arc::new(DropCounter(Arc::clone(&drops)))));
    }

    assert_eq!(table.sweep(), 0);
    assert_eq!(drops.load(Ordering::SeqCst), 0);

    drop(owners);
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    assert_eq!(table.sweep(), 10);
    assert_eq!(drops.load(Ordering::SeqCst), 10);
    assert!(table.is_empty());
}

#[test]
fn test_table_does_not_keep_owner_alive() {
    let drops = Arc::new(AtomicUsize::new(0));
    let table = RawTable::new(1, 16);
    let owner = Arc::new(DropCounter(Arc::clone(&drops)));

    table
        .get_or_insert(identity_of(&owner), tracked(&owner))
        .insert_named(Cow::Borrowed("k"), RawSlot::new(Arc::new(5_u32)));
    assert_eq!(Arc::strong_count(&owner), 1);

    drop(owner);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert_eq!(table.len(), 1);
    assert_eq!(table.sweep(), 1);
}

#[test]
fn test_drop_may_reenter_table() {
    struct Reentrant {
        table: Arc<RawTable>,
        other: Identity,
        seen: Arc<AtomicUsize>,
    }

    impl Drop for Reentrant {
        fn drop(&mut self) {
            if self.table.get(self.other).is_some() {
                self.seen.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    let table = Arc::new(RawTable::new(1, 16));
    let seen = Arc::new(AtomicUsize::new(0));
    let anchor = Arc::new(0_u8);
    table.get_or_insert(identity_of(&anchor), tracked(&anchor));

    let owner = Arc::new(1_u8);
    table.get_or_insert(identity_of(&owner), tracked(&owner)).insert_named(
        Cow::Borrowed("r"),
        RawSlot::new(Arc::new(Reentrant {
            table: Arc::clone(&table),
            other: identity_of(&anchor),
            seen: Arc::clone(&seen),
        })),
    );

    drop(owner);
    assert_eq!(table.sweep(), 1);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_cached_cell_initialises_once() {
    const THREADS: usize = 8;

    let table = Arc::new(RawTable::new(4, 16));
    let owner = Arc::new(());
    let constructed = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let table = Arc::clone(&table);
            let owner = Arc::clone(&owner);
            let constructed = Arc::clone(&constructed);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let cell = table
                    .get_or_insert(identity_of(&owner), tracked(&owner))
                    .cached_cell(TypeId::of::<u64>());
                let slot = cell.get_or_init(|| {
                    constructed.fetch_add(1, Ordering::SeqCst);
                    RawSlot::new(Arc::new(0_u64))
                });
                slot.downcast::<u64>()
            })
        })
        .collect();

    let values: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread panicked").expect("cached value is a u64"))
        .collect();

    assert_eq!(constructed.load(Ordering::SeqCst), 1);
    assert!(values.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_independent_owners_in_parallel() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 64;

    let table = Arc::new(RawTable::new(16, 16));
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                let owners: Vec<_> = (0..PER_THREAD).map(|i| Arc::new(t * PER_THREAD + i)).collect();
                for owner in &owners {
                    table
                        .get_or_insert(identity_of(owner), tracked(owner))
                        .insert_named(Cow::Borrowed("n"), RawSlot::new(Arc::new(**owner)));
                }
                owners.iter().all(|owner| {
                    table
                        .get(identity_of(owner))
                        .and_then(|bag| bag.named("n"))
                        .and_then(|slot| slot.downcast::<usize>())
                        .is_some_and(|value| *value == **owner)
                })
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().expect("thread panicked"));
    }
}
