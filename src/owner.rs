//! Types that can carry fused properties.
//!
//! Properties are keyed by the *identity* of an owner, never by its value.
//! An owner therefore has to have a stable address for as long as anything
//! is attached to it, and a way to tell the table when it has died. The
//! [`Owner`] trait captures exactly those two facts.
//!
//! # Provided implementations
//!
//! - [`Arc<T>`]: identity is the shared allocation, so every clone of the
//!   same `Arc` addresses the same properties. The table only keeps a
//!   `Weak`, so attaching never extends the owner's lifetime. `T` must be
//!   `Send + Sync`: the table stores that `Weak<T>` and is itself shared
//!   between threads, so owners such as `Arc<RefCell<_>>` or `Rc<_>` cannot
//!   carry properties, not even on a table local to one thread.
//! - `&'static T`: identity is the address of the static. Such owners never
//!   die; their properties live for the rest of the program.
//!
//! # Undefined input
//!
//! Identity is an address, so anything without a unique address is outside
//! the contract. The table neither detects nor rejects such owners:
//!
//! - zero-sized statics may share an address with each other;
//! - a static and its first field (or any field at offset zero) have the
//!   same address, so `&CONFIG` and `&CONFIG.first` share one property bag;
//! - identical string or slice literals may be merged by the compiler into
//!   one allocation, so `&"a"` in two places may or may not be the same
//!   owner;
//! - custom implementations must return an identity that no other live
//!   owner can produce, and a [`Liveness`] that reports death no earlier
//!   than the moment that identity may be reused.
//!
//! [`Arc<T>`]: alloc::sync::Arc

use alloc::sync::Arc;

pub use fused_internals::{Identity, IsAlive, Liveness};

/// An object that fused properties can be attached to.
///
/// See the [module documentation](self) for the identity contract.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use fused::{FuseTable, Owner};
///
/// let a = Arc::new(String::from("same"));
/// let b = Arc::new(String::from("same"));
/// assert_eq!(a, b);
/// assert_ne!(a.identity(), b.identity());
/// assert_eq!(a.identity(), Arc::clone(&a).identity());
///
/// let table = FuseTable::new();
/// table.set_named(&a, "seen", true);
/// assert!(table.get_named::<bool>(&b, "seen").is_none());
/// ```
pub trait Owner {
    /// The reference identity of this owner.
    fn identity(&self) -> Identity;

    /// A token that reports whether this owner is still alive.
    ///
    /// Called once, when the first property is attached. The token must not
    /// keep the owner alive.
    fn liveness(&self) -> Liveness;
}

impl<T> Owner for Arc<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    #[inline]
    fn identity(&self) -> Identity {
        Identity::from_ptr(Arc::as_ptr(self))
    }

    fn liveness(&self) -> Liveness {
        Liveness::tracking(Arc::downgrade(self))
    }
}

impl<T> Owner for &'static T
where
    T: ?Sized,
{
    #[inline]
    fn identity(&self) -> Identity {
        Identity::from_ptr(core::ptr::from_ref(*self))
    }

    fn liveness(&self) -> Liveness {
        Liveness::immortal()
    }
}
