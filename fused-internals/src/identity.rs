//! Owner identities and liveness tokens.
//!
//! An [`Identity`] is the address of an owner's allocation. It is only
//! meaningful while the allocation exists, which is why every table entry
//! also carries a [`Liveness`] token: for reference-counted owners the token
//! is a `Weak`, and a `Weak` keeps the allocation (though not the value)
//! reserved. An address therefore cannot be handed out to a new owner while
//! an entry for the old one is still present.

use alloc::{boxed::Box, sync::Weak};
use core::fmt;

/// Reference identity of an owner.
///
/// Two identities are equal exactly when they were taken from the same
/// address. Value equality of the owners plays no part.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(usize);

impl Identity {
    /// Creates the identity of the allocation `ptr` points into.
    ///
    /// Metadata of wide pointers is discarded, so an `Arc<str>` and an
    /// `Arc<dyn Any>` created from the same allocation share an identity.
    #[inline]
    #[must_use]
    pub fn from_ptr<T: ?Sized>(ptr: *const T) -> Self {
        Self(ptr.cast::<()>().addr())
    }

    /// Returns the raw address backing this identity.
    #[inline]
    #[must_use]
    pub const fn addr(self) -> usize {
        self.0
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({:#x})", self.0)
    }
}

/// Reports whether the owner behind a table entry still exists.
pub trait IsAlive: 'static + Send + Sync {
    /// Returns `false` once the owner can no longer be reached.
    ///
    /// Must never return `true` again after it has returned `false`.
    fn is_alive(&self) -> bool;
}

impl<T> IsAlive for Weak<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    #[inline]
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

/// Liveness token stored next to every property bag.
///
/// The token never keeps its owner alive.
pub struct Liveness(Inner);

enum Inner {
    Immortal,
    Tracked(Box<dyn IsAlive>),
}

impl Liveness {
    /// A token for owners that live for the rest of the program.
    #[must_use]
    pub const fn immortal() -> Self {
        Self(Inner::Immortal)
    }

    /// A token that follows the strong count of a reference-counted owner.
    #[must_use]
    pub fn tracking<T>(weak: Weak<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self::new(weak)
    }

    /// A token backed by a custom liveness check.
    #[must_use]
    pub fn new<L: IsAlive>(check: L) -> Self {
        Self(Inner::Tracked(Box::new(check)))
    }

    /// Returns whether the owner still exists.
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        match &self.0 {
            Inner::Immortal => true,
            Inner::Tracked(check) => check.is_alive(),
        }
    }
}

impl fmt::Debug for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Inner::Immortal => f.write_str("Liveness::Immortal"),
            Inner::Tracked(check) => f
                .debug_tuple("Liveness::Tracked")
                .field(&check.is_alive())
                .finish(),
        }
    }
}
