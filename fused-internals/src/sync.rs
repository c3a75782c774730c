//! Lock primitives that switch between `std::sync` and `spin`.
//!
//! With the `std` feature the operating system primitives are used. Without
//! it, `spin` provides `no_std` equivalents with the same surface, including
//! the behaviour of [`Once`] when an initialiser panics.
//!
//! Poisoning is recovered rather than propagated: no critical section in
//! this crate leaves a map in a partially updated state, and user code
//! (constructors, destructors) never runs while one of these locks is held.

use core::ops::{Deref, DerefMut};

#[cfg(feature = "std")]
use std::sync as impl_;

#[cfg(not(feature = "std"))]
use spin as impl_;

#[cfg(feature = "std")]
type OnceImpl<T> = std::sync::OnceLock<T>;

#[cfg(not(feature = "std"))]
type OnceImpl<T> = spin::Once<T>;

/// Reader-writer lock over `T`.
#[repr(transparent)]
pub(crate) struct RwLock<T>(impl_::RwLock<T>);

/// Shared guard returned by [`RwLock::read`].
#[repr(transparent)]
pub(crate) struct ReadGuard<'a, T>(impl_::RwLockReadGuard<'a, T>);

/// Exclusive guard returned by [`RwLock::write`].
#[repr(transparent)]
pub(crate) struct WriteGuard<'a, T>(impl_::RwLockWriteGuard<'a, T>);

impl<T> RwLock<T> {
    #[must_use]
    pub(crate) const fn new(value: T) -> Self {
        Self(impl_::RwLock::new(value))
    }

    #[inline]
    pub(crate) fn read(&self) -> ReadGuard<'_, T> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.read();

        #[cfg(feature = "std")]
        let guard = self
            .0
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        ReadGuard(guard)
    }

    #[inline]
    pub(crate) fn write(&self) -> WriteGuard<'_, T> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.write();

        #[cfg(feature = "std")]
        let guard = self
            .0
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        WriteGuard(guard)
    }
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

/// A cell written at most once.
///
/// Concurrent initialisers block until the winning initialiser finishes, and
/// every caller observes the winner's value. A panicking initialiser leaves
/// the cell empty, so the next caller runs its own.
pub(crate) struct Once<T> {
    cell: OnceImpl<T>,
    // `spin::Once` poisons itself for good when its initialiser panics. The
    // initialiser runs under this lock instead, which unwinding releases.
    #[cfg(not(feature = "std"))]
    init_lock: spin::mutex::SpinMutex<()>,
}

impl<T> Once<T> {
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self {
            cell: OnceImpl::new(),
            #[cfg(not(feature = "std"))]
            init_lock: spin::mutex::SpinMutex::new(()),
        }
    }

    #[inline]
    pub(crate) fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    #[cfg(feature = "std")]
    #[inline]
    pub(crate) fn get_or_init(&self, init: impl FnOnce() -> T) -> &T {
        self.cell.get_or_init(init)
    }

    #[cfg(not(feature = "std"))]
    pub(crate) fn get_or_init(&self, init: impl FnOnce() -> T) -> &T {
        if let Some(value) = self.cell.get() {
            return value;
        }

        let _init = self.init_lock.lock();
        if let Some(value) = self.cell.get() {
            return value;
        }
        let value = init();
        self.cell.call_once(|| value)
    }
}
