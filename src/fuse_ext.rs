//! Extension methods for attaching properties through the process-wide table.
//!
//! [`FuseExt`] is implemented for every [`Owner`], so any `Arc` can carry
//! properties without naming a table:
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use fused::prelude::*;
//!
//! #[derive(Default)]
//! struct Notes(Mutex<Vec<String>>);
//!
//! let user: Arc<str> = Arc::from("ada");
//!
//! user.set_fused("role", "admin");
//! assert_eq!(user.get_fused::<&str>("role").as_deref(), Some(&"admin"));
//!
//! user.fused::<Notes>().0.lock().unwrap().push(String::from("first login"));
//! assert_eq!(user.fused::<Notes>().0.lock().unwrap().len(), 1);
//! ```
//!
//! Every method delegates to the same method on [`FuseTable::global`].

use alloc::{borrow::Cow, sync::Arc};
use core::any::Any;

use crate::{FuseTable, lookup_error::LookupError, owner::Owner};

/// Property access on the process-wide [`FuseTable`].
pub trait FuseExt: Owner {
    /// See [`FuseTable::set_named`].
    fn set_fused<V>(&self, name: impl Into<Cow<'static, str>>, value: V)
    where
        V: Any + Send + Sync,
    {
        FuseTable::global().set_named(self, name, value);
    }

    /// See [`FuseTable::get_named`].
    #[must_use]
    fn get_fused<V>(&self, name: &str) -> Option<Arc<V>>
    where
        V: Any + Send + Sync,
    {
        FuseTable::global().get_named(self, name)
    }

    /// See [`FuseTable::try_get_named`].
    ///
    /// # Errors
    ///
    /// See [`FuseTable::try_get_named`].
    fn try_get_fused<V>(&self, name: &str) -> Result<Arc<V>, LookupError>
    where
        V: Any + Send + Sync,
    {
        FuseTable::global().try_get_named(self, name)
    }

    /// See [`FuseTable::set_typed`].
    fn set_fused_typed<V>(&self, value: V)
    where
        V: Any + Send + Sync,
    {
        FuseTable::global().set_typed(self, value);
    }

    /// See [`FuseTable::get_typed`].
    #[must_use]
    fn get_fused_typed<V>(&self) -> Option<Arc<V>>
    where
        V: Any + Send + Sync,
    {
        FuseTable::global().get_typed(self)
    }

    /// See [`FuseTable::remove_named`].
    fn remove_fused(&self, name: &str) -> bool {
        FuseTable::global().remove_named(self, name)
    }

    /// See [`FuseTable::cached`].
    fn fused<T>(&self) -> Arc<T>
    where
        T: Any + Send + Sync + Default,
    {
        FuseTable::global().cached(self)
    }

    /// See [`FuseTable::cached_with`].
    fn fused_with<T>(&self, init: impl FnOnce() -> T) -> Arc<T>
    where
        T: Any + Send + Sync,
    {
        FuseTable::global().cached_with(self, init)
    }

    /// See [`FuseTable::detach`].
    fn unfuse(&self) -> bool {
        FuseTable::global().detach(self)
    }
}

impl<O> FuseExt for O where O: Owner + ?Sized {}
