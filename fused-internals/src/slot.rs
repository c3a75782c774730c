//! Type-erased property values.

use alloc::sync::Arc;
use core::{
    any::{Any, TypeId},
    fmt,
};

/// A stored property value together with the tag of its concrete type.
///
/// Cloning a slot clones the handle, not the value.
#[derive(Clone)]
pub struct RawSlot {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl RawSlot {
    /// Wraps a shared value, recording its concrete type.
    #[must_use]
    pub fn new<V>(value: Arc<V>) -> Self
    where
        V: Any + Send + Sync,
    {
        Self {
            value,
            type_name: core::any::type_name::<V>(),
        }
    }

    /// The [`TypeId`] of the stored value.
    #[inline]
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        // Deref first; `Arc` itself is `Any`.
        Any::type_id(&*self.value)
    }

    /// The type name of the stored value, for diagnostics only.
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns whether the stored value is a `V`.
    #[inline]
    #[must_use]
    pub fn is<V: Any>(&self) -> bool {
        self.type_id() == TypeId::of::<V>()
    }

    /// Returns a handle to the value if it is a `V`.
    #[must_use]
    pub fn downcast<V>(&self) -> Option<Arc<V>>
    where
        V: Any + Send + Sync,
    {
        Arc::clone(&self.value).downcast::<V>().ok()
    }
}

impl fmt::Debug for RawSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawSlot")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
