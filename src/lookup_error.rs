//! Explaining why a property read came back empty.
//!
//! The regular accessors ([`FuseTable::get_named`], [`FuseTable::get_typed`])
//! fold every kind of miss into `None`. When a caller needs to know *why*
//! nothing was returned, the `try_*` accessors return a [`LookupError`]
//! instead.
//!
//! [`FuseTable::get_named`]: crate::FuseTable::get_named
//! [`FuseTable::get_typed`]: crate::FuseTable::get_typed

/// Reason a property could not be read as the requested type.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use fused::{FuseTable, LookupError};
///
/// let table = FuseTable::new();
/// let owner = Arc::new(());
/// table.set_named(&owner, "count", 3_u32);
///
/// let error = table.try_get_named::<String>(&owner, "count").unwrap_err();
/// assert!(matches!(error, LookupError::TypeMismatch { stored: "u32", .. }));
/// assert_eq!(
///     table.try_get_named::<u32>(&owner, "total").unwrap_err(),
///     LookupError::no_property::<u32>(),
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupError {
    /// Nothing is stored under the requested name for this owner.
    NoProperty {
        /// The type name of the requested value.
        requested: &'static str,
    },
    /// A value is stored under the requested name, but it has another type.
    TypeMismatch {
        /// The type name of the stored value.
        stored: &'static str,
        /// The type name of the requested value.
        requested: &'static str,
    },
}

impl LookupError {
    /// Creates a [`LookupError::NoProperty`] for a requested `T`.
    #[must_use]
    pub fn no_property<T: ?Sized>() -> Self {
        Self::NoProperty {
            requested: core::any::type_name::<T>(),
        }
    }

    /// Creates a [`LookupError::TypeMismatch`] for a requested `T`.
    #[must_use]
    pub fn type_mismatch<T: ?Sized>(stored: &'static str) -> Self {
        Self::TypeMismatch {
            stored,
            requested: core::any::type_name::<T>(),
        }
    }

    /// The type name the caller asked for.
    #[must_use]
    pub fn requested(&self) -> &'static str {
        match *self {
            Self::NoProperty { requested } | Self::TypeMismatch { requested, .. } => requested,
        }
    }
}

impl core::fmt::Display for LookupError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoProperty { requested } => {
                write!(f, "Expected a property of type {requested}, but none is attached")
            }
            Self::TypeMismatch { stored, requested } => write!(
                f,
                "Expected a property of type {requested}, but the attached value is a {stored}"
            ),
        }
    }
}

impl core::error::Error for LookupError {}

#[cfg(test)]
mod tests {
    use alloc::{format, string::String};

    use super::*;

    #[test]
    fn test_lookup_error_display() {
        let missing = LookupError::no_property::<String>();
        assert_eq!(
            format!("{missing}"),
            "Expected a property of type alloc::string::String, but none is attached"
        );

        let mismatch = LookupError::type_mismatch::<i32>("&str");
        assert_eq!(
            format!("{mismatch}"),
            "Expected a property of type i32, but the attached value is a &str"
        );
    }

    #[test]
    fn test_lookup_error_requested() {
        assert_eq!(LookupError::no_property::<u8>().requested(), "u8");
        assert_eq!(LookupError::type_mismatch::<u16>("u8").requested(), "u16");
    }

    #[test]
    fn test_lookup_error_traits() {
        static_assertions::assert_impl_all!(LookupError: Send, Sync, Copy, core::error::Error);
    }
}
