//! Commonly used items for convenient importing.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use fused::prelude::*;
//!
//! let owner: Arc<str> = Arc::from("config.toml");
//! owner.set_fused("loaded", true);
//! assert_eq!(owner.get_fused::<bool>("loaded").as_deref(), Some(&true));
//! ```
//!
//! # What's Included
//!
//! - **[`FuseExt`]**: property methods on every owner, backed by the global
//!   table
//! - **[`FuseTable`]**: the attachment store itself
//! - **[`Owner`]**: the trait for values that can carry properties

pub use crate::{FuseExt, FuseTable, Owner};
