#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![forbid(unsafe_code)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Attach properties to shared objects without changing their types.
//!
//! ## Overview
//!
//! This crate lets you hang arbitrary typed data off any `Arc` (or `'static`
//! reference) you do not control. Properties are keyed by the *identity* of
//! the owner, never by its value: two equal strings in two allocations carry
//! separate properties.
//!
//! The store never keeps an owner alive. Once the last strong handle to an
//! owner is gone, its properties are unreachable and are reclaimed later.
//!
//! ## Quick Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use fused::FuseTable;
//!
//! #[derive(Debug, PartialEq)]
//! struct Person {
//!     first: String,
//!     last: String,
//! }
//!
//! let table = FuseTable::new();
//! let bio: Arc<str> = Arc::from("Ada Lovelace (mathematician; born December 10, 1815)");
//!
//! table.set_typed(
//!     &bio,
//!     Person {
//!         first: "Ada".into(),
//!         last: "Lovelace".into(),
//!     },
//! );
//! table.set_named(&bio, "year", 1815_u32);
//!
//! assert_eq!(table.get_typed::<Person>(&bio).unwrap().first, "Ada");
//! assert_eq!(table.get_named::<u32>(&bio, "year").as_deref(), Some(&1815));
//!
//! // A different allocation holding the same text has no properties.
//! let copy: Arc<str> = Arc::from(&*bio);
//! assert!(table.get_typed::<Person>(&copy).is_none());
//! ```
//!
//! ## Core Concepts
//!
//! Every owner has a *bag* of properties with two namespaces:
//!
//! - **Named** properties are stored under a string. [`FuseTable::set_named`]
//!   overwrites, [`FuseTable::get_named`] reads back a value of a given type.
//!   Reading with the wrong type is the same as reading nothing.
//! - **Typed** properties are named properties whose name is derived from the
//!   value's type (see [`property_name`]). They are a convenience for the
//!   common case of one value per type.
//! - **Cached** properties are created on first access by
//!   [`FuseTable::cached`] and live in their own namespace. At most one value
//!   per type and owner is ever constructed, even under contention, which
//!   makes them a good home for interior-mutable state such as counters or
//!   memo tables.
//!
//! Values are handed out as `Arc<V>`. A handle stays valid after the property
//! is overwritten or its owner dies.
//!
//! ## The process-wide table
//!
//! Most programs need just one table. [`FuseExt`] (in the [`prelude`]) adds
//! methods to every owner that use [`FuseTable::global`]:
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use fused::prelude::*;
//!
//! #[derive(Default)]
//! struct Hits(AtomicUsize);
//!
//! let page: Arc<str> = Arc::from("/index.html");
//! page.fused::<Hits>().0.fetch_add(1, Ordering::Relaxed);
//! page.fused::<Hits>().0.fetch_add(1, Ordering::Relaxed);
//! assert_eq!(page.fused::<Hits>().0.load(Ordering::Relaxed), 2);
//! ```
//!
//! The global table's layout can be tuned once, before first use, with
//! [`TableConfig::install_global`].
//!
//! ## Reclamation
//!
//! Properties of a dead owner are dropped when its entry is removed by
//! [`FuseTable::detach`], [`FuseTable::sweep`], or the automatic sweep that
//! runs when a *new* owner is added to a full shard. Reads and writes on
//! owners that already have properties never reclaim anything.
//!
//! A program that stops adding owners therefore keeps the properties of its
//! dead owners until it sweeps. Long-running programs using the process-wide
//! table should call `FuseTable::global().sweep()` periodically, or call
//! [`FuseExt::unfuse`] from the owner's teardown path.
//!
//! ## Features
//!
//! - `std`: use `std::sync` locks instead of spin locks. Recommended whenever
//!   `std` is available.
//!
//! ## Logging
//!
//! Table events are emitted through [`tracing`](https://docs.rs/tracing):
//! sweeps and global configuration at `DEBUG`, bag creation, removal and
//! cached construction at `TRACE`.

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod config;
mod fuse_ext;
mod global;
pub mod lookup_error;
pub mod owner;
pub mod prelude;
mod table;

pub use self::{
    config::{GlobalTableInitializedError, TableConfig},
    fuse_ext::FuseExt,
    lookup_error::LookupError,
    owner::{Identity, IsAlive, Liveness, Owner},
    table::{FuseTable, property_name},
};
