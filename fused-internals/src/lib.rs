#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`fused`].
//!
//! # Overview
//!
//! This crate contains the type-erased storage that powers the [`fused`]
//! property attachment library: identity keys, liveness tokens, slots, bags
//! and the sharded owner table.
//!
//! **This crate is an implementation detail.** No semantic versioning
//! guarantees are provided. Users should depend on the [`fused`] crate, not
//! this one.
//!
//! # Architecture
//!
//! - **[`identity`]**: who an owner is and whether it still exists
//!   - [`Identity`]: allocation address of an owner
//!   - [`Liveness`]: non-owning token that reports whether the owner died
//! - **[`slot`]**: [`RawSlot`], a shared value erased to `dyn Any` plus its
//!   type tag
//! - **[`bag`]**: [`RawBag`], the per-owner named slots and cached cells
//! - **[`table`]**: [`RawTable`], identity to bag, sharded by identity
//!
//! # Locking
//!
//! Locks come from `std::sync` when the `std` feature is enabled and from
//! `spin` otherwise. Lock order is always shard before bag. Constructors and
//! destructors of attached values never run while either lock is held.
//!
//! [`fused`]: https://docs.rs/fused/latest/fused/

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod bag;
pub mod identity;
pub mod slot;
mod sync;
pub mod table;

pub use bag::{CachedCell, RawBag};
pub use identity::{Identity, IsAlive, Liveness};
pub use slot::RawSlot;
pub use table::RawTable;
