//! Keyed element storage for the element inventory.
//!
//! An inventory keeps three independent collections of elements, each indexed
//! by [`Key`](inv_types::Key):
//!
//! - **Main** -- the effective (unified) elements served to callers
//! - **Alterations** -- derived and overriding elements exactly as loaded
//! - **Base** -- snapshots of elements taken just before they were overridden
//!
//! # Storage Backends
//!
//! All backends implement the [`ElementStore`] trait:
//!
//! - [`InMemoryElementStore`] -- `IndexMap`-based store preserving insertion order
//!
//! # Design Rules
//!
//! 1. At most one element per key in a store.
//! 2. Every insertion stores its own deep copy; stores never share nodes.
//! 3. Stored elements are immutable; replacing an element swaps the whole node.

pub mod error;
pub mod memory;
pub mod set;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryElementStore;
pub use set::{StoreKind, StoreSet};
pub use traits::ElementStore;
