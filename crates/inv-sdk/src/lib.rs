//! High-level element inventory.
//!
//! Loads keyed configuration elements from layered documents, resolves
//! `base="..."` derivations and in-place overrides, and persists user
//! overrides across application versions. This is the main entry point for
//! applications embedding the inventory.
//!
//! # Key Types
//!
//! - [`Inventory`]: the engine, with its query, persistence and reload API
//! - [`InventoryConfig`]: directories, file pattern, selection, key attributes
//! - [`DocumentSource`]: where documents come from ([`FsDocumentSource`],
//!   [`MemoryDocumentSource`])
//! - [`InventoryContext`]: named inventories owned by the application

pub mod config;
pub mod context;
pub mod error;
pub mod inventory;
pub mod source;

pub use config::InventoryConfig;
pub use context::InventoryContext;
pub use error::{InventoryError, InventoryResult};
pub use inventory::Inventory;
pub use source::{DocumentSource, FsDocumentSource, MemoryDocumentSource, SourceFile};

// Re-export key types
pub use inv_codec::Selection;
pub use inv_index::CacheStats;
pub use inv_merge::{OldVersionMerger, OverlayMerger};
pub use inv_types::{Element, ElementId, Key, KeyRegistry};
