//! Foundation types for the element inventory.
//!
//! This crate provides the tree model and identity types used throughout the
//! inventory workspace. Every other `inv-*` crate depends on `inv-types`.
//!
//! # Key Types
//!
//! - [`Element`]: Named, attributed tree node (the unit of configuration)
//! - [`ElementId`]: Synthetic identity assigned when an element is created
//! - [`Key`]: Case-normalized tuple of key attribute values identifying an element
//! - [`KeyRegistry`]: Per-element-name list of the attributes forming its key

pub mod element;
pub mod error;
pub mod key;

pub use element::{Element, ElementId};
pub use error::TypeError;
pub use key::{Key, KeyRegistry};

/// Attribute naming the element an alteration derives from.
pub const BASE_ATTR: &str = "base";

/// Attribute asking the unifier to emit alteration children first.
pub const REORDER_ATTR: &str = "reorder";

/// Attribute carrying the application version an override was written for.
pub const VERSION_ATTR: &str = "version";
