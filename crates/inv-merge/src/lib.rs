//! Unification engine for the element inventory.
//!
//! Produces the effective form of a derived element by merging an
//! *alteration* over the *base* it names: alteration attributes win, children
//! are paired by key and unified recursively, and unmatched children from
//! either side are carried over.
//!
//! Also defines [`OldVersionMerger`], the hook an application installs to
//! upgrade user overrides written for an older version.

pub mod error;
pub mod strategy;
pub mod unify;

pub use error::{MergeError, MergeResult};
pub use strategy::{OldVersionMerger, OverlayMerger};
pub use unify::{unify, Unifier};
