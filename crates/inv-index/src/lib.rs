//! Lookup caches for the element inventory.
//!
//! # Key Types
//!
//! - [`LookupCache`] -- memoized `(store, key) -> element` resolution, including
//!   explicit negative entries
//! - [`Cached`] -- a cached outcome (found or known missing)
//! - [`UnifiedCache`] -- memoized unification results keyed by element id pair
//! - [`CacheStats`] -- hit/miss counters

pub mod lookup;
pub mod unified;

pub use lookup::{CacheStats, Cached, LookupCache};
pub use unified::UnifiedCache;
