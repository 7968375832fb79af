//! The key lookup cache.
//!
//! Entries are keyed by the target store and the normalized element key. A
//! lookup that found nothing is cached as [`Cached::Missing`] so repeated
//! negative queries stay cheap; writers must call [`LookupCache::put`] or
//! [`LookupCache::invalidate`] whenever the element under a key changes.

use std::collections::HashMap;
use std::sync::Arc;

use inv_store::StoreKind;
use inv_types::{Element, Key};
use tracing::trace;

/// A cached lookup outcome.
#[derive(Clone, Debug)]
pub enum Cached {
    /// The key resolved to this element.
    Found(Arc<Element>),
    /// The key is known not to resolve.
    Missing,
}

impl Cached {
    /// The cached element, if any.
    pub fn element(&self) -> Option<Arc<Element>> {
        match self {
            Self::Found(e) => Some(Arc::clone(e)),
            Self::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl From<Option<Arc<Element>>> for Cached {
    fn from(element: Option<Arc<Element>>) -> Self {
        match element {
            Some(e) => Self::Found(e),
            None => Self::Missing,
        }
    }
}

/// Hit/miss counters for a cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Memoized `(store, key) -> element` resolution.
#[derive(Debug, Default)]
pub struct LookupCache {
    entries: HashMap<StoreKind, HashMap<Key, Cached>>,
    stats: CacheStats,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached outcome, counting hits and misses.
    pub fn get(&mut self, store: StoreKind, key: &Key) -> Option<Cached> {
        match self.entries.get(&store).and_then(|m| m.get(key)) {
            Some(cached) => {
                self.stats.hits += 1;
                trace!(%store, %key, missing = cached.is_missing(), "lookup cache hit");
                Some(cached.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Record the outcome for a key, overwriting any earlier entry.
    pub fn put(&mut self, store: StoreKind, key: Key, outcome: impl Into<Cached>) {
        self.entries
            .entry(store)
            .or_default()
            .insert(key, outcome.into());
    }

    /// Forget the outcome for a key.
    pub fn invalidate(&mut self, store: StoreKind, key: &Key) {
        if let Some(m) = self.entries.get_mut(&store) {
            m.remove(key);
        }
    }

    /// Forget every outcome.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
