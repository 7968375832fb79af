use std::sync::Arc;

use inv_types::{Element, Key};

use crate::error::{StoreError, StoreResult};

/// Keyed collection of elements.
///
/// All implementations must satisfy these invariants:
/// - At most one element exists per key.
/// - `insert`/`insert_new` store a deep copy of the given element, so the
///   caller's node and the stored node never alias.
/// - Elements handed out are shared, immutable snapshots; replacing a key
///   never mutates a node a caller already holds.
pub trait ElementStore {
    /// Look up the element stored under `key`.
    fn get(&self, key: &Key) -> Option<Arc<Element>>;

    /// Store a copy of `element` under `key`, replacing any previous element.
    ///
    /// Returns the stored copy.
    fn insert(&mut self, key: Key, element: &Element) -> StoreResult<Arc<Element>>;

    /// Store a copy of `element` under `key`, failing if the key is taken.
    fn insert_new(&mut self, key: Key, element: &Element) -> StoreResult<Arc<Element>> {
        if self.contains(&key) {
            return Err(StoreError::Occupied(key));
        }
        self.insert(key, element)
    }

    /// Remove and return the element stored under `key`.
    fn remove(&mut self, key: &Key) -> Option<Arc<Element>>;

    /// Check whether an element is stored under `key`.
    fn contains(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    /// All keys, in insertion order.
    fn keys(&self) -> Vec<Key>;

    /// Elements whose key starts with `prefix` (missing trailing slots match
    /// anything), in insertion order.
    fn scan_prefix(&self, prefix: &Key) -> Vec<Arc<Element>>;

    /// Number of stored elements.
    fn len(&self) -> usize;

    /// Returns `true` if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every element.
    fn clear(&mut self);
}
