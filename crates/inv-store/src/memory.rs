use std::sync::Arc;

use indexmap::IndexMap;
use inv_types::{Element, Key};

use crate::error::{StoreError, StoreResult};
use crate::traits::ElementStore;

/// In-memory, `IndexMap`-based element store.
///
/// Keys keep the position of their first insertion; replacing an element
/// leaves its position unchanged and removal preserves the order of the rest.
pub struct InMemoryElementStore {
    elements: IndexMap<Key, Arc<Element>>,
}

impl InMemoryElementStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            elements: IndexMap::new(),
        }
    }

    /// Total number of nodes across all stored subtrees.
    pub fn total_nodes(&self) -> usize {
        self.elements.values().map(|e| e.node_count()).sum()
    }
}

impl Default for InMemoryElementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementStore for InMemoryElementStore {
    fn get(&self, key: &Key) -> Option<Arc<Element>> {
        self.elements.get(key).cloned()
    }

    fn insert(&mut self, key: Key, element: &Element) -> StoreResult<Arc<Element>> {
        if key.name() != element.name() {
            return Err(StoreError::KeyMismatch {
                key,
                element: element.name().to_string(),
            });
        }
        let stored = Arc::new(element.clone());
        self.elements.insert(key, Arc::clone(&stored));
        Ok(stored)
    }

    fn remove(&mut self, key: &Key) -> Option<Arc<Element>> {
        self.elements.shift_remove(key)
    }

    fn contains(&self, key: &Key) -> bool {
        self.elements.contains_key(key)
    }

    fn keys(&self) -> Vec<Key> {
        self.elements.keys().cloned().collect()
    }

    fn scan_prefix(&self, prefix: &Key) -> Vec<Arc<Element>> {
        self.elements
            .iter()
            .filter(|(key, _)| key.matches_prefix(prefix))
            .map(|(_, element)| Arc::clone(element))
            .collect()
    }

    fn len(&self) -> usize {
        self.elements.len()
    }

    fn clear(&mut self) {
        self.elements.clear();
    }
}

impl std::fmt::Debug for InMemoryElementStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryElementStore")
            .field("element_count", &self.elements.len())
            .finish()
    }
}
