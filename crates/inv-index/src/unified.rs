use std::collections::HashMap;
use std::sync::Arc;

use inv_types::{Element, ElementId};

/// Memoized unification results keyed by the `(main, alteration)` id pair.
///
/// Element ids are minted per node instance, so a result is reused only for
/// the very same pair of nodes, never for structurally equal copies.
#[derive(Debug, Default)]
pub struct UnifiedCache {
    entries: HashMap<(ElementId, ElementId), Arc<Element>>,
}

impl UnifiedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, main: ElementId, alteration: ElementId) -> Option<Arc<Element>> {
        self.entries.get(&(main, alteration)).cloned()
    }

    pub fn put(&mut self, main: ElementId, alteration: ElementId, unified: Arc<Element>) {
        self.entries.insert((main, alteration), unified);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
