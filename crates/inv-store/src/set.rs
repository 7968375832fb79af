use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::memory::InMemoryElementStore;
use crate::traits::ElementStore;

/// Which of an inventory's three collections a lookup targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StoreKind {
    /// Effective elements served to callers.
    Main,
    /// Derived and overriding elements as loaded.
    Alterations,
    /// Pre-override snapshots.
    Base,
}

impl StoreKind {
    pub const ALL: [StoreKind; 3] = [StoreKind::Main, StoreKind::Alterations, StoreKind::Base];
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "main"),
            Self::Alterations => write!(f, "alterations"),
            Self::Base => write!(f, "base"),
        }
    }
}

/// The three collections owned by one inventory.
#[derive(Debug, Default)]
pub struct StoreSet {
    main: InMemoryElementStore,
    alterations: InMemoryElementStore,
    base: InMemoryElementStore,
}

impl StoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: StoreKind) -> &InMemoryElementStore {
        match kind {
            StoreKind::Main => &self.main,
            StoreKind::Alterations => &self.alterations,
            StoreKind::Base => &self.base,
        }
    }

    pub fn get_mut(&mut self, kind: StoreKind) -> &mut InMemoryElementStore {
        match kind {
            StoreKind::Main => &mut self.main,
            StoreKind::Alterations => &mut self.alterations,
            StoreKind::Base => &mut self.base,
        }
    }

    /// Discard every collection.
    pub fn clear(&mut self) {
        debug!(
            main = self.main.len(),
            alterations = self.alterations.len(),
            base = self.base.len(),
            "clearing element stores"
        );
        for kind in StoreKind::ALL {
            self.get_mut(kind).clear();
        }
    }
}
