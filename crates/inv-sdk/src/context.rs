use std::collections::BTreeMap;

use crate::inventory::Inventory;

type Slot = (String, Option<String>);

/// Owns the inventories of an application, keyed by name and optional
/// database discriminator.
///
/// Consumers receive inventories from the context by reference; there is no
/// process-wide registry.
#[derive(Debug, Default)]
pub struct InventoryContext {
    inventories: BTreeMap<Slot, Inventory>,
}

impl InventoryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `inventory`, returning any inventory it replaces.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        discriminator: Option<&str>,
        inventory: Inventory,
    ) -> Option<Inventory> {
        self.inventories
            .insert(slot(name, discriminator), inventory)
    }

    pub fn get(&self, name: &str, discriminator: Option<&str>) -> Option<&Inventory> {
        self.inventories.get(&slot(name, discriminator))
    }

    pub fn get_mut(&mut self, name: &str, discriminator: Option<&str>) -> Option<&mut Inventory> {
        self.inventories.get_mut(&slot(name, discriminator))
    }

    pub fn remove(&mut self, name: &str, discriminator: Option<&str>) -> Option<Inventory> {
        self.inventories.remove(&slot(name, discriminator))
    }

    /// Registered `(name, discriminator)` pairs in sorted order.
    pub fn names(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.inventories
            .keys()
            .map(|(name, disc)| (name.as_str(), disc.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.inventories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inventories.is_empty()
    }
}

fn slot(name: impl Into<String>, discriminator: Option<&str>) -> Slot {
    (name.into(), discriminator.map(str::to_string))
}
