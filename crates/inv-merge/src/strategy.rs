//! Old-version merge strategies.
//!
//! When user overrides written for an earlier application version are
//! loaded, the inventory hands each outdated element together with the
//! element it would replace to an [`OldVersionMerger`], which decides what
//! survives the upgrade.

use inv_types::{Element, KeyRegistry, VERSION_ATTR};

use crate::error::MergeResult;
use crate::unify::unify;

/// Reconciles a user override from an older version with the current element.
pub trait OldVersionMerger {
    /// Produce the element to store in place of `current`, given the
    /// `outdated` override that was written against an older version.
    fn merge(&self, current: &Element, outdated: &Element) -> MergeResult<Element>;
}

impl<F> OldVersionMerger for F
where
    F: Fn(&Element, &Element) -> MergeResult<Element>,
{
    fn merge(&self, current: &Element, outdated: &Element) -> MergeResult<Element> {
        self(current, outdated)
    }
}

/// Keeps the user's customizations by unifying the outdated override over
/// the current element, then drops the stale `version` stamp.
#[derive(Clone, Debug)]
pub struct OverlayMerger {
    registry: KeyRegistry,
}

impl OverlayMerger {
    pub fn new(registry: KeyRegistry) -> Self {
        Self { registry }
    }
}

impl OldVersionMerger for OverlayMerger {
    fn merge(&self, current: &Element, outdated: &Element) -> MergeResult<Element> {
        let mut merged = unify(Some(outdated), Some(current), &self.registry)?;
        merged.remove_attr(VERSION_ATTR);
        Ok(merged)
    }
}
