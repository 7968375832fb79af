//! Keyed tree unification.
//!
//! `unify(alteration, base)` builds a third, independent element:
//!
//! 1. Named after the alteration; all alteration attributes are copied, then
//!    every base attribute the result does not carry yet.
//! 2. Children are paired by [`Key`](inv_types::Key). By default the base
//!    children drive the output order and matching alteration children are
//!    unified over them; alteration children left unmatched are appended.
//!    With `reorder="true"` on the alteration the alteration children drive
//!    the order instead and leftover base children are appended.
//! 3. Each child takes part in at most one pairing.
//!
//! Neither input is modified.

use inv_types::{Element, KeyRegistry, REORDER_ATTR};
use tracing::trace;

use crate::error::{MergeError, MergeResult};

/// Unify `alteration` over `base`.
///
/// When only one side is present a deep copy of it is returned.
pub fn unify(
    alteration: Option<&Element>,
    base: Option<&Element>,
    registry: &KeyRegistry,
) -> MergeResult<Element> {
    match (alteration, base) {
        (None, None) => Err(MergeError::BothInputsAbsent),
        (Some(alteration), None) => Ok(alteration.clone()),
        (None, Some(base)) => Ok(base.clone()),
        (Some(alteration), Some(base)) => Ok(unify_pair(alteration, base, registry)),
    }
}

fn unify_pair(alteration: &Element, base: &Element, registry: &KeyRegistry) -> Element {
    let mut result = Element::new(alteration.name());
    for (name, value) in alteration.attributes() {
        result.set_attr(name.as_str(), value.as_str());
    }
    result.merge_missing_attributes(base);

    if alteration.attr_bool(REORDER_ATTR, false) {
        let mut pool: Vec<&Element> = base.children().iter().collect();
        for alt_child in alteration.children() {
            let child = match take_match(&mut pool, alt_child, registry) {
                Some(base_child) => unify_pair(alt_child, base_child, registry),
                None => alt_child.clone(),
            };
            result.push_child(child);
        }
        for leftover in pool {
            result.push_child(leftover.clone());
        }
    } else {
        let mut pool: Vec<&Element> = alteration.children().iter().collect();
        for base_child in base.children() {
            let child = match take_match(&mut pool, base_child, registry) {
                Some(alt_child) => unify_pair(alt_child, base_child, registry),
                None => base_child.clone(),
            };
            result.push_child(child);
        }
        for leftover in pool {
            result.push_child(leftover.clone());
        }
    }
    result
}

/// Remove and return the first element of `pool` with the same name and key
/// as `target`.
fn take_match<'e>(
    pool: &mut Vec<&'e Element>,
    target: &Element,
    registry: &KeyRegistry,
) -> Option<&'e Element> {
    let key = registry.key_of(target);
    let pos = pool
        .iter()
        .position(|candidate| candidate.name() == target.name() && registry.key_of(candidate) == key)?;
    Some(pool.remove(pos))
}

/// Stateful front end to [`unify`] that counts the unifications it performs.
#[derive(Clone, Debug)]
pub struct Unifier {
    registry: KeyRegistry,
    unifications: u64,
}

impl Unifier {
    pub fn new(registry: KeyRegistry) -> Self {
        Self {
            registry,
            unifications: 0,
        }
    }

    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    /// Unify `alteration` over `base`, counting the call.
    pub fn unify(
        &mut self,
        alteration: Option<&Element>,
        base: Option<&Element>,
    ) -> MergeResult<Element> {
        let result = unify(alteration, base, &self.registry)?;
        self.unifications += 1;
        trace!(
            element = result.name(),
            count = self.unifications,
            "unified element"
        );
        Ok(result)
    }

    /// Number of successful unifications since construction.
    pub fn unifications(&self) -> u64 {
        self.unifications
    }
}
