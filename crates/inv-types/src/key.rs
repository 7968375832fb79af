//! Element keys and the key-attribute registry.
//!
//! A [`Key`] is the tuple of an element's name and the values of its
//! configured key attributes. Values are lower-cased on construction so that
//! comparison, hashing, and ordering are all case-insensitive. An absent
//! attribute (`None`) is distinct from an empty one (`Some("")`).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::element::Element;

/// Identity of one element instance within a store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    name: String,
    values: Vec<Option<String>>,
}

impl Key {
    /// Build a key, normalizing every present value to lower case.
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            values: values
                .into_iter()
                .map(|v| v.map(|s| s.as_ref().to_lowercase()))
                .collect(),
        }
    }

    /// Build a key whose values are all present.
    pub fn of<S: AsRef<str>>(name: impl Into<String>, values: &[S]) -> Self {
        Self::new(name, values.iter().map(Some))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The last slot: by convention the element's own id, which is what a
    /// `base="..."` reference is matched against.
    pub fn id(&self) -> Option<&str> {
        self.values.last().and_then(|v| v.as_deref())
    }

    /// Copy of this key with the last slot replaced by `id`.
    ///
    /// A key with no slots is returned unchanged.
    pub fn with_id(&self, id: &str) -> Key {
        let mut values = self.values.clone();
        if let Some(last) = values.last_mut() {
            *last = Some(id.to_lowercase());
        }
        Key {
            name: self.name.clone(),
            values,
        }
    }

    /// Whether `self` has the same name and starts with every slot of `prefix`.
    ///
    /// Slots missing from `prefix` act as wildcards.
    pub fn matches_prefix(&self, prefix: &Key) -> bool {
        self.name == prefix.name
            && prefix.values.len() <= self.values.len()
            && self.values.iter().zip(&prefix.values).all(|(a, b)| a == b)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.name)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match value {
                Some(v) => write!(f, "{v}")?,
                None => write!(f, "-")?,
            }
        }
        write!(f, "]")
    }
}

/// Per-element-name ordered list of the attributes forming its key.
///
/// Built once, then only read. Element names without an entry have an empty
/// key, so at most one such element exists per name in a store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyRegistry {
    attributes: HashMap<String, Vec<String>>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: register the key attributes of `element`.
    pub fn with<S: Into<String>>(
        mut self,
        element: impl Into<String>,
        attributes: impl IntoIterator<Item = S>,
    ) -> Self {
        self.attributes.insert(
            element.into(),
            attributes.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Key attribute names of `element`, empty when unregistered.
    pub fn attributes_for(&self, element: &str) -> &[String] {
        self.attributes
            .get(element)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Attribute holding an element's own id (the last key attribute).
    pub fn id_attribute(&self, element: &str) -> Option<&str> {
        self.attributes_for(element).last().map(String::as_str)
    }

    /// First key attribute, used to name per-type override files.
    pub fn first_attribute(&self, element: &str) -> Option<&str> {
        self.attributes_for(element).first().map(String::as_str)
    }

    /// Extract the key of `element`.
    pub fn key_of(&self, element: &Element) -> Key {
        Key::new(
            element.name(),
            self.attributes_for(element.name())
                .iter()
                .map(|attr| element.attr(attr)),
        )
    }

    /// Registered element names, sorted.
    pub fn element_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<K, V, S> FromIterator<(K, V)> for KeyRegistry
where
    K: Into<String>,
    V: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::new(), |reg, (element, attrs)| reg.with(element, attrs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn registry() -> KeyRegistry {
        KeyRegistry::new()
            .with("layout", ["class", "type", "id"])
            .with("part", ["ref"])
    }

    #[test]
    fn key_values_are_case_insensitive() {
        assert_eq!(
            Key::of("layout", &["LexEntry", "Detail", "Basic"]),
            Key::of("layout", &["lexentry", "DETAIL", "basic"])
        );
    }

    #[test]
    fn absent_differs_from_empty() {
        let absent = Key::new("part", [None::<&str>]);
        let empty = Key::new("part", [Some("")]);
        assert_ne!(absent, empty);
    }

    #[test]
    fn key_of_reads_registered_attributes_in_order() {
        let e = Element::new("layout")
            .with_attr("id", "Basic")
            .with_attr("class", "X")
            .with_attr("type", "Detail");
        let key = registry().key_of(&e);
        assert_eq!(key, Key::of("layout", &["x", "detail", "basic"]));
        assert_eq!(key.id(), Some("basic"));
    }

    #[test]
    fn key_of_missing_attribute_is_none() {
        let e = Element::new("layout").with_attr("class", "X");
        let key = registry().key_of(&e);
        assert_eq!(key.values(), &[Some("x".to_string()), None, None]);
    }

    #[test]
    fn unregistered_name_has_empty_key() {
        let key = registry().key_of(&Element::new("settings").with_attr("a", "b"));
        assert!(key.is_empty());
        assert_eq!(key, Key::of::<&str>("settings", &[]));
    }

    #[test]
    fn with_id_replaces_last_slot() {
        let key = Key::of("layout", &["X", "Detail", "Advanced"]);
        assert_eq!(key.with_id("Basic"), Key::of("layout", &["x", "detail", "basic"]));
    }

    #[test]
    fn prefix_matching_treats_missing_slots_as_wildcards() {
        let key = Key::of("layout", &["X", "Detail", "Basic"]);
        assert!(key.matches_prefix(&Key::of("layout", &["x"])));
        assert!(key.matches_prefix(&Key::of::<&str>("layout", &[])));
        assert!(!key.matches_prefix(&Key::of("layout", &["y"])));
        assert!(!key.matches_prefix(&Key::of("part", &["x"])));
    }

    #[test]
    fn display_is_readable() {
        let key = Key::new("layout", [Some("X"), None, Some("Basic")]);
        assert_eq!(key.to_string(), "layout[x, -, basic]");
    }

    #[test]
    fn registry_id_and_first_attributes() {
        let reg = registry();
        assert_eq!(reg.id_attribute("layout"), Some("id"));
        assert_eq!(reg.first_attribute("layout"), Some("class"));
        assert_eq!(reg.id_attribute("unknown"), None);
        assert_eq!(reg.element_names(), vec!["layout", "part"]);
    }

    #[test]
    fn registry_from_iterator() {
        let reg: KeyRegistry = [("layout", vec!["class", "id"])].into_iter().collect();
        assert_eq!(reg.attributes_for("layout"), &["class".to_string(), "id".to_string()]);
    }

    fn hash_of(key: &Key) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    fn values_strategy() -> impl Strategy<Value = Vec<Option<String>>> {
        prop::collection::vec(prop::option::of("[A-Za-z0-9]{0,6}"), 0..4)
    }

    proptest! {
        #[test]
        fn prop_case_changes_keep_key_and_hash(values in values_strategy()) {
            let upper = Key::new("layout", values.iter().map(|v| v.as_ref().map(|s| s.to_uppercase())));
            let lower = Key::new("layout", values.iter().map(|v| v.as_ref().map(|s| s.to_lowercase())));
            prop_assert_eq!(hash_of(&upper), hash_of(&lower));
            prop_assert_eq!(upper, lower);
        }

        #[test]
        fn prop_absent_never_equals_empty(values in values_strategy(), slot in 0usize..4) {
            prop_assume!(!values.is_empty());
            let slot = slot % values.len();
            let mut absent = values.clone();
            absent[slot] = None;
            let mut empty = values;
            empty[slot] = Some(String::new());
            prop_assert_ne!(Key::new("part", absent), Key::new("part", empty));
        }

        #[test]
        fn prop_every_key_matches_empty_and_own_prefixes(values in values_strategy()) {
            let key = Key::new("layout", values.clone());
            prop_assert!(key.matches_prefix(&Key::of::<&str>("layout", &[])));
            prop_assert!(!key.matches_prefix(&Key::of::<&str>("part", &[])));
            for len in 0..=values.len() {
                let prefix = Key::new("layout", values[..len].iter().cloned());
                prop_assert!(key.matches_prefix(&prefix));
            }
        }
    }
}
