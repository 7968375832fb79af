use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Synthetic identity of one element instance.
///
/// Ids are minted from a process-wide counter when an element is created or
/// cloned, so two structurally equal elements still have distinct ids. Caches
/// that memoize work per element pair key on ids rather than on addresses.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(u64);

impl ElementId {
    /// Mint a new, never before issued id.
    pub fn fresh() -> Self {
        Self(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({})", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e#{}", self.0)
    }
}

/// A named, attributed tree node.
///
/// Attribute values are always strings; interpretation (integers, flags) is
/// left to call sites through [`Element::attr_or`] and [`Element::attr_bool`].
///
/// Cloning is deep and mints a fresh [`ElementId`] for every node of the copy.
/// Equality is structural: ids are ignored and attribute order does not
/// matter, while child order does.
#[derive(Serialize, Deserialize)]
pub struct Element {
    #[serde(skip, default = "ElementId::fresh")]
    id: ElementId,
    name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    attributes: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Element>,
}

impl Element {
    /// Create an element with no attributes and no children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ElementId::fresh(),
            name: name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder: set an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder: append a child.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Element> {
        &mut self.children
    }

    /// Read an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Remove an attribute, preserving the order of the remaining ones.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    /// Append a child.
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Copy every attribute of `other` that this element does not carry yet.
    ///
    /// Existing values are never overwritten.
    pub fn merge_missing_attributes(&mut self, other: &Element) {
        for (name, value) in &other.attributes {
            if !self.attributes.contains_key(name) {
                self.attributes.insert(name.clone(), value.clone());
            }
        }
    }

    /// Parse an attribute, falling back to `default` when it is absent or
    /// does not parse.
    pub fn attr_or<T: FromStr>(&self, name: &str, default: T) -> T {
        self.attr(name)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Read a boolean attribute (`true`/`false`, case-insensitive).
    pub fn attr_bool(&self, name: &str, default: bool) -> bool {
        match self.attr(name).map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "true" => true,
            Some(v) if v == "false" => false,
            _ => default,
        }
    }

    /// Parse an optional attribute strictly: absent is `Ok(None)`, a value
    /// that does not parse is an error.
    pub fn attr_parsed<T: FromStr>(&self, name: &str) -> Result<Option<T>, TypeError> {
        match self.attr(name) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| TypeError::InvalidAttribute {
                    element: self.name.clone(),
                    attribute: name.to_string(),
                    value: raw.to_string(),
                }),
        }
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Element::node_count).sum::<usize>()
    }
}

impl Clone for Element {
    fn clone(&self) -> Self {
        Self {
            id: ElementId::fresh(),
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            children: self.children.clone(),
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.attributes == other.attributes
            && self.children == other.children
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Element");
        s.field("name", &self.name);
        if !self.attributes.is_empty() {
            s.field("attributes", &self.attributes);
        }
        if !self.children.is_empty() {
            s.field("children", &self.children);
        }
        s.finish()
    }
}
