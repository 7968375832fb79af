use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use inv_codec::Selection;
use inv_types::KeyRegistry;
use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, InventoryResult};

/// Configuration of one inventory instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Logical name, e.g. `layouts`.
    pub name: String,
    /// Configuration directories, scanned in order.
    pub directories: Vec<PathBuf>,
    /// File name glob for candidate documents.
    pub file_pattern: String,
    /// Selection of the managed elements within each document.
    pub selection: String,
    /// Key attribute names per element name; the last one is the element's id.
    pub key_attributes: BTreeMap<String, Vec<String>>,
    /// Directory holding persisted user overrides.
    pub user_settings_dir: Option<PathBuf>,
    /// Version stamped on persisted overrides.
    pub app_version: u32,
    /// Resolve every pending derivation at the end of a load so that
    /// dangling `base` references fail the load instead of the first lookup.
    pub resolve_on_load: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        let mut key_attributes = BTreeMap::new();
        key_attributes.insert(
            "layout".to_string(),
            vec!["class".to_string(), "type".to_string(), "id".to_string()],
        );
        key_attributes.insert("part".to_string(), vec!["ref".to_string()]);
        Self {
            name: "layouts".into(),
            directories: Vec::new(),
            file_pattern: "*.fwlayout".into(),
            selection: "/LayoutInventory/*".into(),
            key_attributes,
            user_settings_dir: None,
            app_version: 1,
            resolve_on_load: false,
        }
    }
}

impl InventoryConfig {
    /// Parse a TOML document; missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> InventoryResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML configuration file.
    ///
    /// Relative directories are resolved against the file's own directory.
    pub fn from_file(path: &Path) -> InventoryResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            config.directories = config
                .directories
                .into_iter()
                .map(|d| if d.is_relative() { base.join(d) } else { d })
                .collect();
            config.user_settings_dir = config
                .user_settings_dir
                .map(|d| if d.is_relative() { base.join(d) } else { d });
        }
        Ok(config)
    }

    /// The immutable key-attribute registry described by this configuration.
    pub fn key_registry(&self) -> KeyRegistry {
        self.key_attributes
            .iter()
            .map(|(element, attrs)| (element.clone(), attrs.clone()))
            .collect()
    }

    pub fn parsed_selection(&self) -> InventoryResult<Selection> {
        Ok(Selection::parse(&self.selection)?)
    }

    /// File name suffix of persisted override files, taken from the file
    /// pattern (`*.fwlayout` gives `.fwlayout`).
    pub fn override_suffix(&self) -> InventoryResult<&str> {
        match self.file_pattern.strip_prefix('*') {
            Some(suffix) if !suffix.contains(['*', '?', '[', '{']) => Ok(suffix),
            _ => Err(InventoryError::Config(format!(
                "file pattern {:?} must be '*' followed by a literal suffix",
                self.file_pattern
            ))),
        }
    }
}
