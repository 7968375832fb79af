//! User override persistence.
//!
//! Overrides are written to one file per element name and id (the value of
//! the element's first key attribute) in the user settings directory:
//! `{discriminator}_{id}{suffix}`, with `default$$` standing in for an absent
//! discriminator. Each file is a wrapper document built from the selection
//! expression holding any number of managed elements.

use std::path::{Path, PathBuf};

use inv_store::{ElementStore, StoreKind};
use inv_types::{Element, VERSION_ATTR};
use tracing::{debug, info};

use super::{Inventory, OverrideMode, UserOverrides};
use crate::error::{InventoryError, InventoryResult};
use crate::source::{glob_escape, SourceFile};

const DEFAULT_PREFIX: &str = "default$$";

/// Replace characters that cannot appear in a portable file name.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '$') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn file_prefix(discriminator: Option<&str>) -> String {
    discriminator.map_or_else(|| DEFAULT_PREFIX.to_string(), sanitize)
}

impl Inventory {
    fn user_dir(&self) -> InventoryResult<&Path> {
        self.config
            .user_settings_dir
            .as_deref()
            .ok_or_else(|| InventoryError::Config("no user settings directory configured".into()))
    }

    /// The file `node` is persisted to.
    pub fn override_file_path(
        &self,
        node: &Element,
        discriminator: Option<&str>,
    ) -> InventoryResult<PathBuf> {
        let attribute = self.registry.first_attribute(node.name()).ok_or_else(|| {
            InventoryError::Config(format!("no key attributes registered for <{}>", node.name()))
        })?;
        let id = node
            .attr(attribute)
            .ok_or_else(|| InventoryError::MissingKeyAttribute {
                element: node.name().to_string(),
                attribute: attribute.to_string(),
            })?;
        let file_name = format!(
            "{}_{}{}",
            file_prefix(discriminator),
            sanitize(id),
            self.config.override_suffix()?
        );
        Ok(self.user_dir()?.join(file_name))
    }

    /// Apply `node` to the live inventory and write it to its override file.
    ///
    /// The node is stamped with the current application version. An element
    /// with the same key already in the file is replaced; re-persisting an
    /// override replaces the previous one. Nothing is written when the node
    /// cannot be applied. Returns the file written.
    pub fn persist_override(
        &mut self,
        node: &Element,
        discriminator: Option<&str>,
    ) -> InventoryResult<PathBuf> {
        let path = self.override_file_path(node, discriminator)?;
        let key = self.registry.key_of(node);
        let mut stamped = node.clone();
        stamped.set_attr(VERSION_ATTR, self.config.app_version.to_string());

        let exists = self
            .user_files(discriminator)?
            .iter()
            .any(|file| file.path == path);
        let mut doc = if exists {
            self.source.load(&path)?
        } else {
            self.selection.wrapper_document()?
        };
        let wrapper = self.selection.wrapper_mut(&mut doc)?;
        let existing = wrapper
            .children()
            .iter()
            .position(|c| c.name() == node.name() && self.registry.key_of(c) == key);
        match existing {
            Some(pos) => wrapper.children_mut()[pos] = stamped.clone(),
            None => wrapper.push_child(stamped.clone()),
        }

        self.route(key.clone(), &stamped, Some(&path), OverrideMode::Replace)?;
        self.source.save(&path, &doc)?;
        info!(key = %key, file = %path.display(), "persisted override");
        Ok(path)
    }

    /// Delete every override file of `discriminator`. The live inventory is
    /// left as it is. Returns the number of files removed.
    pub fn delete_all_overrides(&self, discriminator: Option<&str>) -> InventoryResult<usize> {
        let files = self.user_files(discriminator)?;
        for file in &files {
            self.source.delete(&file.path)?;
            debug!(file = %file.path.display(), "deleted override file");
        }
        info!(
            inventory = %self.config.name,
            count = files.len(),
            "deleted user overrides"
        );
        Ok(files.len())
    }

    /// Load the user override files of `discriminator` on top of the
    /// configured documents. Elements whose `version` differs from `version`
    /// are outdated: they are merged by the installed merger or dropped.
    ///
    /// The set is remembered and replayed by every later reload. Returns the
    /// number of files read.
    pub fn load_user_overrides(
        &mut self,
        version: u32,
        discriminator: Option<&str>,
    ) -> InventoryResult<usize> {
        let previous = self.user.replace(UserOverrides {
            version,
            discriminator: discriminator.map(str::to_string),
        });
        if previous.is_some() {
            self.reload()?;
            return Ok(self.user_files(discriminator)?.len());
        }
        self.load_user_files(version, discriminator)
    }

    /// Override files of `discriminator`, empty when no user directory is
    /// configured or it does not exist.
    pub(super) fn user_files(&self, discriminator: Option<&str>) -> InventoryResult<Vec<SourceFile>> {
        let Some(dir) = &self.config.user_settings_dir else {
            return Ok(Vec::new());
        };
        let pattern = format!(
            "{}_*{}",
            glob_escape(&file_prefix(discriminator)),
            glob_escape(self.config.override_suffix()?)
        );
        self.source.enumerate(std::slice::from_ref(dir), &pattern)
    }

    pub(super) fn load_user_files(
        &mut self,
        version: u32,
        discriminator: Option<&str>,
    ) -> InventoryResult<usize> {
        let files = self.user_files(discriminator)?;
        for file in &files {
            self.load_file(&file.path, Some(version))?;
        }
        debug!(
            files = files.len(),
            version,
            overrides = self.stores.get(StoreKind::Base).len(),
            "loaded user overrides"
        );
        let count = files.len();
        self.files.extend(files);
        Ok(count)
    }
}
