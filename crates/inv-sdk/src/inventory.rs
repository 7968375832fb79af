use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use inv_codec::Selection;
use inv_index::{CacheStats, Cached, LookupCache, UnifiedCache};
use inv_merge::{OldVersionMerger, Unifier};
use inv_store::{ElementStore, StoreKind, StoreSet};
use inv_types::{Element, Key, KeyRegistry, BASE_ATTR, VERSION_ATTR};
use tracing::{debug, info, warn};

use crate::config::InventoryConfig;
use crate::error::{InventoryError, InventoryResult};
use crate::source::{DocumentSource, SourceFile};

mod persist;

type Merger = Box<dyn OldVersionMerger + Send + Sync>;

/// The user-scoped override set last loaded, replayed on reload.
#[derive(Clone, Debug, PartialEq, Eq)]
struct UserOverrides {
    version: u32,
    discriminator: Option<String>,
}

/// How an override for an already overridden key is handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OverrideMode {
    /// Loading: a second override of the same key is an error.
    Load,
    /// Persisting: the new override replaces the previous one.
    Replace,
}

/// An element inventory.
///
/// Loads keyed elements from the documents of a [`DocumentSource`], resolves
/// `base="..."` derivations lazily on lookup, applies in-place overrides and
/// persists user overrides.
///
/// Elements live in three stores:
///
/// - **Main**: effective elements, as returned by [`get_element`](Self::get_element).
/// - **Alterations**: loaded elements carrying a `base` attribute, as written.
/// - **Base**: the pre-override snapshot of every overridden element.
///
/// Every store holds its own copy of each element.
pub struct Inventory {
    config: InventoryConfig,
    selection: Selection,
    registry: KeyRegistry,
    source: Arc<dyn DocumentSource>,
    stores: StoreSet,
    cache: LookupCache,
    unified: UnifiedCache,
    unifier: Unifier,
    merger: Option<Merger>,
    origins: HashMap<Key, PathBuf>,
    files: Vec<SourceFile>,
    user: Option<UserOverrides>,
}

impl Inventory {
    /// Create an empty inventory. Nothing is read until [`reload`](Self::reload).
    pub fn new(config: InventoryConfig, source: Arc<dyn DocumentSource>) -> InventoryResult<Self> {
        let selection = config.parsed_selection()?;
        let registry = config.key_registry();
        Ok(Self {
            selection,
            unifier: Unifier::new(registry.clone()),
            registry,
            config,
            source,
            stores: StoreSet::new(),
            cache: LookupCache::new(),
            unified: UnifiedCache::new(),
            merger: None,
            origins: HashMap::new(),
            files: Vec::new(),
            user: None,
        })
    }

    /// Create an inventory and load every configured document.
    pub fn load(config: InventoryConfig, source: Arc<dyn DocumentSource>) -> InventoryResult<Self> {
        let mut inventory = Self::new(config, source)?;
        inventory.reload()?;
        Ok(inventory)
    }

    /// Install the strategy used to merge outdated user overrides.
    pub fn with_merger(mut self, merger: impl OldVersionMerger + Send + Sync + 'static) -> Self {
        self.merger = Some(Box::new(merger));
        self
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    // ---------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------

    /// Discard everything and load all documents again, followed by the user
    /// overrides if any were loaded before.
    ///
    /// On error the elements of the documents processed so far stay loaded.
    pub fn reload(&mut self) -> InventoryResult<()> {
        self.reset();
        let files = self
            .source
            .enumerate(&self.config.directories, &self.config.file_pattern)?;
        for file in &files {
            self.load_file(&file.path, None)?;
        }
        self.files = files;

        if let Some(user) = self.user.clone() {
            self.load_user_files(user.version, user.discriminator.as_deref())?;
        }
        if self.config.resolve_on_load {
            self.resolve_pending()?;
        }
        info!(
            inventory = %self.config.name,
            files = self.files.len(),
            elements = self.element_count(),
            nodes = self.stores.get(StoreKind::Main).total_nodes(),
            "inventory loaded"
        );
        Ok(())
    }

    /// Reload if the set of documents or any of their timestamps changed.
    ///
    /// Returns `true` if a reload happened.
    pub fn reload_if_changed(&mut self) -> InventoryResult<bool> {
        let mut current = self
            .source
            .enumerate(&self.config.directories, &self.config.file_pattern)?;
        if let Some(user) = &self.user {
            current.extend(self.user_files(user.discriminator.as_deref())?);
        }
        if current == self.files {
            return Ok(false);
        }
        debug!(inventory = %self.config.name, "documents changed, reloading");
        self.reload()?;
        Ok(true)
    }

    fn reset(&mut self) {
        self.stores.clear();
        self.cache.clear();
        self.unified.clear();
        self.origins.clear();
        self.files.clear();
    }

    /// Load one document, ingesting every selected element.
    ///
    /// `file_version` is set for user override documents; elements whose
    /// `version` differs from it are outdated.
    fn load_file(&mut self, path: &Path, file_version: Option<u32>) -> InventoryResult<usize> {
        let root = self.source.load(path)?;
        let root_matches = self
            .selection
            .steps()
            .first()
            .is_some_and(|step| step.matches(&root));
        if !root_matches {
            warn!(
                file = %path.display(),
                root = root.name(),
                selection = %self.selection,
                "document root does not match selection, skipping"
            );
            return Ok(0);
        }

        let selected = self.selection.select(&root);
        for node in &selected {
            self.ingest_from(node, file_version, Some(path))?;
        }
        debug!(file = %path.display(), elements = selected.len(), "loaded document");
        Ok(selected.len())
    }

    /// Ingest one element as if it had been read from a document.
    pub fn ingest(&mut self, node: &Element) -> InventoryResult<()> {
        self.ingest_from(node, None, None)
    }

    fn ingest_from(
        &mut self,
        node: &Element,
        file_version: Option<u32>,
        origin: Option<&Path>,
    ) -> InventoryResult<()> {
        let key = self.registry.key_of(node);
        if let Some(version) = file_version {
            if is_outdated(node, version)? {
                return self.ingest_outdated(key, node, origin);
            }
        }
        self.route(key, node, origin, OverrideMode::Load)
    }

    /// Dispatch an element to the plain, override or derivation path.
    fn route(
        &mut self,
        key: Key,
        node: &Element,
        origin: Option<&Path>,
        mode: OverrideMode,
    ) -> InventoryResult<()> {
        match node.attr(BASE_ATTR) {
            None => self.insert_plain(key, node).map(|_| ()),
            Some(base) if key.id() == Some(base.to_lowercase().as_str()) => {
                self.apply_override(key, node, origin, mode).map(|_| ())
            }
            Some(_) => self.insert_derivation(key, node, origin),
        }
    }

    fn ingest_outdated(
        &mut self,
        key: Key,
        node: &Element,
        origin: Option<&Path>,
    ) -> InventoryResult<()> {
        if self.merger.is_none() || node.has_attr(BASE_ATTR) {
            warn!(
                key = %key,
                version = node.attr(VERSION_ATTR).unwrap_or_default(),
                file = origin.map(|p| p.display().to_string()).unwrap_or_default(),
                "dropping outdated element"
            );
            return Ok(());
        }

        let Some(current) = self.resolve(&key, &mut Vec::new())? else {
            debug!(key = %key, "no current element for outdated element, skipping");
            return Ok(());
        };
        let Some(merger) = &self.merger else {
            return Ok(());
        };
        let merged = merger.merge(&current, node)?;
        debug!(key = %key, "merged outdated element");
        self.insert_plain(key, &merged).map(|_| ())
    }

    /// A plain element replaces whatever Main holds under its key.
    fn insert_plain(&mut self, key: Key, node: &Element) -> InventoryResult<Arc<Element>> {
        self.put(StoreKind::Main, key, node)
    }

    /// Apply an override (`base` equal to the element's own id): snapshot
    /// the current element into Base and replace Main with the unification.
    fn apply_override(
        &mut self,
        key: Key,
        node: &Element,
        origin: Option<&Path>,
        mode: OverrideMode,
    ) -> InventoryResult<Arc<Element>> {
        let existing = self.stores.get(StoreKind::Base).get(&key);
        let snapshot = match existing {
            Some(existing) if mode == OverrideMode::Replace => existing,
            Some(_) => {
                return Err(InventoryError::DuplicateOverride {
                    key,
                    file: origin.map(Path::to_path_buf),
                })
            }
            None => {
                let current = self.resolve(&key, &mut Vec::new())?.ok_or_else(|| {
                    InventoryError::NoBaseToOverride {
                        key: key.clone(),
                        file: origin.map(Path::to_path_buf),
                    }
                })?;
                let snapshot = self
                    .stores
                    .get_mut(StoreKind::Base)
                    .insert_new(key.clone(), &current)?;
                self.cache
                    .put(StoreKind::Base, key.clone(), Some(Arc::clone(&snapshot)));
                snapshot
            }
        };

        let unified = self.unifier.unify(Some(node), Some(snapshot.as_ref()))?;
        let effective = self.put(StoreKind::Main, key.clone(), &unified)?;
        self.put(StoreKind::Alterations, key.clone(), node)?;
        self.record_origin(&key, origin);
        debug!(key = %key, "applied override");
        Ok(effective)
    }

    /// Store an ordinary derivation for lazy resolution.
    ///
    /// A Main entry under the same key is displaced unless it is the result
    /// of an override.
    fn insert_derivation(
        &mut self,
        key: Key,
        node: &Element,
        origin: Option<&Path>,
    ) -> InventoryResult<()> {
        if !self.stores.get(StoreKind::Base).contains(&key)
            && self.stores.get_mut(StoreKind::Main).remove(&key).is_some()
        {
            debug!(key = %key, "derivation displaces loaded element");
        }
        self.cache.invalidate(StoreKind::Main, &key);
        self.put(StoreKind::Alterations, key.clone(), node)?;
        self.record_origin(&key, origin);
        Ok(())
    }

    fn record_origin(&mut self, key: &Key, origin: Option<&Path>) {
        match origin {
            Some(path) => {
                self.origins.insert(key.clone(), path.to_path_buf());
            }
            None => {
                self.origins.remove(key);
            }
        }
    }

    /// Insert into a store, keeping the cache entry for the key current.
    fn put(&mut self, store: StoreKind, key: Key, element: &Element) -> InventoryResult<Arc<Element>> {
        let stored = self.stores.get_mut(store).insert(key.clone(), element)?;
        self.cache.put(store, key, Some(Arc::clone(&stored)));
        Ok(stored)
    }

    // ---------------------------------------------------------------
    // Resolution
    // ---------------------------------------------------------------

    /// The effective element for `key`, resolving pending derivations.
    ///
    /// `chain` holds the keys being resolved further up the stack.
    fn resolve(&mut self, key: &Key, chain: &mut Vec<Key>) -> InventoryResult<Option<Arc<Element>>> {
        if let Some(cached) = self.cache.get(StoreKind::Main, key) {
            return Ok(cached.element());
        }
        if let Some(found) = self.stores.get(StoreKind::Main).get(key) {
            self.cache
                .put(StoreKind::Main, key.clone(), Some(Arc::clone(&found)));
            return Ok(Some(found));
        }
        let Some(alteration) = self.stores.get(StoreKind::Alterations).get(key) else {
            self.cache.put(StoreKind::Main, key.clone(), Cached::Missing);
            return Ok(None);
        };
        let Some(base_id) = alteration.attr(BASE_ATTR) else {
            return self.put(StoreKind::Main, key.clone(), &alteration).map(Some);
        };

        if chain.contains(key) {
            return Err(InventoryError::DerivationCycle { key: key.clone() });
        }
        let base_key = key.with_id(base_id);
        if base_key == *key {
            return Err(self.missing_base(key, base_id));
        }

        chain.push(key.clone());
        let base = self.resolve(&base_key, chain);
        chain.pop();
        let Some(base) = base? else {
            return Err(self.missing_base(key, base_id));
        };

        let unified = self
            .unifier
            .unify(Some(alteration.as_ref()), Some(base.as_ref()))?;
        debug!(key = %key, base = %base_key, "resolved derivation");
        self.put(StoreKind::Main, key.clone(), &unified).map(Some)
    }

    fn missing_base(&self, key: &Key, base: &str) -> InventoryError {
        InventoryError::MissingBase {
            key: key.clone(),
            base: base.to_string(),
            file: self.origins.get(key).cloned(),
        }
    }

    /// Resolve every derivation that has no Main entry yet.
    pub fn resolve_pending(&mut self) -> InventoryResult<usize> {
        let pending: Vec<Key> = self
            .stores
            .get(StoreKind::Alterations)
            .keys()
            .into_iter()
            .filter(|key| !self.stores.get(StoreKind::Main).contains(key))
            .collect();
        for key in &pending {
            self.resolve(key, &mut Vec::new())?;
        }
        Ok(pending.len())
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// The effective element named `name` with the given key values.
    pub fn get_element<S: AsRef<str>>(
        &mut self,
        name: &str,
        values: &[S],
    ) -> InventoryResult<Option<Arc<Element>>> {
        self.get_element_by_key(&Key::of(name, values))
    }

    pub fn get_element_by_key(&mut self, key: &Key) -> InventoryResult<Option<Arc<Element>>> {
        self.resolve(key, &mut Vec::new())
    }

    /// Every effective element whose key starts with `values`; missing
    /// trailing slots match anything. Results are in load order.
    pub fn get_elements<S: AsRef<str>>(
        &mut self,
        name: &str,
        values: &[S],
    ) -> InventoryResult<Vec<Arc<Element>>> {
        let prefix = Key::of(name, values);
        let pending: Vec<Key> = self
            .stores
            .get(StoreKind::Alterations)
            .keys()
            .into_iter()
            .filter(|key| key.matches_prefix(&prefix))
            .filter(|key| !self.stores.get(StoreKind::Main).contains(key))
            .collect();
        for key in &pending {
            self.resolve(key, &mut Vec::new())?;
        }
        Ok(self.stores.get(StoreKind::Main).scan_prefix(&prefix))
    }

    /// The derived or overriding element as it was loaded.
    pub fn get_alteration<S: AsRef<str>>(&mut self, name: &str, values: &[S]) -> Option<Arc<Element>> {
        self.lookup(StoreKind::Alterations, &Key::of(name, values))
    }

    /// The element as it was before being overridden.
    pub fn get_base<S: AsRef<str>>(&mut self, name: &str, values: &[S]) -> Option<Arc<Element>> {
        self.lookup(StoreKind::Base, &Key::of(name, values))
    }

    fn lookup(&mut self, store: StoreKind, key: &Key) -> Option<Arc<Element>> {
        if let Some(cached) = self.cache.get(store, key) {
            return cached.element();
        }
        let found = self.stores.get(store).get(key);
        self.cache.put(store, key.clone(), found.clone());
        found
    }

    /// Unify `alteration` over `main`, memoized on the pair's identities.
    pub fn get_unified(&mut self, main: &Element, alteration: &Element) -> InventoryResult<Arc<Element>> {
        if let Some(hit) = self.unified.get(main.id(), alteration.id()) {
            return Ok(hit);
        }
        let unified = Arc::new(self.unifier.unify(Some(alteration), Some(main))?);
        self.unified
            .put(main.id(), alteration.id(), Arc::clone(&unified));
        Ok(unified)
    }

    // ---------------------------------------------------------------
    // Statistics
    // ---------------------------------------------------------------

    /// Unifications performed since construction.
    pub fn unify_count(&self) -> u64 {
        self.unifier.unifications()
    }

    /// Number of effective elements currently in Main.
    pub fn element_count(&self) -> usize {
        self.stores.get(StoreKind::Main).len()
    }

    /// Documents read by the last load, user overrides included.
    pub fn loaded_files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Whether `node` carries a version stamp other than `version`. A stamp
/// that is not a number is a configuration error.
fn is_outdated(node: &Element, version: u32) -> InventoryResult<bool> {
    let stamp = node.attr_parsed::<u32>(VERSION_ATTR)?;
    Ok(stamp.is_some_and(|stamp| stamp != version))
}

impl std::fmt::Debug for Inventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inventory")
            .field("name", &self.config.name)
            .field("main", &self.stores.get(StoreKind::Main).len())
            .field("alterations", &self.stores.get(StoreKind::Alterations).len())
            .field("base", &self.stores.get(StoreKind::Base).len())
            .field("files", &self.files.len())
            .field("has_merger", &self.merger.is_some())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::source::MemoryDocumentSource;

    pub(crate) const BASIC: &str = r#"<LayoutInventory>
  <layout class="X" type="Detail" id="Basic" bg="white">
    <part ref="Name"/>
  </layout>
</LayoutInventory>"#;

    const ADVANCED: &str = r#"<LayoutInventory>
  <layout class="X" type="Detail" id="Advanced" base="Basic">
    <part ref="Gloss"/>
  </layout>
</LayoutInventory>"#;

    const OVERRIDE: &str = r#"<LayoutInventory>
  <layout class="X" type="Detail" id="Basic" base="Basic" bg="grey"/>
</LayoutInventory>"#;

    pub(crate) fn config() -> InventoryConfig {
        InventoryConfig {
            directories: vec![PathBuf::from("/cfg")],
            ..Default::default()
        }
    }

    fn source(docs: &[(&str, &str)]) -> Arc<MemoryDocumentSource> {
        let source = Arc::new(MemoryDocumentSource::new());
        for (name, text) in docs {
            source.insert(Path::new("/cfg").join(name), *text);
        }
        source
    }

    fn load(docs: &[(&str, &str)]) -> Inventory {
        Inventory::load(config(), source(docs)).unwrap()
    }

    const KEY_BASIC: [&str; 3] = ["X", "Detail", "Basic"];
    const KEY_ADVANCED: [&str; 3] = ["X", "Detail", "Advanced"];

    fn refs(e: &Element) -> Vec<&str> {
        e.children().iter().filter_map(|c| c.attr("ref")).collect()
    }

    // ---------------------------------------------------------------
    // Loading and derivation
    // ---------------------------------------------------------------

    #[test]
    fn derived_element_inherits_from_base() {
        let mut inv = load(&[("a.fwlayout", BASIC), ("b.fwlayout", ADVANCED)]);
        let adv = inv.get_element("layout", &KEY_ADVANCED).unwrap().unwrap();
        assert_eq!(adv.attr("bg"), Some("white"));
        assert_eq!(adv.attr("id"), Some("Advanced"));
        assert_eq!(refs(&adv), vec!["Name", "Gloss"]);
    }

    #[test]
    fn derivation_is_deferred_until_lookup() {
        let mut inv = load(&[("a.fwlayout", BASIC), ("b.fwlayout", ADVANCED)]);
        assert_eq!(inv.unify_count(), 0);
        assert_eq!(inv.element_count(), 1);
        inv.get_element("layout", &KEY_ADVANCED).unwrap();
        assert_eq!(inv.unify_count(), 1);
        assert_eq!(inv.element_count(), 2);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let mut inv = load(&[("a.fwlayout", BASIC)]);
        let found = inv
            .get_element("layout", &["x", "DETAIL", "basic"])
            .unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn later_plain_element_wins() {
        let newer = r#"<LayoutInventory><layout class="X" type="Detail" id="Basic" bg="black"/></LayoutInventory>"#;
        let mut inv = load(&[("a.fwlayout", BASIC), ("b.fwlayout", newer)]);
        let basic = inv.get_element("layout", &KEY_BASIC).unwrap().unwrap();
        assert_eq!(basic.attr("bg"), Some("black"));
        assert!(basic.children().is_empty());
    }

    #[test]
    fn derivation_chains_resolve_transitively() {
        let expert = r#"<LayoutInventory>
  <layout class="X" type="Detail" id="Expert" base="Advanced" bg="black">
    <part ref="Notes"/>
  </layout>
</LayoutInventory>"#;
        let mut inv = load(&[
            ("a.fwlayout", BASIC),
            ("b.fwlayout", ADVANCED),
            ("c.fwlayout", expert),
        ]);
        let e = inv
            .get_element("layout", &["X", "Detail", "Expert"])
            .unwrap()
            .unwrap();
        assert_eq!(e.attr("bg"), Some("black"));
        assert_eq!(refs(&e), vec!["Name", "Gloss", "Notes"]);
        assert_eq!(inv.unify_count(), 2);
    }

    #[test]
    fn derivation_displaces_plain_element_with_same_key() {
        let redefined = r#"<LayoutInventory>
  <layout class="X" type="Detail" id="Advanced" bg="red"/>
</LayoutInventory>"#;
        let mut inv = load(&[
            ("a.fwlayout", BASIC),
            ("b.fwlayout", redefined),
            ("c.fwlayout", ADVANCED),
        ]);
        let adv = inv.get_element("layout", &KEY_ADVANCED).unwrap().unwrap();
        assert_eq!(adv.attr("bg"), Some("white"));
    }

    #[test]
    fn missing_element_is_none_and_cached() {
        let mut inv = load(&[("a.fwlayout", BASIC)]);
        assert!(inv.get_element("layout", &["X", "Detail", "Nope"]).unwrap().is_none());
        assert!(inv.get_element("layout", &["X", "Detail", "Nope"]).unwrap().is_none());
        assert_eq!(inv.cache_stats().hits, 1);
    }

    #[test]
    fn missing_base_is_an_error_naming_the_file() {
        let dangling = r#"<LayoutInventory><layout class="X" type="Detail" id="Advanced" base="Nope"/></LayoutInventory>"#;
        let mut inv = load(&[("a.fwlayout", BASIC), ("b.fwlayout", dangling)]);
        let err = inv.get_element("layout", &KEY_ADVANCED).unwrap_err();
        match &err {
            InventoryError::MissingBase { base, file, .. } => {
                assert_eq!(base, "Nope");
                assert_eq!(file.as_deref(), Some(Path::new("/cfg/b.fwlayout")));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("layout[x, detail, advanced]"));
    }

    #[test]
    fn resolve_on_load_surfaces_missing_base() {
        let dangling = r#"<LayoutInventory><layout class="X" type="Detail" id="Advanced" base="Nope"/></LayoutInventory>"#;
        let config = InventoryConfig {
            resolve_on_load: true,
            ..config()
        };
        let err = Inventory::load(config, source(&[("a.fwlayout", dangling)])).unwrap_err();
        assert!(matches!(err, InventoryError::MissingBase { .. }));
    }

    #[test]
    fn derivation_cycle_is_detected() {
        let cycle = r#"<LayoutInventory>
  <layout class="X" type="Detail" id="A" base="B"/>
  <layout class="X" type="Detail" id="B" base="A"/>
</LayoutInventory>"#;
        let mut inv = load(&[("a.fwlayout", cycle)]);
        let err = inv.get_element("layout", &["X", "Detail", "A"]).unwrap_err();
        assert!(matches!(err, InventoryError::DerivationCycle { .. }));
    }

    #[test]
    fn root_mismatch_is_skipped() {
        let other = r#"<Other><layout class="X" type="Detail" id="Basic"/></Other>"#;
        let inv = load(&[("a.fwlayout", other)]);
        assert_eq!(inv.element_count(), 0);
        assert_eq!(inv.loaded_files().len(), 1);
    }

    #[test]
    fn unparsable_document_aborts_load() {
        let err = Inventory::load(
            config(),
            source(&[("a.fwlayout", BASIC), ("b.fwlayout", "<LayoutInventory>")]),
        )
        .unwrap_err();
        assert!(matches!(err, InventoryError::Codec(_)));
        assert!(err.to_string().contains("b.fwlayout"));
    }

    #[test]
    fn malformed_version_stamp_is_an_error() {
        let src = source(&[("a.fwlayout", BASIC)]);
        src.insert(
            "/user/default$$_X.fwlayout",
            r#"<LayoutInventory><layout class="X" type="Detail" id="Basic" version="v2"/></LayoutInventory>"#,
        );
        let config = InventoryConfig {
            user_settings_dir: Some(PathBuf::from("/user")),
            ..config()
        };
        let mut inv = Inventory::load(config, src).unwrap();
        let err = inv.load_user_overrides(1, None).unwrap_err();
        assert!(matches!(err, InventoryError::Type(_)));
    }

    #[test]
    fn ingest_accepts_elements_directly() {
        let mut inv = Inventory::new(config(), Arc::new(MemoryDocumentSource::new())).unwrap();
        inv.ingest(&Element::new("layout").with_attr("class", "X").with_attr("type", "Detail").with_attr("id", "Basic"))
            .unwrap();
        assert!(inv.get_element("layout", &KEY_BASIC).unwrap().is_some());
    }

    // ---------------------------------------------------------------
    // Overrides
    // ---------------------------------------------------------------

    #[test]
    fn override_replaces_in_place_and_keeps_base() {
        let mut inv = load(&[("a.fwlayout", BASIC), ("c.fwlayout", OVERRIDE)]);
        let basic = inv.get_element("layout", &KEY_BASIC).unwrap().unwrap();
        assert_eq!(basic.attr("bg"), Some("grey"));
        assert_eq!(refs(&basic), vec!["Name"]);

        let original = inv.get_base("layout", &KEY_BASIC).unwrap();
        assert_eq!(original.attr("bg"), Some("white"));

        let written = inv.get_alteration("layout", &KEY_BASIC).unwrap();
        assert_eq!(written.attr("bg"), Some("grey"));
        assert!(written.children().is_empty());
    }

    #[test]
    fn derivations_see_the_overridden_base() {
        let mut inv = load(&[
            ("a.fwlayout", BASIC),
            ("b.fwlayout", ADVANCED),
            ("c.fwlayout", OVERRIDE),
        ]);
        let adv = inv.get_element("layout", &KEY_ADVANCED).unwrap().unwrap();
        assert_eq!(adv.attr("bg"), Some("grey"));
    }

    #[test]
    fn second_override_of_same_key_fails() {
        let again = r#"<LayoutInventory><layout class="X" type="Detail" id="Basic" base="Basic" bg="blue"/></LayoutInventory>"#;
        let err = Inventory::load(
            config(),
            source(&[
                ("a.fwlayout", BASIC),
                ("c.fwlayout", OVERRIDE),
                ("d.fwlayout", again),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, InventoryError::DuplicateOverride { .. }));
        assert!(err.to_string().contains("only one level of override"));
    }

    #[test]
    fn override_without_target_fails() {
        let err = Inventory::load(config(), source(&[("c.fwlayout", OVERRIDE)])).unwrap_err();
        assert!(matches!(err, InventoryError::NoBaseToOverride { .. }));
    }

    #[test]
    fn introspection_of_unknown_keys_is_none() {
        let mut inv = load(&[("a.fwlayout", BASIC)]);
        assert!(inv.get_alteration("layout", &KEY_BASIC).is_none());
        assert!(inv.get_base("layout", &KEY_BASIC).is_none());
        assert!(inv.get_base("nothing", &[] as &[&str]).is_none());
    }

    // ---------------------------------------------------------------
    // Queries and caching
    // ---------------------------------------------------------------

    #[test]
    fn repeated_lookup_does_not_unify_again() {
        let mut inv = load(&[("a.fwlayout", BASIC), ("b.fwlayout", ADVANCED)]);
        let first = inv.get_element("layout", &KEY_ADVANCED).unwrap().unwrap();
        let count = inv.unify_count();
        let second = inv.get_element("layout", &KEY_ADVANCED).unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(inv.unify_count(), count);
    }

    #[test]
    fn get_elements_matches_key_prefix() {
        let other = r#"<LayoutInventory><layout class="Y" type="Detail" id="Basic"/></LayoutInventory>"#;
        let mut inv = load(&[
            ("a.fwlayout", BASIC),
            ("b.fwlayout", ADVANCED),
            ("c.fwlayout", other),
        ]);
        let found = inv.get_elements("layout", &["X"]).unwrap();
        let ids: Vec<_> = found.iter().filter_map(|e| e.attr("id")).collect();
        assert_eq!(ids, vec!["Basic", "Advanced"]);

        assert_eq!(inv.get_elements("layout", &[] as &[&str]).unwrap().len(), 3);
        assert!(inv.get_elements("part", &[] as &[&str]).unwrap().is_empty());
    }

    #[test]
    fn get_unified_is_memoized_per_pair() {
        let mut inv = load(&[("a.fwlayout", BASIC)]);
        let main = inv.get_element("layout", &KEY_BASIC).unwrap().unwrap();
        let tweak = Element::new("layout")
            .with_attr("bg", "pink")
            .with_child(Element::new("part").with_attr("ref", "Extra"));

        let first = inv.get_unified(&main, &tweak).unwrap();
        let second = inv.get_unified(&main, &tweak).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(inv.unify_count(), 1);
        assert_eq!(first.attr("bg"), Some("pink"));
        assert_eq!(refs(&first), vec!["Name", "Extra"]);

        let copy = tweak.clone();
        inv.get_unified(&main, &copy).unwrap();
        assert_eq!(inv.unify_count(), 2);
    }

    // ---------------------------------------------------------------
    // Reload
    // ---------------------------------------------------------------

    #[test]
    fn reload_if_changed_detects_changes() {
        let src = source(&[("a.fwlayout", BASIC)]);
        let mut inv = Inventory::load(config(), src.clone()).unwrap();
        assert!(!inv.reload_if_changed().unwrap());

        src.insert("/cfg/b.fwlayout", ADVANCED);
        assert!(inv.reload_if_changed().unwrap());
        assert!(inv.get_element("layout", &KEY_ADVANCED).unwrap().is_some());

        assert!(src.touch(Path::new("/cfg/a.fwlayout")));
        assert!(inv.reload_if_changed().unwrap());
        assert!(!inv.reload_if_changed().unwrap());

        assert!(src.remove(Path::new("/cfg/b.fwlayout")));
        assert!(inv.reload_if_changed().unwrap());
        assert!(inv.get_element("layout", &KEY_ADVANCED).unwrap().is_none());
    }

    #[test]
    fn reload_discards_resolved_state() {
        let mut inv = load(&[("a.fwlayout", BASIC), ("b.fwlayout", ADVANCED)]);
        inv.get_element("layout", &KEY_ADVANCED).unwrap();
        assert_eq!(inv.element_count(), 2);
        inv.reload().unwrap();
        assert_eq!(inv.element_count(), 1);
        assert_eq!(inv.unify_count(), 1);
        assert!(inv.get_element("layout", &KEY_ADVANCED).unwrap().is_some());
        assert_eq!(inv.unify_count(), 2);
    }
}
