//! Document sources: where candidate configuration documents come from.
//!
//! The inventory never touches the file system directly when loading. It
//! asks a [`DocumentSource`] to enumerate the documents matching a file
//! pattern in an ordered list of directories, then to load each one. User
//! override files are written and deleted through the same source.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use globset::{Glob, GlobMatcher};
use inv_types::Element;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{InventoryError, InventoryResult};

/// A candidate document and its last modification time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Enumerates and loads configuration documents.
///
/// Implementations must enumerate directories in the given order and files
/// within one directory in a stable order, since later documents win over
/// earlier ones. A directory that does not exist contributes no files.
pub trait DocumentSource: Send + Sync {
    /// Documents in `directories` whose file name matches `pattern`.
    fn enumerate(&self, directories: &[PathBuf], pattern: &str) -> InventoryResult<Vec<SourceFile>>;

    /// Parse the document at `path` into its root element.
    fn load(&self, path: &Path) -> InventoryResult<Element>;

    /// Write `root` to `path`, replacing any previous document there.
    fn save(&self, path: &Path, root: &Element) -> InventoryResult<()>;

    /// Remove the document at `path`.
    fn delete(&self, path: &Path) -> InventoryResult<()>;
}

fn matcher(pattern: &str) -> InventoryResult<GlobMatcher> {
    Glob::new(pattern)
        .map(|g| g.compile_matcher())
        .map_err(|e| InventoryError::Config(format!("invalid file pattern {pattern:?}: {e}")))
}

/// Escape glob metacharacters so `text` matches only itself.
pub(crate) fn glob_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '*' | '?' | '[' | ']' | '{' | '}' => {
                escaped.push('[');
                escaped.push(c);
                escaped.push(']');
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Reads documents from the local file system.
///
/// Only files directly inside each directory are considered (no recursion);
/// within a directory files are ordered by name.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsDocumentSource;

impl FsDocumentSource {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentSource for FsDocumentSource {
    fn enumerate(&self, directories: &[PathBuf], pattern: &str) -> InventoryResult<Vec<SourceFile>> {
        let matcher = matcher(pattern)?;
        let mut files = Vec::new();
        for dir in directories {
            if !dir.is_dir() {
                debug!(dir = %dir.display(), "skipping missing directory");
                continue;
            }
            for entry in WalkDir::new(dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
            {
                let entry = entry.map_err(std::io::Error::from)?;
                if !entry.file_type().is_file() || !matcher.is_match(entry.file_name()) {
                    continue;
                }
                let modified = entry
                    .metadata()
                    .map_err(std::io::Error::from)?
                    .modified()?;
                files.push(SourceFile {
                    path: entry.into_path(),
                    modified,
                });
            }
        }
        Ok(files)
    }

    fn load(&self, path: &Path) -> InventoryResult<Element> {
        Ok(inv_codec::load_file(path)?)
    }

    fn save(&self, path: &Path, root: &Element) -> InventoryResult<()> {
        Ok(inv_codec::save_file(path, root)?)
    }

    fn delete(&self, path: &Path) -> InventoryResult<()> {
        Ok(std::fs::remove_file(path)?)
    }
}

struct MemoryDocument {
    text: String,
    modified: SystemTime,
}

/// In-memory document table for tests and embedding.
///
/// Timestamps come from an internal clock that advances on every write, so
/// each [`insert`](Self::insert) or [`touch`](Self::touch) is observable as a
/// modification.
#[derive(Default)]
pub struct MemoryDocumentSource {
    inner: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    documents: BTreeMap<PathBuf, MemoryDocument>,
    clock: u64,
}

impl MemoryState {
    fn tick(&mut self) -> SystemTime {
        self.clock += 1;
        UNIX_EPOCH + Duration::from_secs(self.clock)
    }
}

impl MemoryDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a document.
    pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        let mut state = self.inner.write().expect("lock poisoned");
        let modified = state.tick();
        state.documents.insert(
            path.into(),
            MemoryDocument {
                text: text.into(),
                modified,
            },
        );
    }

    /// Bump a document's timestamp without changing it. Returns `false` if
    /// there is no such document.
    pub fn touch(&self, path: &Path) -> bool {
        let mut state = self.inner.write().expect("lock poisoned");
        let modified = state.tick();
        match state.documents.get_mut(path) {
            Some(doc) => {
                doc.modified = modified;
                true
            }
            None => false,
        }
    }

    /// Remove a document. Returns `true` if it existed.
    pub fn remove(&self, path: &Path) -> bool {
        let mut state = self.inner.write().expect("lock poisoned");
        state.documents.remove(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentSource for MemoryDocumentSource {
    fn enumerate(&self, directories: &[PathBuf], pattern: &str) -> InventoryResult<Vec<SourceFile>> {
        let matcher = matcher(pattern)?;
        let state = self.inner.read().expect("lock poisoned");
        let mut files = Vec::new();
        for dir in directories {
            for (path, doc) in &state.documents {
                let in_dir = path.parent() == Some(dir.as_path());
                let matches = path.file_name().is_some_and(|name| matcher.is_match(name));
                if in_dir && matches {
                    files.push(SourceFile {
                        path: path.clone(),
                        modified: doc.modified,
                    });
                }
            }
        }
        Ok(files)
    }

    fn load(&self, path: &Path) -> InventoryResult<Element> {
        let state = self.inner.read().expect("lock poisoned");
        let doc = state.documents.get(path).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no document at {}", path.display()),
            )
        })?;
        inv_codec::parse_document(&doc.text).map_err(|e| e.in_file(path).into())
    }

    fn save(&self, path: &Path, root: &Element) -> InventoryResult<()> {
        let text = inv_codec::write_document(root).map_err(|e| e.in_file(path))?;
        self.insert(path, text);
        Ok(())
    }

    fn delete(&self, path: &Path) -> InventoryResult<()> {
        if self.remove(path) {
            return Ok(());
        }
        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no document at {}", path.display()),
        )
        .into())
    }
}

impl std::fmt::Debug for MemoryDocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDocumentSource")
            .field("document_count", &self.len())
            .finish()
    }
}
