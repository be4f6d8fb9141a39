//! Key/value persistence for preferences.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::GalleryError;

/// String key/value store backing the preference axes.
pub trait PreferenceStorage {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), GalleryError>;

    /// Delete a value. Missing keys are not an error.
    fn remove(&mut self, key: &str) -> Result<(), GalleryError>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: BTreeMap<String, String>,
    writes: usize,
}

/// In-memory storage. Clones share the same entries, so a test can keep a
/// clone to inspect what a store persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with entries. Seeding does not count as writes.
    #[must_use]
    pub fn with_entries<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let storage = Self::new();
        storage.inner.borrow_mut().entries = entries
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        storage
    }

    /// Number of `set`/`remove` calls received.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.inner.borrow().writes
    }

    /// Whether no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }
}

impl PreferenceStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.borrow().entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), GalleryError> {
        let mut inner = self.inner.borrow_mut();
        inner.writes += 1;
        let _ = inner.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), GalleryError> {
        let mut inner = self.inner.borrow_mut();
        inner.writes += 1;
        let _ = inner.entries.remove(key);
        Ok(())
    }
}

/// Native storage: a flat TOML table of strings, rewritten on every
/// change.
#[derive(Debug)]
pub struct TomlFileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl TomlFileStorage {
    /// Open (or start) the table at `path`. A missing file is an empty
    /// table.
    pub fn open(path: &Path) -> Result<Self, GalleryError> {
        let entries = match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .map_err(|e| GalleryError::Storage(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                BTreeMap::new()
            }
            Err(e) => return Err(GalleryError::Io(e)),
        };
        Ok(Self {
            path: path.to_owned(),
            entries,
        })
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), GalleryError> {
        let content = toml::to_string(&self.entries)
            .map_err(|e| GalleryError::Storage(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PreferenceStorage for TomlFileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), GalleryError> {
        let _ = self.entries.insert(key.to_owned(), value.to_owned());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), GalleryError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}
