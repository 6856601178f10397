//! Entry Store
//!
//! In-memory mapping of absolute path to tracked entry. Holds no hashing
//! logic; persistence and schema upgrades live in the submodules.

pub mod entry;
pub mod migration;
pub mod persistence;

pub use entry::TrackedEntry;
pub use persistence::{SchemaCodec, CURRENT_SCHEMA_VERSION};

use crate::error::StorageError;
use crate::tree::path;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Path-keyed collection of tracked entries, ordered by path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryStore {
    entries: BTreeMap<PathBuf, TrackedEntry>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&TrackedEntry> {
        self.entries.get(path)
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut TrackedEntry> {
        self.entries.get_mut(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Insert or replace an entry, returning the previous one.
    ///
    /// The entry path is made absolute first so the key does not depend on
    /// the working directory of the caller.
    pub fn put(&mut self, mut entry: TrackedEntry) -> Result<Option<TrackedEntry>, StorageError> {
        if !entry.path.is_absolute() || entry.path.components().any(is_dot_component) {
            entry.path = path::absolutize(&entry.path)?;
        }
        Ok(self.entries.insert(entry.path.clone(), entry))
    }

    pub fn remove(&mut self, path: &Path) -> Option<TrackedEntry> {
        self.entries.remove(path)
    }

    pub fn keys(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &TrackedEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_dot_component(component: std::path::Component<'_>) -> bool {
    matches!(
        component,
        std::path::Component::CurDir | std::path::Component::ParentDir
    )
}
