//! Filesystem walker producing the live inventory of a tracked root

use crate::error::StorageError;
use crate::types::{modified_seconds, EntryKind};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// One trackable object observed on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
    pub size: u64,
    pub modified_at: f64,
}

impl ScannedEntry {
    /// Probe a single path with lstat semantics.
    ///
    /// Returns `Ok(None)` for objects that are never tracked (directories,
    /// devices, sockets) and propagates I/O errors, including `NotFound`.
    pub fn probe(path: &Path) -> Result<Option<Self>, StorageError> {
        let metadata =
            std::fs::symlink_metadata(path).map_err(|e| StorageError::entry_read(path, e))?;
        Self::from_metadata(path.to_path_buf(), &metadata)
    }

    fn from_metadata(
        path: PathBuf,
        metadata: &std::fs::Metadata,
    ) -> Result<Option<Self>, StorageError> {
        let Some(kind) = EntryKind::from_metadata(metadata) else {
            return Ok(None);
        };
        let modified_at = modified_seconds(metadata).map_err(|e| StorageError::entry_read(&path, e))?;
        Ok(Some(Self {
            path,
            kind,
            size: metadata.len(),
            modified_at,
        }))
    }
}

/// Walker configuration
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Sidecar database filename at the root; never reported
    pub database_filename: String,
}

impl WalkerConfig {
    pub fn new(database_filename: impl Into<String>) -> Self {
        Self {
            database_filename: database_filename.into(),
        }
    }

    /// True for the sidecar itself and the temp files written while saving it.
    pub fn is_database_artifact(&self, name: &str) -> bool {
        if name == self.database_filename {
            return true;
        }
        name.strip_prefix('.')
            .and_then(|rest| rest.strip_prefix(self.database_filename.as_str()))
            .is_some_and(|rest| rest.starts_with('.') && rest.ends_with(".tmp"))
    }
}

/// Filesystem walker
///
/// Never follows symlinks: a link is reported as itself.
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    /// Create a walker for an already-canonical root
    pub fn new(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the tree.
    ///
    /// Unreadable directories and entries are yielded as errors so the caller
    /// can report them without aborting the whole walk.
    pub fn walk(&self) -> impl Iterator<Item = Result<ScannedEntry, StorageError>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .min_depth(1)
            .into_iter()
            .filter_entry(|entry| !self.should_skip(entry))
            .filter_map(|entry| self.classify(entry).transpose())
    }

    fn should_skip(&self, entry: &DirEntry) -> bool {
        entry.depth() == 1
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.config.is_database_artifact(name))
    }

    fn classify(
        &self,
        entry: Result<DirEntry, walkdir::Error>,
    ) -> Result<Option<ScannedEntry>, StorageError> {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
            StorageError::entry_read(path, io::Error::from(e))
        })?;

        if entry.file_type().is_dir() {
            return Ok(None);
        }

        let path = entry.path().to_path_buf();
        if path.to_str().is_none() {
            return Err(StorageError::entry_read(
                path,
                io::Error::new(io::ErrorKind::InvalidData, "file name is not valid UTF-8"),
            ));
        }

        let metadata = entry
            .metadata()
            .map_err(|e| StorageError::entry_read(&path, io::Error::from(e)))?;
        ScannedEntry::from_metadata(path, &metadata)
    }
}
