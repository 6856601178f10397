//! Reconcile: diff the live tree against the store and bring the store up to date.
//!
//! Size and mtime act as a gate in front of the content hash, so a re-scan
//! only reads the bytes of objects whose metadata moved. Content changed
//! under a restored mtime slips through the gate; `force_rehash` is the way
//! to catch it.

use crate::error::StorageError;
use crate::progress::{CancellationToken, ProgressEvent, ProgressSink};
use crate::store::{EntryStore, TrackedEntry};
use crate::tree::{ContentHasher, ScannedEntry, Walker};
use crate::types::Digest;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// A tracked object that could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub path: PathBuf,
    pub message: String,
}

impl EntryFailure {
    pub fn new(path: impl Into<PathBuf>, error: &StorageError) -> Self {
        match error {
            StorageError::EntryRead { source, .. } => Self::from_io(path, source),
            other => Self {
                path: path.into(),
                message: other.to_string(),
            },
        }
    }

    pub fn from_io(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self {
            path: path.into(),
            message: error.to_string(),
        }
    }
}

/// Result of an update run. Paths are absolute and sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeReport {
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
    /// Objects that exist but could not be read; their entries are untouched
    pub failed: Vec<EntryFailure>,
}

impl ChangeReport {
    /// True when nothing was added, removed or modified.
    pub fn is_clean(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    fn sort(&mut self) {
        self.added.sort();
        self.removed.sort();
        self.modified.sort();
        self.failed.sort_by(|a, b| a.path.cmp(&b.path));
    }
}

/// Metadata-only drift, computed without hashing or mutating anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    /// On disk, not tracked
    pub untracked: Vec<PathBuf>,
    /// Tracked, no longer on disk
    pub missing: Vec<PathBuf>,
    /// Tracked, size/mtime/kind differ from the record
    pub changed: Vec<PathBuf>,
    pub failed: Vec<EntryFailure>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    /// Re-hash every object regardless of the metadata gate
    pub force_rehash: bool,
    /// Hash on the rayon pool
    pub parallel: bool,
}

/// What the walk phase learned about the tree.
struct Inventory {
    observed: HashSet<PathBuf>,
    to_hash: Vec<ScannedEntry>,
    failed: Vec<EntryFailure>,
    /// Paths whose subtree could not be listed; tracked entries below stay
    unreadable: Vec<PathBuf>,
}

impl Inventory {
    fn take(
        walker: &Walker,
        store: &EntryStore,
        force_rehash: bool,
        cancel: &CancellationToken,
    ) -> Result<Self, StorageError> {
        let mut inventory = Inventory {
            observed: HashSet::new(),
            to_hash: Vec::new(),
            failed: Vec::new(),
            unreadable: Vec::new(),
        };

        for item in walker.walk() {
            cancel.check()?;
            match item {
                Ok(scanned) => {
                    inventory.observed.insert(scanned.path.clone());
                    let needs_hash = match store.get(&scanned.path) {
                        None => true,
                        Some(entry) => force_rehash || entry.metadata_changed(&scanned),
                    };
                    if needs_hash {
                        inventory.to_hash.push(scanned);
                    }
                }
                Err(StorageError::EntryRead { path, source }) => {
                    inventory.failed.push(EntryFailure::from_io(path.clone(), &source));
                    inventory.unreadable.push(path);
                }
                Err(other) => return Err(other),
            }
        }
        Ok(inventory)
    }

    fn is_unreadable(&self, path: &Path) -> bool {
        self.unreadable.iter().any(|dir| path.starts_with(dir))
    }
}

/// Hash every pending entry, optionally in parallel.
///
/// Output order matches input order; mutation of the store is left to the
/// caller so there is only ever one writer.
pub(crate) fn hash_all(
    pending: Vec<ScannedEntry>,
    hasher: &ContentHasher,
    parallel: bool,
    progress: &dyn ProgressSink,
    cancel: &CancellationToken,
) -> Result<Vec<(ScannedEntry, Result<Digest, StorageError>)>, StorageError> {
    let total = pending.len();
    let done = AtomicUsize::new(0);
    let hash_one = |scanned: ScannedEntry| -> Result<_, StorageError> {
        cancel.check()?;
        let digest = hasher.hash_sized(&scanned.path, scanned.kind, scanned.size);
        let done = done.fetch_add(1, Ordering::Relaxed) + 1;
        progress.emit(ProgressEvent::Hashed { done, total });
        Ok((scanned, digest))
    };

    if parallel {
        pending.into_par_iter().map(hash_one).collect()
    } else {
        pending.into_iter().map(hash_one).collect()
    }
}

/// Bring `store` in line with the tree under `walker`.
///
/// New objects are hashed and added; tracked objects whose metadata moved
/// (or all of them, when forced) are re-hashed and reported modified only if
/// the digest or kind changed; tracked objects not seen are removed.
/// Unreadable objects are reported in `failed` and never counted as removed.
pub fn update(
    store: &mut EntryStore,
    walker: &Walker,
    hasher: &ContentHasher,
    options: UpdateOptions,
    progress: &dyn ProgressSink,
    cancel: &CancellationToken,
) -> Result<ChangeReport, StorageError> {
    progress.emit(ProgressEvent::ScanStarted {
        root: walker.root().to_path_buf(),
    });
    let mut inventory = Inventory::take(walker, store, options.force_rehash, cancel)?;
    progress.emit(ProgressEvent::ScanFinished {
        observed: inventory.observed.len(),
        to_hash: inventory.to_hash.len(),
    });
    debug!(
        observed = inventory.observed.len(),
        to_hash = inventory.to_hash.len(),
        forced = options.force_rehash,
        "Walk complete"
    );

    let pending = std::mem::take(&mut inventory.to_hash);
    let hashed = hash_all(pending, hasher, options.parallel, progress, cancel)?;

    let mut report = ChangeReport {
        failed: std::mem::take(&mut inventory.failed),
        ..ChangeReport::default()
    };

    for (scanned, result) in hashed {
        let digest = match result {
            Ok(digest) => digest,
            Err(error) if error.is_vanished() => {
                // Gone between listing and hashing
                inventory.observed.remove(&scanned.path);
                continue;
            }
            Err(error) => {
                report.failed.push(EntryFailure::new(scanned.path, &error));
                continue;
            }
        };

        match store.get_mut(&scanned.path) {
            Some(entry) => {
                let changed = entry.digest != digest || entry.kind != scanned.kind;
                let path = scanned.path.clone();
                entry.refresh(scanned, digest);
                if changed {
                    report.modified.push(path);
                }
            }
            None => {
                report.added.push(scanned.path.clone());
                store.put(TrackedEntry::from_scan(scanned, digest))?;
            }
        }
    }

    let gone: Vec<PathBuf> = store
        .keys()
        .filter(|path| !inventory.observed.contains(*path) && !inventory.is_unreadable(path))
        .cloned()
        .collect();
    for path in gone {
        store.remove(&path);
        report.removed.push(path);
    }

    report.sort();
    debug!(
        added = report.added.len(),
        removed = report.removed.len(),
        modified = report.modified.len(),
        failed = report.failed.len(),
        "Update complete"
    );
    Ok(report)
}

/// Report metadata drift without hashing.
pub fn status(
    store: &EntryStore,
    walker: &Walker,
    cancel: &CancellationToken,
) -> Result<StatusReport, StorageError> {
    let mut report = StatusReport::default();
    let mut observed = HashSet::new();
    let mut unreadable = Vec::new();

    for item in walker.walk() {
        cancel.check()?;
        match item {
            Ok(scanned) => {
                match store.get(&scanned.path) {
                    None => report.untracked.push(scanned.path.clone()),
                    Some(entry) if entry.metadata_changed(&scanned) => {
                        report.changed.push(scanned.path.clone())
                    }
                    Some(_) => {}
                }
                observed.insert(scanned.path);
            }
            Err(StorageError::EntryRead { path, source }) => {
                report.failed.push(EntryFailure::from_io(path.clone(), &source));
                unreadable.push(path);
            }
            Err(other) => return Err(other),
        }
    }

    report.missing = store
        .keys()
        .filter(|path| !observed.contains(*path))
        .filter(|path| !unreadable.iter().any(|dir: &PathBuf| path.starts_with(dir)))
        .cloned()
        .collect();
    Ok(report)
}
