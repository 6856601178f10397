//! Verify: re-hash every tracked entry and compare against the record.
//!
//! Ignores the metadata gate entirely and never mutates the store, which makes
//! it the only operation whose result means anything as a tamper or
//! corruption check.

use crate::error::StorageError;
use crate::progress::{CancellationToken, ProgressEvent, ProgressSink};
use crate::reconcile::EntryFailure;
use crate::store::{EntryStore, TrackedEntry};
use crate::tree::ContentHasher;
use crate::types::EntryKind;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Result of a verify run. Paths are absolute and sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Number of tracked entries examined
    pub checked: usize,
    pub modified: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub failed: Vec<EntryFailure>,
}

impl VerifyReport {
    /// True when every tracked entry matched.
    pub fn is_clean(&self) -> bool {
        self.modified.is_empty() && self.removed.is_empty() && self.failed.is_empty()
    }
}

enum Outcome {
    Intact,
    Modified,
    Removed,
    Failed(EntryFailure),
}

fn check_entry(entry: &TrackedEntry, hasher: &ContentHasher) -> Outcome {
    let metadata = match std::fs::symlink_metadata(&entry.path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Outcome::Removed,
        Err(e) => return Outcome::Failed(EntryFailure::from_io(&entry.path, &e)),
    };

    // Same existence test as the walker: only files and symlinks count
    let Some(kind) = EntryKind::from_metadata(&metadata) else {
        return Outcome::Removed;
    };

    match hasher.hash(&entry.path, kind) {
        Ok(digest) if digest == entry.digest && kind == entry.kind => Outcome::Intact,
        Ok(_) => Outcome::Modified,
        Err(error) if error.is_vanished() => Outcome::Removed,
        Err(error) => Outcome::Failed(EntryFailure::new(&entry.path, &error)),
    }
}

/// Re-hash every tracked entry.
pub fn verify(
    store: &EntryStore,
    hasher: &ContentHasher,
    parallel: bool,
    progress: &dyn ProgressSink,
    cancel: &CancellationToken,
) -> Result<VerifyReport, StorageError> {
    let entries: Vec<&TrackedEntry> = store.values().collect();
    let total = entries.len();
    let done = AtomicUsize::new(0);

    let check = |entry: &TrackedEntry| -> Result<(PathBuf, Outcome), StorageError> {
        cancel.check()?;
        let outcome = check_entry(entry, hasher);
        let done = done.fetch_add(1, Ordering::Relaxed) + 1;
        progress.emit(ProgressEvent::Checked { done, total });
        Ok((entry.path.clone(), outcome))
    };

    let outcomes: Vec<(PathBuf, Outcome)> = if parallel {
        entries.into_par_iter().map(check).collect::<Result<_, _>>()?
    } else {
        entries.into_iter().map(check).collect::<Result<_, _>>()?
    };

    let mut report = VerifyReport {
        checked: total,
        ..VerifyReport::default()
    };
    for (path, outcome) in outcomes {
        match outcome {
            Outcome::Intact => {}
            Outcome::Modified => report.modified.push(path),
            Outcome::Removed => report.removed.push(path),
            Outcome::Failed(failure) => report.failed.push(failure),
        }
    }

    debug!(
        checked = report.checked,
        modified = report.modified.len(),
        removed = report.removed.len(),
        failed = report.failed.len(),
        "Verify complete"
    );
    Ok(report)
}
