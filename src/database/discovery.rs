//! Sidecar discovery: walk from a start directory up to the filesystem root.

use crate::error::StorageError;
use crate::tree::path::canonicalize_path;
use std::path::{Path, PathBuf};

/// Nearest `filename` in `start` or one of its ancestors.
///
/// Returns `None` when nothing is found or `start` cannot be resolved.
pub fn find_database(start: &Path, filename: &str) -> Option<PathBuf> {
    let start = canonicalize_path(start).ok()?;
    search_upwards(&start, filename)
}

/// Like [`find_database`], but absence is an error.
pub fn require_database(start: &Path, filename: &str) -> Result<PathBuf, StorageError> {
    let start = canonicalize_path(start)?;
    search_upwards(&start, filename).ok_or_else(|| StorageError::DatabaseNotFound {
        start: start.clone(),
        filename: filename.to_string(),
    })
}

fn search_upwards(start: &Path, filename: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(filename))
        .find(|candidate| candidate.is_file())
}
