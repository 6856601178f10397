//! Tracked entry domain type.

use crate::tree::ScannedEntry;
use crate::types::{Digest, EntryKind};
use std::path::PathBuf;

/// One filesystem object under watch.
///
/// `size`, `modified_at` and `digest` are always captured together: the
/// digest reflects the object as it was when those attributes were read.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEntry {
    /// Absolute path; the identity key
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Byte length for files, target string length for symlinks.
    /// Unset only for symlinks restored from old databases whose link vanished.
    pub size: Option<u64>,
    pub modified_at: f64,
    pub digest: Digest,
}

impl TrackedEntry {
    /// Build an entry from a scan result and the digest computed for it.
    pub fn from_scan(scanned: ScannedEntry, digest: Digest) -> Self {
        Self {
            path: scanned.path,
            kind: scanned.kind,
            size: Some(scanned.size),
            modified_at: scanned.modified_at,
            digest,
        }
    }

    /// Metadata gate: true when size or mtime differ from the live object.
    pub fn metadata_changed(&self, live: &ScannedEntry) -> bool {
        self.kind != live.kind || self.size != Some(live.size) || self.modified_at != live.modified_at
    }

    /// Replace every observed attribute at once.
    pub fn refresh(&mut self, scanned: ScannedEntry, digest: Digest) {
        self.kind = scanned.kind;
        self.size = Some(scanned.size);
        self.modified_at = scanned.modified_at;
        self.digest = digest;
    }
}
