//! Core value types shared across the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::Metadata;
use std::time::UNIX_EPOCH;

/// Byte lengths of the digests this crate produces: BLAKE3 and SHA-512.
const DIGEST_LENGTHS: [usize; 2] = [32, 64];

/// Content fingerprint, stored as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Encode raw hash output.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Parse a hex digest, accepting either case.
    ///
    /// Empty input and byte lengths no supported algorithm produces are
    /// rejected as `InvalidStringLength`.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.trim();
        let bytes = hex::decode(s)?;
        if !DIGEST_LENGTHS.contains(&bytes.len()) {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of filesystem object that can be tracked.
///
/// The discriminants are the on-disk `type` values and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EntryKind {
    RegularFile = 0,
    Symlink = 1,
}

impl EntryKind {
    /// Classify lstat metadata. Directories, devices, sockets and fifos are `None`.
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            Some(EntryKind::Symlink)
        } else if file_type.is_file() {
            Some(EntryKind::RegularFile)
        } else {
            None
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for EntryKind {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EntryKind::RegularFile),
            1 => Ok(EntryKind::Symlink),
            other => Err(other),
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::RegularFile => f.write_str("file"),
            EntryKind::Symlink => f.write_str("symlink"),
        }
    }
}

/// Modification time as fractional seconds since the Unix epoch.
///
/// Pre-epoch timestamps come back negative.
pub fn modified_seconds(metadata: &Metadata) -> std::io::Result<f64> {
    let modified = metadata.modified()?;
    Ok(match modified.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs_f64(),
        Err(before) => -before.duration().as_secs_f64(),
    })
}
