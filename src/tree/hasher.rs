//! Content hashing for tracked files and symlinks
//!
//! Regular files are hashed over their full byte stream; symlinks are hashed
//! over the bytes of their target string, never the target's content.

use crate::error::StorageError;
use crate::types::{Digest, EntryKind};
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha512};
use std::fs::{self, File};
use std::path::Path;

/// Hash function used for content digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-512, portable with `sha512sum` output.
    #[default]
    Sha512,
    /// BLAKE3, faster but only comparable with other BLAKE3 databases.
    Blake3,
}

impl HashAlgorithm {
    /// Hash a complete byte slice in one pass.
    pub fn digest(self, data: &[u8]) -> Digest {
        match self {
            HashAlgorithm::Sha512 => Digest::from_bytes(&Sha512::digest(data)),
            HashAlgorithm::Blake3 => Digest::from_bytes(blake3::hash(data).as_bytes()),
        }
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha512" | "sha-512" => Ok(HashAlgorithm::Sha512),
            "blake3" => Ok(HashAlgorithm::Blake3),
            other => Err(format!(
                "Unknown hash algorithm '{}' (expected 'sha512' or 'blake3')",
                other
            )),
        }
    }
}

/// Computes digests for tracked objects.
#[derive(Debug, Clone)]
pub struct ContentHasher {
    algorithm: HashAlgorithm,
    empty_digest: Digest,
}

impl ContentHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            empty_digest: algorithm.digest(&[]),
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Reserved digest for empty regular files.
    pub fn empty_digest(&self) -> &Digest {
        &self.empty_digest
    }

    /// Hash an object whose size is not known in advance.
    pub fn hash(&self, path: &Path, kind: EntryKind) -> Result<Digest, StorageError> {
        match kind {
            EntryKind::RegularFile => self.hash_file(path),
            EntryKind::Symlink => self.hash_symlink(path),
        }
    }

    /// Hash an object using the size captured when it was listed.
    ///
    /// Empty regular files return the reserved digest without any I/O.
    pub fn hash_sized(
        &self,
        path: &Path,
        kind: EntryKind,
        size: u64,
    ) -> Result<Digest, StorageError> {
        if kind == EntryKind::RegularFile && size == 0 {
            return Ok(self.empty_digest.clone());
        }
        self.hash(path, kind)
    }

    fn hash_file(&self, path: &Path) -> Result<Digest, StorageError> {
        let file = File::open(path).map_err(|e| StorageError::entry_read(path, e))?;
        let len = file
            .metadata()
            .map_err(|e| StorageError::entry_read(path, e))?
            .len();

        // Zero-length maps are rejected on several platforms
        if len == 0 {
            return Ok(self.empty_digest.clone());
        }

        // Safety: the map is read-only and dropped before returning. A file
        // truncated by another process mid-hash is outside our guarantees.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| StorageError::entry_read(path, e))?;
        Ok(self.algorithm.digest(&mmap[..]))
    }

    fn hash_symlink(&self, path: &Path) -> Result<Digest, StorageError> {
        let target = fs::read_link(path).map_err(|e| StorageError::entry_read(path, e))?;
        Ok(self.algorithm.digest(&link_target_bytes(&target)))
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new(HashAlgorithm::default())
    }
}

/// Raw bytes of a symlink target string.
pub fn link_target_bytes(target: &Path) -> Vec<u8> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        target.as_os_str().as_bytes().to_vec()
    }
    #[cfg(not(unix))]
    {
        target.to_string_lossy().into_owned().into_bytes()
    }
}
