//! Persistence layer for the Entry Store
//!
//! The sidecar is a JSON document holding a schema version and a map of
//! root-relative path to entry attributes. Older documents are upgraded on
//! load through the migration table; newer ones are refused.

use crate::error::StorageError;
use crate::store::migration::{self, MigrationContext};
use crate::store::{EntryStore, TrackedEntry};
use crate::tree::path::{from_relative_key, to_relative_key};
use crate::tree::ContentHasher;
use crate::types::{Digest, EntryKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub use migration::CURRENT_SCHEMA_VERSION;

/// Entry attributes as stored; every field may be missing in old versions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default)]
    pub mtime: Option<f64>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawDocument {
    version: u32,
    #[serde(default)]
    files: BTreeMap<String, RawEntry>,
}

/// A decoded database together with what happened while loading it.
#[derive(Debug)]
pub struct Decoded {
    pub store: EntryStore,
    /// Version found in the document
    pub stored_version: u32,
}

impl Decoded {
    /// True when the document was written by an older schema.
    pub fn was_upgraded(&self) -> bool {
        self.stored_version < CURRENT_SCHEMA_VERSION
    }
}

/// Encodes and decodes the Entry Store for one root.
pub struct SchemaCodec {
    root: PathBuf,
    hasher: ContentHasher,
}

impl SchemaCodec {
    /// `hasher` is only used by upgrade transforms that must re-hash.
    pub fn new(root: PathBuf, hasher: ContentHasher) -> Self {
        Self { root, hasher }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serialize the store at the current schema version.
    pub fn encode(&self, store: &EntryStore) -> Result<Vec<u8>, StorageError> {
        let mut files = BTreeMap::new();
        for entry in store.values() {
            let key = to_relative_key(&self.root, &entry.path)?;
            files.insert(
                key,
                RawEntry {
                    size: entry.size,
                    mtime: Some(entry.modified_at),
                    hash: Some(entry.digest.to_string()),
                    kind: Some(entry.kind.code()),
                },
            );
        }

        let document = RawDocument {
            version: CURRENT_SCHEMA_VERSION,
            files,
        };
        let mut bytes = serde_json::to_vec_pretty(&document).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Failed to serialize database: {}", e),
            ))
        })?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Parse a document, upgrading it to the current schema.
    ///
    /// `source` names the document in error messages.
    pub fn decode(&self, bytes: &[u8], source: &Path) -> Result<Decoded, StorageError> {
        let corrupt = |reason: String| StorageError::CorruptDatabase {
            path: source.to_path_buf(),
            reason,
        };

        // Read the version before the structure so a future layout is
        // reported as unsupported rather than corrupt.
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| corrupt(e.to_string()))?;
        let version = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| corrupt("missing or invalid version".to_string()))?;
        if version == 0 {
            return Err(corrupt("version 0 is not a valid schema version".to_string()));
        }
        if version > CURRENT_SCHEMA_VERSION as u64 {
            return Err(StorageError::UnsupportedSchemaVersion {
                found: u32::try_from(version).unwrap_or(u32::MAX),
                supported: CURRENT_SCHEMA_VERSION,
            });
        }

        let mut document: RawDocument =
            serde_json::from_value(value).map_err(|e| corrupt(e.to_string()))?;
        let stored_version = document.version;

        let context = MigrationContext {
            root: &self.root,
            hasher: &self.hasher,
        };
        migration::upgrade(stored_version, &mut document.files, &context)?;

        let mut store = EntryStore::new();
        for (key, raw) in document.files {
            let entry = self.entry_from_raw(&key, raw).map_err(corrupt)?;
            store.put(entry)?;
        }

        debug!(
            root = %self.root.display(),
            version = stored_version,
            entries = store.len(),
            "Decoded database"
        );
        Ok(Decoded {
            store,
            stored_version,
        })
    }

    fn entry_from_raw(&self, key: &str, raw: RawEntry) -> Result<TrackedEntry, String> {
        let path = from_relative_key(&self.root, key)
            .ok_or_else(|| format!("entry '{}' escapes the root", key))?;
        let code = raw
            .kind
            .ok_or_else(|| format!("entry '{}' has no type", key))?;
        let kind = EntryKind::try_from(code)
            .map_err(|code| format!("entry '{}' has unknown type {}", key, code))?;
        let modified_at = raw
            .mtime
            .ok_or_else(|| format!("entry '{}' has no mtime", key))?;
        let hash = raw
            .hash
            .ok_or_else(|| format!("entry '{}' has no hash", key))?;
        let digest = Digest::from_hex(&hash)
            .map_err(|e| format!("entry '{}' has invalid hash: {}", key, e))?;
        if raw.size.is_none() && kind == EntryKind::RegularFile {
            return Err(format!("entry '{}' has no size", key));
        }

        Ok(TrackedEntry {
            path,
            kind,
            size: raw.size,
            modified_at,
            digest,
        })
    }

    /// Read and decode a sidecar file.
    pub fn load(&self, db_path: &Path) -> Result<Decoded, StorageError> {
        let bytes = std::fs::read(db_path)?;
        let decoded = self.decode(&bytes, db_path)?;
        if decoded.was_upgraded() {
            debug!(
                path = %db_path.display(),
                from = decoded.stored_version,
                to = CURRENT_SCHEMA_VERSION,
                "Upgraded database schema"
            );
        }
        Ok(decoded)
    }

    /// Write the store to `db_path`, replacing any previous document atomically.
    pub fn save(&self, store: &EntryStore, db_path: &Path) -> Result<(), StorageError> {
        let bytes = self.encode(store)?;
        let dir = db_path
            .parent()
            .ok_or_else(|| StorageError::InvalidPath(format!("{:?} has no parent", db_path)))?;
        let filename = db_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StorageError::InvalidPath(format!("{:?} has no file name", db_path)))?;

        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{}.", filename))
            .suffix(".tmp")
            .tempfile_in(dir)?;
        temp.write_all(&bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(db_path).map_err(|e| e.error)?;

        debug!(path = %db_path.display(), entries = store.len(), "Saved database");
        Ok(())
    }
}
