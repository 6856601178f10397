//! Error types for the hash database.

use std::path::PathBuf;
use thiserror::Error;

/// Storage-related errors raised by the database engine.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("No database file '{filename}' found in {start} or any parent directory")]
    DatabaseNotFound { start: PathBuf, filename: String },

    #[error("Database already exists at {0} (use --force to overwrite)")]
    DatabaseExists(PathBuf),

    #[error("Database schema version {found} is newer than the supported version {supported}")]
    UnsupportedSchemaVersion { found: u32, supported: u32 },

    #[error("Corrupt database {path}: {reason}")]
    CorruptDatabase { path: PathBuf, reason: String },

    #[error("Failed to read {path}: {source}")]
    EntryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}:{line}: {reason}")]
    ImportDecode {
        file: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    /// Wrap an I/O error raised while reading a single tracked object.
    pub fn entry_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::EntryRead {
            path: path.into(),
            source,
        }
    }

    /// True when the entry read failed because the object no longer exists.
    ///
    /// Callers use this to tell a file that vanished between listing and
    /// hashing apart from one that cannot be read.
    pub fn is_vanished(&self) -> bool {
        matches!(
            self,
            StorageError::EntryRead { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

/// Errors surfaced to the command layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
