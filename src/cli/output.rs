//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, StorageError};

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::StorageError(StorageError::DatabaseNotFound { .. }) => {
            format!("{}\nRun 'hash_db init' in the directory to track first.", e)
        }
        _ => format!("error: {}", e),
    }
}
