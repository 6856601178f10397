//! hashdb: content-hash integrity database for a directory tree
//!
//! Tracks regular files and symlinks below a root in a JSON sidecar, detects
//! additions, removals and modifications on update, and re-verifies stored
//! digests on demand.

pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod import;
pub mod logging;
pub mod progress;
pub mod reconcile;
pub mod store;
pub mod tree;
pub mod types;
pub mod verify;

pub use database::HashDatabase;
pub use error::{ApiError, StorageError};
