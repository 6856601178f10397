//! Configuration System
//!
//! Layered configuration for the engine and the command shell. Sources, lowest
//! precedence first: built-in defaults, the global config file, the root-local
//! `.hash_db.toml`, then `HASH_DB_*` environment variables
//! (`HASH_DB_DATABASE__HASH_ALGORITHM=blake3`). An explicit file replaces the
//! two file layers.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::tree::{ContentHasher, HashAlgorithm, WalkerConfig};
use config::Environment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod merge;
mod sources;

pub use sources::global_file::global_config_path;
pub use sources::root_file::{root_config_path, ROOT_CONFIG_FILENAME};

/// Default sidecar filename.
pub const DEFAULT_DATABASE_FILENAME: &str = ".hash_db.json";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HashDbConfig {
    /// Engine settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Engine settings passed explicitly into every database operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Sidecar filename at the tracked root
    #[serde(default = "default_filename")]
    pub filename: String,

    /// Content hash function
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,

    /// Hash independent entries on a CPU-bounded worker pool
    #[serde(default = "default_true")]
    pub parallel: bool,
}

fn default_filename() -> String {
    DEFAULT_DATABASE_FILENAME.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            filename: default_filename(),
            hash_algorithm: HashAlgorithm::default(),
            parallel: default_true(),
        }
    }
}

impl DatabaseConfig {
    /// Validate the database settings
    pub fn validate(&self) -> Result<(), String> {
        let name = self.filename.as_str();
        if name.is_empty() {
            return Err("Database filename cannot be empty".to_string());
        }
        if name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(format!(
                "Database filename '{}' must be a plain file name",
                name
            ));
        }
        Ok(())
    }

    pub fn hasher(&self) -> ContentHasher {
        ContentHasher::new(self.hash_algorithm)
    }

    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::new(self.filename.clone())
    }
}

impl HashDbConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ApiError> {
        self.database
            .validate()
            .map_err(|e| ApiError::ConfigError(format!("database: {}", e)))?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Builds [`HashDbConfig`] from its layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for commands run against `root`.
    pub fn load(root: &Path) -> Result<HashDbConfig, ApiError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::root_file::add_to_builder(builder, root)?;
        Self::finish(builder)
    }

    /// Load configuration from one explicit file (plus defaults and environment).
    pub fn load_from_file(path: &Path) -> Result<HashDbConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let builder = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path.to_path_buf()).required(true));
        Self::finish(builder)
    }

    /// Location of the global config file, if a home directory is known.
    pub fn global_config_path() -> Option<PathBuf> {
        global_config_path()
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<HashDbConfig, ApiError> {
        let config: HashDbConfig = builder
            .add_source(
                Environment::with_prefix("HASH_DB")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
