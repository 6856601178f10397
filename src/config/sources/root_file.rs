//! Root-local config file source: <root>/.hash_db.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ROOT_CONFIG_FILENAME: &str = ".hash_db.toml";

/// Path of the root-local config file for a tracked directory.
pub fn root_config_path(root: &Path) -> PathBuf {
    root.join(ROOT_CONFIG_FILENAME)
}

/// Nearest root-local config file at or above `start`, so commands run from
/// a subdirectory still see the settings of the tracked root.
fn find_root_config(start: &Path) -> Option<PathBuf> {
    let start = dunce::canonicalize(start).ok()?;
    start
        .ancestors()
        .map(root_config_path)
        .find(|candidate| candidate.is_file())
}

/// Add the root-local config file to builder when present.
/// Overrides the global file; overridden by the environment.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match find_root_config(root) {
        Some(path) => {
            debug!(config_path = %path.display(), "Using root configuration file");
            Ok(builder.add_source(File::from(path).required(false)))
        }
        None => Ok(builder),
    }
}
