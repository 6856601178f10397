//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("database.filename", crate::config::DEFAULT_DATABASE_FILENAME)?
        .set_default("database.hash_algorithm", "sha512")?
        .set_default("database.parallel", true)
}
