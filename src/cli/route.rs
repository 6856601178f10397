//! CLI route: single route table and run context. Dispatches to the database and presentation.

use crate::cli::help::{command_mutates, command_name};
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_change_report, format_import_report, format_status_report, format_verify_report,
    Palette,
};
use crate::config::{ConfigLoader, HashDbConfig};
use crate::database::HashDatabase;
use crate::error::ApiError;
use crate::progress::{CancellationToken, ProgressEvent};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, trace};

/// Runtime context for CLI execution: start directory, loaded config and output options.
/// Built from the root path and optional config path using ConfigLoader only.
pub struct RunContext {
    root: PathBuf,
    config: HashDbConfig,
    pretend: bool,
    palette: Palette,
    cancel: CancellationToken,
}

fn log_progress(event: ProgressEvent) {
    trace!(?event, "Progress");
}

impl RunContext {
    /// Create run context from the root directory and optional config path.
    pub fn new(root: PathBuf, config_path: Option<PathBuf>, pretend: bool) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&root)?,
        };
        Ok(Self::from_config(root, config, pretend))
    }

    /// Create run context from an already loaded configuration.
    pub fn from_config(root: PathBuf, config: HashDbConfig, pretend: bool) -> Self {
        let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self {
            root,
            config,
            pretend,
            palette: Palette { color },
            cancel: CancellationToken::new(),
        }
    }

    /// Force plain or colored output.
    pub fn with_color(mut self, color: bool) -> Self {
        self.palette = Palette { color };
        self
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        info!(command = command_name(command), root = %self.root.display(), "Command started");
        let result = self.execute_inner(command);
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            pretend = self.pretend && command_mutates(command),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Init { force } => self.handle_init(*force),
            Commands::Update { rehash } => self.handle_update(*rehash),
            Commands::Import { file, encoding } => self.handle_import(file, encoding),
            Commands::Verify { verbose } => self.handle_verify(*verbose),
            Commands::Status => {
                let (database, notes) = self.open()?;
                let report = database.status(&self.cancel)?;
                Ok(notes + &format_status_report(&report, database.root(), self.palette))
            }
            Commands::Export => {
                let (database, _) = self.open()?;
                Ok(database.export()?.trim_end().to_string())
            }
        }
    }

    /// Open the database and persist an in-memory schema upgrade right away.
    fn open(&self) -> Result<(HashDatabase, String), ApiError> {
        let mut database = HashDatabase::open(&self.root, self.config.database.clone())?;
        let mut notes = String::new();
        if database.needs_save_after_upgrade() {
            let from = database.stored_version();
            if self.pretend {
                debug!(from, "Schema upgrade not saved (pretend)");
            } else {
                database.save()?;
            }
            notes = format!(
                "Upgraded database schema from version {} to {}{}.\n",
                from,
                crate::store::CURRENT_SCHEMA_VERSION,
                if self.pretend { " (not saved)" } else { "" }
            );
        }
        Ok((database, notes))
    }

    fn finish(&self, database: &mut HashDatabase) -> Result<&'static str, ApiError> {
        if self.pretend {
            return Ok("\n(pretend: database not written)");
        }
        database.save()?;
        Ok("")
    }

    fn handle_init(&self, force: bool) -> Result<String, ApiError> {
        let mut database = HashDatabase::create(&self.root, self.config.database.clone(), force)?;
        let report = database.update(false, &log_progress, &self.cancel)?;
        let suffix = self.finish(&mut database)?;
        Ok(format_change_report(&report, database.root(), self.palette) + suffix)
    }

    fn handle_update(&self, rehash: bool) -> Result<String, ApiError> {
        let (mut database, notes) = self.open()?;
        let report = database.update(rehash, &log_progress, &self.cancel)?;
        let suffix = self.finish(&mut database)?;
        Ok(notes + &format_change_report(&report, database.root(), self.palette) + suffix)
    }

    fn handle_import(&self, file: &Path, encoding: &str) -> Result<String, ApiError> {
        let (mut database, notes) = self.open()?;
        let report = database.import(file, encoding)?;
        let suffix = self.finish(&mut database)?;
        Ok(notes + &format_import_report(&report, database.root(), self.palette) + suffix)
    }

    fn handle_verify(&self, verbose: bool) -> Result<String, ApiError> {
        let (database, notes) = self.open()?;
        let report = database.verify(&log_progress, &self.cancel)?;
        Ok(notes
            + &format_verify_report(
                &report,
                database.store(),
                database.root(),
                verbose,
                self.palette,
            ))
    }
}
