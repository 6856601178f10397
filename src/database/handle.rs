//! An opened hash database: root, sidecar location, and the loaded store.

use crate::config::DatabaseConfig;
use crate::error::StorageError;
use crate::import::{export_hash_list, import_entries, parse_hash_list, ImportReport};
use crate::progress::{CancellationToken, ProgressSink};
use crate::reconcile::{self, ChangeReport, StatusReport, UpdateOptions};
use crate::store::{EntryStore, SchemaCodec, CURRENT_SCHEMA_VERSION};
use crate::tree::path::{absolutize, canonicalize_path};
use crate::tree::{ContentHasher, Walker};
use crate::verify::{self, VerifyReport};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::discovery::require_database;

/// A root directory and the store tracking it.
///
/// Operations never write to disk on their own; call [`HashDatabase::save`]
/// to persist the store.
pub struct HashDatabase {
    config: DatabaseConfig,
    root: PathBuf,
    db_path: PathBuf,
    hasher: ContentHasher,
    codec: SchemaCodec,
    store: EntryStore,
    stored_version: u32,
}

impl HashDatabase {
    /// An empty, unsaved database for `root`.
    ///
    /// Fails with `DatabaseExists` if a sidecar is already present and `force`
    /// is not set.
    pub fn create(root: &Path, config: DatabaseConfig, force: bool) -> Result<Self, StorageError> {
        config.validate().map_err(StorageError::InvalidPath)?;
        let root = canonicalize_path(root)?;
        if !root.is_dir() {
            return Err(StorageError::InvalidPath(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        let db_path = root.join(&config.filename);
        if !force && std::fs::symlink_metadata(&db_path).is_ok() {
            return Err(StorageError::DatabaseExists(db_path));
        }
        Ok(Self::assemble(config, root, db_path, EntryStore::new(), CURRENT_SCHEMA_VERSION))
    }

    /// Create, scan and hash everything under `root`, then save.
    pub fn init(
        root: &Path,
        config: DatabaseConfig,
        force: bool,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<(Self, ChangeReport), StorageError> {
        let mut database = Self::create(root, config, force)?;
        let report = database.update(false, progress, cancel)?;
        database.save()?;
        Ok((database, report))
    }

    /// Open the nearest database at or above `start`, upgrading older schemas
    /// in memory.
    pub fn open(start: &Path, config: DatabaseConfig) -> Result<Self, StorageError> {
        config.validate().map_err(StorageError::InvalidPath)?;
        let db_path = require_database(start, &config.filename)?;
        let root = db_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| StorageError::InvalidPath(format!("{:?} has no parent", db_path)))?;

        let hasher = config.hasher();
        let decoded = SchemaCodec::new(root.clone(), hasher).load(&db_path)?;
        debug!(
            path = %db_path.display(),
            entries = decoded.store.len(),
            version = decoded.stored_version,
            "Opened database"
        );
        Ok(Self::assemble(
            config,
            root,
            db_path,
            decoded.store,
            decoded.stored_version,
        ))
    }

    fn assemble(
        config: DatabaseConfig,
        root: PathBuf,
        db_path: PathBuf,
        store: EntryStore,
        stored_version: u32,
    ) -> Self {
        let hasher = config.hasher();
        let codec = SchemaCodec::new(root.clone(), hasher.clone());
        Self {
            config,
            root,
            db_path,
            hasher,
            codec,
            store,
            stored_version,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Schema version of the document as it was read from disk.
    pub fn stored_version(&self) -> u32 {
        self.stored_version
    }

    /// True when the on-disk document is older than the current schema.
    pub fn needs_save_after_upgrade(&self) -> bool {
        self.stored_version < CURRENT_SCHEMA_VERSION
    }

    fn walker(&self) -> Walker {
        Walker::new(self.root.clone(), self.config.walker_config())
    }

    /// Bring the store in line with the tree.
    pub fn update(
        &mut self,
        force_rehash: bool,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ChangeReport, StorageError> {
        let options = UpdateOptions {
            force_rehash,
            parallel: self.config.parallel,
        };
        let walker = self.walker();
        reconcile::update(&mut self.store, &walker, &self.hasher, options, progress, cancel)
    }

    /// Re-hash every tracked entry without touching the store.
    pub fn verify(
        &self,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<VerifyReport, StorageError> {
        verify::verify(
            &self.store,
            &self.hasher,
            self.config.parallel,
            progress,
            cancel,
        )
    }

    /// Metadata drift since the last update.
    pub fn status(&self, cancel: &CancellationToken) -> Result<StatusReport, StorageError> {
        reconcile::status(&self.store, &self.walker(), cancel)
    }

    /// Merge the digests listed in a hash list file into the store.
    pub fn import(&mut self, file: &Path, encoding: &str) -> Result<ImportReport, StorageError> {
        let file = absolutize(file)?;
        let bytes = std::fs::read(&file)?;
        let base_dir = file
            .parent()
            .ok_or_else(|| StorageError::InvalidPath(format!("{:?} has no parent", file)))?;
        let entries = parse_hash_list(&bytes, encoding, &file, base_dir)?;
        import_entries(
            &mut self.store,
            &self.root,
            &self.config.walker_config(),
            entries,
        )
    }

    /// Hash list text for every tracked entry.
    pub fn export(&self) -> Result<String, StorageError> {
        export_hash_list(&self.store, &self.root)
    }

    /// Persist the store at the current schema version.
    pub fn save(&mut self) -> Result<(), StorageError> {
        self.codec.save(&self.store, &self.db_path)?;
        self.stored_version = CURRENT_SCHEMA_VERSION;
        Ok(())
    }
}
