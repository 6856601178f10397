//! Schema upgrade table
//!
//! `MIGRATIONS[v - 1]` upgrades a document from version `v` to `v + 1`.
//! Every transform only fills fields that are missing or not yet in their
//! current form, so running one twice is harmless.

use crate::error::StorageError;
use crate::store::persistence::RawEntry;
use crate::tree::hasher::link_target_bytes;
use crate::tree::path::from_relative_key;
use crate::tree::ContentHasher;
use crate::types::EntryKind;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// What a transform may consult besides the document itself.
pub struct MigrationContext<'a> {
    pub root: &'a Path,
    pub hasher: &'a ContentHasher,
}

pub type Migration =
    fn(&mut BTreeMap<String, RawEntry>, &MigrationContext<'_>) -> Result<(), StorageError>;

pub const MIGRATIONS: [Migration; 2] = [add_entry_kind, normalize_symlink_sizes];

/// Version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = MIGRATIONS.len() as u32 + 1;

/// Apply every transform between `from` and the current version.
pub fn upgrade(
    from: u32,
    files: &mut BTreeMap<String, RawEntry>,
    context: &MigrationContext<'_>,
) -> Result<u32, StorageError> {
    let mut version = from.max(1);
    while version < CURRENT_SCHEMA_VERSION {
        let migration = MIGRATIONS[(version - 1) as usize];
        migration(files, context)?;
        debug!(from = version, to = version + 1, entries = files.len(), "Upgraded database schema");
        version += 1;
    }
    Ok(version)
}

/// v1 -> v2: entries gain a `type`.
///
/// Entries saved before kinds existed are re-probed. An object that is now a
/// symlink gets its digest, size and mtime refreshed from the link; anything
/// else, including vanished paths, is taken to be a regular file.
fn add_entry_kind(
    files: &mut BTreeMap<String, RawEntry>,
    context: &MigrationContext<'_>,
) -> Result<(), StorageError> {
    for (key, entry) in files.iter_mut() {
        if entry.kind.is_some() {
            continue;
        }
        entry.kind = Some(EntryKind::RegularFile.code());

        let Some(path) = from_relative_key(context.root, key) else {
            continue;
        };
        let Ok(metadata) = std::fs::symlink_metadata(&path) else {
            continue;
        };
        if EntryKind::from_metadata(&metadata) != Some(EntryKind::Symlink) {
            continue;
        }

        let (Ok(target), Ok(digest), Ok(mtime)) = (
            std::fs::read_link(&path),
            context.hasher.hash(&path, EntryKind::Symlink),
            crate::types::modified_seconds(&metadata),
        ) else {
            continue;
        };
        entry.kind = Some(EntryKind::Symlink.code());
        entry.size = Some(link_target_bytes(&target).len() as u64);
        entry.mtime = Some(mtime);
        entry.hash = Some(digest.to_string());
    }
    Ok(())
}

/// v2 -> v3: symlink sizes become target-string lengths; digests are lowercase.
fn normalize_symlink_sizes(
    files: &mut BTreeMap<String, RawEntry>,
    context: &MigrationContext<'_>,
) -> Result<(), StorageError> {
    let symlink = EntryKind::Symlink.code();
    for (key, entry) in files.iter_mut() {
        if let Some(hash) = entry.hash.as_mut() {
            hash.make_ascii_lowercase();
        }
        if entry.kind != Some(symlink) || entry.size.is_some() {
            continue;
        }
        entry.size = from_relative_key(context.root, key)
            .and_then(|path| std::fs::read_link(path).ok())
            .map(|target| link_target_bytes(&target).len() as u64);
    }
    Ok(())
}
