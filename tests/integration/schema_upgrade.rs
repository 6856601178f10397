//! Schema Upgrade Tests
//!
//! Older sidecar documents load through the upgrade table; newer ones are refused.

use super::test_utils::{sha512_hex, Fixture};
use hashdb::config::DatabaseConfig;
use hashdb::store::CURRENT_SCHEMA_VERSION;
use hashdb::types::EntryKind;
use hashdb::{HashDatabase, StorageError};
use serde_json::json;
use std::fs;

fn write_document(fixture: &Fixture, document: serde_json::Value) {
    fs::write(fixture.db_path(), serde_json::to_vec(&document).unwrap()).unwrap();
}

fn open(fixture: &Fixture) -> Result<HashDatabase, StorageError> {
    HashDatabase::open(&fixture.root, DatabaseConfig::default())
}

/// A v1 document (no `type`) loads and saves at the current version
#[test]
fn test_v1_document_is_upgraded() {
    let fixture = Fixture::new();
    fixture.write("a.txt", "hi");
    write_document(
        &fixture,
        json!({
            "version": 1,
            "files": {
                "a.txt": { "size": 2, "mtime": 1.5, "hash": sha512_hex(b"hi").to_uppercase() }
            }
        }),
    );

    let mut database = open(&fixture).unwrap();
    assert_eq!(database.stored_version(), 1);
    assert!(database.needs_save_after_upgrade());

    let entry = database.store().get(&fixture.path("a.txt")).unwrap();
    assert_eq!(entry.kind, EntryKind::RegularFile);
    assert_eq!(entry.digest.as_str(), sha512_hex(b"hi"));
    assert_eq!(entry.modified_at, 1.5);

    database.save().unwrap();
    let saved: serde_json::Value =
        serde_json::from_slice(&fs::read(fixture.db_path()).unwrap()).unwrap();
    assert_eq!(saved["version"], json!(CURRENT_SCHEMA_VERSION));
    assert_eq!(saved["files"]["a.txt"]["type"], json!(0));
    assert!(!open(&fixture).unwrap().needs_save_after_upgrade());
}

/// A v1 entry whose path is now a symlink is refreshed from the link
#[cfg(unix)]
#[test]
fn test_v1_entry_now_symlink_is_refreshed() {
    let fixture = Fixture::new();
    fixture.symlink("link", "target-name");
    write_document(
        &fixture,
        json!({
            "version": 1,
            "files": {
                "link": { "size": 999, "mtime": 1.0, "hash": sha512_hex(b"stale") }
            }
        }),
    );

    let database = open(&fixture).unwrap();
    let entry = database.store().get(&fixture.path("link")).unwrap();
    assert_eq!(entry.kind, EntryKind::Symlink);
    assert_eq!(entry.size, Some(11));
    assert_eq!(entry.digest.as_str(), sha512_hex(b"target-name"));
    assert!(database
        .verify(
            &hashdb::progress::NoProgress,
            &hashdb::progress::CancellationToken::new()
        )
        .unwrap()
        .is_clean());
}

/// A v2 symlink entry without a size gets one from the live link
#[cfg(unix)]
#[test]
fn test_v2_symlink_size_is_filled() {
    let fixture = Fixture::new();
    fixture.symlink("link", "abc");
    write_document(
        &fixture,
        json!({
            "version": 2,
            "files": {
                "link": { "mtime": 1.0, "hash": sha512_hex(b"abc"), "type": 1 }
            }
        }),
    );

    let database = open(&fixture).unwrap();
    assert_eq!(database.store().get(&fixture.path("link")).unwrap().size, Some(3));
}

/// Documents from a newer release are refused, not truncated
#[test]
fn test_future_version_is_unsupported() {
    let fixture = Fixture::new();
    write_document(
        &fixture,
        json!({ "version": CURRENT_SCHEMA_VERSION + 1, "files": {}, "extra": [1, 2, 3] }),
    );

    match open(&fixture) {
        Err(StorageError::UnsupportedSchemaVersion { found, supported }) => {
            assert_eq!(found, CURRENT_SCHEMA_VERSION + 1);
            assert_eq!(supported, CURRENT_SCHEMA_VERSION);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("future version must not load"),
    }
}

/// Structurally broken documents are corrupt
#[test]
fn test_structurally_invalid_documents_are_corrupt() {
    let fixture = Fixture::new();
    for document in [
        json!({ "files": {} }),
        json!({ "version": 0, "files": {} }),
        json!({ "version": 3, "files": { "a": { "size": 1, "mtime": 1.0, "hash": "zz", "type": 0 } } }),
        json!({ "version": 3, "files": { "../escape": { "size": 1, "mtime": 1.0, "hash": "ab", "type": 0 } } }),
        json!({ "version": 3, "files": { "a": { "size": 1, "mtime": 1.0, "hash": "ab", "type": 7 } } }),
    ] {
        write_document(&fixture, document.clone());
        assert!(
            matches!(open(&fixture), Err(StorageError::CorruptDatabase { .. })),
            "expected corrupt for {document}"
        );
    }
}
