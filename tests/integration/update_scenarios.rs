//! Update Scenario Tests
//!
//! Add/remove/modify detection, idempotence and the size+mtime gate.

use super::test_utils::{paths, update, Fixture};
#[cfg(unix)]
use super::test_utils::{running_as_root, set_mode};
use filetime::FileTime;
use hashdb::progress::{CancellationToken, NoProgress, ProgressEvent};
use hashdb::tree::ContentHasher;
use hashdb::StorageError;
use std::fs;
use std::sync::Mutex;

const SHA512_EMPTY: &str = "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce\
                            47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e";

/// Test the basic add/remove scenario from a fresh database
#[test]
fn test_init_then_add_and_delete() {
    let fixture = Fixture::new();
    fixture.write("a.txt", "hi");
    fixture.write("b.txt", "");

    let (mut database, report) = fixture.init();
    assert_eq!(report.added, paths(&fixture, &["a.txt", "b.txt"]));
    assert!(report.removed.is_empty() && report.modified.is_empty());

    let empty = database.store().get(&fixture.path("b.txt")).unwrap();
    assert_eq!(empty.digest.as_str(), SHA512_EMPTY);
    assert_eq!(&empty.digest, ContentHasher::default().empty_digest());

    fixture.write("c.txt", "new");
    fixture.remove("a.txt");
    let report = update(&mut database, false);
    assert_eq!(report.added, paths(&fixture, &["c.txt"]));
    assert_eq!(report.removed, paths(&fixture, &["a.txt"]));
    assert!(report.modified.is_empty());
    assert!(report.failed.is_empty());
}

/// Test that a second update with no filesystem change reports nothing
#[test]
fn test_update_is_idempotent() {
    let fixture = Fixture::new();
    fixture.write("a.txt", "alpha");
    fixture.write("nested/deeper/b.txt", "beta");

    let (_, _) = fixture.init();
    let mut database = fixture.open();
    let first = update(&mut database, false);
    let second = update(&mut database, false);
    assert!(first.is_clean());
    assert!(second.is_clean());
    assert_eq!(database.store().len(), 2);
}

/// Test that a content change with new metadata is reported modified
#[test]
fn test_modified_content_is_reported() {
    let fixture = Fixture::new();
    fixture.write("a.txt", "short");
    fixture.set_mtime("a.txt", 1_600_000_000.0);
    let (mut database, _) = fixture.init();

    fixture.write("a.txt", "much longer content");
    let report = update(&mut database, false);
    assert_eq!(report.modified, paths(&fixture, &["a.txt"]));

    let entry = database.store().get(&fixture.path("a.txt")).unwrap();
    assert_eq!(entry.size, Some(19));
}

/// Touching a file re-hashes it but does not report it; the stored mtime moves
#[test]
fn test_touch_without_content_change_is_absorbed() {
    let fixture = Fixture::new();
    fixture.write("a.txt", "stable");
    fixture.set_mtime("a.txt", 1_500_000_000.25);
    let (mut database, _) = fixture.init();
    assert_eq!(
        database.store().get(&fixture.path("a.txt")).unwrap().modified_at,
        1_500_000_000.25
    );

    fixture.set_mtime("a.txt", 1_700_000_000.5);
    let report = update(&mut database, false);
    assert!(report.is_clean());
    assert_eq!(
        database.store().get(&fixture.path("a.txt")).unwrap().modified_at,
        1_700_000_000.5
    );

    // The refreshed mtime survives a save/load cycle
    let reopened = fixture.open();
    assert_eq!(
        reopened.store().get(&fixture.path("a.txt")).unwrap().modified_at,
        1_700_000_000.5
    );
}

/// Same-size edit with the old mtime restored is only caught when forced
#[test]
fn test_forced_rehash_catches_restored_mtime() {
    let fixture = Fixture::new();
    let path = fixture.write("a.txt", "aaaa");
    let (mut database, _) = fixture.init();

    let before = fs::metadata(&path).unwrap();
    let mtime = FileTime::from_last_modification_time(&before);
    fs::write(&path, "bbbb").unwrap();
    filetime::set_file_mtime(&path, mtime).unwrap();

    let normal = update(&mut database, false);
    assert!(normal.is_clean(), "metadata gate hides the change");

    let forced = update(&mut database, true);
    assert_eq!(forced.modified, paths(&fixture, &["a.txt"]));

    let again = update(&mut database, true);
    assert!(again.is_clean());
}

/// The sidecar and its temporary save files are never tracked
#[test]
fn test_database_file_is_not_tracked() {
    let fixture = Fixture::new();
    fixture.write("a.txt", "alpha");
    let (mut database, _) = fixture.init();
    fixture.write(".hash_db.json.bak", "copy");

    let report = update(&mut database, false);
    assert_eq!(report.added, paths(&fixture, &[".hash_db.json.bak"]));
    assert!(!database.store().contains(&fixture.db_path()));
}

/// Progress events arrive through a plain closure
#[test]
fn test_progress_events_are_delivered() {
    let fixture = Fixture::new();
    fixture.write("a.txt", "alpha");
    fixture.write("b.txt", "beta");
    let mut database = hashdb::HashDatabase::create(
        &fixture.root,
        hashdb::config::DatabaseConfig::default(),
        false,
    )
    .unwrap();

    let events = Mutex::new(Vec::new());
    let sink = |event: ProgressEvent| events.lock().unwrap().push(event);
    database
        .update(false, &sink, &CancellationToken::new())
        .unwrap();

    let events = events.into_inner().unwrap();
    assert!(matches!(events.first(), Some(ProgressEvent::ScanStarted { .. })));
    assert!(events.contains(&ProgressEvent::Hashed { done: 2, total: 2 }));
}

/// A cancelled update leaves the in-memory store untouched
#[test]
fn test_cancelled_update_leaves_store() {
    let fixture = Fixture::new();
    fixture.write("a.txt", "alpha");
    let (mut database, _) = fixture.init();
    let before = database.store().clone();
    fixture.write("b.txt", "beta");

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = database.update(false, &NoProgress, &cancel);
    assert!(matches!(result, Err(StorageError::Cancelled)));
    assert_eq!(database.store(), &before);
}

/// Unreadable files are failures, never removals or modifications
#[cfg(unix)]
#[test]
fn test_unreadable_file_is_reported_as_failure() {
    // Root ignores permission bits
    if running_as_root() {
        return;
    }

    let fixture = Fixture::new();
    let path = fixture.write("secret.txt", "hidden");
    set_mode(&path, 0o000);

    let mut database = hashdb::HashDatabase::create(
        &fixture.root,
        hashdb::config::DatabaseConfig::default(),
        false,
    )
    .unwrap();
    let report = database
        .update(false, &NoProgress, &CancellationToken::new())
        .unwrap();
    set_mode(&path, 0o644);

    assert!(report.added.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, path);
}

/// A tracked file that can no longer be read stays tracked on a forced rehash
#[cfg(unix)]
#[test]
fn test_forced_rehash_keeps_unreadable_tracked_file() {
    if running_as_root() {
        return;
    }

    let fixture = Fixture::new();
    let path = fixture.write("secret.txt", "hidden");
    fixture.write("plain.txt", "open");
    let (mut database, _) = fixture.init();
    let before = database.store().get(&path).cloned();

    set_mode(&path, 0o000);
    let report = database
        .update(true, &NoProgress, &CancellationToken::new())
        .unwrap();
    set_mode(&path, 0o644);

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, path);
    assert!(report.removed.is_empty());
    assert!(report.modified.is_empty());
    assert_eq!(database.store().len(), 2);
    assert_eq!(database.store().get(&path).cloned(), before);
}

/// Entries below a directory the walk cannot enter are neither removed nor missing
#[cfg(unix)]
#[test]
fn test_unreadable_directory_keeps_entries_below_it() {
    if running_as_root() {
        return;
    }

    let fixture = Fixture::new();
    fixture.write("locked/a.txt", "a");
    fixture.write("locked/deeper/b.txt", "b");
    fixture.write("top.txt", "t");
    let (mut database, _) = fixture.init();
    let dir = fixture.path("locked");

    set_mode(&dir, 0o000);
    let report = database
        .update(false, &NoProgress, &CancellationToken::new())
        .unwrap();
    let status = database.status(&CancellationToken::new()).unwrap();
    set_mode(&dir, 0o755);

    assert!(report.removed.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, dir);
    assert_eq!(database.store().len(), 3);
    assert!(database.store().contains(&fixture.path("locked/deeper/b.txt")));

    assert!(status.missing.is_empty());
    assert_eq!(status.failed.len(), 1);
    assert_eq!(status.failed[0].path, dir);
}
