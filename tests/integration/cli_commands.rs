//! CLI End-to-End Tests
//!
//! Runs the `hash_db` binary against scratch trees.

use super::test_utils::{sha512_hex, Fixture};
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn hash_db(fixture: &Fixture) -> Command {
    let mut cmd = Command::cargo_bin("hash_db").unwrap();
    cmd.arg("--root")
        .arg(&fixture.root)
        .arg("--quiet")
        .env("NO_COLOR", "1")
        .env("XDG_CONFIG_HOME", fixture.root.join(".no-global-config"));
    cmd
}

#[test]
fn test_init_update_verify() {
    let fixture = Fixture::new();
    fixture.write("a.txt", "hi");
    fixture.write("b.txt", "");

    hash_db(&fixture)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Added (2):"))
        .stdout(predicate::str::contains("  a.txt"));
    assert!(fixture.db_path().is_file());

    fixture.write("c.txt", "new");
    fixture.remove("a.txt");
    hash_db(&fixture)
        .arg("update")
        .assert()
        .success()
        .stdout(predicate::str::contains("Added (1):\n  c.txt"))
        .stdout(predicate::str::contains("Removed (1):\n  a.txt"));

    hash_db(&fixture)
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("all OK"));
}

/// Drift is reported with exit code zero
#[test]
fn test_verify_drift_exits_zero() {
    let fixture = Fixture::new();
    fixture.write("a.txt", "hi");
    hash_db(&fixture).arg("init").assert().success();

    fixture.write("a.txt", "changed");
    hash_db(&fixture)
        .args(["verify", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Modified (1):\n  a.txt"));
}

#[test]
fn test_missing_database_fails() {
    let fixture = Fixture::new();
    hash_db(&fixture)
        .arg("update")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("hash_db init"));
}

#[test]
fn test_truncated_database_fails_verify() {
    let fixture = Fixture::new();
    fixture.write("a.txt", "hi");
    hash_db(&fixture).arg("init").assert().success();

    let bytes = fs::read(fixture.db_path()).unwrap();
    fs::write(fixture.db_path(), &bytes[..bytes.len() / 3]).unwrap();

    hash_db(&fixture)
        .arg("verify")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Corrupt database"));
}

#[test]
fn test_init_refuses_to_overwrite() {
    let fixture = Fixture::new();
    hash_db(&fixture).arg("init").assert().success();
    hash_db(&fixture)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    hash_db(&fixture).args(["init", "--force"]).assert().success();
}

#[test]
fn test_pretend_leaves_database_untouched() {
    let fixture = Fixture::new();
    fixture.write("a.txt", "hi");
    hash_db(&fixture).arg("init").assert().success();
    let saved = fs::read(fixture.db_path()).unwrap();

    fixture.write("b.txt", "new");
    hash_db(&fixture)
        .args(["--pretend", "update"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  b.txt"))
        .stdout(predicate::str::contains("database not written"));
    assert_eq!(fs::read(fixture.db_path()).unwrap(), saved);

    // Without --pretend the same change is reported again and saved
    hash_db(&fixture)
        .arg("update")
        .assert()
        .success()
        .stdout(predicate::str::contains("  b.txt"));
    assert_ne!(fs::read(fixture.db_path()).unwrap(), saved);
}

#[test]
fn test_upgrade_is_saved_on_load() {
    let fixture = Fixture::new();
    fixture.write("a.txt", "hi");
    fs::write(
        fixture.db_path(),
        format!(
            r#"{{"version": 1, "files": {{"a.txt": {{"size": 2, "mtime": 1.0, "hash": "{}"}}}}}}"#,
            sha512_hex(b"hi")
        ),
    )
    .unwrap();

    hash_db(&fixture)
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("from version 1 to 3"));
    let saved: serde_json::Value =
        serde_json::from_slice(&fs::read(fixture.db_path()).unwrap()).unwrap();
    assert_eq!(saved["version"], 3);
}

#[test]
fn test_status_and_export() {
    let fixture = Fixture::new();
    fixture.write("a.txt", "hi");
    hash_db(&fixture).arg("init").assert().success();

    hash_db(&fixture)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Up to date."));

    fixture.write("new.txt", "x");
    hash_db(&fixture)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Untracked (1):\n  new.txt"));

    hash_db(&fixture)
        .arg("export")
        .assert()
        .success()
        .stdout(format!("{}  a.txt\n", sha512_hex(b"hi")));
}

#[test]
fn test_import_command() {
    let fixture = Fixture::new();
    fixture.write("a.txt", "hi");
    hash_db(&fixture).arg("init").assert().success();
    let list = fixture.write("SUMS", format!("{}  a.txt\n", sha512_hex(b"hi")));

    hash_db(&fixture)
        .arg("import")
        .arg(&list)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 imported, 0 skipped"));

    hash_db(&fixture)
        .arg("import")
        .arg(&list)
        .args(["--encoding", "no-such-encoding"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown text encoding"));
}
