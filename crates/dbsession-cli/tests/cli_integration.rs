//! CLI integration tests for the dbsession command-line interface.
//!
//! Each test runs against a database in its own temporary directory, with
//! config discovery pointed at that directory too.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the dbsession binary, isolated in `dir`.
fn dbsession(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dbsession").unwrap();
    cmd.env("DBSESSION_CONFIG_DIR", dir.path())
        .env_remove("DBSESSION_CONFIG")
        .env("DBSESSION_DATABASE", dir.path().join("sessions.db"));
    cmd
}

fn init(dir: &TempDir) {
    dbsession(dir).arg("init").assert().success();
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    dbsession(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("put"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("touch"))
        .stdout(predicate::str::contains("delete"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    dbsession(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dbsession"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Lifecycle
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_put_then_show() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    dbsession(&dir)
        .args(["put", "s1", "user=alice", "count=3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved 2 entries"));

    dbsession(&dir)
        .args(["--json", "show", "s1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""state": "active""#))
        .stdout(predicate::str::contains(r#""key": "user""#))
        .stdout(predicate::str::contains(r#""value": "alice""#))
        .stdout(predicate::str::contains(r#""value": 3"#));
}

#[test]
fn test_show_unknown_session() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    dbsession(&dir)
        .args(["--json", "show", "nope"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""state": "missing""#));
}

#[test]
fn test_status_unknown_then_touched() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    dbsession(&dir)
        .args(["--json", "status", "s1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""determinable": false"#))
        .stdout(predicate::str::contains(r#""expired": true"#));

    dbsession(&dir)
        .args(["touch", "s1", "--ttl-secs", "600"])
        .assert()
        .success();

    dbsession(&dir)
        .args(["--json", "status", "s1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""determinable": true"#))
        .stdout(predicate::str::contains(r#""expired": false"#));
}

#[test]
fn test_delete_removes_session() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    dbsession(&dir).args(["put", "s1", "k=v"]).assert().success();
    dbsession(&dir).args(["delete", "s1"]).assert().success();
    dbsession(&dir).args(["delete", "s1"]).assert().success();

    dbsession(&dir)
        .args(["--json", "status", "s1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""determinable": false"#));
}

#[test]
fn test_dedicated_expiration_table_from_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        r#"
[store]
ttl_secs = 600

[expiration.schema]
table_name = "SESSION_EXPIRATION"
session_id_column = "ID"
expiration_column = "EXPIRES_AT"
"#,
    )
    .unwrap();

    dbsession(&dir)
        .args(["--json", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SESSION_EXPIRATION"));

    dbsession(&dir).args(["put", "s1", "k=v"]).assert().success();

    dbsession(&dir)
        .args(["--json", "status", "s1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""determinable": true"#));

    // Both tables carry the same expiration instant.
    let conn = dbsession::rusqlite::Connection::open(dir.path().join("sessions.db")).unwrap();
    let payload_expiry: i64 = conn
        .query_row(
            "SELECT EXPIRATION_DATETIME FROM USER_SESSION WHERE SESSION_ID = 's1'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    let tracked_expiry: i64 = conn
        .query_row("SELECT EXPIRES_AT FROM SESSION_EXPIRATION WHERE ID = 's1'", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(payload_expiry, tracked_expiry);
}

// ─────────────────────────────────────────────────────────────────────────────
// Invalid Input
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_put_rejects_malformed_entry() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    dbsession(&dir)
        .args(["put", "s1", "novalue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected key=value"));
}

#[test]
fn test_invalid_table_name_in_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[store.schema]\ntable_name = \"x; DROP TABLE y\"\n",
    )
    .unwrap();

    dbsession(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn test_put_requires_entries() {
    let dir = TempDir::new().unwrap();
    dbsession(&dir).args(["put", "s1"]).assert().failure();
}
