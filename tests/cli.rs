use assert_cmd::Command;
use flate2::read::GzDecoder;
use predicates::prelude::*;
use std::fs;
use std::io::Read;

fn actionsql() -> Command {
    let mut cmd = Command::cargo_bin("actionsql").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_commands() {
    actionsql()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("snapshot"))
        .stdout(predicate::str::contains("init-changelog"))
        .stdout(predicate::str::contains("history"));
}

#[test]
fn offline_init_prints_ddl() {
    actionsql()
        .args(["init-changelog", "--offline", "postgres"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "CREATE TABLE DATABASECHANGELOG (ID VARCHAR(255) NOT NULL",
        ))
        .stdout(predicate::str::contains("DEPLOYMENT_ID VARCHAR(10));"));
}

#[test]
fn offline_init_honours_table_settings() {
    actionsql()
        .args([
            "init-changelog",
            "--offline",
            "postgres",
            "--changelog-table",
            "history",
            "--changelog-schema",
            "audit",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("CREATE TABLE audit.history ("));
}

#[test]
fn offline_init_writes_script() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("init.sql");
    actionsql()
        .args(["init-changelog", "--offline", "mysql", "--output"])
        .arg(&path)
        .assert()
        .success();

    let script = fs::read_to_string(&path).unwrap();
    assert!(script.starts_with("CREATE TABLE DATABASECHANGELOG ("));
    assert!(script.trim_end().ends_with(';'));
}

#[test]
fn offline_init_writes_gzip_script() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("init.sql.gz");
    actionsql()
        .args(["init-changelog", "--offline", "postgres", "--output"])
        .arg(&path)
        .assert()
        .success();

    let mut script = String::new();
    GzDecoder::new(fs::File::open(&path).unwrap())
        .read_to_string(&mut script)
        .unwrap();
    assert!(script.contains("CREATE TABLE DATABASECHANGELOG ("));
}

#[test]
fn unknown_offline_dialect_fails() {
    actionsql()
        .args(["init-changelog", "--offline", "oracle"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown offline dialect: oracle"));
}

#[test]
fn live_commands_need_a_url() {
    actionsql()
        .arg("history")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Either --url or --url-env must be provided"));
}

#[test]
fn snapshot_replays_stored_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    fs::write(
        &path,
        r#"[
            {"type": "table", "name": ["public", "users"]},
            {"type": "table", "name": ["audit", "events"]}
        ]"#,
    )
    .unwrap();

    actionsql()
        .args(["snapshot", "--offline", "postgres", "--schema", "public", "--snapshot-file"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("users"))
        .stdout(predicate::str::contains("events").not());
}
