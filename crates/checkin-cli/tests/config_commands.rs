use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_config_path_command() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("checkin")
        .env("CHECKIN_HOME", dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_creates_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    cargo_bin_cmd!("checkin")
        .env("CHECKIN_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config at"));

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("# api_base_url ="));
    assert!(contents.contains("request_timeout_secs = 30"));
}

#[test]
fn test_config_init_fails_if_exists() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "# existing config").unwrap();

    cargo_bin_cmd!("checkin")
        .env("CHECKIN_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_invalid_api_url_is_reported() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("checkin")
        .env("CHECKIN_HOME", dir.path())
        .env("CHECKIN_API_URL", "not a url")
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a url"));
}
