use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("checkin")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("register"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("check-in"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_login_requires_username() {
    cargo_bin_cmd!("checkin")
        .arg("login")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--username"));
}
