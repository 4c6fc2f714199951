//! Binary-level behavior that needs no GIMS server.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `gims` with an empty environment and a config directory that holds nothing.
fn gims(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gims").unwrap();
    cmd.env_clear()
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"));
    cmd
}

#[test]
fn validate_code_accepts_valid_python() {
    let home = TempDir::new().unwrap();
    gims(&home)
        .args(["validate-code", "--code", "def check():\n    return 1\n"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"valid\": true"))
        .stdout(predicate::str::contains("\"error\": null"));
}

#[test]
fn validate_code_rejects_syntax_errors() {
    let home = TempDir::new().unwrap();
    gims(&home)
        .args(["validate-code", "--code", "def broken(:\n    pass\n"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"valid\": false"))
        .stdout(predicate::str::contains("Syntax error at line"));
}

#[test]
fn validate_code_reads_files() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("code.py");
    std::fs::write(&file, "print('ok')\n").unwrap();

    gims(&home)
        .arg("validate-code")
        .arg("--file")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"valid\": true"));
}

#[test]
fn validate_code_without_input_is_an_error_envelope() {
    let home = TempDir::new().unwrap();
    gims(&home)
        .arg("validate-code")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"status\": \"error\""))
        .stdout(predicate::str::contains("Specify --file or --code"));
}

#[test]
fn sync_command_without_config_prints_envelope() {
    let home = TempDir::new().unwrap();
    gims(&home)
        .args(["status", "--base-dir", "."])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"message\": \"Configuration error\""))
        .stdout(predicate::str::contains("GIMS_URL not set"));
}

#[test]
fn crud_command_without_config_reports_on_stderr() {
    let home = TempDir::new().unwrap();
    gims(&home)
        .args(["script", "list"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Error: Configuration error"))
        .stderr(predicate::str::contains("Detail: GIMS_URL not set"));
}

#[test]
fn unknown_component_type_is_rejected_by_the_parser() {
    let home = TempDir::new().unwrap();
    gims(&home)
        .args(["checkout", "--component-type", "widget", "--id", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("widget"));
}
