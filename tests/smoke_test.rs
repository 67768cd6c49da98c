//! Smoke tests for the modsettings CLI.
//!
//! These tests verify basic CLI functionality:
//! - `modsettings --version` outputs version info
//! - `modsettings --help` outputs help text
//! - a command is required

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a Command for the modsettings binary.
fn modsettings() -> Command {
    Command::new(env!("CARGO_BIN_EXE_modsettings"))
}

#[test]
fn test_version_flag() {
    modsettings()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("modsettings"))
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_help_flag() {
    modsettings()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("Options:"));
}

#[test]
fn test_help_lists_commands() {
    modsettings()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("restore"));
}

#[test]
fn test_no_args_is_an_error() {
    modsettings()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_set_help() {
    modsettings()
        .args(["set", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("parsed as JSON"));
}
