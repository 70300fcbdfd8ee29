//! Cross-cutting CLI tests (help, version, error handling)

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help() {
    cargo_bin_cmd!("lua-format-ls")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("thin bridge"));
}

#[test]
fn test_version() {
    cargo_bin_cmd!("lua-format-ls")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_subcommand() {
    cargo_bin_cmd!("lua-format-ls")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_invalid_subcommand() {
    cargo_bin_cmd!("lua-format-ls")
        .arg("invalid")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_format_help() {
    cargo_bin_cmd!("lua-format-ls")
        .args(["format", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pipe a Lua document"));
}
