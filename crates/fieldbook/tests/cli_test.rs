//! Integration tests for the `fieldbook` CLI binary.
//!
//! Argument parsing, completions, config handling and early error paths,
//! all without a running backend.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

const NOWHERE: &str = "/tmp/fieldbook-cli-test-nonexistent";

/// `fieldbook` with every config and data directory pointed at `home`
/// and all `FIELDBOOK_*` variables removed.
fn fieldbook_cmd_in(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("fieldbook");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("FIELDBOOK_PROFILE")
        .env_remove("FIELDBOOK_SERVER")
        .env_remove("FIELDBOOK_OUTPUT")
        .env_remove("FIELDBOOK_INSECURE")
        .env_remove("FIELDBOOK_TIMEOUT")
        .env_remove("FIELDBOOK_DEFAULT_PROFILE")
        .env_remove("FIELDBOOK_LOG")
        .env_remove("RUST_LOG");
    cmd
}

fn fieldbook_cmd() -> assert_cmd::Command {
    fieldbook_cmd_in(Path::new(NOWHERE))
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = fieldbook_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_entity_commands() {
    fieldbook_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("projects")
            .and(predicate::str::contains("tasks"))
            .and(predicate::str::contains("merchants"))
            .and(predicate::str::contains("login")),
    );
}

#[test]
fn test_version_flag() {
    fieldbook_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fieldbook"));
}

#[test]
fn test_merchant_import_help_mentions_geocode() {
    fieldbook_cmd()
        .args(["merchants", "import", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--geocode"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    fieldbook_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    fieldbook_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_points_into_config_home() {
    let home = tempfile::tempdir().unwrap();
    fieldbook_cmd_in(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_set_then_show() {
    let home = tempfile::tempdir().unwrap();

    fieldbook_cmd_in(home.path())
        .args(["config", "set", "server", "https://tasks.example.com"])
        .assert()
        .success();
    fieldbook_cmd_in(home.path())
        .args(["config", "set", "token_storage", "file"])
        .assert()
        .success();

    fieldbook_cmd_in(home.path())
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("https://tasks.example.com")
                .and(predicate::str::contains("\"token_storage\": \"file\"")),
        );

    fieldbook_cmd_in(home.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default *"));
}

#[test]
fn test_config_set_unknown_key_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    let output = fieldbook_cmd_in(home.path())
        .args(["config", "set", "password", "hunter2"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("unknown config key"));
}

#[test]
fn test_config_use_missing_profile() {
    let home = tempfile::tempdir().unwrap();
    let output = fieldbook_cmd_in(home.path())
        .args(["config", "use", "staging"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("staging"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = fieldbook_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_projects_list_without_server() {
    let output = fieldbook_cmd().args(["projects", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(
        combined_output(&output).contains("No server configured"),
        "Expected a missing-config error"
    );
}

#[test]
fn test_projects_list_without_token() {
    let home = tempfile::tempdir().unwrap();
    let output = fieldbook_cmd_in(home.path())
        .args(["--server", "http://127.0.0.1:9", "projects", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected the auth exit code");
    assert!(combined_output(&output).contains("Not logged in"));
}

#[test]
fn test_bad_server_url_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let output = fieldbook_cmd_in(home.path())
        .args(["--server", "ftp://files.example.com", "projects", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("server"));
}

#[test]
fn test_delete_without_tty_requires_yes() {
    let home = tempfile::tempdir().unwrap();
    let tokens = home.path().join("data").join("fieldbook").join("tokens");
    std::fs::create_dir_all(&tokens).unwrap();
    std::fs::write(tokens.join("default"), "t0ken").unwrap();

    let output = fieldbook_cmd_in(home.path())
        .args(["--server", "http://127.0.0.1:9", "projects", "delete", "4"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("requires confirmation"));
}
