//! CLI integration tests for the Sensorcast command-line interface.
//!
//! Each test runs the binary in an empty temporary directory with the user
//! config directory pointed at another one, so no real config leaks in.
//! None of them start the server.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Sandbox {
    project: TempDir,
    user: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            project: TempDir::new().unwrap(),
            user: TempDir::new().unwrap(),
        }
    }

    /// Write `./sensorcast.toml` in the project directory.
    fn with_project_config(self, contents: &str) -> Self {
        fs::write(self.project.path().join("sensorcast.toml"), contents).unwrap();
        self
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("sensorcast").unwrap();
        cmd.current_dir(self.project.path())
            .env("SENSORCAST_CONFIG_DIR", self.user.path())
            .env_remove("SENSORCAST_ENV")
            .env_remove("SENSORCAST_CONFIG")
            .env_remove("RUST_LOG");
        cmd
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    Sandbox::new()
        .cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_displays() {
    Sandbox::new()
        .cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sensorcast"));
}

#[test]
fn test_serve_help_lists_overrides() {
    Sandbox::new()
        .cmd()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--bind"))
        .stdout(predicate::str::contains("--max-connections"))
        .stdout(predicate::str::contains("--env"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_show_defaults() {
    Sandbox::new()
        .cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("env = \"dev\""))
        .stdout(predicate::str::contains("port = 8080"))
        .stdout(predicate::str::contains("max_connections = 10000"))
        .stdout(predicate::str::contains("refresh_interval_ms = 2000"))
        .stdout(predicate::str::contains("ttl_secs = 30"));
}

#[test]
fn test_config_show_project_layer() {
    Sandbox::new()
        .with_project_config("env = \"uat\"\n\n[server]\nport = 9090\n")
        .cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("env = \"uat\""))
        .stdout(predicate::str::contains("port = 9090"));
}

#[test]
fn test_env_var_overrides_file() {
    Sandbox::new()
        .with_project_config("env = \"uat\"\n")
        .cmd()
        .env("SENSORCAST_ENV", "prod")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("env = \"prod\""));
}

#[test]
fn test_unknown_env_var_fails() {
    Sandbox::new()
        .cmd()
        .env("SENSORCAST_ENV", "staging")
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("staging"));
}

#[test]
fn test_explicit_config_file() {
    let sandbox = Sandbox::new();
    let path = sandbox.user.path().join("custom.toml");
    fs::write(&path, "[cache]\nttl_secs = 5\n").unwrap();

    sandbox
        .cmd()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ttl_secs = 5"));
}

#[test]
fn test_missing_explicit_config_file_fails() {
    Sandbox::new()
        .cmd()
        .args(["--config", "does-not-exist.toml", "config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn test_config_which_reports_broken_layer() {
    Sandbox::new()
        .with_project_config("[server\nport = 1\n")
        .cmd()
        .args(["config", "which"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped"))
        .stdout(predicate::str::contains("warning: Failed to load"));
}

#[test]
fn test_config_validate() {
    Sandbox::new()
        .cmd()
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));

    Sandbox::new()
        .with_project_config("[security]\nx_frame_options = \"ALLOWALL\"\n")
        .cmd()
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("security.x_frame_options"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Serve Argument Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_serve_rejects_privileged_port() {
    Sandbox::new()
        .cmd()
        .args(["serve", "--port", "80"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("server.port"));
}

#[test]
fn test_serve_rejects_tiny_capacity() {
    Sandbox::new()
        .cmd()
        .args(["serve", "--max-connections", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("server.max_connections"));
}

#[test]
fn test_serve_rejects_unknown_env() {
    Sandbox::new()
        .cmd()
        .args(["serve", "--env", "staging"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("staging"));
}

#[test]
fn test_serve_rejects_bad_bind_address() {
    Sandbox::new()
        .cmd()
        .args(["serve", "--bind", "not-an-ip", "--port", "18080"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid bind address"));
}
