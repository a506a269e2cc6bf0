//! End-to-end tests of the vault binary

use assert_cmd::{cargo::cargo_bin_cmd, Command};
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temp directory with a config pointing the file backend inside it
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new(extra: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let entries = dir.path().join("entries");
        let config = format!(
            "[general]\naudit_log = false\n\n[backend]\nkind = \"file\"\npath = {:?}\n\n{}",
            entries.display().to_string(),
            extra
        );
        std::fs::write(dir.path().join("config.toml"), config).unwrap();
        Self { dir }
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    fn vault(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("vault");
        cmd.env_remove("VAULT_NAMESPACE")
            .arg("--config")
            .arg(self.config_path());
        cmd
    }

    fn entries_dir(&self) -> PathBuf {
        self.dir.path().join("entries")
    }
}

const STATIC_PROVIDER: &str = r#"
[[providers]]
kind = "static"
name = "defaults"
entries = { region = "eu-west-1", "log-level" = "info" }
"#;

fn json_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|it| {
            it.filter_map(Result::ok)
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                .count()
        })
        .unwrap_or(0)
}

#[test]
fn help_displays() {
    cargo_bin_cmd!("vault")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("configuration and secret store"));
}

#[test]
fn version_displays() {
    cargo_bin_cmd!("vault")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vault"));
}

#[test]
fn set_then_get() {
    let sandbox = Sandbox::new("");

    sandbox
        .vault()
        .args(["set", "db-host", "10.0.0.5"])
        .assert()
        .success();
    assert_eq!(json_files(&sandbox.entries_dir()), 1);

    sandbox
        .vault()
        .args(["get", "db-host"])
        .assert()
        .success()
        .stdout("10.0.0.5\n");

    sandbox
        .vault()
        .args(["get", "db-host", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""source": "manual""#));
}

#[test]
fn get_missing_fails() {
    let sandbox = Sandbox::new("");

    sandbox
        .vault()
        .args(["get", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Entry not found: nope"));
}

#[test]
fn get_pulls_from_provider_on_miss() {
    let sandbox = Sandbox::new(STATIC_PROVIDER);

    sandbox
        .vault()
        .args(["get", "region"])
        .assert()
        .success()
        .stdout("eu-west-1\n");
}

#[test]
fn refresh_then_list() {
    let sandbox = Sandbox::new(STATIC_PROVIDER);

    sandbox
        .vault()
        .arg("refresh")
        .assert()
        .success()
        .stdout(predicate::str::contains("Refreshed from 1 provider(s)"));

    sandbox
        .vault()
        .args(["list", "--format", "plain"])
        .assert()
        .success()
        .stdout("log-level\nregion\n");
}

#[test]
fn refresh_without_providers_warns() {
    let sandbox = Sandbox::new("");

    sandbox
        .vault()
        .arg("refresh")
        .assert()
        .success()
        .stdout(predicate::str::contains("No providers configured"));
}

#[test]
fn list_empty() {
    let sandbox = Sandbox::new("");

    sandbox
        .vault()
        .args(["list", "--format", "json"])
        .assert()
        .success()
        .stdout("[]\n");
}

#[test]
fn delete_removes_entry() {
    let sandbox = Sandbox::new("");

    sandbox.vault().args(["set", "k", "v"]).assert().success();
    sandbox.vault().args(["delete", "k"]).assert().success();
    sandbox.vault().args(["delete", "k"]).assert().success();

    sandbox.vault().args(["get", "k"]).assert().failure();
}

#[test]
fn namespace_flag_isolates_entries() {
    let sandbox = Sandbox::new("");

    sandbox
        .vault()
        .args(["--namespace", "prod", "set", "host", "prod.db"])
        .assert()
        .success();

    sandbox.vault().args(["get", "host"]).assert().failure();
    sandbox
        .vault()
        .args(["-n", "qa", "get", "host"])
        .assert()
        .failure();
    sandbox
        .vault()
        .args(["-n", "prod", "get", "host"])
        .assert()
        .success()
        .stdout("prod.db\n");
}

#[test]
fn config_path() {
    let sandbox = Sandbox::new("");

    sandbox
        .vault()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_show() {
    let sandbox = Sandbox::new(STATIC_PROVIDER);

    sandbox
        .vault()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[general]"))
        .stdout(predicate::str::contains("defaults"));
}

#[test]
fn invalid_config_reports_error() {
    let sandbox = Sandbox::new("");
    std::fs::write(sandbox.config_path(), "[vault]\nttl_secs = \"soon\"\n").unwrap();

    sandbox
        .vault()
        .args(["list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn config_loading_is_logged_when_verbose() {
    let dir = TempDir::new().unwrap();
    let mut cmd = cargo_bin_cmd!("vault");
    cmd.env_remove("VAULT_NAMESPACE")
        .arg("-vv")
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .args(["config", "path"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Config file not found, using defaults"));
}

#[test]
fn json_log_format_applies_after_config_load() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        format!(
            "[general]\naudit_log = false\nlog_format = \"json\"\n\n[backend]\nkind = \"file\"\npath = {:?}\n",
            dir.path().join("entries").display().to_string()
        ),
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("vault");
    cmd.env_remove("VAULT_NAMESPACE")
        .arg("-vv")
        .arg("--config")
        .arg(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stderr(predicate::str::contains(r#""level":"DEBUG""#))
        .stderr(predicate::str::contains("Using file backend"));
}
