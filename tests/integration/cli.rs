//! The `execman` binary end to end, without network access.

use assert_cmd::Command;
use chrono::Utc;
use execman::registry::{ExecutableRecord, Registry};
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn execman(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("execman").unwrap();
    cmd.env("EXECMAN_REGISTRY", dir.join("registry.json"))
        .env("EXECMAN_CONFIG", dir.join("config.json"))
        // Unroutable, so nothing can reach the real API
        .env("EXECMAN_API_URL", "http://127.0.0.1:9")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

/// A registry with one entry named `tool` whose file exists.
fn prepared(dir: &Path) -> PathBuf {
    let path = dir.join("bin").join("tool");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "binary").unwrap();

    let mut registry = Registry::new(dir.join("registry.json"));
    registry.add(
        "tool",
        ExecutableRecord {
            source: "https://github.com/acme/tool".to_string(),
            version: "v1.2.3".to_string(),
            installed_at: Utc::now(),
            path: path.clone(),
            platform: "linux/amd64".to_string(),
            checksum: "ab".repeat(32),
        },
    );
    registry.save().unwrap();
    path
}

#[test]
fn test_list_empty_registry() {
    let temp = TempDir::new().unwrap();
    execman(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No managed executables."));
}

#[test]
fn test_list_json() {
    let temp = TempDir::new().unwrap();
    prepared(temp.path());

    let output = execman(temp.path()).args(["list", "--json"]).assert().success();
    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    let items = json["executables"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "tool");
    assert_eq!(items[0]["version"], "v1.2.3");
    assert!(items[0].get("checksum").is_none());

    let output = execman(temp.path()).args(["ls", "--json", "--long"]).assert().success();
    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(json["executables"][0]["platform"], "linux/amd64");
}

#[test]
fn test_list_unknown_name_fails() {
    let temp = TempDir::new().unwrap();
    prepared(temp.path());
    execman(temp.path())
        .args(["list", "ghost"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn test_forget_keeps_file() {
    let temp = TempDir::new().unwrap();
    let path = prepared(temp.path());

    execman(temp.path())
        .args(["forget", "tool", "-y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no longer managed"));
    assert!(path.exists());
    assert!(Registry::load_from(&temp.path().join("registry.json")).unwrap().is_empty());
}

#[test]
fn test_remove_deletes_file() {
    let temp = TempDir::new().unwrap();
    let path = prepared(temp.path());

    execman(temp.path())
        .args(["remove", "tool", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed"));
    assert!(!path.exists());
    assert!(Registry::load_from(&temp.path().join("registry.json")).unwrap().is_empty());
}

#[test]
fn test_remove_declined_on_empty_stdin() {
    let temp = TempDir::new().unwrap();
    let path = prepared(temp.path());

    execman(temp.path())
        .args(["remove", "tool"])
        .write_stdin("\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removal cancelled."));
    assert!(path.exists());
}

#[test]
fn test_update_requires_name_or_all() {
    let temp = TempDir::new().unwrap();
    execman(temp.path()).arg("update").assert().failure();
}

#[test]
fn test_update_all_empty_registry() {
    let temp = TempDir::new().unwrap();
    execman(temp.path())
        .args(["update", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No managed executables to update."));
}

#[test]
fn test_check_empty_registry() {
    let temp = TempDir::new().unwrap();
    execman(temp.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("No managed executables."));
}

#[test]
fn test_install_malformed_source() {
    let temp = TempDir::new().unwrap();
    execman(temp.path())
        .args(["install", "badsource", "-y"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error"));
    assert!(!temp.path().join("registry.json").exists());
}

#[test]
fn test_corrupt_registry_reported() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("registry.json"), "{ not json").unwrap();
    execman(temp.path())
        .arg("list")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Registry error"));
}
