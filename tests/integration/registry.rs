//! Registry persistence as seen by the engines.

use crate::common::Harness;
use execman::registry::Registry;
use serial_test::serial;

#[tokio::test]
async fn test_install_writes_readable_document() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    let record = h.install("tool").await;

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(h.registry_path()).unwrap()).unwrap();
    assert_eq!(raw["schema_version"], 1);
    let entry = &raw["executables"]["tool"];
    assert_eq!(entry["source"], "https://github.com/acme/tool");
    assert_eq!(entry["version"], "v1.0.0");
    assert_eq!(entry["checksum"], record.checksum.as_str());
    assert_eq!(entry["path"], record.path.to_string_lossy().as_ref());
    assert!(entry["installed_at"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn test_save_leaves_no_temp_files() {
    let h = Harness::new();
    h.publish("a", "v1.0.0", "a");
    h.publish("b", "v1.0.0", "b");
    h.install("a").await;
    h.install("b").await;

    let leftovers: Vec<_> = std::fs::read_dir(h.dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "unexpected temp files: {leftovers:?}");
    assert_eq!(h.registry().list().len(), 2);
}

#[test]
fn test_older_schema_is_upgraded_on_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.json");
    std::fs::write(&path, r#"{"schema_version": 0, "executables": {}}"#).unwrap();

    let registry = Registry::load_from(&path).unwrap();
    registry.save().unwrap();

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["schema_version"], 1);
}

#[test]
#[serial]
fn test_registry_path_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.json");
    // SAFETY: serialized with every other test touching the environment
    unsafe { std::env::set_var("EXECMAN_REGISTRY", &path) };
    let resolved = Registry::default_path();
    let loaded = Registry::load(None);
    unsafe { std::env::remove_var("EXECMAN_REGISTRY") };

    assert_eq!(resolved.unwrap(), path);
    assert_eq!(loaded.unwrap().path(), path);
}
