//! check, remove and forget over installed executables.

use crate::common::{Harness, OWNER};
use execman::check::{CheckOptions, IntegrityStatus, check};
use execman::remove::{RemoveOutcome, forget, remove};
use execman::test_utils::ScriptedPrompter;

#[tokio::test]
async fn test_check_after_install_and_release() {
    let h = Harness::new();
    h.publish("fresh", "v1.0.0", "fresh");
    h.publish("stale", "v1.0.0", "stale");
    h.install("fresh").await;
    h.install("stale").await;
    h.publish("stale", "v1.1.0", "stale-new");

    let report = check(&h.registry(), &h.host, &CheckOptions::default()).await.unwrap();
    assert_eq!(report.up_to_date, 1);
    assert_eq!(report.updates_available, 1);

    let stale = report.executables.iter().find(|e| e.name == "stale").unwrap();
    assert_eq!(stale.current_version, "v1.0.0");
    assert_eq!(stale.latest_version.as_deref(), Some("v1.1.0"));
}

#[tokio::test]
async fn test_check_verify_detects_tampering() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    let record = h.install("tool").await;
    std::fs::write(&record.path, "patched").unwrap();

    let options = CheckOptions {
        verify: true,
        ..CheckOptions::default()
    };
    let report = check(&h.registry(), &h.host, &options).await.unwrap();
    assert_eq!(report.executables[0].status, IntegrityStatus::Modified);
    assert_eq!(report.modified, 1);
    assert!(report.executables[0].latest_version.is_none());
}

#[tokio::test]
async fn test_check_single_name_and_missing_file() {
    let h = Harness::new();
    h.publish("a", "v1.0.0", "a");
    h.publish("b", "v1.0.0", "b");
    let a = h.install("a").await;
    h.install("b").await;
    std::fs::remove_file(&a.path).unwrap();
    let lookups = h.host.lookups();

    let options = CheckOptions {
        name: Some("a".to_string()),
        ..CheckOptions::default()
    };
    let report = check(&h.registry(), &h.host, &options).await.unwrap();
    assert_eq!(report.executables.len(), 1);
    assert_eq!(report.executables[0].status, IntegrityStatus::Missing);
    // Missing entries are not looked up
    assert_eq!(h.host.lookups(), lookups);
}

#[tokio::test]
async fn test_check_does_not_modify_registry() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    h.install("tool").await;
    let before = std::fs::read_to_string(h.registry_path()).unwrap();

    h.host.fail_lookups(OWNER, "tool");
    let report = check(&h.registry(), &h.host, &CheckOptions::default()).await.unwrap();
    assert_eq!(report.errors, 1);
    assert!(report.executables[0].error.is_some());
    assert_eq!(std::fs::read_to_string(h.registry_path()).unwrap(), before);
}

#[tokio::test]
async fn test_remove_installed_executable() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    let record = h.install("tool").await;

    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new(["y"]);
    let outcome = remove(&mut registry, "tool", false, &mut prompter).await.unwrap();

    assert!(matches!(outcome, RemoveOutcome::Removed { .. }));
    assert!(!record.path.exists());
    assert!(h.registry().is_empty());
}

#[tokio::test]
async fn test_forget_installed_executable() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    let record = h.install("tool").await;

    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
    let outcome = forget(&mut registry, "tool", true, &mut prompter).await.unwrap();

    assert!(matches!(outcome, RemoveOutcome::Forgotten { .. }));
    assert_eq!(std::fs::read_to_string(&record.path).unwrap(), "one");
    assert!(h.registry().is_empty());
    assert!(prompter.asked().is_empty());
}

#[tokio::test]
async fn test_reinstall_after_forget() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    h.install("tool").await;

    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
    forget(&mut registry, "tool", true, &mut prompter).await.unwrap();

    let record = h.install("tool").await;
    assert_eq!(h.registry().get("tool"), Some(&record));
}
