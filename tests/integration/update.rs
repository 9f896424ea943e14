//! Update engine tests.

use crate::common::{Harness, OWNER};
use execman::core::ExecmanError;
use execman::prompt::Prompt;
use execman::test_utils::{ScriptedPrompter, platform_release, sha256_hex};
use execman::update::{UpdateEngine, UpdateOptions, UpdateOutcome};

fn yes() -> UpdateOptions {
    UpdateOptions {
        assume_yes: true,
        ..UpdateOptions::default()
    }
}

#[tokio::test]
async fn test_update_to_latest() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    let before = h.install("tool").await;
    h.publish("tool", "v2.0.0", "two");

    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
    let outcome = UpdateEngine::new(&h.host, &mut prompter, &h.config)
        .update_one(&mut registry, "tool", &yes())
        .await
        .unwrap();

    let UpdateOutcome::Updated {
        from,
        to,
        record,
        ..
    } = outcome
    else {
        panic!("Expected Updated, got {outcome:?}");
    };
    assert_eq!((from.as_str(), to.as_str()), ("v1.0.0", "v2.0.0"));
    assert_eq!(record.path, before.path);
    assert_eq!(record.source, before.source);
    assert!(record.installed_at >= before.installed_at);

    let installed = std::fs::read(&record.path).unwrap();
    assert_eq!(installed, b"two");
    assert_eq!(record.checksum, sha256_hex(&installed));
    assert_eq!(h.registry().get("tool"), Some(&record));
    assert!(prompter.asked().is_empty());
}

#[tokio::test]
async fn test_up_to_date_downloads_nothing() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    h.install("tool").await;
    let downloads = h.host.downloaded().len();

    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
    let outcome = UpdateEngine::new(&h.host, &mut prompter, &h.config)
        .update_one(&mut registry, "tool", &UpdateOptions::default())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        UpdateOutcome::UpToDate {
            name: "tool".to_string(),
            version: "v1.0.0".to_string()
        }
    );
    assert_eq!(h.host.downloaded().len(), downloads);
    assert!(prompter.asked().is_empty());
}

#[tokio::test]
async fn test_declined_update_changes_nothing() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    let before = h.install("tool").await;
    h.publish("tool", "v2.0.0", "two");

    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new([""]);
    let outcome = UpdateEngine::new(&h.host, &mut prompter, &h.config)
        .update_one(&mut registry, "tool", &UpdateOptions::default())
        .await
        .unwrap();

    assert!(matches!(outcome, UpdateOutcome::Cancelled { .. }));
    assert!(matches!(prompter.asked(), [Prompt::ConfirmUpdate { .. }]));
    assert_eq!(std::fs::read_to_string(&before.path).unwrap(), "one");
    assert_eq!(h.registry().get("tool"), Some(&before));
}

#[tokio::test]
async fn test_interactive_update_with_backup() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    let before = h.install("tool").await;
    h.publish("tool", "v2.0.0", "two");

    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new(["y", "y"]);
    UpdateEngine::new(&h.host, &mut prompter, &h.config)
        .update_one(&mut registry, "tool", &UpdateOptions::default())
        .await
        .unwrap();

    assert!(matches!(prompter.asked(), [Prompt::ConfirmUpdate { .. }, Prompt::ConfirmBackup { .. }]));
    let mut backup = before.path.clone().into_os_string();
    backup.push(".backup");
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), "one");
    assert_eq!(std::fs::read_to_string(&before.path).unwrap(), "two");
}

#[tokio::test]
async fn test_forced_backup_under_assume_yes() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    let before = h.install("tool").await;
    h.publish("tool", "v2.0.0", "two");

    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
    let options = UpdateOptions {
        backup: Some(true),
        ..yes()
    };
    UpdateEngine::new(&h.host, &mut prompter, &h.config)
        .update_one(&mut registry, "tool", &options)
        .await
        .unwrap();

    let mut backup = before.path.clone().into_os_string();
    backup.push(".backup");
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), "one");
}

#[tokio::test]
async fn test_assume_yes_skips_backup() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    let before = h.install("tool").await;
    h.publish("tool", "v2.0.0", "two");

    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
    UpdateEngine::new(&h.host, &mut prompter, &h.config)
        .update_one(&mut registry, "tool", &yes())
        .await
        .unwrap();

    let mut backup = before.path.clone().into_os_string();
    backup.push(".backup");
    assert!(!std::path::Path::new(&backup).exists());
}

#[tokio::test]
async fn test_missing_file_reinstalls_recorded_or_latest() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    let before = h.install("tool").await;
    h.publish("tool", "v2.0.0", "two");
    std::fs::remove_file(&before.path).unwrap();

    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new(["r"]);
    let outcome = UpdateEngine::new(&h.host, &mut prompter, &h.config)
        .update_one(&mut registry, "tool", &UpdateOptions::default())
        .await
        .unwrap();
    assert!(matches!(outcome, UpdateOutcome::Updated { ref to, .. } if to == "v1.0.0"));
    assert_eq!(std::fs::read_to_string(&before.path).unwrap(), "one");
    // No backup prompt for a missing file
    assert!(matches!(prompter.asked(), [Prompt::ReinstallMissing { .. }]));

    std::fs::remove_file(&before.path).unwrap();
    let mut prompter = ScriptedPrompter::new(["latest"]);
    UpdateEngine::new(&h.host, &mut prompter, &h.config)
        .update_one(&mut registry, "tool", &UpdateOptions::default())
        .await
        .unwrap();
    assert_eq!(std::fs::read_to_string(&before.path).unwrap(), "two");
    assert_eq!(h.registry().get("tool").unwrap().version, "v2.0.0");
}

#[tokio::test]
async fn test_missing_file_reinstall_cancelled() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    let before = h.install("tool").await;
    h.publish("tool", "v2.0.0", "two");
    std::fs::remove_file(&before.path).unwrap();

    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new(["nope"]);
    let outcome = UpdateEngine::new(&h.host, &mut prompter, &h.config)
        .update_one(&mut registry, "tool", &UpdateOptions::default())
        .await
        .unwrap();

    assert!(matches!(outcome, UpdateOutcome::Cancelled { .. }));
    assert!(!before.path.exists());
    assert_eq!(h.registry().get("tool"), Some(&before));
}

#[tokio::test]
async fn test_missing_file_same_version_uses_yes_no() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    let before = h.install("tool").await;
    std::fs::remove_file(&before.path).unwrap();

    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new([""]);
    let outcome = UpdateEngine::new(&h.host, &mut prompter, &h.config)
        .update_one(&mut registry, "tool", &UpdateOptions::default())
        .await
        .unwrap();
    assert!(matches!(outcome, UpdateOutcome::Cancelled { .. }));

    let mut prompter = ScriptedPrompter::new(["y"]);
    UpdateEngine::new(&h.host, &mut prompter, &h.config)
        .update_one(&mut registry, "tool", &UpdateOptions::default())
        .await
        .unwrap();
    assert_eq!(std::fs::read_to_string(&before.path).unwrap(), "one");
}

#[tokio::test]
async fn test_missing_file_assume_yes_installs_latest() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    let before = h.install("tool").await;
    h.publish("tool", "v2.0.0", "two");
    std::fs::remove_file(&before.path).unwrap();

    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
    UpdateEngine::new(&h.host, &mut prompter, &h.config)
        .update_one(&mut registry, "tool", &yes())
        .await
        .unwrap();
    assert_eq!(std::fs::read_to_string(&before.path).unwrap(), "two");
}

#[cfg(unix)]
mod symlinked {
    use super::*;
    use std::path::PathBuf;

    /// Installs `tool`, then moves the binary to `opt/tool` and leaves a
    /// symlink at the recorded path. Returns (link, target).
    async fn linked_install(h: &Harness) -> (PathBuf, PathBuf) {
        h.publish("tool", "v1.0.0", "one");
        let record = h.install("tool").await;
        h.publish("tool", "v2.0.0", "two");

        let target = h.dir.path().join("opt").join("tool");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::rename(&record.path, &target).unwrap();
        std::os::unix::fs::symlink(&target, &record.path).unwrap();
        (record.path, target)
    }

    #[tokio::test]
    async fn test_non_interactive_symlink_fails_before_any_change() {
        let h = Harness::new();
        let (link, target) = linked_install(&h).await;
        let downloads = h.host.downloaded().len();

        let mut registry = h.registry();
        let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
        let err = UpdateEngine::new(&h.host, &mut prompter, &h.config)
            .update_one(&mut registry, "tool", &yes())
            .await
            .unwrap_err();

        match err {
            ExecmanError::SymlinkAmbiguity {
                path,
                target: reported,
            } => {
                assert_eq!(path, link);
                assert_eq!(reported, target);
            }
            other => panic!("Expected SymlinkAmbiguity, got {other:?}"),
        }
        assert_eq!(h.host.downloaded().len(), downloads);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "one");
    }

    #[tokio::test]
    async fn test_replace_target_keeps_link() {
        let h = Harness::new();
        let (link, target) = linked_install(&h).await;

        let mut registry = h.registry();
        let mut prompter = ScriptedPrompter::new(["1", "y", "n"]);
        let outcome = UpdateEngine::new(&h.host, &mut prompter, &h.config)
            .update_one(&mut registry, "tool", &UpdateOptions::default())
            .await
            .unwrap();

        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "two");
        let UpdateOutcome::Updated {
            record,
            ..
        } = outcome
        else {
            panic!("Expected Updated");
        };
        assert_eq!(record.path, link);
    }

    #[tokio::test]
    async fn test_replace_symlink_itself() {
        let h = Harness::new();
        let (link, target) = linked_install(&h).await;

        let mut registry = h.registry();
        let mut prompter = ScriptedPrompter::new(["2", "y", "n"]);
        UpdateEngine::new(&h.host, &mut prompter, &h.config)
            .update_one(&mut registry, "tool", &UpdateOptions::default())
            .await
            .unwrap();

        assert!(!std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_to_string(&link).unwrap(), "two");
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "one");
    }

    #[tokio::test]
    async fn test_cancel_at_symlink_prompt() {
        let h = Harness::new();
        let (_, target) = linked_install(&h).await;

        let mut registry = h.registry();
        let mut prompter = ScriptedPrompter::new(["3"]);
        let outcome = UpdateEngine::new(&h.host, &mut prompter, &h.config)
            .update_one(&mut registry, "tool", &UpdateOptions::default())
            .await
            .unwrap();

        assert!(matches!(outcome, UpdateOutcome::Cancelled { .. }));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "one");
    }
}

#[tokio::test]
async fn test_failed_registry_save_restores_previous_binary() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    let before = h.install("tool").await;
    h.publish("tool", "v2.0.0", "two");

    let mut registry = h.registry();
    h.break_registry();

    let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
    let err = UpdateEngine::new(&h.host, &mut prompter, &h.config)
        .update_one(&mut registry, "tool", &yes())
        .await
        .unwrap_err();

    assert!(matches!(err, ExecmanError::RegistryIo { .. }), "got {err:?}");
    assert_eq!(registry.get("tool"), Some(&before));
    let installed = std::fs::read(&before.path).unwrap();
    assert_eq!(installed, b"one");
    assert_eq!(sha256_hex(&installed), before.checksum);

    let mut rollback = before.path.clone().into_os_string();
    rollback.push(".execman-old");
    assert!(!std::path::Path::new(&rollback).exists());
}

#[tokio::test]
async fn test_failed_registry_save_after_reinstall_removes_file() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    let before = h.install("tool").await;
    std::fs::remove_file(&before.path).unwrap();

    let mut registry = h.registry();
    h.break_registry();

    let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
    let err = UpdateEngine::new(&h.host, &mut prompter, &h.config)
        .update_one(&mut registry, "tool", &yes())
        .await
        .unwrap_err();

    assert!(matches!(err, ExecmanError::RegistryIo { .. }), "got {err:?}");
    assert_eq!(registry.get("tool"), Some(&before));
    assert!(!before.path.exists());
}

#[tokio::test]
async fn test_checksum_mismatch_during_update_changes_nothing() {
    let h = Harness::new();
    h.publish("tool", "v1.0.0", "one");
    let before = h.install("tool").await;

    let mut assets = platform_release("tool", "v2.0.0", "evil", false);
    let bogus = format!("{}  {}\n", "f".repeat(64), assets[0].0);
    assets.push(("checksums.txt".to_string(), bogus.into_bytes()));
    h.host.publish(OWNER, "tool", "v2.0.0", assets);

    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
    let err = UpdateEngine::new(&h.host, &mut prompter, &h.config)
        .update_one(&mut registry, "tool", &yes())
        .await
        .unwrap_err();

    match err {
        ExecmanError::ChecksumMismatch {
            expected,
            artifact,
            ..
        } => {
            assert_eq!(expected, "f".repeat(64));
            assert!(artifact.exists());
            std::fs::remove_dir_all(artifact.parent().unwrap()).unwrap();
        }
        other => panic!("Expected ChecksumMismatch, got {other:?}"),
    }

    assert_eq!(std::fs::read_to_string(&before.path).unwrap(), "one");
    assert_eq!(registry.get("tool"), Some(&before));
    assert_eq!(h.registry().get("tool"), Some(&before));
}

#[tokio::test]
async fn test_unknown_name() {
    let h = Harness::new();
    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
    let err = UpdateEngine::new(&h.host, &mut prompter, &h.config)
        .update_one(&mut registry, "ghost", &yes())
        .await
        .unwrap_err();
    assert!(matches!(err, ExecmanError::NotManaged { .. }));
}

#[tokio::test]
async fn test_update_all_isolates_failures() {
    let h = Harness::new();
    for name in ["a", "b", "c"] {
        h.publish(name, "v1.0.0", &format!("{name}-one"));
        h.install(name).await;
        h.publish(name, "v2.0.0", &format!("{name}-two"));
    }
    h.host.fail_downloads_from("acme", "b");

    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
    let report = UpdateEngine::new(&h.host, &mut prompter, &h.config).update_all(&mut registry, &yes()).await;

    assert_eq!(report.updated, vec!["a", "c"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "b");
    assert!(matches!(report.failed[0].1, ExecmanError::Network { .. }));
    assert_eq!(report.summary(), "2 updated, 0 already up to date, 1 failed");

    let saved = h.registry();
    assert_eq!(saved.get("a").unwrap().version, "v2.0.0");
    assert_eq!(saved.get("b").unwrap().version, "v1.0.0");
    assert_eq!(saved.get("c").unwrap().version, "v2.0.0");
    assert_eq!(std::fs::read_to_string(&saved.get("b").unwrap().path).unwrap(), "b-one");
}

#[tokio::test]
async fn test_update_all_mixed_outcomes() {
    let h = Harness::new();
    for name in ["a", "b"] {
        h.publish(name, "v1.0.0", "one");
        h.install(name).await;
    }
    h.publish("b", "v2.0.0", "two");

    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
    let report = UpdateEngine::new(&h.host, &mut prompter, &h.config).update_all(&mut registry, &yes()).await;

    assert_eq!(report.up_to_date, vec!["a"]);
    assert_eq!(report.updated, vec!["b"]);
    assert_eq!(report.summary(), "1 updated, 1 already up to date, 0 failed");
}
