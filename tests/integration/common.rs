//! Shared harness for the integration tests.

use execman::config::Config;
use execman::installer::{InstallEngine, InstallOptions, InstallOutcome};
use execman::registry::{ExecutableRecord, Registry};
use execman::test_utils::{FakeReleaseHost, ScriptedPrompter, init_test_logging, platform_release};
use std::path::PathBuf;
use tempfile::TempDir;

pub const OWNER: &str = "acme";

/// A temp directory holding an install dir and a registry file, plus a fake
/// release host.
pub struct Harness {
    pub dir: TempDir,
    pub host: FakeReleaseHost,
    pub config: Config,
}

impl Harness {
    pub fn new() -> Self {
        init_test_logging(None);
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            default_install_dir: Some(dir.path().join("bin")),
            ..Config::default()
        };
        Self {
            dir,
            host: FakeReleaseHost::new(),
            config,
        }
    }

    pub fn install_dir(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    pub fn registry_path(&self) -> PathBuf {
        self.dir.path().join("registry.json")
    }

    pub fn registry(&self) -> Registry {
        Registry::load_from(&self.registry_path()).unwrap()
    }

    /// Replaces the registry file with a non-empty directory, so every later
    /// save fails. Load the registry before calling this.
    pub fn break_registry(&self) {
        let path = self.registry_path();
        if path.exists() {
            std::fs::remove_file(&path).unwrap();
        }
        std::fs::create_dir_all(path.join("blocker")).unwrap();
    }

    /// Publishes `tag` of `acme/<repo>` with a checksums manifest; the binary
    /// contains `content`.
    pub fn publish(&self, repo: &str, tag: &str, content: &str) {
        self.host.publish(OWNER, repo, tag, platform_release(repo, tag, content, true));
    }

    /// Installs `acme/<repo>` non-interactively and returns the record.
    pub async fn install(&self, repo: &str) -> ExecutableRecord {
        let mut registry = self.registry();
        let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
        let options = InstallOptions {
            source: format!("github.com/{OWNER}/{repo}"),
            assume_yes: true,
            ..InstallOptions::default()
        };
        match InstallEngine::new(&self.host, &mut prompter, &self.config)
            .install(&mut registry, &options)
            .await
            .unwrap()
        {
            InstallOutcome::Installed {
                record,
                ..
            } => record,
            InstallOutcome::Cancelled => panic!("assume_yes install was cancelled"),
        }
    }
}
