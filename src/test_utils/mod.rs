//! Test utilities for execman
//!
//! Headless stand-ins for the engine's collaborators, available to unit tests
//! and (through the `test-utils` feature) to the integration suite:
//!
//! - [`FakeReleaseHost`] - in-memory releases with injectable failures
//! - [`ScriptedPrompter`] - replays canned answers and records every prompt
//! - [`tar_gz_with`] / [`zip_with`] - build release archives in memory
//! - [`platform_release`] - the assets a well-behaved project would publish
//!
//! # Example
//!
//! ```rust,no_run
//! use execman::test_utils::{FakeReleaseHost, ScriptedPrompter, platform_release};
//!
//! let host = FakeReleaseHost::new();
//! host.publish("acme", "tool", "v1.0.0", platform_release("tool", "v1.0.0", "#!/bin/sh\n", true));
//! let prompter = ScriptedPrompter::new(["y"]);
//! ```

use crate::core::{ExecmanError, Result};
use crate::prompt::{Prompt, Prompter};
use crate::release::{Asset, ReleaseDescriptor, ReleaseHost};
use crate::utils::platform::Platform;
use crate::utils::progress::ProgressBar;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, Once};
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests, once per process.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, logging
/// stays off.
///
/// ```bash
/// RUST_LOG=execman=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// A gzip-compressed tarball holding `(path, content)` entries, mode 0755.
#[must_use]
pub fn tar_gz_with(entries: &[(&str, &str)]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (path, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o755);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder.append_data(&mut header, path, content.as_bytes()).expect("append tar entry");
    }

    builder.into_inner().and_then(|gz| gz.finish()).expect("finish tarball")
}

/// A zip archive holding `(path, content)` entries.
#[must_use]
pub fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);

    for (path, content) in entries {
        writer.start_file(*path, options).expect("start zip entry");
        writer.write_all(content.as_bytes()).expect("write zip entry");
    }

    writer.finish().expect("finish zip").into_inner()
}

/// Assets for `name` at `tag` on the current platform: an archive named
/// after the first selection template holding the binary, and optionally a
/// `checksums.txt` manifest covering it.
#[must_use]
pub fn platform_release(
    name: &str,
    tag: &str,
    binary_content: &str,
    with_checksums: bool,
) -> Vec<(String, Vec<u8>)> {
    let platform = Platform::current();
    let asset_name =
        format!("{name}_{tag}_{}_{}.{}", platform.os, platform.arch, platform.archive_extension());
    let binary_name = platform.executable_name(name);

    let archive = if platform.is_windows() {
        zip_with(&[(binary_name.as_str(), binary_content), ("README.md", "docs")])
    } else {
        tar_gz_with(&[(binary_name.as_str(), binary_content), ("README.md", "docs")])
    };

    let mut assets = Vec::new();
    if with_checksums {
        let manifest = format!("{}  {asset_name}\n", sha256_hex(&archive));
        assets.push(("checksums.txt".to_string(), manifest.into_bytes()));
    }
    assets.insert(0, (asset_name, archive));
    assets
}

#[derive(Default)]
struct FakeState {
    /// `owner/repo` -> releases, newest first
    releases: HashMap<String, Vec<ReleaseDescriptor>>,
    /// download URL -> content
    blobs: HashMap<String, Vec<u8>>,
    failing_lookups: HashSet<String>,
    /// Asset names whose download fails
    failing_downloads: HashSet<String>,
    /// Repositories all of whose downloads fail
    failing_repos: HashSet<String>,
    downloaded: Vec<String>,
    lookups: usize,
}

/// An in-memory [`ReleaseHost`].
#[derive(Default)]
pub struct FakeReleaseHost {
    state: Mutex<FakeState>,
}

impl FakeReleaseHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Publishes a release, making it the newest for `owner/repo`.
    pub fn publish(
        &self,
        owner: &str,
        repo: &str,
        tag: &str,
        assets: Vec<(String, Vec<u8>)>,
    ) -> ReleaseDescriptor {
        self.publish_release(owner, repo, tag, false, assets)
    }

    /// Publishes a prerelease.
    pub fn publish_prerelease(
        &self,
        owner: &str,
        repo: &str,
        tag: &str,
        assets: Vec<(String, Vec<u8>)>,
    ) -> ReleaseDescriptor {
        self.publish_release(owner, repo, tag, true, assets)
    }

    fn publish_release(
        &self,
        owner: &str,
        repo: &str,
        tag: &str,
        is_prerelease: bool,
        assets: Vec<(String, Vec<u8>)>,
    ) -> ReleaseDescriptor {
        let mut state = self.state();
        let mut descriptors = Vec::new();
        for (name, content) in assets {
            let url = format!("fake://{owner}/{repo}/{tag}/{name}");
            descriptors.push(Asset {
                name,
                download_url: url.clone(),
                size: content.len() as u64,
            });
            state.blobs.insert(url, content);
        }

        let release = ReleaseDescriptor {
            tag: tag.to_string(),
            is_prerelease,
            assets: descriptors,
        };
        state.releases.entry(format!("{owner}/{repo}")).or_default().insert(0, release.clone());
        release
    }

    /// Makes every downloaded asset named `asset_name` fail with a network error.
    pub fn fail_download(&self, asset_name: &str) {
        self.state().failing_downloads.insert(asset_name.to_string());
    }

    /// Makes every download from `owner/repo` fail with a network error.
    pub fn fail_downloads_from(&self, owner: &str, repo: &str) {
        self.state().failing_repos.insert(format!("{owner}/{repo}"));
    }

    /// Makes release lookups for `owner/repo` fail with a network error.
    pub fn fail_lookups(&self, owner: &str, repo: &str) {
        self.state().failing_lookups.insert(format!("{owner}/{repo}"));
    }

    /// Names of the assets downloaded so far, in order.
    #[must_use]
    pub fn downloaded(&self) -> Vec<String> {
        self.state().downloaded.clone()
    }

    /// Number of release lookups served.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.state().lookups
    }

    fn lookup(
        &self,
        owner: &str,
        repo: &str,
        pick: impl Fn(&ReleaseDescriptor) -> bool,
        version: Option<&str>,
    ) -> Result<ReleaseDescriptor> {
        let repository = format!("{owner}/{repo}");
        let mut state = self.state();
        state.lookups += 1;

        if state.failing_lookups.contains(&repository) {
            return Err(ExecmanError::network(
                format!("fetch release metadata for {repository}"),
                "injected failure",
            ));
        }

        state
            .releases
            .get(&repository)
            .and_then(|releases| releases.iter().find(|r| pick(r)).cloned())
            .ok_or(ExecmanError::ReleaseNotFound {
                repository,
                version: version.map(str::to_string),
            })
    }

    fn serve(&self, asset: &Asset, dest: &Path, progress: &ProgressBar) -> Result<u64> {
        let mut state = self.state();
        let repository = asset
            .download_url
            .strip_prefix("fake://")
            .and_then(|rest| {
                let mut parts = rest.splitn(3, '/');
                Some(format!("{}/{}", parts.next()?, parts.next()?))
            })
            .unwrap_or_default();

        if state.failing_downloads.contains(&asset.name) || state.failing_repos.contains(&repository)
        {
            return Err(ExecmanError::network(format!("download {}", asset.name), "injected failure"));
        }

        let content = state.blobs.get(&asset.download_url).cloned().ok_or_else(|| {
            ExecmanError::network(format!("download {}", asset.name), "HTTP 404 Not Found")
        })?;

        std::fs::write(dest, &content).map_err(|e| ExecmanError::io("write", dest, e))?;
        progress.inc(content.len() as u64);
        state.downloaded.push(asset.name.clone());
        Ok(content.len() as u64)
    }
}

impl ReleaseHost for FakeReleaseHost {
    async fn latest_release(
        &self,
        owner: &str,
        repo: &str,
        include_prereleases: bool,
    ) -> Result<ReleaseDescriptor> {
        self.lookup(owner, repo, |r| include_prereleases || !r.is_prerelease, None)
    }

    async fn release_by_tag(&self, owner: &str, repo: &str, tag: &str) -> Result<ReleaseDescriptor> {
        self.lookup(owner, repo, |r| r.tag == tag, Some(tag))
    }

    async fn download_asset(&self, asset: &Asset, dest: &Path, progress: &ProgressBar) -> Result<u64> {
        self.serve(asset, dest, progress)
    }
}

/// A [`Prompter`] that replays canned answers.
///
/// Once the script runs out, every further prompt is answered with an empty
/// line, i.e. the prompt's default.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<Prompt>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// Every prompt presented so far.
    #[must_use]
    pub fn asked(&self) -> &[Prompt] {
        &self.asked
    }

    /// Answers not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    async fn ask(&mut self, prompt: &Prompt) -> Result<String> {
        self.asked.push(prompt.clone());
        Ok(self.answers.pop_front().unwrap_or_default())
    }
}
