//! Installation of a new executable from a release.
//!
//! [`InstallEngine::install`] walks a fixed pipeline:
//!
//! ```text
//! resolve source -> fetch release -> confirm duplicate -> confirm install
//!   -> select asset -> download -> verify checksum -> extract
//!   -> place file -> hash installed file -> commit registry
//! ```
//!
//! Every step runs only when the previous one succeeded. Everything up to
//! extraction happens inside a staging directory, so a failure there leaves
//! the install directory and the registry exactly as they were. A file
//! already at the target is set aside before placement and put back if the
//! registry cannot be saved. The staging
//! directory is removed after a successful install and kept (and logged)
//! after a failed one so the downloaded artifacts can be inspected.

use crate::archive::extract_binary;
use crate::config::Config;
use crate::core::Result;
use crate::download::Downloader;
use crate::prompt::{Prompt, Prompter, confirm};
use crate::registry::{ExecutableRecord, Registry};
use crate::release::{ReleaseDescriptor, ReleaseHost, resolve_release, select_asset};
use crate::source::SourceRef;
use crate::update::backup::Rollback;
use crate::utils::fs::{TempDir, atomic_replace, ensure_dir};
use crate::utils::platform::{Platform, absolutize, expand_tilde};
use crate::verification::ChecksumVerifier;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// What to install and how.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Source reference, e.g. `github.com/owner/repo@v1.2.3`
    pub source: String,
    /// Install directory; the configured default when `None`
    pub into: Option<PathBuf>,
    /// Skip every confirmation
    pub assume_yes: bool,
    /// OR-ed with the configured default
    pub include_prereleases: bool,
}

/// Result of an install request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed {
        name: String,
        record: ExecutableRecord,
    },
    /// The operator declined a confirmation. Nothing was changed.
    Cancelled,
}

/// Installs executables into the registry.
pub struct InstallEngine<'a, H, P> {
    host: &'a H,
    prompter: &'a mut P,
    config: &'a Config,
    platform: Platform,
}

impl<'a, H, P> InstallEngine<'a, H, P>
where
    H: ReleaseHost + Sync,
    P: Prompter + Send,
{
    pub fn new(host: &'a H, prompter: &'a mut P, config: &'a Config) -> Self {
        Self {
            host,
            prompter,
            config,
            platform: Platform::current(),
        }
    }

    /// Selects assets for `platform` instead of the running one.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Runs the install pipeline for `options.source`.
    ///
    /// # Errors
    ///
    /// Any [`ExecmanError`](crate::core::ExecmanError) raised along the pipeline. The registry is
    /// unchanged whenever an error is returned.
    pub async fn install(
        &mut self,
        registry: &mut Registry,
        options: &InstallOptions,
    ) -> Result<InstallOutcome> {
        let source = SourceRef::parse(&options.source)?;
        let include_prereleases = options.include_prereleases || self.config.include_prereleases;

        let release = resolve_release(self.host, &source, include_prereleases).await?;
        let name = source.repo.clone();
        let version = release.tag.clone();

        if let Some(existing) = registry.get(&name)
            && existing.version == version
            && !options.assume_yes
        {
            let prompt = Prompt::ConfirmReinstall {
                name: name.clone(),
                version: version.clone(),
                path: existing.path.clone(),
            };
            if !confirm(&mut *self.prompter, &prompt).await? {
                info!("Reinstall of {name} {version} declined");
                return Ok(InstallOutcome::Cancelled);
            }
        }

        let install_dir = match &options.into {
            Some(dir) => expand_tilde(dir)?,
            None => self.config.install_dir()?,
        };
        let target = absolutize(&install_dir.join(self.platform.executable_name(&name)))?;

        if !options.assume_yes {
            let prompt = Prompt::ConfirmInstall {
                repository: source.canonical_url(),
                version: version.clone(),
                platform: self.platform.to_string(),
                target: target.clone(),
            };
            if !confirm(&mut *self.prompter, &prompt).await? {
                info!("Installation of {name} declined");
                return Ok(InstallOutcome::Cancelled);
            }
        }

        let staging = TempDir::new("install")?;
        let record = match self.place(registry, &source, &release, staging.path(), &target).await {
            Ok(record) => record,
            Err(e) => {
                let kept = staging.keep();
                warn!("Install of {name} failed; staging directory kept at {}", kept.display());
                return Err(e);
            }
        };

        info!("Installed {name} {} at {}", record.version, record.path.display());
        Ok(InstallOutcome::Installed {
            name,
            record,
        })
    }

    /// Stages the binary, moves it to `target` and records it.
    ///
    /// Whatever `target` held before is put back if the registry save fails.
    async fn place(
        &self,
        registry: &mut Registry,
        source: &SourceRef,
        release: &ReleaseDescriptor,
        staging: &Path,
        target: &Path,
    ) -> Result<ExecutableRecord> {
        let binary = stage_release_binary(self.host, release, &source.repo, &self.platform, staging).await?;

        if let Some(parent) = target.parent() {
            ensure_dir(parent)?;
        }

        let rollback = Rollback::capture(target).await?;
        match self.swap_in(registry, source, release, &binary, target).await {
            Ok(record) => {
                rollback.discard().await;
                Ok(record)
            }
            Err(e) => {
                error!("Placing {} failed: {e}", target.display());
                rollback.restore().await;
                Err(e)
            }
        }
    }

    async fn swap_in(
        &self,
        registry: &mut Registry,
        source: &SourceRef,
        release: &ReleaseDescriptor,
        binary: &Path,
        target: &Path,
    ) -> Result<ExecutableRecord> {
        atomic_replace(binary, target)?;
        let checksum = ChecksumVerifier::compute_sha256(target).await?;

        let record = ExecutableRecord {
            source: source.canonical_url(),
            version: release.tag.clone(),
            installed_at: Utc::now(),
            path: target.to_path_buf(),
            platform: self.platform.to_string(),
            checksum,
        };
        registry.commit(&source.repo, record.clone())?;
        Ok(record)
    }
}

/// Downloads, verifies and extracts `name`'s binary from `release` into
/// `staging`, returning the extracted file.
///
/// Verification runs only when the release publishes a manifest listing the
/// selected asset.
pub(crate) async fn stage_release_binary<H: ReleaseHost + Sync>(
    host: &H,
    release: &ReleaseDescriptor,
    name: &str,
    platform: &Platform,
    staging: &Path,
) -> Result<PathBuf> {
    let asset = select_asset(&release.assets, name, &release.tag, platform)?;
    info!("Selected asset {} for {platform}", asset.name);

    let downloader = Downloader::new(host);
    let archive = staging.join(&asset.name);
    downloader.fetch(asset, &archive).await?;

    if let Some((manifest, manifest_name)) = downloader.fetch_manifest(release, asset, staging).await {
        match ChecksumVerifier::find_expected(&manifest, &asset.name).await {
            Ok(Some(expected)) => {
                ChecksumVerifier::verify(&archive, &asset.name, &expected).await?;
            }
            Ok(None) => warn!("{manifest_name} does not list {}; skipping verification", asset.name),
            Err(e) => warn!("Could not read checksum manifest {manifest_name}: {e}; skipping verification"),
        }
    }

    let extracted_dir = staging.join("extracted");
    ensure_dir(&extracted_dir)?;
    let binary_name = platform.executable_name(name);
    let binary = extract_binary(&archive, &binary_name, &extracted_dir.join(&binary_name)).await?;
    debug!("Staged {} at {}", binary_name, binary.display());
    Ok(binary)
}
