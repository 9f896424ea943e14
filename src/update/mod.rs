//! Updating managed executables.
//!
//! [`UpdateEngine::update_one`] brings one registry entry to the latest
//! release:
//!
//! 1. A recorded file that no longer exists (a dangling symlink counts)
//!    switches to the reinstall flow, offering the recorded or the latest
//!    version.
//! 2. Otherwise a symlinked path is resolved to the physical file to write
//!    before anything is touched.
//! 3. Equal recorded and latest tags mean up to date; anything else is
//!    confirmed.
//! 4. The current binary is optionally backed up to `<file>.backup`.
//! 5. The new binary is staged next to the destination and renamed over it.
//! 6. The registry entry is updated and saved. If that fails, the previous
//!    binary is put back so the file matches the entry again.
//!
//! [`UpdateEngine::update_all`] runs that flow over every managed name in
//! order. A failing item is recorded and the batch moves on.

pub mod backup;

use crate::config::Config;
use crate::core::{ExecmanError, Result};
use crate::installer::stage_release_binary;
use crate::prompt::{Prompt, Prompter, confirm, parse_yes_no};
use crate::registry::{ExecutableRecord, Registry};
use crate::release::{ReleaseDescriptor, ReleaseHost, resolve_release};
use crate::source::SourceRef;
use crate::symlink::{self, SymlinkDecision};
use crate::utils::fs::{TempDir, atomic_replace};
use crate::utils::platform::Platform;
use crate::verification::ChecksumVerifier;
use backup::{BackupManager, Rollback};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// How to update.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    /// Skip every confirmation. Symlinked paths then fail instead of prompting.
    pub assume_yes: bool,
    /// OR-ed with the configured default
    pub include_prereleases: bool,
    /// `Some` forces the backup choice; `None` asks, or skips the backup
    /// under `assume_yes`.
    pub backup: Option<bool>,
}

/// Result of updating one executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated {
        name: String,
        from: String,
        to: String,
        record: ExecutableRecord,
    },
    UpToDate {
        name: String,
        version: String,
    },
    Cancelled {
        name: String,
    },
}

/// Tally of an [`UpdateEngine::update_all`] run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub updated: Vec<String>,
    pub up_to_date: Vec<String>,
    pub cancelled: Vec<String>,
    pub failed: Vec<(String, ExecmanError)>,
}

impl BatchReport {
    fn record(&mut self, outcome: UpdateOutcome) {
        match outcome {
            UpdateOutcome::Updated {
                name,
                ..
            } => self.updated.push(name),
            UpdateOutcome::UpToDate {
                name,
                ..
            } => self.up_to_date.push(name),
            UpdateOutcome::Cancelled {
                name,
            } => self.cancelled.push(name),
        }
    }

    /// Items processed, whatever their result.
    #[must_use]
    pub fn total(&self) -> usize {
        self.updated.len() + self.up_to_date.len() + self.cancelled.len() + self.failed.len()
    }

    /// e.g. `2 updated, 0 already up to date, 1 failed`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} updated, {} already up to date, {} failed",
            self.updated.len(),
            self.up_to_date.len(),
            self.failed.len()
        );
        if !self.cancelled.is_empty() {
            summary.push_str(&format!(", {} cancelled", self.cancelled.len()));
        }
        summary
    }
}

/// Where the new binary goes.
struct Destination {
    /// Physical file to replace
    effective: PathBuf,
    /// Whether a file is there to back up
    exists: bool,
}

/// Updates executables already in the registry.
pub struct UpdateEngine<'a, H, P> {
    host: &'a H,
    prompter: &'a mut P,
    config: &'a Config,
    platform: Platform,
}

impl<'a, H, P> UpdateEngine<'a, H, P>
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

    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Updates `name` to its latest release.
    ///
    /// # Errors
    ///
    /// [`ExecmanError::NotManaged`] for an unknown name,
    /// [`ExecmanError::SymlinkAmbiguity`] for a symlinked path under
    /// `assume_yes`, and whatever the download and replacement steps raise.
    /// The registry entry only changes once the new binary is in place.
    pub async fn update_one(
        &mut self,
        registry: &mut Registry,
        name: &str,
        options: &UpdateOptions,
    ) -> Result<UpdateOutcome> {
        let record = registry.get(name).cloned().ok_or_else(|| ExecmanError::NotManaged {
            name: name.to_string(),
        })?;
        let source = SourceRef::parse(&record.source)?;
        let include_prereleases = options.include_prereleases || self.config.include_prereleases;
        let cancelled = || -> Result<UpdateOutcome> {
            Ok(UpdateOutcome::Cancelled {
                name: name.to_string(),
            })
        };

        // Path::exists follows links, so a dangling link reads as missing.
        let missing = !record.path.exists();

        let destination = if missing {
            Destination {
                effective: record.path.clone(),
                exists: false,
            }
        } else {
            let info = symlink::inspect(&record.path)?;
            let decision = symlink::decide(&info, !options.assume_yes, &mut *self.prompter).await?;
            if decision == SymlinkDecision::Cancel {
                info!("Update of {name} cancelled at symlink prompt");
                return cancelled();
            }
            Destination {
                effective: symlink::effective_path(&info, decision),
                exists: true,
            }
        };

        let latest = resolve_release(self.host, &source, include_prereleases).await?;

        let release = if missing {
            warn!("{name} is missing from {}", record.path.display());
            match self.choose_reinstall(name, &record, &source, latest, options).await? {
                Some(release) => release,
                None => return cancelled(),
            }
        } else {
            if record.version == latest.tag {
                debug!("{name} is already at {}", record.version);
                return Ok(UpdateOutcome::UpToDate {
                    name: name.to_string(),
                    version: record.version,
                });
            }
            if !options.assume_yes {
                let prompt = Prompt::ConfirmUpdate {
                    name: name.to_string(),
                    current: record.version.clone(),
                    latest: latest.tag.clone(),
                };
                if !confirm(&mut *self.prompter, &prompt).await? {
                    info!("Update of {name} declined");
                    return cancelled();
                }
            }
            latest
        };

        let backup = if destination.exists {
            match (options.backup, options.assume_yes) {
                (Some(choice), _) => choice,
                (None, true) => false,
                (None, false) => {
                    let prompt = Prompt::ConfirmBackup {
                        path: destination.effective.clone(),
                    };
                    confirm(&mut *self.prompter, &prompt).await?
                }
            }
        } else {
            false
        };

        let staging = TempDir::new("update")?;
        let updated = match self
            .replace(registry, name, &record, &release, &destination.effective, backup, staging.path())
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                let kept = staging.keep();
                warn!("Update of {name} failed; staging directory kept at {}", kept.display());
                return Err(e);
            }
        };

        info!("Updated {name} from {} to {}", record.version, updated.version);
        Ok(UpdateOutcome::Updated {
            name: name.to_string(),
            from: record.version,
            to: updated.version.clone(),
            record: updated,
        })
    }

    /// Every managed executable, in name order, one after another.
    pub async fn update_all(&mut self, registry: &mut Registry, options: &UpdateOptions) -> BatchReport {
        let mut names = registry.list();
        names.sort();

        let mut report = BatchReport::default();
        for name in names {
            info!("Updating {name}");
            match self.update_one(registry, &name, options).await {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    warn!("Failed to update {name}: {e}");
                    report.failed.push((name, e));
                }
            }
        }
        report
    }

    /// Picks the release to reinstall a missing executable from, or `None`
    /// to cancel.
    async fn choose_reinstall(
        &mut self,
        name: &str,
        record: &ExecutableRecord,
        source: &SourceRef,
        latest: ReleaseDescriptor,
        options: &UpdateOptions,
    ) -> Result<Option<ReleaseDescriptor>> {
        if options.assume_yes {
            return Ok(Some(latest));
        }

        let prompt = Prompt::ReinstallMissing {
            name: name.to_string(),
            path: record.path.clone(),
            recorded: record.version.clone(),
            latest: latest.tag.clone(),
        };
        let answer = self.prompter.ask(&prompt).await?;

        if record.version == latest.tag {
            return Ok(parse_yes_no(&answer, false).then_some(latest));
        }

        match answer.trim().to_lowercase().as_str() {
            "l" | "latest" => Ok(Some(latest)),
            "r" | "recorded" => {
                let pinned = source.with_version(record.version.clone());
                resolve_release(self.host, &pinned, false).await.map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Stages the new binary, swaps it in and saves the updated record,
    /// which is returned.
    #[allow(clippy::too_many_arguments)]
    async fn replace(
        &self,
        registry: &mut Registry,
        name: &str,
        record: &ExecutableRecord,
        release: &ReleaseDescriptor,
        effective: &Path,
        backup: bool,
        staging: &Path,
    ) -> Result<ExecutableRecord> {
        let binary = stage_release_binary(self.host, release, name, &self.platform, staging).await?;

        if backup {
            BackupManager::new(effective.to_path_buf()).create_backup().await?;
        }

        let rollback = Rollback::capture(effective).await?;
        match self.swap_in(registry, name, record, release, &binary, effective).await {
            Ok(updated) => {
                rollback.discard().await;
                Ok(updated)
            }
            Err(e) => {
                error!("Replacing {} failed: {e}", effective.display());
                rollback.restore().await;
                Err(e)
            }
        }
    }

    async fn swap_in(
        &self,
        registry: &mut Registry,
        name: &str,
        record: &ExecutableRecord,
        release: &ReleaseDescriptor,
        binary: &Path,
        effective: &Path,
    ) -> Result<ExecutableRecord> {
        atomic_replace(binary, effective)?;
        let checksum = ChecksumVerifier::compute_sha256(effective).await?;

        let updated = ExecutableRecord {
            version: release.tag.clone(),
            checksum,
            installed_at: Utc::now(),
            ..record.clone()
        };
        registry.commit(name, updated.clone())?;
        Ok(updated)
    }
}
