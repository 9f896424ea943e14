//! Integrity and update status of managed executables.
//!
//! Checking never mutates anything. Each entry is classified as
//! [`IntegrityStatus::Missing`] when its file is gone, as
//! [`IntegrityStatus::Modified`] when verification is requested and the
//! file's digest no longer matches the record, and as
//! [`IntegrityStatus::Ok`] otherwise. Only intact entries are compared with
//! the latest release; a failed lookup is recorded on the entry and the run
//! continues.

use crate::core::{ExecmanError, Result};
use crate::registry::Registry;
use crate::release::{ReleaseHost, resolve_release};
use crate::source::SourceRef;
use crate::verification::{ChecksumVerifier, digests_match};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// State of the file behind a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrityStatus {
    Ok,
    Missing,
    Modified,
}

/// Check result for one executable.
#[derive(Debug, Clone, Serialize)]
pub struct CheckEntry {
    pub name: String,
    pub current_version: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub status: IntegrityStatus,
    /// Latest release tag, when it was looked up successfully
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
    pub update_available: bool,
    /// Why the latest release couldn't be determined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// All entries of a check run plus tallies.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub executables: Vec<CheckEntry>,
    pub updates_available: usize,
    pub up_to_date: usize,
    pub missing: usize,
    pub modified: usize,
    /// Entries whose release lookup failed
    pub errors: usize,
}

impl CheckReport {
    fn push(&mut self, entry: CheckEntry) {
        match entry.status {
            IntegrityStatus::Missing => self.missing += 1,
            IntegrityStatus::Modified => self.modified += 1,
            IntegrityStatus::Ok if entry.error.is_some() => self.errors += 1,
            IntegrityStatus::Ok if entry.update_available => self.updates_available += 1,
            IntegrityStatus::Ok => self.up_to_date += 1,
        }
        self.executables.push(entry);
    }

    /// e.g. `1 missing, 2 up to date, 1 update available`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if self.missing > 0 {
            parts.push(format!("{} missing", self.missing));
        }
        if self.modified > 0 {
            parts.push(format!("{} modified", self.modified));
        }
        parts.push(format!("{} up to date", self.up_to_date));
        parts.push(match self.updates_available {
            1 => "1 update available".to_string(),
            n => format!("{n} updates available"),
        });
        if self.errors > 0 {
            parts.push(format!("{} could not be checked", self.errors));
        }
        parts.join(", ")
    }
}

/// What to check.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// A single executable; every managed one when `None`
    pub name: Option<String>,
    /// Hash each file and compare it with the recorded checksum
    pub verify: bool,
    pub include_prereleases: bool,
}

/// Checks the executables selected by `options`, in name order.
///
/// # Errors
///
/// [`ExecmanError::NotManaged`] when `options.name` is not in the registry.
/// Per-entry failures end up in [`CheckEntry::error`] instead.
pub async fn check<H: ReleaseHost + Sync>(
    registry: &Registry,
    host: &H,
    options: &CheckOptions,
) -> Result<CheckReport> {
    let names = match &options.name {
        Some(name) if !registry.contains(name) => {
            return Err(ExecmanError::NotManaged {
                name: name.clone(),
            });
        }
        Some(name) => vec![name.clone()],
        None => {
            let mut names = registry.list();
            names.sort();
            names
        }
    };

    let mut report = CheckReport::default();
    for name in names {
        let Some(record) = registry.get(&name) else {
            continue;
        };

        let mut entry = CheckEntry {
            name: name.clone(),
            current_version: record.version.clone(),
            path: record.path.clone(),
            status: IntegrityStatus::Ok,
            latest_version: None,
            update_available: false,
            error: None,
        };

        if !record.path.exists() {
            entry.status = IntegrityStatus::Missing;
        } else if options.verify {
            match ChecksumVerifier::compute_sha256(&record.path).await {
                Ok(actual) if !digests_match(&record.checksum, &actual) => {
                    entry.status = IntegrityStatus::Modified;
                }
                Ok(_) => debug!("{name} matches its recorded checksum"),
                Err(e) => warn!("Could not hash {}: {e}", record.path.display()),
            }
        }

        if entry.status == IntegrityStatus::Ok {
            let latest = match SourceRef::parse(&record.source) {
                Ok(source) => resolve_release(host, &source, options.include_prereleases).await,
                Err(e) => Err(e),
            };
            match latest {
                Ok(release) => {
                    entry.update_available = release.tag != record.version;
                    entry.latest_version = Some(release.tag);
                }
                Err(e) => {
                    warn!("Could not check {name} for updates: {e}");
                    entry.error = Some(e.to_string());
                }
            }
        }

        report.push(entry);
    }

    Ok(report)
}
