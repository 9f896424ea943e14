//! Release metadata and the release host seam.
//!
//! Engines never talk to the network directly: they go through a
//! [`ReleaseHost`], implemented for GitHub by [`GithubClient`] and by an
//! in-memory fake in `test_utils` for headless tests.
//!
//! - [`ReleaseDescriptor`] / [`Asset`] - what a release publishes
//! - [`assets::select_asset`] - pick the asset built for a platform
//! - [`resolve_release`] - tag lookup or latest, with a spinner

pub mod assets;
pub mod github;

pub use assets::select_asset;
pub use github::GithubClient;

use crate::core::Result;
use crate::source::SourceRef;
use crate::utils::progress::ProgressBar;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub download_url: String,
    /// Size in bytes as reported by the host
    pub size: u64,
}

/// A published release: its tag and assets, in host order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    pub tag: String,
    pub is_prerelease: bool,
    pub assets: Vec<Asset>,
}

impl ReleaseDescriptor {
    /// Looks up an asset by exact name.
    #[must_use]
    pub fn asset(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.name == name)
    }
}

/// Access to a remote release repository.
///
/// Implementations distinguish a release that does not exist
/// ([`ExecmanError::ReleaseNotFound`](crate::core::ExecmanError::ReleaseNotFound))
/// from a transport failure
/// ([`ExecmanError::Network`](crate::core::ExecmanError::Network)) so callers
/// can decide whether retrying makes sense.
pub trait ReleaseHost {
    /// The newest release. Drafts are never returned; prereleases only when
    /// `include_prereleases` is set.
    fn latest_release(
        &self,
        owner: &str,
        repo: &str,
        include_prereleases: bool,
    ) -> impl std::future::Future<Output = Result<ReleaseDescriptor>> + Send;

    /// The release published under `tag`.
    fn release_by_tag(
        &self,
        owner: &str,
        repo: &str,
        tag: &str,
    ) -> impl std::future::Future<Output = Result<ReleaseDescriptor>> + Send;

    /// Streams `asset` into `dest`, reporting bytes on `progress`.
    ///
    /// Returns the number of bytes written.
    fn download_asset(
        &self,
        asset: &Asset,
        dest: &Path,
        progress: &ProgressBar,
    ) -> impl std::future::Future<Output = Result<u64>> + Send;
}

/// Fetches the release named by `source`: its pinned tag if present,
/// otherwise the latest release.
pub async fn resolve_release<H: ReleaseHost + Sync>(
    host: &H,
    source: &SourceRef,
    include_prereleases: bool,
) -> Result<ReleaseDescriptor> {
    let spinner = ProgressBar::new_spinner();
    let result = match &source.version {
        Some(tag) => {
            spinner.set_message(format!("Fetching release {tag} of {}...", source.repository()));
            host.release_by_tag(&source.owner, &source.repo, tag).await
        }
        None => {
            spinner.set_message(format!("Fetching latest release of {}...", source.repository()));
            host.latest_release(&source.owner, &source.repo, include_prereleases).await
        }
    };
    spinner.finish_and_clear();

    let release = result?;
    tracing::debug!(
        "Resolved {} to {} ({} assets)",
        source.repository(),
        release.tag,
        release.assets.len()
    );
    Ok(release)
}
