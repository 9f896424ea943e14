//! Asset and checksum manifest downloads.
//!
//! [`Downloader`] streams release assets through a [`ReleaseHost`] into a
//! staging directory with a byte progress bar. Checksum manifests are
//! fetched opportunistically: a release without one, or a manifest that
//! fails to download, is logged and skipped rather than failing the install.

use crate::core::Result;
use crate::release::{Asset, ReleaseDescriptor, ReleaseHost};
use crate::utils::progress::ProgressBar;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions of the signatures and certificates published next to manifests.
const SIGNATURE_EXTENSIONS: &[&str] = &[".sig", ".asc", ".pem", ".cert", ".crt", ".bundle", ".minisig"];

/// Finds the checksum manifest covering `asset_name`.
///
/// An exact `<asset>.sha256` wins; otherwise the first asset whose name
/// contains `checksum` or ends in `.sha256`. Signatures of a manifest
/// (`checksums.txt.sig` and friends) are never picked.
#[must_use]
pub fn find_manifest_asset<'a>(release: &'a ReleaseDescriptor, asset_name: &str) -> Option<&'a Asset> {
    let exact = format!("{asset_name}.sha256");
    release.asset(&exact).or_else(|| {
        release.assets.iter().find(|a| {
            let lower = a.name.to_lowercase();
            a.name != asset_name
                && !SIGNATURE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
                && (lower.contains("checksum") || lower.ends_with(".sha256"))
        })
    })
}

/// Streams assets from a release host to local files.
pub struct Downloader<'a, H> {
    host: &'a H,
}

impl<'a, H: ReleaseHost + Sync> Downloader<'a, H> {
    pub const fn new(host: &'a H) -> Self {
        Self {
            host,
        }
    }

    /// Downloads `asset` to `dest`.
    pub async fn fetch(&self, asset: &Asset, dest: &Path) -> Result<u64> {
        let progress = ProgressBar::new_download(asset.size);
        progress.set_prefix(asset.name.clone());

        let result = self.host.download_asset(asset, dest, &progress).await;
        progress.finish_and_clear();

        let bytes = result?;
        debug!("Fetched {} ({bytes} bytes)", asset.name);
        Ok(bytes)
    }

    /// Downloads the checksum manifest for `asset` into `dir`, if the release
    /// publishes one.
    ///
    /// Returns the manifest's local path and file name. Every failure here is
    /// a warning, never an error.
    pub async fn fetch_manifest(
        &self,
        release: &ReleaseDescriptor,
        asset: &Asset,
        dir: &Path,
    ) -> Option<(PathBuf, String)> {
        let Some(manifest) = find_manifest_asset(release, &asset.name) else {
            warn!(
                "No checksum manifest published for {} in release {}; skipping verification",
                asset.name, release.tag
            );
            return None;
        };

        let dest = dir.join(&manifest.name);
        match self.host.download_asset(manifest, &dest, &ProgressBar::hidden()).await {
            Ok(_) => {
                debug!("Fetched checksum manifest {}", manifest.name);
                Some((dest, manifest.name.clone()))
            }
            Err(e) => {
                warn!("Could not download checksum manifest {}: {e}; skipping verification", manifest.name);
                None
            }
        }
    }
}
