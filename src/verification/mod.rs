//! SHA-256 integrity verification.
//!
//! Digests are plain lowercase hex. Checksum manifests use the `sha256sum`
//! layout, one `<hex>  <filename>` entry per line:
//!
//! ```text
//! 2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae  tool_linux_amd64.tar.gz
//! fcde2b2edba56bf408601fb721fe9b5c338d10ee429ea04fae5511b68fbf8fb9 *tool_darwin_arm64.tar.gz
//! ```
//!
//! A sidecar named `<asset>.sha256` may instead hold just the digest.

use crate::core::{ExecmanError, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// SHA-256 computation and manifest lookups.
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// Computes the SHA-256 of a file, reading it in chunks.
    ///
    /// ```rust,no_run
    /// use execman::verification::ChecksumVerifier;
    /// use std::path::Path;
    ///
    /// # async fn example() -> execman::core::Result<()> {
    /// let digest = ChecksumVerifier::compute_sha256(Path::new("/usr/local/bin/rg")).await?;
    /// assert_eq!(digest.len(), 64);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn compute_sha256(path: &Path) -> Result<String> {
        debug!("Computing SHA256 checksum for: {}", path.display());

        let mut file =
            tokio::fs::File::open(path).await.map_err(|e| ExecmanError::io("open", path, e))?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; 64 * 1024];

        loop {
            let read =
                file.read(&mut buffer).await.map_err(|e| ExecmanError::io("read", path, e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(hex::encode(hasher.finalize()))
    }

    /// Reads `manifest_path` and returns the digest listed for `asset_name`.
    pub async fn find_expected(manifest_path: &Path, asset_name: &str) -> Result<Option<String>> {
        let content = tokio::fs::read_to_string(manifest_path)
            .await
            .map_err(|e| ExecmanError::io("read checksum manifest", manifest_path, e))?;
        let manifest_name =
            manifest_path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        Ok(Self::parse_manifest(&content, asset_name, &manifest_name))
    }

    /// Finds the digest for `asset_name` in manifest text.
    ///
    /// Blank lines are ignored and the `*` binary-mode marker is stripped.
    /// Entries may carry a directory prefix (`dist/tool.tar.gz`). A manifest
    /// holding a single bare digest applies only when it is named
    /// `<asset_name>.sha256`.
    #[must_use]
    pub fn parse_manifest(content: &str, asset_name: &str, manifest_name: &str) -> Option<String> {
        let mut bare_digests = Vec::new();

        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let mut parts = line.split_whitespace();
            let Some(digest) = parts.next() else { continue };

            let Some(filename) = parts.next() else {
                bare_digests.push(digest);
                continue;
            };
            let filename = filename.trim_start_matches('*');
            let basename = filename.rsplit('/').next().unwrap_or(filename);

            if filename == asset_name || basename == asset_name {
                debug!("Found checksum for {asset_name} in {manifest_name}");
                return Some(digest.to_lowercase());
            }
        }

        match bare_digests.as_slice() {
            [digest] if manifest_name == format!("{asset_name}.sha256") && is_sha256_hex(digest) => {
                Some(digest.to_lowercase())
            }
            _ => None,
        }
    }

    /// Hashes `path` and compares it against `expected`.
    ///
    /// Returns the actual digest on success.
    ///
    /// # Errors
    ///
    /// [`ExecmanError::ChecksumMismatch`] naming `path` as the preserved
    /// artifact.
    pub async fn verify(path: &Path, asset_name: &str, expected: &str) -> Result<String> {
        info!("Verifying checksum for: {asset_name}");
        let actual = Self::compute_sha256(path).await?;

        if !digests_match(expected, &actual) {
            return Err(ExecmanError::ChecksumMismatch {
                asset: asset_name.to_string(),
                expected: normalize_digest(expected),
                actual,
                artifact: path.to_path_buf(),
            });
        }

        info!("Checksum verification successful");
        Ok(actual)
    }
}

/// Lowercases and strips an optional `sha256:` prefix.
#[must_use]
pub fn normalize_digest(digest: &str) -> String {
    let trimmed = digest.trim();
    let bare = trimmed
        .get(..7)
        .filter(|prefix| prefix.eq_ignore_ascii_case("sha256:"))
        .map_or(trimmed, |_| &trimmed[7..]);
    bare.to_lowercase()
}

/// Case-insensitive digest comparison tolerating a `sha256:` prefix.
#[must_use]
pub fn digests_match(expected: &str, actual: &str) -> bool {
    normalize_digest(expected) == normalize_digest(actual)
}

fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit())
}
