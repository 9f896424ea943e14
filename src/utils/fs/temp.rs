//! Scoped staging directories.

use crate::core::Result;
use crate::utils::fs::ensure_dir;
use std::path::{Path, PathBuf};

/// A temporary directory that is removed when dropped, unless kept.
///
/// Installs stage downloads and extracted files here. On success the
/// directory is dropped and cleaned up; on failure the engine calls
/// [`TempDir::keep`] so the artifacts stay available for inspection.
///
/// ```rust,no_run
/// use execman::utils::fs::TempDir;
///
/// # fn example() -> execman::core::Result<()> {
/// let staging = TempDir::new("install")?;
/// std::fs::write(staging.path().join("asset.tar.gz"), b"...").unwrap();
/// let kept = staging.keep();
/// println!("left artifacts in {}", kept.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TempDir {
    path: PathBuf,
    keep: bool,
}

impl TempDir {
    /// Creates `execman_{prefix}_{uuid}` in the system temporary directory.
    pub fn new(prefix: &str) -> Result<Self> {
        let unique_name = format!("execman_{}_{}", prefix, uuid::Uuid::new_v4());
        let path = std::env::temp_dir().join(unique_name);

        ensure_dir(&path)?;

        Ok(Self {
            path,
            keep: false,
        })
    }

    /// The directory path. It exists for as long as this value does.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disables cleanup and returns the path.
    #[must_use]
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        self.path.clone()
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        if !self.keep {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}
