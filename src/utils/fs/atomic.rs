//! Atomic file operations using a temp-and-rename strategy.
//!
//! Readers of a path written here see either the old content or the new
//! content, never a partial write.

use crate::constants::STAGED_SUFFIX;
use crate::core::{ExecmanError, Result};
use crate::utils::fs::ensure_dir;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Returns `path` with `suffix` appended to its file name.
pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Atomically writes bytes to a file.
///
/// 1. Writes content to a sibling `<name>.tmp` file
/// 2. Syncs it to disk
/// 3. Renames it over the target
///
/// Parent directories are created if they don't exist. The temporary file is
/// removed if any step fails.
///
/// # Examples
///
/// ```rust,no_run
/// use execman::utils::fs::atomic_write;
/// use std::path::Path;
///
/// # fn example() -> execman::core::Result<()> {
/// atomic_write(Path::new("registry.json"), br#"{"schema_version":1}"#)?;
/// # Ok(())
/// # }
/// ```
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }

    let temp_path = with_suffix(path, ".tmp");

    let written = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()
    })();
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(ExecmanError::io("write", &temp_path, e));
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(ExecmanError::io("rename temp file to", path, e));
    }

    Ok(())
}

/// Replaces `dest` with a copy of `source`, as atomically as the platform allows.
///
/// The new content is first copied next to the destination as
/// `<dest>.execman-new` and made executable, so a failure while copying leaves
/// `dest` untouched. On Unix the staged file is then renamed over `dest` in a
/// single step. Windows cannot rename over an existing file, so there the
/// destination is removed first and a short window without a file remains.
pub fn atomic_replace(source: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }

    let staged = with_suffix(dest, STAGED_SUFFIX);
    if let Err(e) = fs::copy(source, &staged) {
        let _ = fs::remove_file(&staged);
        return Err(ExecmanError::io("stage new binary at", &staged, e));
    }
    if let Err(e) = crate::utils::fs::make_executable(&staged) {
        let _ = fs::remove_file(&staged);
        return Err(e);
    }

    #[cfg(windows)]
    if dest.exists() {
        fs::remove_file(dest).map_err(|e| ExecmanError::io("remove", dest, e))?;
    }

    if let Err(e) = fs::rename(&staged, dest) {
        let _ = fs::remove_file(&staged);
        return Err(ExecmanError::io("move new binary into", dest, e));
    }

    tracing::debug!("Replaced {} with {}", dest.display(), source.display());
    Ok(())
}
