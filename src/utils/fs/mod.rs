//! File system utilities
//!
//! Atomic writes for the registry, atomic replacement for installed binaries,
//! and scoped staging directories for downloads and extraction.
//!
//! # Examples
//!
//! ```rust,no_run
//! use execman::utils::fs::{TempDir, atomic_write, ensure_dir};
//! use std::path::Path;
//!
//! # fn example() -> execman::core::Result<()> {
//! ensure_dir(Path::new("/tmp/execman-demo"))?;
//! atomic_write(Path::new("/tmp/execman-demo/registry.json"), b"{}")?;
//!
//! let staging = TempDir::new("install")?;
//! println!("staging in {}", staging.path().display());
//! # Ok(())
//! # }
//! ```

pub mod atomic;
pub mod temp;

pub use atomic::{atomic_replace, atomic_write};
pub use temp::TempDir;

use crate::core::{ExecmanError, Result};
use std::path::Path;

/// Ensures a directory exists, creating it and all parents if necessary.
///
/// Fails if the path exists but is not a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .map_err(|e| ExecmanError::io("create directory", path, e))?;
    } else if !path.is_dir() {
        return Err(ExecmanError::Io {
            operation: "create directory".to_string(),
            path: path.to_path_buf(),
            reason: "path exists but is not a directory".to_string(),
        });
    }
    Ok(())
}

/// Sets `0755` on Unix; a no-op elsewhere.
pub fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| ExecmanError::io("set permissions on", path, e))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
