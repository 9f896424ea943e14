//! Platform identification and path helpers
//!
//! Release assets are named after Go-style `os`/`arch` pairs
//! (`linux/amd64`, `darwin/arm64`, ...). [`Platform`] maps the compile-time
//! target onto those names so asset selection can match them.
//!
//! ```rust
//! use execman::utils::platform::Platform;
//!
//! let linux = Platform::new("linux", "amd64");
//! assert_eq!(linux.to_string(), "linux/amd64");
//! assert_eq!(linux.archive_extension(), "tar.gz");
//! assert_eq!(Platform::new("windows", "amd64").archive_extension(), "zip");
//! ```

use crate::core::{ExecmanError, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// An `(os, arch)` pair in release-asset vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    /// `linux`, `darwin` or `windows`
    pub os: String,
    /// `amd64`, `arm64` or `386`
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform this binary was compiled for.
    #[must_use]
    pub fn current() -> Self {
        let os = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            other => other,
        };
        Self::new(os, arch)
    }

    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    /// Archive format releases conventionally use on this platform.
    #[must_use]
    pub fn archive_extension(&self) -> &'static str {
        if self.is_windows() { "zip" } else { "tar.gz" }
    }

    /// File name of an executable called `name` on this platform.
    #[must_use]
    pub fn executable_name(&self, name: &str) -> String {
        if self.is_windows() && !name.to_ascii_lowercase().ends_with(".exe") {
            format!("{name}.exe")
        } else {
            name.to_string()
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// Gets the home directory of the current user.
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| ExecmanError::Io {
        operation: "resolve home directory".to_string(),
        path: PathBuf::from("~"),
        reason: if cfg!(windows) {
            "USERPROFILE is not set".to_string()
        } else {
            "HOME is not set".to_string()
        },
    })
}

/// Expands a leading `~/` to the home directory.
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    match path.to_str().and_then(|s| s.strip_prefix("~/")) {
        Some(rest) => Ok(get_home_dir()?.join(rest)),
        None if path == Path::new("~") => get_home_dir(),
        None => Ok(path.to_path_buf()),
    }
}

/// Makes `path` absolute against the current directory without touching the
/// file system (no symlink resolution).
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let expanded = expand_tilde(path)?;
    if expanded.is_absolute() {
        return Ok(expanded);
    }
    let cwd = std::env::current_dir()
        .map_err(|e| ExecmanError::io("resolve current directory for", path, e))?;
    Ok(cwd.join(expanded))
}
