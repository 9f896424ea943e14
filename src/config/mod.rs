//! User configuration.
//!
//! An optional JSON file at `<config_dir>/execman/config.json` (or
//! `$EXECMAN_CONFIG`). Every field is optional:
//!
//! ```json
//! {
//!   "default_install_dir": "~/.local/bin",
//!   "include_prereleases": false,
//!   "api_url": "https://api.github.com"
//! }
//! ```
//!
//! `$EXECMAN_API_URL` overrides `api_url`.

use crate::constants::{APP_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_API_URL, ENV_API_URL, ENV_CONFIG};
use crate::core::{ExecmanError, Result};
use crate::utils::fs::atomic_write;
use crate::utils::platform::{expand_tilde, get_home_dir};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings read from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory `install` places executables into when `--into` is absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_install_dir: Option<PathBuf>,

    /// Consider prereleases when looking up the latest release
    pub include_prereleases: bool,

    /// Release API base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl Config {
    /// `<config_dir>/execman/config.json`, or `$EXECMAN_CONFIG` when set.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(ENV_CONFIG).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let config_dir = dirs::config_dir().ok_or_else(|| ExecmanError::Config {
            path: PathBuf::from(CONFIG_FILE_NAME),
            reason: "unable to determine the configuration directory".to_string(),
        })?;
        Ok(config_dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads from `path`, or from [`Config::default_path`] when `None`.
    /// A missing file yields defaults.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path).await,
            None => Self::load_from(&Self::default_path()?).await,
        }
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ExecmanError::Config {
                    path: path.to_path_buf(),
                    reason: format!("failed to read: {e}"),
                });
            }
        };

        serde_json::from_str(&content).map_err(|e| ExecmanError::Config {
            path: path.to_path_buf(),
            reason: format!("failed to parse: {e}"),
        })
    }

    /// Writes the config as pretty JSON to `path`, atomically.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| ExecmanError::Config {
            path: path.to_path_buf(),
            reason: format!("failed to serialize: {e}"),
        })?;
        atomic_write(path, content.as_bytes())?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// The configured install directory with `~` expanded, defaulting to
    /// `~/.local/bin`.
    pub fn install_dir(&self) -> Result<PathBuf> {
        match &self.default_install_dir {
            Some(dir) => expand_tilde(dir),
            None => Ok(get_home_dir()?.join(".local").join("bin")),
        }
    }

    /// `$EXECMAN_API_URL`, then the config value, then the public API.
    #[must_use]
    pub fn api_url(&self) -> String {
        std::env::var(ENV_API_URL)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }
}
