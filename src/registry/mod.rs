//! The registry of managed executables.
//!
//! A single JSON document maps executable names to [`ExecutableRecord`]s:
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "executables": {
//!     "ripgrep": {
//!       "source": "https://github.com/BurntSushi/ripgrep",
//!       "version": "14.1.0",
//!       "installed_at": "2026-03-01T12:00:00Z",
//!       "path": "/home/me/.local/bin/ripgrep",
//!       "platform": "linux/amd64",
//!       "checksum": "9f2c..."
//!     }
//!   }
//! }
//! ```
//!
//! The registry is loaded once per command, mutated in memory and written
//! back with an atomic temp-and-rename. [`Registry::commit`] and
//! [`Registry::commit_removal`] pair each mutation with its save and undo
//! the in-memory change if the save fails, so a `Registry` value always
//! describes what is on disk.

use crate::constants::{APP_DIR_NAME, ENV_REGISTRY, REGISTRY_FILE_NAME, REGISTRY_SCHEMA_VERSION};
use crate::core::{ExecmanError, Result};
use crate::utils::fs::atomic_write;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One managed executable. Its name is the registry key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutableRecord {
    /// Canonical repository URL; never changes after installation
    pub source: String,
    /// Installed release tag
    pub version: String,
    pub installed_at: DateTime<Utc>,
    /// Absolute path of the installed file
    pub path: PathBuf,
    /// `os/arch` the asset was selected for
    pub platform: String,
    /// SHA-256 of the installed file, lowercase hex
    pub checksum: String,
}

/// Persistent `name -> ExecutableRecord` mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    schema_version: u32,
    #[serde(default)]
    executables: BTreeMap<String, ExecutableRecord>,
    #[serde(skip)]
    path: PathBuf,
}

impl Registry {
    /// An empty registry that will be saved to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            schema_version: REGISTRY_SCHEMA_VERSION,
            executables: BTreeMap::new(),
            path: path.into(),
        }
    }

    /// `<config_dir>/execman/registry.json`, or `$EXECMAN_REGISTRY` when set.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(ENV_REGISTRY).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let config_dir = dirs::config_dir().ok_or_else(|| ExecmanError::RegistryIo {
            path: PathBuf::from(REGISTRY_FILE_NAME),
            reason: "unable to determine the configuration directory".to_string(),
        })?;
        Ok(config_dir.join(APP_DIR_NAME).join(REGISTRY_FILE_NAME))
    }

    /// Loads from `path`, or from [`Registry::default_path`] when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load_from(&Self::default_path()?),
        }
    }

    /// Loads a registry file. A missing file is an empty registry.
    ///
    /// # Errors
    ///
    /// [`ExecmanError::RegistryIo`] if the file can't be read or parsed, or
    /// declares a schema version newer than this build understands.
    pub fn load_from(path: &Path) -> Result<Self> {
        let registry_error = |reason: String| ExecmanError::RegistryIo {
            path: path.to_path_buf(),
            reason,
        };

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No registry at {}, starting empty", path.display());
                return Ok(Self::new(path));
            }
            Err(e) => return Err(registry_error(format!("failed to read: {e}"))),
        };

        let mut registry: Self = serde_json::from_str(&content)
            .map_err(|e| registry_error(format!("failed to parse: {e}")))?;

        if registry.schema_version > REGISTRY_SCHEMA_VERSION {
            return Err(registry_error(format!(
                "unsupported schema version {} (this execman supports up to {})",
                registry.schema_version, REGISTRY_SCHEMA_VERSION
            )));
        }

        registry.schema_version = REGISTRY_SCHEMA_VERSION;
        registry.path = path.to_path_buf();
        debug!("Loaded {} registry entries from {}", registry.len(), path.display());
        Ok(registry)
    }

    /// Writes the registry atomically to its path.
    pub fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| ExecmanError::RegistryIo {
            path: self.path.clone(),
            reason: format!("failed to serialize: {e}"),
        })?;

        atomic_write(&self.path, content.as_bytes()).map_err(|e| ExecmanError::RegistryIo {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        debug!("Saved registry to {}", self.path.display());
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ExecutableRecord> {
        self.executables.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.executables.contains_key(name)
    }

    /// Inserts or replaces a record, returning the previous one.
    pub fn add(&mut self, name: impl Into<String>, record: ExecutableRecord) -> Option<ExecutableRecord> {
        self.executables.insert(name.into(), record)
    }

    pub fn remove(&mut self, name: &str) -> Option<ExecutableRecord> {
        self.executables.remove(name)
    }

    /// Names of all managed executables. Callers must not rely on the order.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.executables.keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.executables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.executables.is_empty()
    }

    /// Adds `record` and saves. On save failure the previous record (if any)
    /// is restored in memory.
    pub fn commit(&mut self, name: &str, record: ExecutableRecord) -> Result<()> {
        let previous = self.add(name, record);
        if let Err(e) = self.save() {
            match previous {
                Some(previous) => {
                    self.add(name, previous);
                }
                None => {
                    self.remove(name);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Removes `name` and saves, returning the removed record. On save
    /// failure the record is put back.
    ///
    /// # Errors
    ///
    /// [`ExecmanError::NotManaged`] if `name` has no entry.
    pub fn commit_removal(&mut self, name: &str) -> Result<ExecutableRecord> {
        let record = self.remove(name).ok_or_else(|| ExecmanError::NotManaged {
            name: name.to_string(),
        })?;
        if let Err(e) = self.save() {
            self.add(name, record);
            return Err(e);
        }
        Ok(record)
    }
}
