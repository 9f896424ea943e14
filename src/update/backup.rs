//! Backups of a binary about to be replaced.
//!
//! The copy sits next to the original as `<file>.backup`, on the same file
//! system and with the same permissions, so restoring it is a plain copy back.
//!
//! [`Rollback`] is the internal counterpart: every replacement sets the prior
//! file aside as `<file>.execman-old` and puts it back if the registry cannot
//! record the new one, whether or not a user-facing backup was asked for.

use crate::constants::{BACKUP_SUFFIX, RESTORE_ATTEMPTS, ROLLBACK_SUFFIX};
use crate::core::{ExecmanError, Result};
use crate::utils::fs::atomic::with_suffix;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};

/// Creates, restores and discards the backup of one executable.
///
/// ```rust,no_run
/// use execman::update::backup::BackupManager;
/// use std::path::PathBuf;
///
/// # async fn example() -> execman::core::Result<()> {
/// let backup = BackupManager::new(PathBuf::from("/home/me/.local/bin/fd"));
/// backup.create_backup().await?;
/// // ... replace the binary ...
/// let replacement_failed = false;
/// if replacement_failed {
///     backup.restore_backup().await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BackupManager {
    original_path: PathBuf,
    backup_path: PathBuf,
}

impl BackupManager {
    /// Manages the backup of `executable_path`, stored at
    /// `<executable_path>.backup`.
    #[must_use]
    pub fn new(executable_path: PathBuf) -> Self {
        Self::with_suffix(executable_path, BACKUP_SUFFIX)
    }

    fn with_suffix(executable_path: PathBuf, suffix: &str) -> Self {
        let backup_path = with_suffix(&executable_path, suffix);
        Self {
            original_path: executable_path,
            backup_path,
        }
    }

    /// Copies the original aside, replacing any older backup.
    ///
    /// # Errors
    ///
    /// [`ExecmanError::Io`] (or `PermissionDenied`) if the original is missing
    /// or the copy fails.
    pub async fn create_backup(&self) -> Result<()> {
        if self.backup_path.exists() {
            debug!("Removing old backup at {}", self.backup_path.display());
            fs::remove_file(&self.backup_path)
                .await
                .map_err(|e| ExecmanError::io("remove old backup", &self.backup_path, e))?;
        }

        info!("Creating backup at {}", self.backup_path.display());
        fs::copy(&self.original_path, &self.backup_path)
            .await
            .map_err(|e| ExecmanError::io("back up", &self.original_path, e))?;

        #[cfg(unix)]
        {
            let permissions = fs::metadata(&self.original_path)
                .await
                .map_err(|e| ExecmanError::io("read metadata of", &self.original_path, e))?
                .permissions();
            fs::set_permissions(&self.backup_path, permissions)
                .await
                .map_err(|e| ExecmanError::io("set permissions on", &self.backup_path, e))?;
        }

        Ok(())
    }

    /// Copies the backup back over the original.
    ///
    /// Retried a few times with a one second pause, for binaries that are
    /// briefly locked (Windows).
    pub async fn restore_backup(&self) -> Result<()> {
        if !self.backup_path.exists() {
            return Err(ExecmanError::Io {
                operation: "restore backup".to_string(),
                path: self.backup_path.clone(),
                reason: "no backup file found".to_string(),
            });
        }

        info!("Restoring {} from backup", self.original_path.display());
        let mut attempt = 1;
        loop {
            match self.attempt_restore().await {
                Ok(()) => {
                    info!("Restored {}", self.original_path.display());
                    return Ok(());
                }
                Err(e) if attempt < RESTORE_ATTEMPTS => {
                    warn!("Restore attempt {attempt} failed: {e}; retrying");
                    attempt += 1;
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt_restore(&self) -> Result<()> {
        if self.original_path.exists() {
            fs::remove_file(&self.original_path)
                .await
                .map_err(|e| ExecmanError::io("remove", &self.original_path, e))?;
        }

        fs::copy(&self.backup_path, &self.original_path)
            .await
            .map_err(|e| ExecmanError::io("restore", &self.original_path, e))?;

        #[cfg(unix)]
        {
            let permissions = fs::metadata(&self.backup_path)
                .await
                .map_err(|e| ExecmanError::io("read metadata of", &self.backup_path, e))?
                .permissions();
            fs::set_permissions(&self.original_path, permissions)
                .await
                .map_err(|e| ExecmanError::io("set permissions on", &self.original_path, e))?;
        }

        Ok(())
    }

    /// Deletes the backup if there is one. Failures are only logged.
    pub async fn cleanup_backup(&self) {
        if !self.backup_path.exists() {
            return;
        }
        match fs::remove_file(&self.backup_path).await {
            Ok(()) => debug!("Removed backup {}", self.backup_path.display()),
            Err(e) => warn!("Failed to remove backup {}: {e}", self.backup_path.display()),
        }
    }

    #[must_use]
    pub fn backup_exists(&self) -> bool {
        self.backup_path.exists()
    }

    #[must_use]
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }
}

/// The file at a destination as it was before a replacement.
///
/// [`capture`](Self::capture) copies it aside, [`discard`](Self::discard)
/// drops the copy once the new file is recorded, and
/// [`restore`](Self::restore) undoes the replacement. A destination that was
/// empty is restored by deleting whatever was placed there.
pub(crate) struct Rollback {
    target: PathBuf,
    prior: Option<BackupManager>,
}

impl Rollback {
    pub(crate) async fn capture(target: &Path) -> Result<Self> {
        let prior = if target.is_file() {
            let manager = BackupManager::with_suffix(target.to_path_buf(), ROLLBACK_SUFFIX);
            manager.create_backup().await?;
            Some(manager)
        } else {
            None
        };
        Ok(Self {
            target: target.to_path_buf(),
            prior,
        })
    }

    pub(crate) async fn discard(self) {
        if let Some(manager) = &self.prior {
            manager.cleanup_backup().await;
        }
    }

    /// Failures are logged; a copy that could not be put back stays on disk.
    pub(crate) async fn restore(self) {
        match &self.prior {
            Some(manager) => match manager.restore_backup().await {
                Ok(()) => manager.cleanup_backup().await,
                Err(e) => error!(
                    "Could not restore {}: {e}; the previous file is at {}",
                    self.target.display(),
                    manager.backup_path().display()
                ),
            },
            None if self.target.is_file() => {
                if let Err(e) = fs::remove_file(&self.target).await {
                    error!("Could not remove {}: {e}", self.target.display());
                } else {
                    info!("Removed {}", self.target.display());
                }
            }
            None => {}
        }
    }
}
