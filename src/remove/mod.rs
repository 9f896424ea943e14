//! Dropping executables from management.
//!
//! [`remove`] deletes the file and the registry entry; [`forget`] only the
//! entry. A symlinked path is resolved the same way updates resolve it:
//! choosing the link target deletes the target and then the dangling link,
//! choosing the link deletes just the link.

use crate::core::{ExecmanError, Result};
use crate::prompt::{Prompt, Prompter, confirm};
use crate::registry::{ExecutableRecord, Registry};
use crate::symlink::{self, SymlinkDecision};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of [`remove`] or [`forget`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed {
        name: String,
        record: ExecutableRecord,
        /// Files actually deleted, in order
        deleted: Vec<PathBuf>,
    },
    Forgotten {
        name: String,
        record: ExecutableRecord,
    },
    Cancelled,
}

fn lookup(registry: &Registry, name: &str) -> Result<ExecutableRecord> {
    registry.get(name).cloned().ok_or_else(|| ExecmanError::NotManaged {
        name: name.to_string(),
    })
}

/// Deletes `name`'s file and stops managing it.
///
/// A file that is already gone only produces a warning.
///
/// # Errors
///
/// [`ExecmanError::NotManaged`], [`ExecmanError::SymlinkAmbiguity`] for a
/// symlinked path under `assume_yes`, or the I/O error from deleting the
/// file. The registry entry is kept when the file can't be deleted.
pub async fn remove<P: Prompter + Send>(
    registry: &mut Registry,
    name: &str,
    assume_yes: bool,
    prompter: &mut P,
) -> Result<RemoveOutcome> {
    let record = lookup(registry, name)?;

    let info = symlink::inspect(&record.path)?;
    let decision = symlink::decide(&info, !assume_yes, &mut *prompter).await?;
    if decision == SymlinkDecision::Cancel {
        return Ok(RemoveOutcome::Cancelled);
    }
    let effective = symlink::effective_path(&info, decision);

    if !assume_yes {
        let prompt = Prompt::ConfirmRemove {
            name: name.to_string(),
            source: record.source.clone(),
            version: record.version.clone(),
            path: record.path.clone(),
            removes: info.is_symlink.then(|| effective.clone()),
        };
        if !confirm(prompter, &prompt).await? {
            info!("Removal of {name} declined");
            return Ok(RemoveOutcome::Cancelled);
        }
    }

    let mut deleted = Vec::new();
    if delete_file(&effective)? {
        deleted.push(effective.clone());
    } else {
        warn!("Executable file not found at {}", effective.display());
    }

    if info.is_symlink && decision == SymlinkDecision::ReplaceTarget {
        match delete_file(&info.path) {
            Ok(true) => deleted.push(info.path.clone()),
            Ok(false) => {}
            Err(e) => warn!("Failed to remove symlink {}: {e}", info.path.display()),
        }
    }

    let record = registry.commit_removal(name)?;
    info!("Removed {name}");
    Ok(RemoveOutcome::Removed {
        name: name.to_string(),
        record,
        deleted,
    })
}

/// Stops managing `name`, leaving its file in place.
pub async fn forget<P: Prompter + Send>(
    registry: &mut Registry,
    name: &str,
    assume_yes: bool,
    prompter: &mut P,
) -> Result<RemoveOutcome> {
    let record = lookup(registry, name)?;

    if !assume_yes {
        let prompt = Prompt::ConfirmForget {
            name: name.to_string(),
            source: record.source.clone(),
            version: record.version.clone(),
            path: record.path.clone(),
        };
        if !confirm(prompter, &prompt).await? {
            info!("Forgetting {name} declined");
            return Ok(RemoveOutcome::Cancelled);
        }
    }

    let record = registry.commit_removal(name)?;
    info!("Forgot {name}; file kept at {}", record.path.display());
    Ok(RemoveOutcome::Forgotten {
        name: name.to_string(),
        record,
    })
}

/// Deletes a file or symlink. `Ok(false)` when nothing was there.
fn delete_file(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Deleted {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ExecmanError::io("remove", path, e)),
    }
}
