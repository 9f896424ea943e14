//! Symlink handling for install targets.
//!
//! Managed paths are often symlinks (`~/.local/bin/tool -> /opt/tool/bin/tool`).
//! Before replacing or deleting one, the operator decides which physical
//! path to act on: the link target or the link itself. Without a terminal
//! to ask, the choice is refused rather than guessed.

use crate::core::{ExecmanError, Result};
use crate::prompt::{Prompt, Prompter};
use std::path::{Path, PathBuf};
use tracing::debug;

/// What is at a path, without following it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymlinkInfo {
    /// The inspected path
    pub path: PathBuf,
    pub is_symlink: bool,
    /// Link destination, resolved against the link's directory when
    /// relative. Equal to `path` for anything that isn't a symlink.
    pub target: PathBuf,
}

/// Which physical path to mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymlinkDecision {
    /// Write through to the link target; the link stays.
    ReplaceTarget,
    /// Replace the link itself with a regular file.
    ReplaceSymlink,
    Cancel,
}

/// Inspects `path` with `symlink_metadata`.
///
/// A non-existent path is reported as not a symlink.
pub fn inspect(path: &Path) -> Result<SymlinkInfo> {
    let not_a_link = || SymlinkInfo {
        path: path.to_path_buf(),
        is_symlink: false,
        target: path.to_path_buf(),
    };

    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(not_a_link()),
        Err(e) => return Err(ExecmanError::io("inspect", path, e)),
    };

    if !metadata.file_type().is_symlink() {
        return Ok(not_a_link());
    }

    let link = std::fs::read_link(path).map_err(|e| ExecmanError::io("read symlink", path, e))?;
    let target = if link.is_absolute() {
        link
    } else {
        path.parent().map_or_else(|| link.clone(), |dir| dir.join(&link))
    };
    debug!("{} is a symlink to {}", path.display(), target.display());

    Ok(SymlinkInfo {
        path: path.to_path_buf(),
        is_symlink: true,
        target,
    })
}

/// Decides how to treat `info`.
///
/// Non-symlinks resolve to [`SymlinkDecision::ReplaceSymlink`], i.e. the
/// nominal path. For a symlink, `interactive` asks `prompter`: `1` replaces
/// the target, `2` the link, anything else cancels.
///
/// # Errors
///
/// [`ExecmanError::SymlinkAmbiguity`] for a symlink when not interactive.
pub async fn decide<P: Prompter + Send>(
    info: &SymlinkInfo,
    interactive: bool,
    prompter: &mut P,
) -> Result<SymlinkDecision> {
    if !info.is_symlink {
        return Ok(SymlinkDecision::ReplaceSymlink);
    }

    if !interactive {
        return Err(ExecmanError::SymlinkAmbiguity {
            path: info.path.clone(),
            target: info.target.clone(),
        });
    }

    let answer = prompter
        .ask(&Prompt::Symlink {
            path: info.path.clone(),
            target: info.target.clone(),
        })
        .await?;

    Ok(match answer.trim() {
        "1" => SymlinkDecision::ReplaceTarget,
        "2" => SymlinkDecision::ReplaceSymlink,
        _ => SymlinkDecision::Cancel,
    })
}

/// The path a decision acts on.
#[must_use]
pub fn effective_path(info: &SymlinkInfo, decision: SymlinkDecision) -> PathBuf {
    match decision {
        SymlinkDecision::ReplaceTarget => info.target.clone(),
        SymlinkDecision::ReplaceSymlink | SymlinkDecision::Cancel => info.path.clone(),
    }
}
