//! First-run setup.
//!
//! [`initialize`] points the config at an install directory, creates the
//! registry there if it does not exist yet and installs execman itself into
//! that directory, so the tool manages its own updates from then on.

use crate::config::Config;
use crate::core::Result;
use crate::installer::{InstallEngine, InstallOptions, InstallOutcome};
use crate::prompt::Prompter;
use crate::registry::Registry;
use crate::release::ReleaseHost;
use crate::utils::platform::absolutize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;

/// What [`initialize`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    /// Absolute install directory now stored as `default_install_dir`
    pub install_dir: PathBuf,
    pub outcome: InstallOutcome,
}

/// Writes `folder` as the default install directory to the config at
/// `config_path`, saves `registry` and installs `source` into `folder`
/// without prompting.
///
/// Other config fields are preserved.
///
/// # Errors
///
/// Config and registry write failures, and anything the install raises.
pub async fn initialize<H, P>(
    host: &H,
    prompter: &mut P,
    config_path: &Path,
    registry: &mut Registry,
    folder: &Path,
    source: &str,
) -> Result<InitReport>
where
    H: ReleaseHost + Sync,
    P: Prompter + Send,
{
    let install_dir = absolutize(folder)?;
    info!("Initializing execman in {}", install_dir.display());

    let mut config = Config::load_from(config_path).await?;
    config.default_install_dir = Some(install_dir.clone());
    config.save_to(config_path)?;

    registry.save()?;

    let options = InstallOptions {
        source: source.to_string(),
        into: Some(install_dir.clone()),
        assume_yes: true,
        include_prereleases: false,
    };
    let outcome = InstallEngine::new(host, prompter, &config).install(registry, &options).await?;

    Ok(InitReport {
        install_dir,
        outcome,
    })
}

/// Whether `dir` is one of the entries of a `PATH`-style list.
#[must_use]
pub fn path_list_contains(path_var: &OsStr, dir: &Path) -> bool {
    std::env::split_paths(path_var).any(|entry| absolutize(&entry).is_ok_and(|entry| entry == dir))
}
