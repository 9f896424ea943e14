//! Command-line interface for execman.
//!
//! Each subcommand lives in its own module as a clap `Args` struct with an
//! `execute` method. Commands load the registry and config through a shared
//! [`CommandContext`], hand the work to the library engines and render the
//! outcome with `colored`.
//!
//! ```bash
//! execman init ~/.local/bin
//! execman install github.com/BurntSushi/ripgrep
//! execman install github.com/sharkdp/fd@v10.2.0 --into ~/bin -y
//! execman update --all
//! execman check --verify
//! execman list --long
//! execman remove fd
//! execman forget rg
//! ```
//!
//! # Global flags
//!
//! - `-v, --verbose`: debug logging on stderr
//! - `--no-progress`: no progress bars or spinners
//! - `--registry <PATH>`: registry file (also `$EXECMAN_REGISTRY`)
//! - `--config <PATH>`: config file (also `$EXECMAN_CONFIG`)

mod check;
mod forget;
mod init;
mod install;
mod list;
mod remove;
mod update;

use crate::config::Config;
use crate::registry::Registry;
use crate::release::GithubClient;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Settings derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// `tracing` filter directive, e.g. `debug`
    pub log_level: String,
    pub no_progress: bool,
}

/// Locations shared by every command.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    pub registry_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
}

impl CommandContext {
    pub fn load_registry(&self) -> Result<Registry> {
        Registry::load(self.registry_path.as_deref()).context("Failed to load registry")
    }

    /// The config file this invocation reads and writes.
    pub fn config_file(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Config::default_path().context("Failed to locate config file"),
        }
    }

    pub async fn load_config(&self) -> Result<Config> {
        Config::load(self.config_path.as_deref()).await.context("Failed to load config")
    }

    pub fn release_host(&self, config: &Config) -> Result<GithubClient> {
        Ok(GithubClient::new(config.api_url())?)
    }
}

#[derive(Parser)]
#[command(
    name = "execman",
    about = "Install and update standalone executables from GitHub releases",
    version,
    long_about = "execman installs single-binary tools from GitHub releases, verifies them \
                  against published checksums and keeps a registry so they can be checked, \
                  updated and removed later."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable progress bars and spinners
    #[arg(long, global = true)]
    no_progress: bool,

    /// Path to the registry file
    #[arg(long, global = true, value_name = "PATH", env = "EXECMAN_REGISTRY")]
    registry: Option<PathBuf>,

    /// Path to the config file
    #[arg(long, global = true, value_name = "PATH", env = "EXECMAN_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Set the install directory and install execman itself into it
    Init(init::InitCommand),
    /// Install an executable from a GitHub release
    Install(install::InstallCommand),
    /// Update one or all managed executables
    Update(update::UpdateCommand),
    /// Check managed executables for updates and integrity
    Check(check::CheckCommand),
    /// List managed executables
    #[command(alias = "ls")]
    List(list::ListCommand),
    /// Delete a managed executable and stop managing it
    Remove(remove::RemoveCommand),
    /// Stop managing an executable, keeping the file
    Forget(forget::ForgetCommand),
}

impl Cli {
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        CliConfig {
            log_level: if self.verbose { "debug" } else { "warn" }.to_string(),
            no_progress: self.no_progress,
        }
    }

    pub async fn execute(self) -> Result<()> {
        if self.no_progress {
            crate::utils::progress::disable_progress();
        }

        let ctx = CommandContext {
            registry_path: self.registry,
            config_path: self.config,
        };

        match self.command {
            Commands::Init(cmd) => cmd.execute(&ctx).await,
            Commands::Install(cmd) => cmd.execute(&ctx).await,
            Commands::Update(cmd) => cmd.execute(&ctx).await,
            Commands::Check(cmd) => cmd.execute(&ctx).await,
            Commands::List(cmd) => cmd.execute(&ctx),
            Commands::Remove(cmd) => cmd.execute(&ctx).await,
            Commands::Forget(cmd) => cmd.execute(&ctx).await,
        }
    }
}

/// `path` with the home directory shown as `~`.
pub(crate) fn display_path(path: &std::path::Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(PathBuf::from)) {
        Some(rest) => format!("~/{}", rest.display()),
        None => path.display().to_string(),
    }
}
