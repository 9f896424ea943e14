//! `execman install`

use super::{CommandContext, display_path};
use crate::installer::{InstallEngine, InstallOptions, InstallOutcome};
use crate::prompt::StdinPrompter;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InstallCommand {
    /// Repository to install from, e.g. `github.com/owner/repo[@version]`
    source: String,

    /// Directory to install into (default: config `default_install_dir`, or ~/.local/bin)
    #[arg(long, value_name = "DIR")]
    into: Option<PathBuf>,

    /// Skip confirmation prompts
    #[arg(short, long)]
    yes: bool,

    /// Consider prerelease versions when picking the latest release
    #[arg(long)]
    include_prereleases: bool,
}

impl InstallCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let config = ctx.load_config().await?;
        let mut registry = ctx.load_registry()?;
        let host = ctx.release_host(&config)?;
        let mut prompter = StdinPrompter::new();

        let options = InstallOptions {
            source: self.source,
            into: self.into,
            assume_yes: self.yes,
            include_prereleases: self.include_prereleases,
        };

        let outcome =
            InstallEngine::new(&host, &mut prompter, &config).install(&mut registry, &options).await?;

        match outcome {
            InstallOutcome::Installed {
                name,
                record,
            } => {
                println!(
                    "{} Installed {} {} to {}",
                    "✓".green(),
                    name.bold(),
                    record.version,
                    display_path(&record.path)
                );
            }
            InstallOutcome::Cancelled => println!("Installation cancelled."),
        }
        Ok(())
    }
}
