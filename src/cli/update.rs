//! `execman update`

use super::CommandContext;
use crate::prompt::StdinPrompter;
use crate::update::{UpdateEngine, UpdateOptions, UpdateOutcome};
use anyhow::Result;
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct UpdateCommand {
    /// Name of the executable to update
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    name: Option<String>,

    /// Update every managed executable
    #[arg(short, long)]
    all: bool,

    /// Skip confirmation prompts (symlinked executables then fail)
    #[arg(short, long)]
    yes: bool,

    /// Allow updating to prerelease versions
    #[arg(long)]
    include_prereleases: bool,

    /// Back up the current binary to `<path>.backup` without asking
    #[arg(long, conflicts_with = "no_backup")]
    backup: bool,

    /// Never back up the current binary
    #[arg(long)]
    no_backup: bool,
}

impl UpdateCommand {
    fn options(&self) -> UpdateOptions {
        let backup = match (self.backup, self.no_backup) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        UpdateOptions {
            assume_yes: self.yes,
            include_prereleases: self.include_prereleases,
            backup,
        }
    }

    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let config = ctx.load_config().await?;
        let mut registry = ctx.load_registry()?;
        let host = ctx.release_host(&config)?;
        let mut prompter = StdinPrompter::new();
        let options = self.options();
        let mut engine = UpdateEngine::new(&host, &mut prompter, &config);

        let Some(name) = self.name else {
            if registry.is_empty() {
                println!("No managed executables to update.");
                return Ok(());
            }

            let report = engine.update_all(&mut registry, &options).await;
            println!();
            for name in &report.updated {
                println!("  {} {name}", "updated".green());
            }
            for name in &report.cancelled {
                println!("  {} {name}", "cancelled".yellow());
            }
            for (name, error) in &report.failed {
                println!("  {} {name}: {error}", "failed".red());
            }
            println!("\n{}.", report.summary());
            return Ok(());
        };

        match engine.update_one(&mut registry, &name, &options).await? {
            UpdateOutcome::Updated {
                name,
                from,
                to,
                ..
            } => println!("{} Updated {} {from} → {}", "✓".green(), name.bold(), to.green()),
            UpdateOutcome::UpToDate {
                name,
                version,
            } => println!("{name} is already up to date ({version})."),
            UpdateOutcome::Cancelled {
                name,
            } => println!("Update of {name} cancelled."),
        }
        Ok(())
    }
}
