//! `execman forget`

use super::{CommandContext, display_path};
use crate::prompt::StdinPrompter;
use crate::remove::{RemoveOutcome, forget};
use anyhow::Result;
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct ForgetCommand {
    /// Name of the managed executable
    name: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

impl ForgetCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let mut registry = ctx.load_registry()?;
        let mut prompter = StdinPrompter::new();

        match forget(&mut registry, &self.name, self.yes, &mut prompter).await? {
            RemoveOutcome::Forgotten {
                name,
                record,
            } => {
                println!(
                    "{} {} is no longer managed; the file stays at {}",
                    "✓".green(),
                    name.bold(),
                    display_path(&record.path)
                );
            }
            RemoveOutcome::Removed { .. } | RemoveOutcome::Cancelled => println!("Forget cancelled."),
        }
        Ok(())
    }
}
