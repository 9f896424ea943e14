//! `execman remove`

use super::{CommandContext, display_path};
use crate::prompt::StdinPrompter;
use crate::remove::{RemoveOutcome, remove};
use anyhow::Result;
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct RemoveCommand {
    /// Name of the managed executable
    name: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

impl RemoveCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let mut registry = ctx.load_registry()?;
        let mut prompter = StdinPrompter::new();

        match remove(&mut registry, &self.name, self.yes, &mut prompter).await? {
            RemoveOutcome::Removed {
                name,
                deleted,
                ..
            } => {
                for path in &deleted {
                    println!("  Deleted {}", display_path(path));
                }
                println!("{} {} removed", "✓".green(), name.bold());
            }
            RemoveOutcome::Forgotten { .. } | RemoveOutcome::Cancelled => println!("Removal cancelled."),
        }
        Ok(())
    }
}
