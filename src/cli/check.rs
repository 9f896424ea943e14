//! `execman check`

use super::CommandContext;
use crate::check::{CheckEntry, CheckOptions, IntegrityStatus, check};
use anyhow::Result;
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Check only this executable
    name: Option<String>,

    /// Verify installed files against their recorded checksums
    #[arg(long)]
    verify: bool,

    /// Include prerelease versions when looking for updates
    #[arg(long)]
    include_prereleases: bool,

    /// Also list executables that are up to date
    #[arg(long)]
    no_skip: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl CheckCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let config = ctx.load_config().await?;
        let registry = ctx.load_registry()?;
        let host = ctx.release_host(&config)?;

        let options = CheckOptions {
            name: self.name.clone(),
            verify: self.verify,
            include_prereleases: self.include_prereleases || config.include_prereleases,
        };
        let report = check(&registry, &host, &options).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        if report.executables.is_empty() {
            println!("No managed executables.");
            return Ok(());
        }

        for entry in &report.executables {
            if let Some(line) = self.render(entry) {
                println!("  {line}");
            }
        }

        println!("\n{}.", report.summary());
        if report.missing > 0 || report.modified > 0 {
            println!("Run 'execman update <name>' to reinstall missing or modified executables.");
        } else if report.updates_available > 0 {
            println!("Run 'execman update --all' to install updates.");
        }
        Ok(())
    }

    fn render(&self, entry: &CheckEntry) -> Option<String> {
        let name = format!("{:<15}", entry.name);
        let current = format!("{:<9}", entry.current_version);
        match entry.status {
            IntegrityStatus::Missing => Some(format!("{name} {current}          {}", "MISSING".red())),
            IntegrityStatus::Modified => Some(format!("{name} {current}          {}", "MODIFIED".red())),
            IntegrityStatus::Ok => {
                if let Some(error) = &entry.error {
                    return Some(format!("{name} {}: {error}", "error".red()));
                }
                match &entry.latest_version {
                    Some(latest) if entry.update_available => Some(format!(
                        "{name} {} → {:<9} {}",
                        entry.current_version,
                        latest.green(),
                        "update available".yellow()
                    )),
                    _ if self.no_skip => {
                        let verified = if self.verify { " (verified)" } else { "" };
                        Some(format!("{name} {current}          up to date{verified}"))
                    }
                    _ => None,
                }
            }
        }
    }
}
