//! `execman init`
//!
//! Sets the default install directory, creates the registry and installs
//! execman into the directory so it can update itself:
//!
//! ```bash
//! execman init ~/.local/bin
//! ```

use super::{CommandContext, display_path};
use crate::constants::SELF_SOURCE;
use crate::init::{initialize, path_list_contains};
use crate::installer::InstallOutcome;
use crate::prompt::StdinPrompter;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct InitCommand {
    /// Directory execman installs executables into from now on
    folder: PathBuf,
}

impl InitCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let config_path = ctx.config_file()?;
        let config = ctx.load_config().await?;
        let mut registry = ctx.load_registry()?;
        let host = ctx.release_host(&config)?;
        let mut prompter = StdinPrompter::new();

        println!("Initializing execman in {}...", self.folder.display());
        let report =
            initialize(&host, &mut prompter, &config_path, &mut registry, &self.folder, SELF_SOURCE)
                .await?;

        println!("{} Configuration written to {}", "✓".green(), display_path(&config_path));
        println!("{} Registry at {}", "✓".green(), display_path(registry.path()));

        let InstallOutcome::Installed {
            record,
            ..
        } = report.outcome
        else {
            println!("Installation cancelled.");
            return Ok(());
        };
        println!(
            "{} Installed execman {} to {}",
            "✓".green(),
            record.version,
            display_path(&record.path)
        );

        if let Ok(current) = std::env::current_exe()
            && current != record.path
        {
            println!(
                "\nNote: you ran execman from {}. That copy can be deleted if you no longer need it.",
                current.display()
            );
        }

        let on_path =
            std::env::var_os("PATH").is_some_and(|path| path_list_contains(&path, &report.install_dir));
        if !on_path {
            print_path_hint(&report.install_dir);
        }
        Ok(())
    }
}

fn print_path_hint(dir: &Path) {
    println!("\n{} {} is not on your PATH.", "Note:".yellow(), dir.display());
    println!("Add it by putting this line in your ~/.bashrc or ~/.profile:");
    println!("  export PATH=\"{}:$PATH\"", dir.display());
}
