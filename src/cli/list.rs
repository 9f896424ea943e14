//! `execman list`

use super::{CommandContext, display_path};
use crate::core::ExecmanError;
use crate::registry::{ExecutableRecord, Registry};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct ListCommand {
    /// Show only this executable
    name: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Show every recorded field
    #[arg(short, long)]
    long: bool,
}

#[derive(Debug, Serialize)]
struct ListOutput<'a> {
    executables: Vec<ListItem<'a>>,
}

#[derive(Debug, Serialize)]
struct ListItem<'a> {
    name: &'a str,
    source: &'a str,
    version: &'a str,
    path: String,
    installed_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    platform: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    checksum: Option<&'a str>,
}

impl ListCommand {
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let registry = ctx.load_registry()?;
        let names = self.selected(&registry)?;
        let entries: Vec<(&str, &ExecutableRecord)> = names
            .iter()
            .filter_map(|name| registry.get(name).map(|record| (name.as_str(), record)))
            .collect();

        if self.json {
            let output = ListOutput {
                executables: entries.iter().map(|(name, record)| self.item(name, record)).collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        if entries.is_empty() {
            println!("No managed executables.");
            return Ok(());
        }

        if let [(name, record)] = entries.as_slice()
            && self.long
        {
            println!("{}\n", name.bold());
            println!("  Source:       {}", record.source);
            println!("  Version:      {}", record.version);
            println!("  Path:         {}", record.path.display());
            println!("  Platform:     {}", record.platform);
            println!("  Installed:    {}", record.installed_at.to_rfc3339());
            println!("  Checksum:     {}", record.checksum);
            return Ok(());
        }

        println!("Managed executables:\n");
        for (name, record) in entries {
            let source = record.source.trim_start_matches("https://");
            println!(
                "  {:<15} {:<12} {:<40} {}  {}",
                name.bold(),
                record.version.green(),
                source,
                record.installed_at.format("%Y-%m-%d"),
                display_path(&record.path)
            );
        }
        Ok(())
    }

    fn selected(&self, registry: &Registry) -> Result<Vec<String>> {
        match &self.name {
            Some(name) if !registry.contains(name) => Err(ExecmanError::NotManaged {
                name: name.clone(),
            }
            .into()),
            Some(name) => Ok(vec![name.clone()]),
            None => {
                let mut names = registry.list();
                names.sort();
                Ok(names)
            }
        }
    }

    fn item<'a>(&self, name: &'a str, record: &'a ExecutableRecord) -> ListItem<'a> {
        ListItem {
            name,
            source: &record.source,
            version: &record.version,
            path: record.path.display().to_string(),
            installed_at: record.installed_at.to_rfc3339(),
            platform: self.long.then_some(record.platform.as_str()),
            checksum: self.long.then_some(record.checksum.as_str()),
        }
    }
}
