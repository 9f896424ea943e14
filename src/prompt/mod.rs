//! Operator prompts.
//!
//! Engines never read stdin themselves. Each question is a typed [`Prompt`]
//! handed to a [`Prompter`]: [`StdinPrompter`] in the CLI, a scripted
//! prompter in tests. The [`Prompt`] text is rendered by its `Display`
//! implementation so that every front end asks the same thing.

use crate::core::{ExecmanError, Result};
use colored::Colorize;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};

/// A question the engine needs answered before it can continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// The requested version is already installed.
    ConfirmReinstall {
        name: String,
        version: String,
        path: PathBuf,
    },
    /// Final confirmation before installing.
    ConfirmInstall {
        repository: String,
        version: String,
        platform: String,
        target: PathBuf,
    },
    /// A managed executable's file is gone; choose what to reinstall.
    ///
    /// Expects `r`/`l` when the versions differ, `y`/`n` when they coincide.
    ReinstallMissing {
        name: String,
        path: PathBuf,
        recorded: String,
        latest: String,
    },
    /// A newer release exists.
    ConfirmUpdate {
        name: String,
        current: String,
        latest: String,
    },
    /// Whether to copy the current binary aside before replacing it.
    ConfirmBackup { path: PathBuf },
    /// The install target is a symlink. Expects `1`, `2` or anything else.
    Symlink { path: PathBuf, target: PathBuf },
    /// Delete the file and stop managing it.
    ConfirmRemove {
        name: String,
        source: String,
        version: String,
        path: PathBuf,
        /// Set when `path` is a symlink and the link target will be removed
        removes: Option<PathBuf>,
    },
    /// Stop managing, keep the file.
    ConfirmForget {
        name: String,
        source: String,
        version: String,
        path: PathBuf,
    },
}

impl Prompt {
    /// Whether a `y/n` answer of empty means yes.
    #[must_use]
    pub const fn default_yes(&self) -> bool {
        matches!(self, Self::ConfirmInstall { .. })
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfirmReinstall {
                name,
                version,
                path,
            } => {
                writeln!(
                    f,
                    "{} {name} version {version} is already installed at {}",
                    "Warning:".yellow(),
                    path.display()
                )?;
                write!(f, "Reinstall? [y/N]: ")
            }
            Self::ConfirmInstall {
                repository,
                version,
                platform,
                target,
            } => {
                writeln!(f, "\nInstallation Details:")?;
                writeln!(f, "  Repository: {repository}")?;
                writeln!(f, "  Version:    {version}")?;
                writeln!(f, "  Platform:   {platform}")?;
                writeln!(f, "  Target:     {}", target.display())?;
                write!(f, "\nProceed with installation? [Y/n]: ")
            }
            Self::ReinstallMissing {
                name,
                path,
                recorded,
                latest,
            } => {
                writeln!(f, "Executable file is {} at {}", "MISSING".red(), path.display())?;
                writeln!(f, "Recorded version:  {recorded}")?;
                writeln!(f, "Latest version:    {latest}\n")?;
                if recorded == latest {
                    write!(f, "Reinstall {name} {recorded}? [y/N]: ")
                } else {
                    write!(f, "Install {name}? [r]ecorded {recorded} / [l]atest {latest} / [N]o: ")
                }
            }
            Self::ConfirmUpdate {
                name,
                current,
                latest,
            } => {
                writeln!(f, "Current version: {current}")?;
                writeln!(f, "Latest version:  {latest}\n")?;
                write!(f, "Update {name} to {latest}? [y/N]: ")
            }
            Self::ConfirmBackup {
                path,
            } => write!(f, "Create backup of {}? [y/N]: ", path.display()),
            Self::Symlink {
                path,
                target,
            } => {
                writeln!(f, "\nNote: {} is a symlink to {}\n", path.display(), target.display())?;
                writeln!(f, "How would you like to proceed?")?;
                writeln!(f, "  [1] Replace the symlink target ({})", target.display())?;
                writeln!(f, "  [2] Replace the symlink itself ({})", path.display())?;
                writeln!(f, "  [3] Cancel")?;
                write!(f, "\nChoice [1/2/3]: ")
            }
            Self::ConfirmRemove {
                name,
                source,
                version,
                path,
                removes,
            } => {
                writeln!(f, "Remove {name}?\n")?;
                writeln!(f, "  Source:       {source}")?;
                writeln!(f, "  Version:      {version}")?;
                writeln!(f, "  Path:         {}", path.display())?;
                if let Some(target) = removes {
                    writeln!(f, "  Will remove:  {}", target.display())?;
                }
                write!(
                    f,
                    "\nThis will delete the executable file and remove it from management. Continue? [y/N]: "
                )
            }
            Self::ConfirmForget {
                name,
                source,
                version,
                path,
            } => {
                writeln!(f, "Forget {name}?\n")?;
                writeln!(f, "  Source:       {source}")?;
                writeln!(f, "  Version:      {version}")?;
                writeln!(f, "  Path:         {}", path.display())?;
                write!(
                    f,
                    "\nThis will stop tracking the executable but keep the file. Continue? [y/N]: "
                )
            }
        }
    }
}

/// Source of answers to [`Prompt`]s.
pub trait Prompter {
    /// Presents `prompt` and returns the raw answer, untrimmed.
    fn ask(&mut self, prompt: &Prompt) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Asks a yes/no question; an empty answer takes the prompt's default.
pub async fn confirm<P: Prompter + Send>(prompter: &mut P, prompt: &Prompt) -> Result<bool> {
    let answer = prompter.ask(prompt).await?;
    Ok(parse_yes_no(&answer, prompt.default_yes()))
}

/// `y`/`yes` and `n`/`no` in any case; anything else falls back to `default`
/// only when empty, otherwise means no.
#[must_use]
pub fn parse_yes_no(answer: &str, default: bool) -> bool {
    match answer.trim().to_lowercase().as_str() {
        "" => default,
        "y" | "yes" => true,
        _ => false,
    }
}

/// Prompts on stdout and reads answers from stdin.
pub struct StdinPrompter {
    reader: BufReader<Stdin>,
}

impl StdinPrompter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
        }
    }
}

impl Default for StdinPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for StdinPrompter {
    async fn ask(&mut self, prompt: &Prompt) -> Result<String> {
        let stdin_error = |e: std::io::Error| ExecmanError::io("read answer from", "<stdin>", e);

        print!("{prompt}");
        std::io::stdout().flush().map_err(|e| ExecmanError::io("write prompt to", "<stdout>", e))?;

        let mut response = String::new();
        self.reader.read_line(&mut response).await.map_err(stdin_error)?;
        Ok(response)
    }
}
