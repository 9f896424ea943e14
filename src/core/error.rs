//! Error handling for execman
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** so engine callers can branch on the kind of failure
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`ExecmanError`] - the closed set of failure kinds, each carrying the
//!   structured context (asset lists, paths, digests) needed to act on it
//! - [`ErrorContext`] - wrapper that adds a suggestion and details for display
//!
//! Library code returns [`Result<T>`](crate::core::Result). The CLI layer works
//! with [`anyhow::Error`] and converts it for display with [`user_friendly_error`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use execman::core::{ExecmanError, user_friendly_error};
//!
//! let err = ExecmanError::NotManaged {
//!     name: "ripgrep".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(err));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The closed set of failures the install/update engine can report.
///
/// Variants carry structured fields rather than preformatted strings so that
/// callers can react to the failure (retry a [`ExecmanError::Network`] error,
/// show the asset list of [`ExecmanError::NoMatchingAsset`], etc.).
#[derive(Error, Debug, Clone)]
pub enum ExecmanError {
    /// The source reference could not be split into host/owner/repo.
    #[error("Malformed source reference '{reference}': {reason}")]
    MalformedSource {
        /// The reference as given by the user
        reference: String,
        /// What was wrong with it
        reason: String,
    },

    /// The release host has no release matching the request.
    #[error("No release {} found for {repository}", version.as_deref().unwrap_or("(latest)"))]
    ReleaseNotFound {
        /// `owner/repo`
        repository: String,
        /// The requested tag, or `None` when the latest release was requested
        version: Option<String>,
    },

    /// Transport or API failure talking to the release host.
    #[error("Network error: {operation}")]
    Network {
        /// What was being attempted (e.g. "fetch latest release")
        operation: String,
        /// Underlying failure
        reason: String,
    },

    /// None of the asset naming templates matched exactly one asset.
    #[error("No release asset matches platform {platform}")]
    NoMatchingAsset {
        /// `os/arch` that was searched for
        platform: String,
        /// Every asset name in the release, for presenting alternatives
        assets: Vec<String>,
    },

    /// The downloaded artifact does not match its manifest entry.
    #[error("Checksum mismatch for '{asset}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Asset file name
        asset: String,
        /// Digest listed in the manifest
        expected: String,
        /// Digest of the downloaded bytes
        actual: String,
        /// Where the downloaded artifact was preserved
        artifact: PathBuf,
    },

    /// The archive holds no unambiguous executable payload.
    #[error("No executable found in archive {}", archive.display())]
    NoExecutableFound {
        /// Archive that was searched
        archive: PathBuf,
        /// Regular files seen in the archive
        candidates: Vec<String>,
    },

    /// The archive is corrupt or uses an unsupported format.
    #[error("Failed to extract {}: {reason}", archive.display())]
    Extract {
        /// Archive that failed to extract
        archive: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// The install target is a symlink and no interactive choice can be made.
    #[error(
        "{} is a symlink to {}\n       Cannot proceed in non-interactive mode.\n       Run without --yes to choose how to handle symlinks",
        path.display(),
        target.display()
    )]
    SymlinkAmbiguity {
        /// The symlink itself
        path: PathBuf,
        /// What the symlink points to
        target: PathBuf,
    },

    /// The operating system refused access to a path.
    #[error("Permission denied: {operation} {}", path.display())]
    PermissionDenied {
        /// What was being attempted
        operation: String,
        /// Path that could not be accessed
        path: PathBuf,
    },

    /// The registry could not be read, parsed, or written.
    #[error("Registry error at {}: {reason}", path.display())]
    RegistryIo {
        /// Registry file location
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// The configuration file could not be read or parsed.
    #[error("Configuration error at {}: {reason}", path.display())]
    Config {
        /// Config file location
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// The named executable has no registry entry.
    #[error("Executable '{name}' is not managed by execman")]
    NotManaged {
        /// Name that was looked up
        name: String,
    },

    /// Any other filesystem failure (disk full, missing directory, ...).
    #[error("File system error: {operation} {}: {reason}", path.display())]
    Io {
        /// What was being attempted
        operation: String,
        /// Path involved
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },
}

impl ExecmanError {
    /// Build an error from an [`std::io::Error`], keeping permission failures
    /// distinguishable from other I/O failures.
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let operation = operation.into();
        let path = path.into();
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied {
                operation,
                path,
            }
        } else {
            Self::Io {
                operation,
                path,
                reason: err.to_string(),
            }
        }
    }

    /// Build a network error from any displayable cause.
    pub fn network(operation: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Network {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether retrying the same request could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

/// An error paired with optional details and a suggestion for the user.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: anyhow::Error,
    /// What the user could do about it
    pub suggestion: Option<String>,
    /// Extra explanation (asset lists, digests, file paths)
    pub details: Option<String>,
}

impl ErrorContext {
    /// Wrap an error with no suggestion or details.
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self {
            error: error.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`] with suggestions.
///
/// [`ExecmanError`] values found anywhere in the chain get kind-specific
/// suggestions; bare I/O permission errors are recognized too. Everything
/// else is shown with its cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(err) = error.chain().find_map(|e| e.downcast_ref::<ExecmanError>()) {
        return create_error_context(err.clone());
    }

    if error
        .downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == std::io::ErrorKind::PermissionDenied)
    {
        return ErrorContext::new(error).with_suggestion(
            "Check the permissions of the install directory, or choose another one with --into",
        );
    }

    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    let mut ctx = ErrorContext::new(error);
    if !chain.is_empty() {
        let mut details = String::from("Caused by:");
        for (i, cause) in chain.iter().enumerate() {
            details.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
        ctx = ctx.with_details(details);
    }
    ctx
}

fn create_error_context(error: ExecmanError) -> ErrorContext {
    match &error {
        ExecmanError::MalformedSource { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Use the form github.com/<owner>/<repo> or github.com/<owner>/<repo>@<tag>"),

        ExecmanError::ReleaseNotFound { repository, version } => {
            let suggestion = match version {
                Some(v) => format!(
                    "Check that the tag '{v}' exists on https://github.com/{repository}/releases"
                ),
                None => "The repository has no published releases. Try --include-prereleases".to_string(),
            };
            ErrorContext::new(error.clone()).with_suggestion(suggestion)
        }

        ExecmanError::Network { reason, .. } => ErrorContext::new(error.clone())
            .with_suggestion("Check your internet connection. Set GITHUB_TOKEN if you are being rate limited")
            .with_details(reason.clone()),

        ExecmanError::NoMatchingAsset { assets, .. } => {
            let listing = if assets.is_empty() {
                "The release has no assets".to_string()
            } else {
                let mut s = String::from("Available assets:");
                for name in assets {
                    s.push_str(&format!("\n  - {name}"));
                }
                s
            };
            ErrorContext::new(error.clone())
                .with_suggestion("The project may not publish binaries for this platform")
                .with_details(listing)
        }

        ExecmanError::ChecksumMismatch { artifact, .. } => ErrorContext::new(error.clone())
            .with_suggestion("Nothing was installed. Retry the download; report the release if it keeps failing")
            .with_details(format!("The downloaded artifact was kept at {}", artifact.display())),

        ExecmanError::NoExecutableFound { candidates, .. } => ErrorContext::new(error.clone())
            .with_details(if candidates.is_empty() {
                "The archive contains no regular files".to_string()
            } else {
                format!("Candidates: {}", candidates.join(", "))
            }),

        ExecmanError::PermissionDenied { .. } => ErrorContext::new(error.clone())
            .with_suggestion(match cfg!(windows) {
                true => "Run as Administrator or check file permissions in File Explorer",
                false => "Check file permissions with 'ls -la' or choose a directory you own",
            }),

        ExecmanError::NotManaged { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Install it first with 'execman install github.com/<owner>/<repo>'"),

        _ => ErrorContext::new(error.clone()),
    }
}
