//! Source references for release repositories.
//!
//! A source reference names a repository on a release host and optionally a
//! release tag: `github.com/owner/repo` or `github.com/owner/repo@v1.2.3`.
//! The canonical repository URL stored in the registry
//! (`https://github.com/owner/repo`) parses back to the same reference, so
//! registry entries can be fed straight into a new release lookup.
//!
//! ```rust
//! use execman::source::SourceRef;
//!
//! let source = SourceRef::parse("github.com/BurntSushi/ripgrep@14.1.0").unwrap();
//! assert_eq!(source.owner, "BurntSushi");
//! assert_eq!(source.repo, "ripgrep");
//! assert_eq!(source.version.as_deref(), Some("14.1.0"));
//! assert_eq!(source.canonical_url(), "https://github.com/BurntSushi/ripgrep");
//! ```

use crate::core::{ExecmanError, Result};
use std::fmt;

/// A parsed `host/owner/repo[@version]` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// Release host, e.g. `github.com`
    pub host: String,
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name, which is also the installed executable's name
    pub repo: String,
    /// Requested tag; `None` means the latest release
    pub version: Option<String>,
}

impl SourceRef {
    /// Parses a source reference.
    ///
    /// Accepts an optional `https://` or `http://` scheme, a trailing `/`, and
    /// a trailing `.git` on the repository name. An empty `@` suffix is the
    /// same as no version. Owners and repository names never contain `@`, so
    /// everything after the first one is the tag. Segments after `owner/repo` are rejected so that
    /// URLs pointing into a repository (`/tree/main`) aren't silently
    /// truncated.
    ///
    /// # Errors
    ///
    /// [`ExecmanError::MalformedSource`] if host, owner or repo is missing or
    /// empty.
    pub fn parse(input: &str) -> Result<Self> {
        let malformed = |reason: &str| ExecmanError::MalformedSource {
            reference: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(malformed("reference is empty"));
        }

        let without_scheme = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);

        let (location, version) = match without_scheme.split_once('@') {
            Some((location, version)) => {
                let version = version.trim();
                (location, (!version.is_empty()).then(|| version.to_string()))
            }
            None => (without_scheme, None),
        };

        let location = location.trim_end_matches('/');
        let segments: Vec<&str> = location.split('/').collect();
        if segments.len() < 3 {
            return Err(malformed("expected host/owner/repo"));
        }
        if segments.len() > 3 {
            return Err(malformed("unexpected path segments after host/owner/repo"));
        }

        let host = segments[0];
        let owner = segments[1];
        let repo = segments[2].strip_suffix(".git").unwrap_or(segments[2]);

        if host.is_empty() {
            return Err(malformed("host is empty"));
        }
        if owner.is_empty() {
            return Err(malformed("owner is empty"));
        }
        if repo.is_empty() {
            return Err(malformed("repository name is empty"));
        }

        Ok(Self {
            host: host.to_ascii_lowercase(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            version,
        })
    }

    /// `https://{host}/{owner}/{repo}`, the form stored in the registry.
    #[must_use]
    pub fn canonical_url(&self) -> String {
        format!("https://{}/{}/{}", self.host, self.owner, self.repo)
    }

    /// `owner/repo`
    #[must_use]
    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// The same repository pinned to `version`.
    #[must_use]
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            ..self.clone()
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.host, self.owner, self.repo)?;
        if let Some(version) = &self.version {
            write!(f, "@{version}")?;
        }
        Ok(())
    }
}
