//! execman - an executable manager for GitHub releases
//!
//! execman installs standalone binaries published as GitHub release assets,
//! verifies them against the checksum manifests projects publish alongside
//! them, and records every installation in a JSON registry so that the tools
//! can later be checked, updated and removed.
//!
//! # Architecture Overview
//!
//! A command flows through a small set of single-purpose modules:
//!
//! ```text
//! source -> release -> download -> verification -> archive -> (symlink) -> registry
//! ```
//!
//! The engines ([`installer`], [`update`], [`check`], [`remove`]) thread an
//! explicit `&mut Registry` through every call and ask their questions
//! through the [`prompt::Prompter`] trait, so the same code runs behind the
//! CLI and headless in tests. Release metadata and downloads go through the
//! [`release::ReleaseHost`] trait, implemented for the GitHub REST API by
//! [`release::GithubClient`].
//!
//! # Core Modules
//!
//! - [`source`] - parsing `host/owner/repo[@version]` references
//! - [`release`] - release lookup, asset selection and the GitHub client
//! - [`download`] - streaming asset and checksum manifest downloads
//! - [`verification`] - SHA-256 hashing and checksum manifests
//! - [`archive`] - pulling the executable out of `.tar.gz` and `.zip` assets
//! - [`symlink`] - deciding which physical path a mutation applies to
//! - [`registry`] - the persistent record of managed executables
//!
//! ## Engines
//! - [`installer`] - install a new executable
//! - [`update`] - update one or all managed executables, with backups
//! - [`check`] - integrity and update status
//! - [`remove`] - remove or forget a managed executable
//! - [`init`] - first-run setup that installs execman itself
//!
//! ## Supporting Modules
//! - [`cli`] - the `execman` command-line interface
//! - [`config`] - optional user configuration
//! - [`core`] - error types and user-facing error rendering
//! - [`prompt`] - operator prompts
//! - [`utils`] - file system, platform and progress helpers
//!
//! # Registry Format
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "executables": {
//!     "fd": {
//!       "source": "https://github.com/sharkdp/fd",
//!       "version": "v10.2.0",
//!       "installed_at": "2026-03-01T12:00:00Z",
//!       "path": "/home/me/.local/bin/fd",
//!       "platform": "linux/amd64",
//!       "checksum": "6ab2..."
//!     }
//!   }
//! }
//! ```

pub mod archive;
pub mod check;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod download;
pub mod init;
pub mod installer;
pub mod prompt;
pub mod registry;
pub mod release;
pub mod remove;
pub mod source;
pub mod symlink;
pub mod update;
pub mod utils;
pub mod verification;

// test_utils is available for unit tests and, through the `test-utils`
// feature, for the integration suite
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
