//! Global constants used throughout the execman codebase.
//!
//! Environment variable names, retry parameters, and default locations live
//! here so that magic values stay discoverable.

use std::time::Duration;

/// Schema version written into every registry file.
///
/// Registries declaring a different version are rejected on load.
pub const REGISTRY_SCHEMA_VERSION: u32 = 1;

/// Default base URL of the GitHub REST API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// The only release host currently supported.
pub const GITHUB_HOST: &str = "github.com";

/// Repository `execman init` installs execman itself from.
pub const SELF_SOURCE: &str = "github.com/sfkleach/execman";

/// Overrides the registry file location.
pub const ENV_REGISTRY: &str = "EXECMAN_REGISTRY";

/// Overrides the configuration file location.
pub const ENV_CONFIG: &str = "EXECMAN_CONFIG";

/// Overrides the release API base URL.
pub const ENV_API_URL: &str = "EXECMAN_API_URL";

/// Disables all progress indicators when set to any value.
pub const ENV_NO_PROGRESS: &str = "EXECMAN_NO_PROGRESS";

/// Tokens consulted, in order, for authenticated API requests.
pub const TOKEN_ENV_VARS: &[&str] = &["GITHUB_TOKEN", "GH_TOKEN"];

/// Directory name used under the platform config directory.
pub const APP_DIR_NAME: &str = "execman";

/// Registry file name inside [`APP_DIR_NAME`].
pub const REGISTRY_FILE_NAME: &str = "registry.json";

/// Config file name inside [`APP_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Suffix of the backup written next to an executable before an update.
pub const BACKUP_SUFFIX: &str = ".backup";

/// Suffix of the prior binary kept aside until a replacement is recorded.
pub const ROLLBACK_SUFFIX: &str = ".execman-old";

/// Suffix of the staged binary renamed over the destination during placement.
pub const STAGED_SUFFIX: &str = ".execman-new";

/// Starting delay for exponential backoff on release host requests (200ms).
pub const STARTING_BACKOFF_DELAY_MS: u64 = 200;

/// Maximum backoff delay between release host retries (5 seconds).
pub const MAX_BACKOFF_DELAY_MS: u64 = 5_000;

/// Number of retries for transient release host failures.
pub const MAX_NETWORK_RETRIES: usize = 3;

/// Timeout for a single API request (30 seconds).
pub const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for establishing a connection to the release host (30 seconds).
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// A download fails if no data arrives for this long (5 minutes).
pub const DOWNLOAD_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(300);

/// Number of attempts made when restoring a backup.
pub const RESTORE_ATTEMPTS: u32 = 3;
