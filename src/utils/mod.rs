//! Cross-platform utilities and helpers
//!
//! # Modules
//!
//! - [`fs`] - Atomic writes, atomic binary replacement and staging directories
//! - [`platform`] - Release-asset platform names and path helpers
//! - [`progress`] - Progress bars and spinners for downloads and lookups

pub mod fs;
pub mod platform;
pub mod progress;

pub use fs::{TempDir, atomic_replace, atomic_write, ensure_dir};
pub use platform::Platform;
pub use progress::ProgressBar;
