//! Progress indicators
//!
//! Thin wrapper over `indicatif` with execman styling. Downloads get a
//! byte-counting bar, release lookups get a spinner.
//!
//! # Environment Variables
//!
//! - `EXECMAN_NO_PROGRESS`: Set to any value to disable all progress indicators
//!
//! The `--no-progress` flag has the same effect through [`disable_progress`].
//!
//! # Examples
//!
//! ```rust
//! use execman::utils::progress::ProgressBar;
//!
//! let bar = ProgressBar::new_download(1024);
//! bar.set_prefix("ripgrep");
//! bar.inc(512);
//! bar.inc(512);
//! bar.finish_and_clear();
//!
//! let spinner = ProgressBar::new_spinner();
//! spinner.set_message("Fetching latest release...");
//! spinner.finish_and_clear();
//! ```

use crate::constants::ENV_NO_PROGRESS;
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

static PROGRESS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Disables progress indicators for the rest of the process.
pub fn disable_progress() {
    PROGRESS_DISABLED.store(true, Ordering::Relaxed);
}

fn is_progress_disabled() -> bool {
    PROGRESS_DISABLED.load(Ordering::Relaxed) || std::env::var_os(ENV_NO_PROGRESS).is_some()
}

/// A progress bar with consistent styling.
///
/// When progress is disabled the bar is hidden and silently ignores all
/// updates, so callers never need to branch on it.
#[derive(Clone, Debug)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// A bar counting `len` bytes. A length of zero means unknown.
    pub fn new_download(len: u64) -> Self {
        Self::styled(|| {
            let bar = IndicatifBar::new(len);
            bar.set_style(ProgressStyle::download());
            bar
        })
    }

    /// A spinner for work of unknown length.
    pub fn new_spinner() -> Self {
        Self::styled(|| {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(ProgressStyle::spinner());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        })
    }

    /// A bar that never draws.
    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    fn styled(build: impl FnOnce() -> IndicatifBar) -> Self {
        if is_progress_disabled() {
            Self::hidden()
        } else {
            Self {
                inner: build(),
            }
        }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    /// Updates the total once it becomes known (e.g. from `Content-Length`).
    pub fn set_length(&self, len: u64) {
        self.inner.set_length(len);
    }

    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

/// Pre-configured indicatif styles.
pub struct ProgressStyle;

impl ProgressStyle {
    /// `{prefix} {spinner} {msg}` with Braille tick strings.
    pub fn spinner() -> IndicatifStyle {
        IndicatifStyle::default_spinner()
            .template("{prefix:.bold} {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| IndicatifStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
    }

    /// `{prefix} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})`
    pub fn download() -> IndicatifStyle {
        IndicatifStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| IndicatifStyle::default_bar())
            .progress_chars("━╸━")
    }
}
