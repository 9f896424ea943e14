//! Core types for execman
//!
//! The foundation shared by every engine: the closed error taxonomy and the
//! library-wide `Result` alias.
//!
//! - [`ExecmanError`] - every failure mode the engines can report
//! - [`ErrorContext`] - user-facing wrapper with details and suggestions
//! - [`user_friendly_error`] - converts any [`anyhow::Error`] for display
//!
//! Library code returns [`Result<T>`]. The binary works with
//! [`anyhow::Result`] and converts at the edge, so typed errors stay
//! inspectable right up to the point where they are printed.

pub mod error;

pub use error::{ErrorContext, ExecmanError, user_friendly_error};

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, ExecmanError>;
