//! Integration test suite for execman
//!
//! End-to-end tests of the engines against an in-memory release host, plus
//! a handful of tests driving the `execman` binary itself.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! RUST_LOG=execman=debug cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **common**: shared harness (temp dirs, fake host, registry)
//! - **init**: first-run setup
//! - **install**: install pipeline, duplicates, checksum failures
//! - **update**: single updates, reinstalls, symlinks, backups, batches
//! - **manage**: check, remove and forget
//! - **registry**: on-disk registry behavior
//! - **cli**: the `execman` binary

mod common;

mod cli;
mod init;
mod manage;
mod registry;
mod update;
