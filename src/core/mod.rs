//! Core types for the updater
//!
//! This module holds the error taxonomy shared by every phase of an update run:
//! - [`UpdaterError`] - Enumerated failure classes, each with its own exit code
//! - [`ErrorContext`] - User-friendly error wrapper with details and suggestions
//! - [`user_friendly_error`] - Convert any error into an [`ErrorContext`]
//!
//! All fallible operations return [`anyhow::Result`]; typed errors are raised at the
//! point of failure and recovered by [`find_updater_error`] when reporting.

pub mod error;

pub use error::{
    EXIT_GENERIC_FAILURE, EXIT_USAGE, ErrorContext, UpdaterError, exit_code_for, find_updater_error,
    user_friendly_error,
};
