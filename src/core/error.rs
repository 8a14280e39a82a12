//! Error handling for the updater
//!
//! This module provides the error taxonomy and user-friendly error reporting for
//! `egts-updater`. The error system is built around two ideas:
//! 1. **Strongly-typed errors** that name the failing step precisely
//! 2. **User-friendly messages** with actionable suggestions for the operator
//!
//! # Architecture
//!
//! - [`UpdaterError`] - Enumerated error types for every failure class of a run
//! - [`ErrorContext`] - Wrapper that adds details and suggestions for display
//!
//! Code throughout the crate returns [`anyhow::Result`] and attaches context with
//! `.context()`. Typed errors are raised at the point of failure and recovered
//! later by walking the error chain, see [`find_updater_error`].
//!
//! # Exit Codes
//!
//! Every variant maps to a distinct process exit status through
//! [`UpdaterError::exit_code`], so scripted invocations can tell failures apart:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success, including "already up to date" |
//! | 1 | Unclassified failure |
//! | 2 | Configuration could not be read or decoded |
//! | 3 | Network/transport failure |
//! | 4 | Unexpected HTTP status |
//! | 5 | Updater is outdated |
//! | 6 | Response body could not be decoded |
//! | 7 | Filesystem failure |
//! | 8 | Archive entry escapes the installation directory |
//! | 9 | Downloaded file is not a readable zip archive |
//! | 10 | Cabinet deletion failed (abort policy) |
//! | 11 | Configuration could not be written |
//! | 12 | Invalid command-line usage |
//!
//! # Examples
//!
//! ```rust,no_run
//! use egts_updater::core::{UpdaterError, user_friendly_error};
//!
//! let error = anyhow::Error::from(UpdaterError::UpdaterOutdated {
//!     current: "0.1.1".to_string(),
//!     latest: "0.2.0".to_string(),
//! });
//! let context = user_friendly_error(error);
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Exit status used for errors that carry no [`UpdaterError`].
pub const EXIT_GENERIC_FAILURE: i32 = 1;

/// Exit status for command-line usage errors reported by clap.
pub const EXIT_USAGE: i32 = 12;

/// The main error type for updater runs.
///
/// Each variant represents one failure class of the update protocol. Fields carry
/// the step, path or URL involved so messages can name what went wrong.
#[derive(Error, Debug, Clone)]
pub enum UpdaterError {
    /// The configuration file could not be read.
    #[error("Failed to read config file: {path}")]
    ConfigRead {
        /// Path of the configuration file
        path: String,
        /// Underlying I/O failure
        reason: String,
    },

    /// The configuration file is not valid TOML or misses required fields.
    #[error("Failed to decode config file {path}: {reason}")]
    ConfigParse {
        /// Path of the configuration file
        path: String,
        /// Decoder message
        reason: String,
    },

    /// The configuration file could not be rewritten at the end of a run.
    #[error("Failed to write config file {path}: {reason}")]
    ConfigWrite {
        /// Path of the configuration file
        path: String,
        /// Underlying failure
        reason: String,
    },

    /// A request could not be sent or its body could not be read.
    #[error("Network error while {operation} ({url}): {reason}")]
    Network {
        /// Protocol step, e.g. "checking the latest release"
        operation: String,
        /// Requested URL
        url: String,
        /// Transport failure
        reason: String,
    },

    /// The server answered with a status the protocol does not accept.
    #[error("Unexpected response while {operation} ({url}): HTTP {status}")]
    UnexpectedStatus {
        /// Protocol step
        operation: String,
        /// Requested URL
        url: String,
        /// Received HTTP status code
        status: u16,
    },

    /// The remote updater version differs from the embedded one.
    #[error("Updater is outdated, please download the latest updater (curr: {current}, latest: {latest})")]
    UpdaterOutdated {
        /// Version embedded in this binary
        current: String,
        /// Version announced by the endpoint
        latest: String,
    },

    /// A response body was not in the expected format.
    #[error("Failed to decode response while {operation}: {reason}")]
    ResponseDecode {
        /// Protocol step
        operation: String,
        /// Decoder message
        reason: String,
    },

    /// A filesystem operation failed.
    #[error("File system error during {operation}: {path}")]
    FileSystem {
        /// The operation that failed
        operation: String,
        /// The path involved
        path: String,
        /// Underlying failure
        reason: String,
    },

    /// An archive entry would be written outside the installation directory.
    #[error("illegal file path: {path} (archive entry '{entry}')")]
    PathTraversal {
        /// Entry name as stored in the archive
        entry: String,
        /// Path the entry resolved to
        path: String,
    },

    /// The downloaded file could not be opened as a zip archive.
    #[error("Invalid update archive {path}: {reason}")]
    InvalidArchive {
        /// Archive path
        path: String,
        /// Decoder message
        reason: String,
    },

    /// Removing a cabinet directory failed.
    #[error("Failed to delete cabinet directory {path}: {reason}")]
    PruneFailed {
        /// Directory that could not be deleted
        path: String,
        /// Underlying failure
        reason: String,
    },

    /// The operator confirmation could not be read.
    #[error("Failed to read confirmation from standard input: {reason}")]
    ConfirmationFailed {
        /// Underlying failure
        reason: String,
    },
}

impl UpdaterError {
    /// Process exit status for this failure class.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigRead { .. } | Self::ConfigParse { .. } => 2,
            Self::Network { .. } => 3,
            Self::UnexpectedStatus { .. } => 4,
            Self::UpdaterOutdated { .. } => 5,
            Self::ResponseDecode { .. } => 6,
            Self::FileSystem { .. } | Self::ConfirmationFailed { .. } => 7,
            Self::PathTraversal { .. } => 8,
            Self::InvalidArchive { .. } => 9,
            Self::PruneFailed { .. } => 10,
            Self::ConfigWrite { .. } => 11,
        }
    }
}

/// Finds the first [`UpdaterError`] in an error chain.
///
/// Call sites wrap typed errors with `.context()`, so the typed error is not
/// necessarily the outermost one.
#[must_use]
pub fn find_updater_error(error: &anyhow::Error) -> Option<&UpdaterError> {
    error.chain().find_map(|cause| cause.downcast_ref::<UpdaterError>())
}

/// Exit status for an arbitrary error returned from a run.
#[must_use]
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    find_updater_error(error).map_or(EXIT_GENERIC_FAILURE, UpdaterError::exit_code)
}

/// Error wrapper with optional details and suggestion for terminal display.
#[derive(Debug)]
pub struct ErrorContext {
    /// Headline message
    pub message: String,
    /// Optional additional details about the error
    pub details: Option<String>,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Exit status the process should terminate with
    pub exit_code: i32,
}

impl ErrorContext {
    /// Create a context with only a headline.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
            suggestion: None,
            exit_code: EXIT_GENERIC_FAILURE,
        }
    }

    /// Add a suggestion for resolving the error.
    ///
    /// Suggestions are displayed in green to draw attention.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error, displayed in yellow.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Set the exit status.
    #[must_use]
    pub const fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    /// Display the error context to stderr with terminal colors.
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

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
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with suggestions.
///
/// The headline is the full context chain (`outer: inner: cause`), so the step
/// that failed is always named. When an [`UpdaterError`] is present in the chain
/// the matching suggestion and exit code are attached.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let message = format!("{error:#}");
    let context = ErrorContext::new(message);

    let Some(updater_error) = find_updater_error(&error) else {
        return context;
    };

    let context = context.with_exit_code(updater_error.exit_code());

    match updater_error {
        UpdaterError::ConfigRead { path, reason } => context
            .with_details(reason.clone())
            .with_suggestion(format!(
                "Run the updater from the game directory or pass --config pointing at {path}"
            )),
        UpdaterError::ConfigParse { .. } => context
            .with_details("The config file must contain an [updater] table with release, version and password")
            .with_suggestion("Check the TOML syntax of the config file. Verify quotes and brackets"),
        UpdaterError::ConfigWrite { path, .. } => context
            .with_details("The update itself was applied, only the version marker is stale")
            .with_suggestion(format!("Check write permissions for {path}")),
        UpdaterError::Network { .. } => context
            .with_suggestion("Check your internet connection and run the updater again"),
        UpdaterError::UnexpectedStatus { status, .. } if *status == 401 || *status == 403 => {
            context.with_suggestion("Check the password in the [updater] section of the config file")
        }
        UpdaterError::UnexpectedStatus { .. } => context
            .with_suggestion("The update server may be unavailable, try again later"),
        UpdaterError::UpdaterOutdated { .. } => context
            .with_suggestion("Download the latest updater before updating the game"),
        UpdaterError::ResponseDecode { .. } => context
            .with_details("The update server returned a response in an unexpected format"),
        UpdaterError::FileSystem { reason, .. } => context
            .with_details(reason.clone())
            .with_suggestion("Check that the game is not running and that the directory is writable"),
        UpdaterError::PathTraversal { .. } => context
            .with_details("The update archive contains an entry that would be written outside the game directory")
            .with_suggestion("Do not retry with this archive; report it to the release maintainers"),
        UpdaterError::InvalidArchive { .. } => context
            .with_details("The downloaded update archive is corrupted or incomplete")
            .with_suggestion("Run the updater again to download the archive anew"),
        UpdaterError::PruneFailed { .. } => context
            .with_suggestion("Please delete the CabinetInfo directories manually"),
        UpdaterError::ConfirmationFailed { .. } => context
            .with_suggestion("Run the updater with --yes to skip the confirmation prompt"),
    }
}
