//! EGTS Updater - self-update client for an EGTS game installation
//!
//! The updater keeps a game directory in sync with the release channel named in
//! its `egts.toml`. A run discovers the update endpoint through a bootstrap
//! document, refuses to continue when the updater itself is outdated, asks the
//! server whether the recorded version is current and, if not, downloads the
//! release archive, extracts it over the installation and records the new
//! version.
//!
//! # Configuration (`egts.toml`)
//!
//! ```toml
//! [updater]
//! release = "prod"
//! version = "1.0.0"
//! password = "secret"
//! ```
//!
//! # Core Modules
//!
//! - [`cli`] - Command-line parsing and logging setup
//! - [`config`] - Loading and atomically rewriting `egts.toml`
//! - [`core`] - Error taxonomy, exit codes and user-facing error display
//! - [`update`] - Release negotiation, download, extraction and cabinet cleanup
//! - [`utils`] - Path cleaning, atomic writes and progress indicators
//!
//! # Exit Codes
//!
//! `0` on success, including when the installation is already up to date. Every
//! failure class has its own non-zero code, see [`core::error`].

pub mod cli;
pub mod config;
pub mod core;
pub mod update;
pub mod utils;
