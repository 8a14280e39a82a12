//! Command-line interface for `egts-updater`.
//!
//! The binary has no subcommands: every invocation performs one update run in
//! the current (or `--install-dir`) game directory.
//!
//! # Usage
//!
//! ```bash
//! # Interactive run from the game directory
//! egts-updater
//!
//! # Unattended run with debug logs
//! egts-updater --yes --verbose
//!
//! # Different layout
//! egts-updater --config /opt/egts/egts.toml --install-dir /opt/egts
//! ```
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug logging on stderr
//! - `--quiet` - Disable logging
//! - `--no-progress` - Hide the download and extraction indicators
//!
//! `RUST_LOG` always takes precedence over `--verbose`/`--quiet`.
//!
//! # Environment Variables
//!
//! - `EGTS_BOOTSTRAP_URL` - Overrides the bootstrap URL (same as `--bootstrap-url`)
//! - `EGTS_NO_PROGRESS` - Disables progress indicators
//! - `RUST_LOG` - Log filter for `tracing`

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::update::{
    AutoConfirm, DEFAULT_BOOTSTRAP_URL, HttpReleaseApi, LinePrompt, PruneFailurePolicy,
    RuntimeSettings, UpdateOutcome, Updater,
};
use crate::utils::progress::disable_progress;


/// Log filter used with `--verbose`.
pub const VERBOSE_LOG_FILTER: &str = "egts_updater=debug";

/// Log filter used without `--verbose` or `--quiet`.
pub const DEFAULT_LOG_FILTER: &str = "egts_updater=warn";

/// Runtime configuration derived from global CLI flags.
///
/// Kept separate from [`Cli`] so tests can inspect how flags are interpreted
/// without touching the process state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// `tracing` filter directive. `None` disables logging unless `RUST_LOG` is set.
    pub log_level: Option<String>,

    /// Whether progress indicators are hidden.
    pub no_progress: bool,
}

impl CliConfig {
    /// Install the logging subscriber and progress preference for this process.
    ///
    /// Logs go to stderr so they never interleave with the status lines on
    /// stdout. Calling this more than once keeps the first subscriber.
    pub fn apply(&self) {
        if self.no_progress {
            disable_progress();
        }

        let filter = if std::env::var_os("RUST_LOG").is_some() {
            EnvFilter::from_default_env()
        } else if let Some(level) = &self.log_level {
            EnvFilter::new(level)
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Self-update client for an EGTS game installation.
///
/// Resolves the update endpoint, checks that this updater is current, asks the
/// server for a newer release of the configured channel and applies it.
#[derive(Parser, Debug)]
#[command(
    name = "egts-updater",
    about = "Update an EGTS game installation to the latest release",
    version,
    long_about = "Checks the release server for a newer build of the configured release channel, \
                  downloads and extracts it into the game directory and records the new version in egts.toml."
)]
pub struct Cli {
    /// Path of the updater configuration file.
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Game directory the update is extracted into.
    #[arg(short = 'd', long, value_name = "DIR", default_value = ".")]
    install_dir: PathBuf,

    /// URL of the plaintext document holding the update endpoint.
    #[arg(long, value_name = "URL", env = "EGTS_BOOTSTRAP_URL", default_value = DEFAULT_BOOTSTRAP_URL)]
    bootstrap_url: String,

    /// Start the download without waiting for Enter.
    #[arg(short = 'y', long)]
    yes: bool,

    /// What to do when the CabinetInfo directories cannot be deleted.
    ///
    /// `continue` records the new version anyway; `abort` ends the run with an
    /// error and leaves the configuration untouched.
    #[arg(long, value_enum, value_name = "POLICY", default_value_t = PruneFailurePolicy::Continue)]
    on_prune_failure: PruneFailurePolicy,

    /// Enable debug logging on stderr.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Disable logging. Errors are still reported.
    #[arg(short, long)]
    quiet: bool,

    /// Hide progress bars and spinners.
    #[arg(long)]
    no_progress: bool,
}

impl Cli {
    /// Run the updater with the configuration derived from the parsed flags.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing update step.
    pub async fn execute(self) -> Result<UpdateOutcome> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    ///
    /// ```rust
    /// use clap::Parser;
    /// use egts_updater::cli::Cli;
    ///
    /// let cli = Cli::parse_from(["egts-updater", "--verbose"]);
    /// assert_eq!(cli.build_config().log_level.as_deref(), Some("egts_updater=debug"));
    /// ```
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some(VERBOSE_LOG_FILTER.to_string())
        } else if self.quiet {
            None
        } else {
            Some(DEFAULT_LOG_FILTER.to_string())
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress,
        }
    }

    /// Build the per-run settings from the parsed flags.
    #[must_use]
    pub fn runtime_settings(&self) -> RuntimeSettings {
        RuntimeSettings::default()
            .with_config_path(&self.config)
            .with_install_dir(&self.install_dir)
            .with_bootstrap_url(&self.bootstrap_url)
            .with_prune_failure(self.on_prune_failure)
    }

    /// Run the updater with an explicit [`CliConfig`].
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing update step.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<UpdateOutcome> {
        config.apply();

        let settings = self.runtime_settings();
        debug!("Runtime settings: {:?}", settings);

        let api = HttpReleaseApi::new()?;
        if self.yes {
            Updater::new(settings, api, AutoConfirm).run().await
        } else {
            Updater::new(settings, api, LinePrompt::stdin()).run().await
        }
    }
}
