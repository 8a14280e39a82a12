use clap::ValueEnum;
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;

/// Version string the remote `/version` endpoint must return for a run to proceed.
pub const UPDATER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Location of the plaintext file holding the updater endpoint base URI.
pub const DEFAULT_BOOTSTRAP_URL: &str =
    "https://raw.githubusercontent.com/keitannunes/TPSDir/main/updaterUri.txt";

/// File name of the downloaded archive inside the install directory.
pub const DEFAULT_ARCHIVE_NAME: &str = "update.zip";

/// Name prefix of the legacy cabinet directories.
pub const CABINET_PREFIX: &str = "CabinetInfo";

/// What to do when cabinet deletion fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PruneFailurePolicy {
    /// Report the failure and still persist the new version.
    #[default]
    Continue,
    /// Report the failure and end the run without rewriting the config.
    Abort,
}

/// Values that stay fixed for the duration of one run.
///
/// Built once at startup from compile-time constants and CLI flags and handed to
/// the [`Updater`](crate::update::Updater).
///
/// # Examples
///
/// ```rust
/// use egts_updater::update::{PruneFailurePolicy, RuntimeSettings};
///
/// let settings = RuntimeSettings::default()
///     .with_install_dir("/games/egts")
///     .with_prune_failure(PruneFailurePolicy::Abort);
/// assert_eq!(settings.archive_path(), std::path::Path::new("/games/egts/update.zip"));
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    /// Version this binary identifies as during the self-version check.
    pub updater_version: String,
    /// Bootstrap URL for endpoint discovery.
    pub bootstrap_url: String,
    /// Path of the configuration file.
    pub config_path: PathBuf,
    /// Directory the update archive is extracted into.
    pub install_dir: PathBuf,
    /// File name of the temporary archive inside `install_dir`.
    pub archive_name: String,
    /// Prefix of directories removed when a release asks for cabinet deletion.
    pub cabinet_prefix: String,
    /// Behaviour when cabinet deletion fails.
    pub prune_failure: PruneFailurePolicy,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            updater_version: UPDATER_VERSION.to_string(),
            bootstrap_url: DEFAULT_BOOTSTRAP_URL.to_string(),
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            install_dir: PathBuf::from("."),
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
            cabinet_prefix: CABINET_PREFIX.to_string(),
            prune_failure: PruneFailurePolicy::default(),
        }
    }
}

impl RuntimeSettings {
    /// Override the version reported to the self-version check.
    #[must_use]
    pub fn with_updater_version(mut self, version: impl Into<String>) -> Self {
        self.updater_version = version.into();
        self
    }

    /// Override the bootstrap URL.
    #[must_use]
    pub fn with_bootstrap_url(mut self, url: impl Into<String>) -> Self {
        self.bootstrap_url = url.into();
        self
    }

    /// Override the configuration file path.
    #[must_use]
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    /// Override the installation directory.
    #[must_use]
    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = dir.into();
        self
    }

    /// Select the cabinet deletion failure policy.
    #[must_use]
    pub const fn with_prune_failure(mut self, policy: PruneFailurePolicy) -> Self {
        self.prune_failure = policy;
        self
    }

    /// Full path of the temporary archive.
    #[must_use]
    pub fn archive_path(&self) -> PathBuf {
        self.install_dir.join(&self.archive_name)
    }
}
