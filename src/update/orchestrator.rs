use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::UpdaterError;
use crate::update::api::{ReleaseApi, endpoint_url};
use crate::update::extract::{ExtractSummary, extract_zip};
use crate::update::prompt::Confirm;
use crate::update::prune::delete_directories;
use crate::update::release::{ReleaseCheck, ReleaseDescriptor, ReleaseRequest};
use crate::update::settings::{PruneFailurePolicy, RuntimeSettings};
use crate::utils::progress::ProgressBar;

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The server reported the recorded version as current; nothing was changed.
    UpToDate {
        /// Version recorded in the configuration
        version: String,
    },
    /// A release was downloaded, extracted and recorded in the configuration.
    Updated {
        /// Version written to the configuration
        version: String,
        /// Release label
        name: String,
        /// Files and directories written by extraction
        extracted: ExtractSummary,
        /// Result of the cabinet cleanup
        pruned: PruneOutcome,
    },
}

/// Result of the cabinet cleanup step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PruneOutcome {
    /// The release did not ask for cabinet deletion.
    NotRequested,
    /// Cabinet directories that were removed.
    Deleted(Vec<PathBuf>),
    /// Deletion failed and the run continued; holds the rendered error.
    Failed(String),
}

/// Drives one update run against a [`ReleaseApi`].
///
/// The run is strictly sequential: load config, resolve the endpoint, check the
/// updater version, check for a release, confirm, download, extract, prune,
/// write config. Any failure ends the run; the configuration is only written
/// after everything else succeeded.
pub struct Updater<A, C> {
    settings: RuntimeSettings,
    api: A,
    prompt: C,
}

impl<A: ReleaseApi, C: Confirm> Updater<A, C> {
    /// Create an updater.
    pub const fn new(settings: RuntimeSettings, api: A, prompt: C) -> Self {
        Self {
            settings,
            api,
            prompt,
        }
    }

    /// The release API this updater talks to.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Perform one update run.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error. Each carries an
    /// [`UpdaterError`] in its chain that determines the exit code.
    pub async fn run(&mut self) -> Result<UpdateOutcome> {
        let mut config = Config::load_from(&self.settings.config_path).await?;
        debug!(
            "Tracking release '{}' at version {}",
            config.updater.release, config.updater.version
        );

        let endpoint = self.resolve_endpoint().await?;
        self.check_updater_version(&endpoint).await?;

        println!("{}", "Checking for updates...".cyan());
        let descriptor = match self.check_release(&endpoint, &config).await? {
            ReleaseCheck::UpToDate => {
                println!(
                    "{} {}",
                    "Already up to date:".green().bold(),
                    config.updater.version
                );
                return Ok(UpdateOutcome::UpToDate {
                    version: config.updater.version,
                });
            }
            ReleaseCheck::Available(descriptor) => descriptor,
        };

        let extracted = self.download_and_extract(&descriptor).await?;

        let pruned = if descriptor.delete_cabinet {
            self.prune_cabinets().await?
        } else {
            PruneOutcome::NotRequested
        };

        config.updater.version.clone_from(&descriptor.version);
        config.save_to(&self.settings.config_path).await?;

        println!(
            "{} {} ({})",
            "Update complete:".green().bold(),
            descriptor.name,
            descriptor.version
        );

        Ok(UpdateOutcome::Updated {
            version: descriptor.version,
            name: descriptor.name,
            extracted,
            pruned,
        })
    }

    async fn resolve_endpoint(&self) -> Result<String> {
        let body = self.api.fetch_bootstrap(&self.settings.bootstrap_url).await?;
        let endpoint = body.trim();
        if endpoint.is_empty() {
            return Err(UpdaterError::ResponseDecode {
                operation: "getting the updater URI".to_string(),
                reason: "bootstrap document is empty".to_string(),
            }
            .into());
        }
        info!("Using update endpoint {}", endpoint);
        Ok(endpoint.to_string())
    }

    async fn check_updater_version(&self, endpoint: &str) -> Result<()> {
        let url = endpoint_url(endpoint, "version");
        let latest = self.api.fetch_updater_version(&url).await?;
        let current = &self.settings.updater_version;

        if latest == *current {
            debug!("Updater version {} is current", current);
            return Ok(());
        }

        if let (Ok(remote), Ok(local)) =
            (semver::Version::parse(latest.trim()), semver::Version::parse(current))
        {
            if remote < local {
                warn!("Endpoint announces updater {} which is older than {}", remote, local);
            }
        }

        Err(UpdaterError::UpdaterOutdated {
            current: current.clone(),
            latest,
        }
        .into())
    }

    async fn check_release(&self, endpoint: &str, config: &Config) -> Result<ReleaseCheck> {
        let url = endpoint_url(endpoint, &format!("releases/{}", config.updater.release));
        let request = ReleaseRequest {
            version: config.updater.version.clone(),
            password: config.updater.password.clone(),
        };
        self.api.check_release(&url, &request).await
    }

    async fn download_and_extract(&mut self, descriptor: &ReleaseDescriptor) -> Result<ExtractSummary> {
        println!("{} {}", "Release:".bold(), descriptor.name);
        println!("{} {}", "Download:".bold(), descriptor.uri);
        self.prompt.confirm("Press enter to start the update...").await?;

        let archive_path = self.settings.archive_path();
        let bytes = self.api.download(&descriptor.uri, &archive_path).await?;
        info!("Downloaded {} bytes to {}", bytes, archive_path.display());

        let spinner = ProgressBar::new_spinner();
        spinner.set_message("Extracting update");

        let task_archive = archive_path.clone();
        let install_dir = self.settings.install_dir.clone();
        let result = tokio::task::spawn_blocking(move || extract_zip(&task_archive, &install_dir))
            .await
            .context("Extraction task panicked");
        spinner.finish_and_clear();

        let summary = result?.with_context(|| {
            format!(
                "Failed to extract update, the archive was kept at {}",
                archive_path.display()
            )
        })?;
        info!("Extracted {} files and {} directories", summary.files, summary.dirs);

        if let Err(e) = tokio::fs::remove_file(&archive_path).await {
            warn!("Failed to remove {}: {}", archive_path.display(), e);
        }

        Ok(summary)
    }

    async fn prune_cabinets(&self) -> Result<PruneOutcome> {
        let prefix = &self.settings.cabinet_prefix;
        match delete_directories(&self.settings.install_dir, prefix).await {
            Ok(deleted) => Ok(PruneOutcome::Deleted(deleted)),
            Err(e) => {
                eprintln!(
                    "{}: failed to delete the {prefix} directories, please delete them manually",
                    "warning".yellow().bold()
                );
                match self.settings.prune_failure {
                    PruneFailurePolicy::Abort => Err(e),
                    PruneFailurePolicy::Continue => {
                        warn!("Cabinet cleanup failed: {:#}", e);
                        Ok(PruneOutcome::Failed(format!("{e:#}")))
                    }
                }
            }
        }
    }
}
