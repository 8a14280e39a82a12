//! Local updater configuration (`egts.toml`)
//!
//! The configuration file records which release channel the installation tracks,
//! which version was last applied, and the shared secret sent to the release API.
//!
//! ```toml
//! [updater]
//! release = "prod"
//! version = "1.0.0"
//! password = "secret"
//! ```
//!
//! The file is read once at the start of a run and rewritten once at the very end
//! of a successful run. A run that fails earlier never touches it. The rewrite is
//! atomic: readers see either the old or the new file, never a truncated one.
//!
//! # Security
//!
//! The file holds a password. On Unix the rewritten file is created with
//! owner-only permissions (`0600`).

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::debug;

use crate::core::UpdaterError;
use crate::utils::fs::safe_write;

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "egts.toml";

/// Root of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// The `[updater]` table.
    pub updater: UpdaterConfig,
}

/// The `[updater]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Release channel whose update stream is tracked (e.g. `"prod"`).
    pub release: String,
    /// Version tag of the last applied release.
    pub version: String,
    /// Shared secret sent to the release API.
    pub password: String,
}

impl Config {
    /// Load the configuration from `path`.
    ///
    /// # Errors
    ///
    /// - [`UpdaterError::ConfigRead`] if the file cannot be read
    /// - [`UpdaterError::ConfigParse`] if it is not valid TOML or a field is missing
    pub async fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());

        let content = fs::read_to_string(path).await.map_err(|e| UpdaterError::ConfigRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            UpdaterError::ConfigParse {
                path: path.display().to_string(),
                reason: e.message().to_string(),
            }
            .into()
        })
    }

    /// Encode the configuration as TOML and atomically replace the file at `path`.
    ///
    /// # Errors
    ///
    /// [`UpdaterError::ConfigWrite`] if encoding, writing or the final rename fails.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("Writing config to {}", path.display());

        let write_error = |reason: String| UpdaterError::ConfigWrite {
            path: path.display().to_string(),
            reason,
        };

        let content = toml::to_string_pretty(self).map_err(|e| write_error(e.to_string()))?;

        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || safe_write(&target, &content))
            .await
            .map_err(|e| write_error(e.to_string()))?
            .map_err(|e| write_error(format!("{e:#}")))?;

        Ok(())
    }
}
