use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::core::UpdaterError;

/// Recursively delete every immediate subdirectory of `base` whose name starts with `prefix`.
///
/// Files and symlinks are never removed, whatever their name. Matching
/// directories are deleted in name order and the first failure stops the
/// sweep, leaving the remaining ones in place.
///
/// Returns the deleted directories.
///
/// # Errors
///
/// - [`UpdaterError::FileSystem`] if `base` cannot be listed (nothing is deleted)
/// - [`UpdaterError::PruneFailed`] for the first directory that cannot be removed
pub async fn delete_directories(base: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let list_error = |e: std::io::Error| UpdaterError::FileSystem {
        operation: "listing the installation directory".to_string(),
        path: base.display().to_string(),
        reason: e.to_string(),
    };

    let mut entries = fs::read_dir(base).await.map_err(list_error)?;
    let mut matches = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(list_error)? {
        let file_type = entry.file_type().await.map_err(list_error)?;
        if !file_type.is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with(prefix) {
            matches.push(entry.path());
        }
    }
    matches.sort();

    let mut deleted = Vec::with_capacity(matches.len());
    for path in matches {
        println!("{} {}", "Deleting directory:".yellow(), path.display());
        debug!("Removing {}", path.display());

        fs::remove_dir_all(&path).await.map_err(|e| UpdaterError::PruneFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        deleted.push(path);
    }

    Ok(deleted)
}
