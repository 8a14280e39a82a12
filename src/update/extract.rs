//! Zip extraction into the installation directory.
//!
//! Every entry is resolved against the destination and rejected when it would
//! land outside of it. Extraction stops at the first failing entry and leaves
//! the entries written so far in place.

use anyhow::Result;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use tracing::debug;

use crate::core::UpdaterError;
use crate::utils::fs::{clean_path, is_strictly_within};

/// Mode applied to file entries whose archive record carries no unix permissions.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Counts of the entries written by [`extract_zip`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Regular files written
    pub files: usize,
    /// Directory entries created
    pub dirs: usize,
}

/// Extract the zip archive at `archive_path` into `destination`.
///
/// Entries are processed in archive order. File entries are created with the
/// unix mode stored in the archive (or [`DEFAULT_FILE_MODE`]) and existing files
/// are overwritten.
///
/// This is blocking I/O; async callers should run it on the blocking pool.
///
/// # Errors
///
/// - [`UpdaterError::PathTraversal`] for an entry resolving outside `destination`
/// - [`UpdaterError::InvalidArchive`] if the file is not a readable zip archive
/// - [`UpdaterError::FileSystem`] for any open, create or copy failure
pub fn extract_zip(archive_path: &Path, destination: &Path) -> Result<ExtractSummary> {
    let file = File::open(archive_path).map_err(|e| UpdaterError::FileSystem {
        operation: "opening the update archive".to_string(),
        path: archive_path.display().to_string(),
        reason: e.to_string(),
    })?;

    let invalid = |e: zip::result::ZipError| UpdaterError::InvalidArchive {
        path: archive_path.display().to_string(),
        reason: e.to_string(),
    };

    let mut archive = zip::ZipArchive::new(file).map_err(invalid)?;
    let root = clean_path(destination);
    let mut summary = ExtractSummary::default();

    for index in 0..archive.len() {
        let entry = archive.by_index(index).map_err(invalid)?;
        let name = entry.name().to_string();
        let target = clean_path(&destination.join(&name));

        if !is_strictly_within(&root, &target) {
            return Err(UpdaterError::PathTraversal {
                entry: name,
                path: target.display().to_string(),
            }
            .into());
        }

        if entry.is_dir() {
            debug!("Creating directory {}", target.display());
            fs::create_dir_all(&target).map_err(|e| fs_error("creating a directory", &target, &e))?;
            summary.dirs += 1;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| fs_error("creating a directory", parent, &e))?;
        }

        let mode = entry_mode(entry.unix_mode());
        debug!("Extracting {} (mode {:o})", target.display(), mode);

        let copied = {
            let mut reader = entry;
            let mut output = open_output(&target, mode)
                .map_err(|e| fs_error("creating an extracted file", &target, &e))?;
            io::copy(&mut reader, &mut output)
        };
        copied.map_err(|e| fs_error("writing an extracted file", &target, &e))?;

        apply_mode(&target, mode).map_err(|e| fs_error("setting file permissions", &target, &e))?;
        summary.files += 1;
    }

    Ok(summary)
}

/// Permission bits applied to an extracted file.
///
/// Only the rwx bits are kept; setuid, setgid and sticky bits from the archive
/// are dropped.
fn entry_mode(stored: Option<u32>) -> u32 {
    stored.map_or(DEFAULT_FILE_MODE, |mode| mode & 0o777)
}

/// Open `path` for writing, truncating an existing file.
///
/// A read-only file left by a previous extraction is made writable first; the
/// stored mode is re-applied once the content has been copied.
fn open_output(path: &Path, mode: u32) -> io::Result<File> {
    match output_options(mode).open(path) {
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied && path.is_file() => {
            debug!("Making {} writable before overwriting it", path.display());
            make_writable(path)?;
            output_options(mode).open(path)
        }
        result => result,
    }
}

fn output_options(mode: u32) -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    options
}

#[cfg(unix)]
fn make_writable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mode = fs::metadata(path)?.permissions().mode();
    fs::set_permissions(path, fs::Permissions::from_mode(mode | 0o200))
}

#[cfg(not(unix))]
fn make_writable(path: &Path) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    #[allow(clippy::permissions_set_readonly_false)]
    permissions.set_readonly(false);
    fs::set_permissions(path, permissions)
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

fn fs_error(operation: &str, path: &Path, error: &io::Error) -> UpdaterError {
    UpdaterError::FileSystem {
        operation: operation.to_string(),
        path: path.display().to_string(),
        reason: error.to_string(),
    }
}
