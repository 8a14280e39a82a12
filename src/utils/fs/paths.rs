//! Path utilities for lexical normalization and containment checks.
//!
//! These functions never touch the filesystem: they operate on path components
//! only, which is what the archive extractor needs to judge entries before any
//! file is created.

use std::path::{Component, Path, PathBuf};

/// Cleans a path lexically by resolving `.` and `..` components.
///
/// - `.` components are dropped
/// - `..` removes the preceding normal component
/// - `..` directly after a root is dropped (`/..` is `/`)
/// - leading `..` components of a relative path are kept
///
/// An empty result is returned as `.`.
///
/// # Examples
///
/// ```rust
/// use egts_updater::utils::fs::clean_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(clean_path(Path::new("/foo/./bar/../baz")), PathBuf::from("/foo/baz"));
/// assert_eq!(clean_path(Path::new("./a/../../b")), PathBuf::from("../b"));
/// assert_eq!(clean_path(Path::new("a/..")), PathBuf::from("."));
/// ```
#[must_use]
pub fn clean_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            c => components.push(c),
        }
    }

    if components.is_empty() {
        return PathBuf::from(".");
    }

    components.iter().collect()
}

/// Returns `true` if `path` lies strictly inside `base` after cleaning both.
///
/// The comparison is component-wise, so `/game-old` is not inside `/game`, and
/// `base` itself is not considered inside.
///
/// # Examples
///
/// ```rust
/// use egts_updater::utils::fs::is_strictly_within;
/// use std::path::Path;
///
/// let base = Path::new("/games/egts");
/// assert!(is_strictly_within(base, Path::new("/games/egts/data/a.bin")));
/// assert!(!is_strictly_within(base, Path::new("/games/egts")));
/// assert!(!is_strictly_within(base, Path::new("/games/egts/../other")));
/// assert!(!is_strictly_within(Path::new("."), Path::new("../x")));
/// ```
#[must_use]
pub fn is_strictly_within(base: &Path, path: &Path) -> bool {
    let base = clean_path(base);
    let path = clean_path(path);

    if base == Path::new(".") {
        // Every relative path that does not climb out is inside the working directory.
        return path.is_relative()
            && path != Path::new(".")
            && !matches!(path.components().next(), Some(Component::ParentDir));
    }

    path != base && path.starts_with(&base)
}
