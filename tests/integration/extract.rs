use egts_updater::core::{UpdaterError, find_updater_error};
use egts_updater::update::{ExtractSummary, extract_zip};
use std::fs;
use tempfile::TempDir;

use crate::common::ZipFixture;

#[test]
fn test_extracting_twice_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("update.zip");
    let dest = temp.path().join("game");
    fs::create_dir(&dest).unwrap();

    ZipFixture::new()
        .dir("data/")
        .file("data/level1.bin", [1u8, 2, 3])
        .file_with_mode("bin/launch.sh", "#!/bin/sh\nexec ./game\n", 0o755)
        .file("readme.txt", "hello")
        .write_to(&archive)
        .unwrap();

    let first = extract_zip(&archive, &dest).unwrap();
    let snapshot = |path: &str| {
        let full = dest.join(path);
        (fs::read(&full).unwrap(), fs::metadata(&full).unwrap().permissions())
    };
    let before = ["data/level1.bin", "bin/launch.sh", "readme.txt"].map(snapshot);

    let second = extract_zip(&archive, &dest).unwrap();
    let after = ["data/level1.bin", "bin/launch.sh", "readme.txt"].map(snapshot);

    assert_eq!(first, ExtractSummary { files: 3, dirs: 1 });
    assert_eq!(first, second);
    assert_eq!(before, after);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        assert_eq!(after[1].1.mode() & 0o777, 0o755);
        assert_eq!(after[0].1.mode() & 0o777, 0o644);
    }
}

#[cfg(unix)]
#[test]
fn test_read_only_entries_survive_second_extraction() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("update.zip");
    let dest = temp.path().join("game");
    fs::create_dir(&dest).unwrap();

    ZipFixture::new()
        .file_with_mode("data/ro.txt", "read only", 0o444)
        .file_with_mode("bin/tool", "#!/bin/sh\n", 0o555)
        .write_to(&archive)
        .unwrap();

    let first = extract_zip(&archive, &dest).unwrap();
    let second = extract_zip(&archive, &dest).unwrap();
    assert_eq!(first, second);

    for (path, content, mode) in [("data/ro.txt", "read only", 0o444), ("bin/tool", "#!/bin/sh\n", 0o555)] {
        let full = dest.join(path);
        assert_eq!(fs::read_to_string(&full).unwrap(), content);
        assert_eq!(fs::metadata(&full).unwrap().permissions().mode() & 0o7777, mode);
    }
}

#[cfg(unix)]
#[test]
fn test_absolute_entry_outside_destination_rejected() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("update.zip");
    let dest = temp.path().join("game");
    let outside = temp.path().join("outside.txt");
    fs::create_dir(&dest).unwrap();

    let entry = outside.to_string_lossy().into_owned();
    ZipFixture::new().file(&entry, "x").write_to(&archive).unwrap();

    let error = extract_zip(&archive, &dest).unwrap_err();
    assert!(matches!(find_updater_error(&error), Some(UpdaterError::PathTraversal { .. })));
    assert!(!outside.exists());
}

#[test]
fn test_entry_naming_destination_itself_rejected() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("update.zip");
    ZipFixture::new().file("sub/..", "x").write_to(&archive).unwrap();

    let error = extract_zip(&archive, temp.path()).unwrap_err();
    assert!(matches!(find_updater_error(&error), Some(UpdaterError::PathTraversal { .. })));
}

#[test]
fn test_archive_released_after_failed_extraction() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("update.zip");
    let dest = temp.path().join("game");
    fs::create_dir(&dest).unwrap();

    ZipFixture::new()
        .file("ok.txt", "fine")
        .file("../escape.txt", "x")
        .write_to(&archive)
        .unwrap();

    assert!(extract_zip(&archive, &dest).is_err());

    let moved = temp.path().join("update.zip.bak");
    fs::rename(&archive, &moved).unwrap();
    fs::remove_file(&moved).unwrap();
    assert!(dest.join("ok.txt").exists());
}

#[test]
fn test_archive_released_after_success() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("update.zip");
    let dest = temp.path().join("game");
    fs::create_dir(&dest).unwrap();

    ZipFixture::new().file("a.txt", "a").write_to(&archive).unwrap();
    extract_zip(&archive, &dest).unwrap();

    fs::remove_file(&archive).unwrap();
    fs::remove_file(dest.join("a.txt")).unwrap();
}
