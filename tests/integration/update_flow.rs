use egts_updater::core::{UpdaterError, exit_code_for, find_updater_error};
use egts_updater::update::{
    AutoConfirm, LinePrompt, PruneFailurePolicy, PruneOutcome, ReleaseRequest, UpdateOutcome,
    Updater,
};
use std::fs;

use crate::common::{
    ApiCall, BOOTSTRAP_URL, DownloadReply, FakeReleaseApi, PACKAGE_URI, ReleaseReply,
    TestInstall, ZipFixture, init_test_logging,
};

fn package() -> Vec<u8> {
    ZipFixture::new()
        .dir("data/")
        .file("data/a.txt", "alpha")
        .file_with_mode("bin/game", "#!/bin/sh\n", 0o755)
        .to_bytes()
}

#[tokio::test]
async fn test_full_update_with_cabinet_cleanup() {
    init_test_logging();
    let install = TestInstall::new("prod", "1.0.0", "x").unwrap();
    install.mkdir("CabinetInfoOld/nested");
    install.mkdir("Saves");
    fs::write(install.path().join("CabinetInfoNotes"), "keep").unwrap();

    let api = FakeReleaseApi::with_release("1.1.0", true, package());
    let mut updater = Updater::new(install.settings(), api, AutoConfirm);
    let outcome = updater.run().await.unwrap();

    match outcome {
        UpdateOutcome::Updated {
            version,
            name,
            extracted,
            pruned,
        } => {
            assert_eq!(version, "1.1.0");
            assert_eq!(name, "Patch 1.1.0");
            assert_eq!(extracted.files, 2);
            assert_eq!(pruned, PruneOutcome::Deleted(vec![install.path().join("CabinetInfoOld")]));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert_eq!(fs::read_to_string(install.path().join("data/a.txt")).unwrap(), "alpha");
    assert!(install.path().join("bin/game").is_file());
    assert!(!install.path().join("CabinetInfoOld").exists());
    assert!(install.path().join("Saves").is_dir());
    assert!(install.path().join("CabinetInfoNotes").is_file());
    assert!(!install.archive_path().exists());

    let config = install.config_value();
    assert_eq!(config["updater"]["version"].as_str(), Some("1.1.0"));
    assert_eq!(config["updater"]["release"].as_str(), Some("prod"));
    assert_eq!(config["updater"]["password"].as_str(), Some("x"));
}

#[tokio::test]
async fn test_requests_follow_protocol() {
    let install = TestInstall::new("beta", "2.0.0", "s3cr3t!").unwrap();
    let api = FakeReleaseApi::with_release("2.1.0", false, package());
    let mut updater = Updater::new(install.settings(), api, AutoConfirm);
    updater.run().await.unwrap();

    let calls = updater_calls(updater);
    assert_eq!(
        calls,
        vec![
            ApiCall::Bootstrap(BOOTSTRAP_URL.to_string()),
            ApiCall::Version("https://api.test/version".to_string()),
            ApiCall::Release {
                url: "https://api.test/releases/beta".to_string(),
                request: ReleaseRequest {
                    version: "2.0.0".to_string(),
                    password: "s3cr3t!".to_string(),
                },
            },
            ApiCall::Download {
                url: PACKAGE_URI.to_string(),
                dest: install.archive_path(),
            },
        ]
    );
}

#[tokio::test]
async fn test_endpoint_with_trailing_slash() {
    let install = TestInstall::new("prod", "1.0.0", "x").unwrap();
    let mut api = FakeReleaseApi::up_to_date();
    api.bootstrap = "  https://api.test/\r\n".to_string();

    let mut updater = Updater::new(install.settings(), api, AutoConfirm);
    updater.run().await.unwrap();

    let calls = updater_calls(updater);
    assert_eq!(calls[1], ApiCall::Version("https://api.test/version".to_string()));
}

#[tokio::test]
async fn test_not_modified_leaves_everything_untouched() {
    let install = TestInstall::new("prod", "1.0.0", "x").unwrap();
    let before = install.config_bytes();

    let mut updater = Updater::new(install.settings(), FakeReleaseApi::up_to_date(), AutoConfirm);
    let outcome = updater.run().await.unwrap();

    assert_eq!(
        outcome,
        UpdateOutcome::UpToDate {
            version: "1.0.0".to_string()
        }
    );
    assert_eq!(install.config_bytes(), before);
    assert!(!install.archive_path().exists());
    assert_eq!(updater_calls(updater).len(), 3);
}

#[tokio::test]
async fn test_outdated_updater_stops_before_release_check() {
    let install = TestInstall::new("prod", "1.0.0", "x").unwrap();
    let before = install.config_bytes();
    let mut api = FakeReleaseApi::with_release("1.1.0", false, package());
    api.updater_version = "0.2.0".to_string();

    let mut updater = Updater::new(install.settings(), api, AutoConfirm);
    let error = updater.run().await.unwrap_err();

    assert!(error.to_string().contains("curr: 0.1.1, latest: 0.2.0"));
    assert_eq!(exit_code_for(&error), 5);
    let calls = updater_calls(updater);
    assert_eq!(calls.len(), 2);
    assert!(!calls.iter().any(|call| matches!(call, ApiCall::Release { .. })));
    assert_eq!(install.config_bytes(), before);
}

#[tokio::test]
async fn test_newer_local_updater_is_still_rejected() {
    let install = TestInstall::new("prod", "1.0.0", "x").unwrap();
    let settings = install.settings().with_updater_version("0.2.0");
    let mut updater = Updater::new(settings, FakeReleaseApi::up_to_date(), AutoConfirm);

    let error = updater.run().await.unwrap_err();

    assert!(error.to_string().contains("curr: 0.2.0, latest: 0.1.1"));
    assert_eq!(exit_code_for(&error), 5);
    let calls = updater_calls(updater);
    assert!(!calls.iter().any(|call| matches!(call, ApiCall::Release { .. })));
}

#[tokio::test]
async fn test_version_body_must_match_exactly() {
    let install = TestInstall::new("prod", "1.0.0", "x").unwrap();
    let mut api = FakeReleaseApi::up_to_date();
    api.updater_version = "0.1.1\n".to_string();

    let mut updater = Updater::new(install.settings(), api, AutoConfirm);
    let error = updater.run().await.unwrap_err();
    assert!(matches!(find_updater_error(&error), Some(UpdaterError::UpdaterOutdated { .. })));
}

#[tokio::test]
async fn test_unexpected_release_status_is_fatal() {
    let install = TestInstall::new("prod", "1.0.0", "x").unwrap();
    let before = install.config_bytes();
    let mut api = FakeReleaseApi::up_to_date();
    api.release = ReleaseReply::Status(500);

    let mut updater = Updater::new(install.settings(), api, AutoConfirm);
    let error = updater.run().await.unwrap_err();

    assert_eq!(exit_code_for(&error), 4);
    assert_eq!(install.config_bytes(), before);
}

#[tokio::test]
async fn test_failed_download_keeps_config() {
    let install = TestInstall::new("prod", "1.0.0", "x").unwrap();
    let before = install.config_bytes();
    let mut api = FakeReleaseApi::with_release("1.1.0", false, Vec::new());
    api.download = DownloadReply::Status(404);

    let mut updater = Updater::new(install.settings(), api, AutoConfirm);
    let error = updater.run().await.unwrap_err();

    match find_updater_error(&error) {
        Some(UpdaterError::UnexpectedStatus { status, .. }) => assert_eq!(*status, 404),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!install.archive_path().exists());
    assert_eq!(install.config_bytes(), before);
}

#[tokio::test]
async fn test_traversal_archive_aborts_and_keeps_archive() {
    let install = TestInstall::new("prod", "1.0.0", "x").unwrap();
    let before = install.config_bytes();
    let archive = ZipFixture::new()
        .file("first.txt", "1")
        .file("../../escape.txt", "x")
        .to_bytes();

    let api = FakeReleaseApi::with_release("1.1.0", true, archive);
    let cabinet = install.mkdir("CabinetInfoA");
    let mut updater = Updater::new(install.settings(), api, AutoConfirm);
    let error = updater.run().await.unwrap_err();

    assert_eq!(exit_code_for(&error), 8);
    assert!(format!("{error:#}").contains("illegal file path"));
    assert!(install.path().join("first.txt").exists());
    assert!(install.archive_path().exists());
    assert!(cabinet.exists());
    assert_eq!(install.config_bytes(), before);
}

#[tokio::test]
async fn test_corrupt_archive_is_reported() {
    let install = TestInstall::new("prod", "1.0.0", "x").unwrap();
    let api = FakeReleaseApi::with_release("1.1.0", false, b"not a zip".to_vec());

    let mut updater = Updater::new(install.settings(), api, AutoConfirm);
    let error = updater.run().await.unwrap_err();

    assert_eq!(exit_code_for(&error), 9);
    assert!(install.archive_path().exists());
}

#[tokio::test]
async fn test_stdin_prompt_gates_download() {
    let install = TestInstall::new("prod", "1.0.0", "x").unwrap();
    let api = FakeReleaseApi::with_release("1.1.0", false, package());
    let input: &[u8] = b"\n";

    let mut updater = Updater::new(install.settings(), api, LinePrompt::new(input));
    let outcome = updater.run().await.unwrap();
    assert!(matches!(outcome, UpdateOutcome::Updated { .. }));
}

#[tokio::test]
async fn test_missing_config_fails_before_any_request() {
    let install = TestInstall::new("prod", "1.0.0", "x").unwrap();
    fs::remove_file(install.config_path()).unwrap();

    let mut updater = Updater::new(install.settings(), FakeReleaseApi::up_to_date(), AutoConfirm);
    let error = updater.run().await.unwrap_err();

    assert_eq!(exit_code_for(&error), 2);
    assert!(updater_calls(updater).is_empty());
}

/// Make a cabinet directory undeletable for the current user.
///
/// Returns `None` when running with privileges that ignore directory
/// permissions, in which case the caller skips the test.
#[cfg(unix)]
fn lock_directory(dir: &std::path::Path) -> Option<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::write(dir.join("locked.dat"), "x").unwrap();
    fs::set_permissions(dir, fs::Permissions::from_mode(0o555)).unwrap();
    if fs::write(dir.join("write-check"), "x").is_ok() {
        fs::set_permissions(dir, fs::Permissions::from_mode(0o755)).unwrap();
        return None;
    }
    Some(())
}

#[cfg(unix)]
fn unlock_directory(dir: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dir, fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn test_prune_failure_continue_records_version() {
    let install = TestInstall::new("prod", "1.0.0", "x").unwrap();
    let cabinet = install.mkdir("CabinetInfoA");
    if lock_directory(&cabinet).is_none() {
        return;
    }

    let api = FakeReleaseApi::with_release("1.1.0", true, package());
    let settings = install.settings().with_prune_failure(PruneFailurePolicy::Continue);
    let mut updater = Updater::new(settings, api, AutoConfirm);
    let outcome = updater.run().await;
    unlock_directory(&cabinet);

    match outcome.unwrap() {
        UpdateOutcome::Updated { pruned, .. } => assert!(matches!(pruned, PruneOutcome::Failed(_))),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(install.config_value()["updater"]["version"].as_str(), Some("1.1.0"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_prune_failure_abort_skips_config_write() {
    let install = TestInstall::new("prod", "1.0.0", "x").unwrap();
    let before = install.config_bytes();
    let cabinet = install.mkdir("CabinetInfoA");
    if lock_directory(&cabinet).is_none() {
        return;
    }

    let api = FakeReleaseApi::with_release("1.1.0", true, package());
    let settings = install.settings().with_prune_failure(PruneFailurePolicy::Abort);
    let mut updater = Updater::new(settings, api, AutoConfirm);
    let result = updater.run().await;
    unlock_directory(&cabinet);

    let error = result.unwrap_err();
    assert_eq!(exit_code_for(&error), 10);
    assert!(install.path().join("data/a.txt").exists());
    assert_eq!(install.config_bytes(), before);
}

fn updater_calls(updater: Updater<FakeReleaseApi, impl egts_updater::update::Confirm>) -> Vec<ApiCall> {
    updater.api().calls()
}
