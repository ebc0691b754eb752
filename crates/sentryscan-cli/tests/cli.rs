use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn shows_help() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sentryscan"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("sentryscan"));
}

/// A full flag set with --result set and no conflicting flags
/// succeeds.
#[test]
fn valid_flag_set_succeeds() {
    let root = tempdir().unwrap();
    let result_path = root.path().join("result.textproto");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sentryscan"));
    cmd.arg("--root")
        .arg(root.path())
        .arg("--result")
        .arg(&result_path)
        .arg("--extractors")
        .arg("dpkg,secrets")
        .arg("--detectors")
        .arg("linux-end-of-life,shadow-weak-password")
        .arg("--skip-dirs")
        .arg(root.path().join("skip-me"));
    cmd.assert().success();

    assert!(result_path.exists());
}

/// Neither --result nor -o is set.
#[test]
fn missing_result_and_o_fails_with_the_documented_message() {
    let root = tempdir().unwrap();

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sentryscan"));
    cmd.arg("--root").arg(root.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("either --result or --o needs to be set"));
}

#[test]
fn image_platform_without_remote_image_is_rejected() {
    let root = tempdir().unwrap();
    let result_path = root.path().join("result.textproto");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sentryscan"));
    cmd.arg("--root")
        .arg(root.path())
        .arg("--result")
        .arg(&result_path)
        .arg("--image-platform")
        .arg("linux/amd64");
    cmd.assert().failure();
}
