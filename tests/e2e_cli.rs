//! CLI end-to-end tests
//!
//! Tests for the ffkit command-line interface. None of these need a working
//! ffmpeg installation.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the ffkit binary
#[allow(deprecated)]
fn ffkit_cmd() -> Command {
    Command::cargo_bin("ffkit").unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = ffkit_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = ffkit_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffkit"))
        .stdout(predicate::str::contains("transcode"))
        .stdout(predicate::str::contains("best-encoder"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = ffkit_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ffkit "));
}

#[test]
fn test_cli_check_tools_command() {
    let mut cmd = ffkit_cmd();
    cmd.arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"))
        .stdout(predicate::str::contains("ffprobe"));
}

#[test]
fn test_cli_probe_nonexistent_file() {
    let mut cmd = ffkit_cmd();
    cmd.args(["probe", "/nonexistent/file.mkv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_duration_nonexistent_file() {
    let mut cmd = ffkit_cmd();
    cmd.args(["duration", "/nonexistent/file.mkv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_transcode_dry_run() {
    let mut cmd = ffkit_cmd();
    cmd.args([
        "transcode",
        "-i",
        "in.mov",
        "-o",
        "out.mp4",
        "--video-codec",
        "libx264",
        "--crf",
        "23",
        "--audio-codec",
        "aac",
        "--dry-run",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains(
        "-y -i in.mov -c:v libx264 -crf 23 -c:a aac out.mp4",
    ));
}

#[test]
fn test_cli_transcode_dry_run_quotes_spaces() {
    let mut cmd = ffkit_cmd();
    cmd.args([
        "transcode",
        "-i",
        "my clip.mov",
        "-o",
        "out.mp4",
        "--copy-video",
        "--metadata",
        "title=Holiday 2024",
        "--no-overwrite",
        "--dry-run",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains(
        "-i \"my clip.mov\" -c:v copy -metadata \"title=Holiday 2024\" out.mp4",
    ))
    .stdout(predicate::str::contains(" -y ").not());
}

#[test]
fn test_cli_transcode_requires_output() {
    let mut cmd = ffkit_cmd();
    cmd.args(["transcode", "-i", "in.mov"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output"));
}

#[test]
fn test_cli_transcode_config_disables_overwrite() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("ffkit.toml");
    fs::write(&config_path, "[transcode]\noverwrite = false\n").unwrap();

    let mut cmd = ffkit_cmd();
    cmd.arg("--config")
        .arg(&config_path)
        .args(["transcode", "-i", "in.mov", "-o", "out.mp4", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg -i in.mov out.mp4"));
}

#[test]
fn test_cli_invalid_config_fails() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("ffkit.toml");
    fs::write(&config_path, "[tools]\ntimeout_secs = 0\n").unwrap();

    let mut cmd = ffkit_cmd();
    cmd.arg("--config")
        .arg(&config_path)
        .arg("check-tools")
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout_secs"));
}

#[test]
fn test_cli_best_encoder_rejects_unknown_codec() {
    let mut cmd = ffkit_cmd();
    cmd.args(["best-encoder", "--codec", "vp9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
