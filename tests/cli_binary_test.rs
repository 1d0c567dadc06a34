//! Runs the compiled `berth` binary.

use std::process::Command;

fn berth() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_berth"));
    command.env_remove("BERTH_LOG");
    command
}

#[test]
fn test_version_flag() {
    let output = berth()
        .arg("--version")
        .output()
        .expect("Failed to execute binary");

    assert!(output.status.success(), "Version flag should exit with code 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let version = stdout.trim().strip_prefix("berth ").unwrap_or("");
    assert_eq!(version, env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_help_lists_commands() {
    let output = berth().arg("--help").output().expect("Failed to execute binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("berth pull <image>"));
    assert!(stdout.contains("berth build <recipe-file>"));
}

#[test]
fn test_invalid_arguments_exit_with_usage() {
    let output = berth()
        .args(["pull", "a", "b"])
        .output()
        .expect("Failed to execute binary");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("pull takes exactly one image reference"));
    assert!(stderr.contains("Usage:"));
}

#[test]
fn test_pull_against_unreachable_engine_fails() {
    let output = berth()
        .args(["pull", "nginx:alpine"])
        .env("BERTH_ENGINE_URL", "http://127.0.0.1:1")
        .env("BERTH_TIMEOUT_SECS", "5")
        .output()
        .expect("Failed to execute binary");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("berth: "), "stderr was: {}", stderr);
}

#[test]
fn test_build_with_missing_recipe_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("Dockerfile");

    let output = berth()
        .arg("build")
        .arg(&missing)
        .env("BERTH_ENGINE_URL", "http://127.0.0.1:1")
        .output()
        .expect("Failed to execute binary");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot read"), "stderr was: {}", stderr);
}
