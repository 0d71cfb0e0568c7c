//! CLI integration tests

use std::process::{Command, Output};

fn tpctl(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tpctl"))
        .args(args)
        .env_remove("TPCTL_API_URL")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = tpctl(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Traffic Predictor"), "Should show app name");
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("health"), "Should show health command");
    assert!(stdout.contains("features"), "Should show features command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = tpctl(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("tpctl"), "Should show binary name");
}

#[test]
fn test_predict_help() {
    let output = tpctl(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Predict help should succeed");
    assert!(stdout.contains("--input"), "Should show input option");
    assert!(stdout.contains("--field"), "Should show field option");
    assert!(stdout.contains("speed"), "Should list slots");
    assert!(stdout.contains("congestion"), "Should list slots");
}

#[test]
fn test_features_help() {
    let output = tpctl(&["features", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Features help should succeed");
    assert!(stdout.contains("<SLOT>"), "Should show slot argument");
}

#[test]
fn test_format_option() {
    let output = tpctl(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("--api-url"), "Should show api-url option");
}

#[test]
fn test_invalid_slot() {
    let output = tpctl(&["features", "volume"]);

    assert!(!output.status.success(), "Unknown slot should fail");
}

#[test]
fn test_invalid_command() {
    let output = tpctl(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
}

#[test]
fn test_malformed_field_fails_before_request() {
    let output = tpctl(&[
        "--api-url",
        "http://127.0.0.1:9",
        "predict",
        "speed",
        "--field",
        "no-equals-sign",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("NAME=VALUE"), "Should explain field syntax: {}", stderr);
}

#[test]
fn test_unreachable_service_fails() {
    let output = tpctl(&["--api-url", "http://127.0.0.1:9", "health"]);

    assert!(!output.status.success(), "Unreachable service should fail");
}
