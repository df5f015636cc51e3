//! CLI error handling tests for bb-core.
//!
//! These tests verify that invalid arguments, configuration and data
//! produce the documented exit codes and error output.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the bb-core binary with an isolated environment.
fn bb_core(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bb-core").expect("bb-core binary should exist");
    cmd.env_remove("BB_CONFIG")
        .env_remove("BB_LOG")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", home.path());
    cmd
}

// ============================================================================
// Argument errors
// ============================================================================

mod invalid_arguments {
    use super::*;

    #[test]
    fn unknown_command_fails() {
        let home = TempDir::new().unwrap();
        bb_core(&home)
            .arg("nonexistent-command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn run_requires_data() {
        let home = TempDir::new().unwrap();
        bb_core(&home)
            .arg("run")
            .assert()
            .failure()
            .stderr(predicate::str::contains("--data"));
    }

    #[test]
    fn unknown_model_is_rejected() {
        let home = TempDir::new().unwrap();
        bb_core(&home)
            .args(["run", "--data", "x.csv", "--model", "svm"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("svm"));
    }

    #[test]
    fn unknown_format_is_rejected() {
        let home = TempDir::new().unwrap();
        bb_core(&home)
            .args(["-f", "yaml", "version"])
            .assert()
            .failure();
    }
}

// ============================================================================
// Data errors
// ============================================================================

mod data_errors {
    use super::*;

    #[test]
    fn missing_dataset_exits_12() {
        let home = TempDir::new().unwrap();
        let missing = home.path().join("missing.csv");
        bb_core(&home)
            .args(["run", "--no-persist", "--data"])
            .arg(&missing)
            .assert()
            .code(12)
            .stderr(predicate::str::contains("missing.csv"));
    }

    #[test]
    fn unsupported_extension_exits_11() {
        let home = TempDir::new().unwrap();
        let path = home.path().join("data.xlsx");
        std::fs::write(&path, "not a spreadsheet").unwrap();
        bb_core(&home)
            .args(["run", "--no-persist", "--data"])
            .arg(&path)
            .assert()
            .code(11);
    }

    #[test]
    fn json_format_reports_structured_error() {
        let home = TempDir::new().unwrap();
        let missing = home.path().join("missing.csv");
        let output = bb_core(&home)
            .args(["-f", "json", "run", "--no-persist", "--data"])
            .arg(&missing)
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(12));
        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert!(value.get("code").is_some(), "structured error: {value}");
    }
}

// ============================================================================
// Configuration errors
// ============================================================================

mod config_errors {
    use super::*;

    #[test]
    fn unknown_drift_backend_exits_11() {
        let home = TempDir::new().unwrap();
        let data = common::write_csv(home.path(), 40);
        bb_core(&home)
            .args(["run", "--no-persist", "--backends", "psi", "--data"])
            .arg(&data)
            .assert()
            .code(11)
            .stderr(predicate::str::contains("psi"));
    }

    #[test]
    fn invalid_noise_exits_11() {
        let home = TempDir::new().unwrap();
        let data = common::write_csv(home.path(), 40);
        bb_core(&home)
            .args(["run", "--no-persist", "--noise=-1", "--data"])
            .arg(&data)
            .assert()
            .code(11);
    }

    #[test]
    fn missing_config_file_exits_11() {
        let home = TempDir::new().unwrap();
        let data = common::write_csv(home.path(), 40);
        bb_core(&home)
            .args(["run", "--config", "/nonexistent/experiment.toml", "--data"])
            .arg(&data)
            .assert()
            .code(11);
    }

    #[test]
    fn config_from_env_is_used() {
        let home = TempDir::new().unwrap();
        let config = home.path().join("experiment.json");
        std::fs::write(&config, "{ not json").unwrap();
        bb_core(&home)
            .env("BB_CONFIG", &config)
            .args(["config", "validate"])
            .assert()
            .code(11);
    }

    #[test]
    fn default_config_validates() {
        let home = TempDir::new().unwrap();
        bb_core(&home)
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("built-in defaults"));
    }
}
