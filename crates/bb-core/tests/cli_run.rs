//! End-to-end runs of the bb-core binary.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bb_core(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bb-core").expect("bb-core binary should exist");
    cmd.env_remove("BB_CONFIG")
        .env_remove("BB_LOG")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", home.path());
    cmd
}

#[test]
fn markdown_report_has_four_sections_in_order() {
    let home = TempDir::new().unwrap();
    let data = common::write_csv(home.path(), 100);
    let output = bb_core(&home)
        .args(["run", "--no-persist", "--no-notify", "--model", "centroid", "--data"])
        .arg(&data)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("# Experiment Report"));
    let headings: Vec<&str> = stdout.lines().filter(|l| l.starts_with("## ")).collect();
    assert_eq!(
        headings,
        vec![
            "## Reference Metrics",
            "## Mutated Metrics",
            "## Drift Report",
            "## Robustness Report"
        ]
    );
    assert!(stdout.contains("- accuracy: "));
}

#[test]
fn run_directory_holds_all_artifacts() {
    let home = TempDir::new().unwrap();
    let data = common::write_csv(home.path(), 80);
    let runs = home.path().join("runs");
    let output = bb_core(&home)
        .args(["-f", "json", "run", "--no-notify", "--data"])
        .arg(&data)
        .arg("--output-dir")
        .arg(&runs)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));

    let outcome: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let run_id = outcome["run_id"].as_str().unwrap();
    assert_eq!(outcome["persistence"]["status"], "persisted");
    assert_eq!(outcome["stages"].as_array().unwrap().len(), 7);

    let run_dir = runs.join(run_id);
    for file in [
        "manifest.json",
        "experiment_report.md",
        "report.json",
        "feature_attribution.json",
        "mutated_features.csv",
    ] {
        assert!(run_dir.join(file).is_file(), "missing {file}");
    }

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(run_dir.join("manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest["parameters"]["model_type"], "rf");
    assert!(manifest["metrics"]["reference.accuracy"].is_number());
    assert!(manifest["metrics"]["degradation.f1"].is_number());
}

#[test]
fn boosted_model_records_impurity_importances() {
    let home = TempDir::new().unwrap();
    let data = common::write_csv(home.path(), 80);
    let runs = home.path().join("runs");
    let output = bb_core(&home)
        .args(["-f", "json", "run", "--no-notify", "--model", "xgb", "--data"])
        .arg(&data)
        .arg("--output-dir")
        .arg(&runs)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));

    let outcome: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let run_dir = runs.join(outcome["run_id"].as_str().unwrap());
    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(run_dir.join("manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest["parameters"]["model_type"], "xgb");

    let attribution: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(run_dir.join("feature_attribution.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(attribution["model"], "xgb");
    let impurity = attribution["impurity"].as_array().unwrap();
    assert_eq!(impurity.len(), 5);
    assert_eq!(impurity[0]["feature"], "f0");
}

#[test]
fn summary_format_is_one_line() {
    let home = TempDir::new().unwrap();
    let data = common::write_csv(home.path(), 60);
    bb_core(&home)
        .args(["-f", "summary", "run", "--no-persist", "--no-explain", "--model", "majority", "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("model=majority"))
        .stdout(predicate::str::contains("persisted=skipped"))
        .stdout(predicate::function(|s: &str| s.trim_end().lines().count() == 1));
}

#[test]
fn persistence_failure_exits_3_with_report() {
    let home = TempDir::new().unwrap();
    let data = common::write_csv(home.path(), 60);
    // A regular file where the output directory should be.
    let blocker = home.path().join("blocked");
    std::fs::write(&blocker, "x").unwrap();

    bb_core(&home)
        .args(["run", "--no-notify", "--no-explain", "--model", "majority", "--data"])
        .arg(&data)
        .arg("--output-dir")
        .arg(&blocker)
        .assert()
        .code(3)
        .stdout(predicate::str::starts_with("# Experiment Report"));
}

#[test]
fn exitcode_format_prints_nothing() {
    let home = TempDir::new().unwrap();
    let data = common::write_csv(home.path(), 40);
    bb_core(&home)
        .args(["-f", "exitcode", "run", "--no-persist", "--model", "majority", "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn version_prints_schema() {
    let home = TempDir::new().unwrap();
    bb_core(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("schema 1.0.0"));
}
