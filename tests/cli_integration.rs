//! Command line behavior of the `fst` binary
//!
//! Only paths that never open a device connection are exercised here:
//! dry runs, environment helpers, argument errors and configuration errors.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const ENV_KEYS: &[&str] = &[
    "AP_ADDRESS",
    "AP_PORT",
    "AP_USERNAME",
    "AP_PASSWORD",
    "STATION_ADDRESS",
    "FREQUENCY_RANGE",
    "WAIT_FOR_REGISTRATION",
    "VALID_PING_TIME",
    "SIGNAL_THRESHOLD",
    "RESULTS_FILE",
    "ENABLE_COLOR",
    "LOG_FORMAT",
];

/// Command running in an empty directory with a clean environment
fn fst(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("fst").unwrap();
    cmd.current_dir(dir.path()).env("NO_COLOR", "1");
    for key in ENV_KEYS {
        cmd.env_remove(key);
    }
    cmd
}

fn write_config(dir: &TempDir, content: &str) -> String {
    let path = dir.path().join("config.json");
    fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_help_lists_sweep_options() {
    let dir = TempDir::new().unwrap();
    fst(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--range"))
        .stdout(predicate::str::contains("--station"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_dry_run_prints_plan_without_connecting() {
    let dir = TempDir::new().unwrap();
    fst(&dir)
        .args([
            "--ap", "192.0.2.1", "--station", "192.0.2.2", "--range", "5000-5010",
            "--wait", "30", "--max-ping", "15", "--protocol", "udp", "--local-limit", "20",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("frequencies: 5000, 5005, 5010"))
        .stdout(predicate::str::contains("=protocol=udp"))
        .stdout(predicate::str::contains("=local-tx-speed=20M"))
        .stdout(predicate::str::contains("Dry run"));

    assert!(!dir.path().join("Results.txt").exists());
}

#[test]
fn test_dry_run_reads_thresholds_from_config_file() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, r#"{"config": {"wait_for_registration": 45, "valid_ping_time": 12.5}}"#);

    fst(&dir)
        .args(["--ap", "192.0.2.1", "--station", "192.0.2.2", "--range", "5180-5180", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ping < 12.5 ms within 45s"));
}

#[test]
fn test_missing_thresholds_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    fst(&dir)
        .args(["--ap", "192.0.2.1", "--station", "192.0.2.2", "--dry-run"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("wait_for_registration"));
}

#[test]
fn test_malformed_config_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "{ not json");

    fst(&dir)
        .args(["--config", &path, "--ap", "192.0.2.1", "--station", "192.0.2.2", "--dry-run"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_arguments_are_rejected() {
    let dir = TempDir::new().unwrap();

    fst(&dir).args(["--range", "5100-5000"]).assert().failure();
    fst(&dir).args(["--ap", "not-an-ip"]).assert().failure();
    fst(&dir).args(["--direction", "sideways"]).assert().failure();
    fst(&dir).args(["--duration", "0"]).assert().failure();
    fst(&dir)
        .args(["--dry-run", "--interactive"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--dry-run"));
}

#[test]
fn test_create_env_writes_example_once() {
    let dir = TempDir::new().unwrap();
    fst(&dir)
        .arg("--create-env")
        .assert()
        .success()
        .stdout(predicate::str::contains(".env.example"));

    let content = fs::read_to_string(dir.path().join(".env.example")).unwrap();
    assert!(content.contains("# AP_ADDRESS="));
    assert!(content.contains("# LOG_FORMAT=text"));

    fst(&dir)
        .args(["--create-env", ".env.example"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_env_help_lists_variables() {
    let dir = TempDir::new().unwrap();
    fst(&dir)
        .arg("--env-help")
        .assert()
        .success()
        .stdout(predicate::str::contains("STATION_ADDRESS"))
        .stdout(predicate::str::contains("Configuration Priority"));
}

#[test]
fn test_invalid_log_format_is_rejected() {
    let dir = TempDir::new().unwrap();
    fst(&dir)
        .args(["--log-format", "xml", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--log-format"));
}
