//! Corruption recovery tests for liftlog.
//!
//! These tests verify the system can handle:
//! - Malformed rows in the lifting log, including across rewrites
//! - Hand-edited logs in older formats
//! - Corrupted template files
//! - Invalid configuration

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn liftlog(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("liftlog").expect("binary built");
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

#[test]
fn test_malformed_log_rows_are_skipped() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(
        data_dir.join("lifting_log.csv"),
        "Date,Workout Title,Exercise,Set Order,Set Type,Weight,Reps,RPE,RIR,Notes\n\
         2024-01-01,Push,Bench,1,Working,135,10,,,\n\
         yesterday,Push,Bench,2,Working,135,10,,,\n\
         2024-01-01,Push,Bench,3,Sometimes,135,10,,,\n\
         2024-01-01,Push,Bench,4,Working,135,8,,,\n",
    )
    .unwrap();

    liftlog(data_dir)
        .args(["stats", "Bench"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total sets:      2"))
        .stderr(predicate::str::contains("Skipping malformed log row"));
}

#[test]
fn test_merge_keeps_malformed_log_rows() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(
        data_dir.join("lifting_log.csv"),
        "Date,Workout Title,Exercise,Set Order,Set Type,Weight,Reps,RPE,RIR,Notes\n\
         2024-01-01,Push,Bench,1,Working,135,10,,,\n\
         yesterday,Push,Bench,2,Working,135,10,,,\n",
    )
    .unwrap();

    let export = data_dir.join("strong.csv");
    fs::write(
        &export,
        "Date,Workout Name,Exercise Name,Set Order,Weight,Reps\n\
         2024-03-01 08:00:00,Legs,Squat,1,225,5\n",
    )
    .unwrap();

    liftlog(data_dir)
        .arg("import")
        .arg(&export)
        .arg("--merge")
        .assert()
        .success()
        .stdout(predicate::str::contains("Merged 1 new sets"));

    let content = fs::read_to_string(data_dir.join("lifting_log.csv")).unwrap();
    assert_eq!(content.lines().count(), 4);
    assert!(content.contains("yesterday,Push,Bench,2,Working,135,10,,,"));
}

#[test]
fn test_legacy_log_format_is_readable() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    // Datetime stamps, lowercase set types and no RIR column
    fs::write(
        data_dir.join("lifting_log.csv"),
        "Date,Workout Title,Exercise,Set Order,Set Type,Weight,Reps,RPE,Notes\n\
         2024-01-01 00:00:00,Push,Bench,1,warmup,95,5,,\n\
         2024-01-01 00:00:00,Push,Bench,2,working,135,10,,\n",
    )
    .unwrap();

    liftlog(data_dir)
        .args(["stats", "Bench", "--chart", "load"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01-01     1350.0"));

    // Logging on top of the legacy file upgrades its columns
    liftlog(data_dir)
        .args(["log", "--title", "Push", "--date", "2024-01-02", "--set", "Bench,140,8"])
        .assert()
        .success();

    let content = fs::read_to_string(data_dir.join("lifting_log.csv")).unwrap();
    assert!(content.starts_with("Date,Workout Title,Exercise,Set Order,Set Type,Weight,Reps,RPE,RIR,Notes\n"));
    assert_eq!(content.lines().count(), 4);
    assert!(content.contains("2024-01-01,Push,Bench,1,Warmup,95.0,5,,,"));

    liftlog(data_dir)
        .args(["stats", "Bench"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total sets:      2"));
}

#[test]
fn test_log_missing_required_columns_is_an_error() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("lifting_log.csv"), "Date,Exercise\n2024-01-01,Bench\n").unwrap();

    liftlog(data_dir)
        .args(["stats", "Bench"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required column"));
}

#[test]
fn test_corrupted_template_reports_error() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::create_dir_all(data_dir.join("templates")).unwrap();
    fs::write(data_dir.join("templates/Broken.json"), "{ not json ]").unwrap();

    liftlog(data_dir)
        .args(["template", "show", "Broken"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Json"));

    // Nothing is logged when the template cannot be read
    liftlog(data_dir)
        .args(["log", "--title", "X", "--template", "Broken", "--set", "Bench,135,5"])
        .assert()
        .failure();
    let content = fs::read_to_string(data_dir.join("lifting_log.csv")).unwrap();
    assert_eq!(content.lines().count(), 1);
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let config_dir = data_dir.join("config/liftlog");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        "[dashboard]\nmoving_average_window = 0\n",
    )
    .unwrap();

    liftlog(data_dir)
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("moving_average_window"));
}

#[test]
fn test_config_delimiter_used_for_import() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let config_dir = data_dir.join("config/liftlog");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "[import]\ndelimiter = \";\"\n").unwrap();

    let export = data_dir.join("strong.csv");
    fs::write(
        &export,
        "Date;Workout Name;Exercise Name;Set Order;Weight;Reps\n\
         2024-03-01 08:00:00;Legs;Squat;1;225;5\n",
    )
    .unwrap();

    liftlog(data_dir)
        .arg("import")
        .arg(&export)
        .assert()
        .success()
        .stdout(predicate::str::contains("Converted 1 sets"));
}
