//! Integration tests for the flightcall binary.

#![allow(
    clippy::unwrap_used,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::f32::consts::PI;
use std::path::Path;
use tempfile::TempDir;

const SR: u32 = 22_050;

/// 4 s recording with two 0.3 s calls at 6 kHz.
fn write_recording(path: &Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SR,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..4 * SR as usize {
        let t = i as f32 / SR as f32;
        let in_call = (1.0..1.3).contains(&t) || (2.5..2.8).contains(&t);
        let sample = if in_call {
            0.5 * (2.0 * PI * 6000.0 * t).sin()
        } else {
            0.0
        };
        writer.write_sample((sample * 32_000.0) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn test_config_path_honours_explicit_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("custom.toml");

    cargo_bin_cmd!("flightcall")
        .args(["config", "path", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_init_then_show() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("flightcall.toml");

    cargo_bin_cmd!("flightcall")
        .args(["config", "init", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    assert!(config.exists());

    cargo_bin_cmd!("flightcall")
        .args(["config", "show", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("[filter]"))
        .stdout(predicate::str::contains("[segmentation]"));
}

#[test]
fn test_json_summary_on_stdout() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("XC777.wav");
    write_recording(&input);
    let out = temp_dir.path().join("clips");

    let assert = cargo_bin_cmd!("flightcall")
        .arg(&input)
        .arg("--config")
        .arg(temp_dir.path().join("missing.toml"))
        .arg("-o")
        .arg(&out)
        .args(["--json", "--no-progress"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["processed"], 1);
    assert_eq!(summary["failed"], 0);
    assert_eq!(summary["events"], 2);
    assert!(out.join("XC777").join("XC777.events.csv").exists());
    assert!(out.join("XC777").join("XC777_0000.wav").exists());
    assert!(out.join("XC777").join("XC777_0001.wav").exists());
}

#[test]
fn test_energy_strategy_from_flag() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("XC778.wav");
    write_recording(&input);

    cargo_bin_cmd!("flightcall")
        .arg(&input)
        .arg("--config")
        .arg(temp_dir.path().join("missing.toml"))
        .args(["--strategy", "energy-threshold", "--dry-run", "-q"])
        .assert()
        .success();

    // Dry run writes nothing
    assert!(!temp_dir.path().join("events").exists());
}

#[test]
fn test_filter_above_nyquist_fails_recording() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("XC779.wav");
    write_recording(&input);

    cargo_bin_cmd!("flightcall")
        .arg(&input)
        .arg("--config")
        .arg(temp_dir.path().join("missing.toml"))
        .args(["--high-hz", "15000", "--no-progress"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("1 recording(s) failed"));
}

#[test]
fn test_unknown_profile_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("XC780.wav");
    write_recording(&input);

    cargo_bin_cmd!("flightcall")
        .arg(&input)
        .arg("--config")
        .arg(temp_dir.path().join("missing.toml"))
        .args(["--profile", "Anthus pratensis"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("profile 'Anthus pratensis' not found"));
}

#[test]
fn test_invalid_order_is_rejected() {
    cargo_bin_cmd!("flightcall")
        .args(["in.wav", "--order", "0"])
        .assert()
        .failure();
}

#[test]
fn test_no_audio_files() {
    let temp_dir = TempDir::new().unwrap();

    cargo_bin_cmd!("flightcall")
        .arg(temp_dir.path())
        .arg("--config")
        .arg(temp_dir.path().join("missing.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no valid audio files"));
}
