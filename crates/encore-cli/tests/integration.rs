//! Integration tests for encore-cli.
//!
//! Each test runs the built `encore` binary.

use std::process::Command;
use tempfile::TempDir;

/// Helper to get the path to the `encore` binary built by cargo.
fn encore_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_encore"))
}

fn stdout_of(args: &[&str]) -> String {
    let output = encore_bin()
        .args(args)
        .output()
        .expect("failed to run encore");
    assert!(
        output.status.success(),
        "encore {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn presets_lists_every_preset() {
    let stdout = stdout_of(&["presets"]);
    assert!(stdout.contains("Effect Presets"));
    for name in ["compressor", "eq_low", "eq_mid", "eq_high", "freeverb", "dx_reverb"] {
        assert!(stdout.contains(name), "listing should contain '{name}'");
    }
}

#[test]
fn presets_detail_shows_parameters() {
    let stdout = stdout_of(&["presets", "COMPRESSOR"]);
    assert!(stdout.contains("threshold"));
    assert!(stdout.contains("4:1"));
    assert!(stdout.contains("Encoded size: 20 bytes"));
}

#[test]
fn presets_unknown_name_fails() {
    let output = encore_bin().args(["presets", "plate"]).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown preset"), "got: {stderr}");
}

#[test]
fn settings_init_writes_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audio.toml");
    let path_str = path.to_str().unwrap();

    let stdout = stdout_of(&["settings", "--path", path_str, "--init"]);
    assert!(path.exists());
    assert!(stdout.contains("master_volume = 1.0"), "got: {stdout}");
    assert!(stdout.contains("fade_ms = 1000"));
}

#[test]
fn settings_without_file_shows_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.toml");
    let stdout = stdout_of(&["settings", "--path", path.to_str().unwrap()]);
    assert!(stdout.contains("not found"));
    assert!(!path.exists());
}

#[test]
fn simulate_fade_reaches_target() {
    let stdout = stdout_of(&[
        "simulate", "--ticks", "4", "--tick-ms", "250", "--fade-to", "0",
    ]);
    let rows: Vec<&str> = stdout.lines().skip(1).collect();
    assert_eq!(rows.len(), 4);
    assert!(rows[1].contains("0.500"), "got: {}", rows[1]);
    assert!(rows[3].split_whitespace().nth(2) == Some("0.000"), "got: {}", rows[3]);
}

#[test]
fn simulate_reverb_slides_in() {
    let stdout = stdout_of(&["simulate", "--ticks", "6", "--tick-ms", "100", "--reverb"]);
    let last = stdout.lines().last().unwrap();
    assert!(last.contains("1.500"), "got: {last}");
}

#[test]
fn simulate_uses_settings_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audio.toml");
    std::fs::write(
        &path,
        "reverb_variant = \"dx_reverb\"\n[effects]\nreverb = true\n",
    )
    .unwrap();
    let stdout = stdout_of(&[
        "simulate",
        "--settings",
        path.to_str().unwrap(),
        "--ticks",
        "10",
        "--tick-ms",
        "50",
    ]);
    let last = stdout.lines().last().unwrap();
    assert!(last.contains("0.0dB"), "got: {last}");
}

#[test]
fn simulate_survives_extreme_tick_length() {
    let max = u64::MAX.to_string();
    let stdout = stdout_of(&["simulate", "--ticks", "3", "--tick-ms", &max]);
    let rows: Vec<&str> = stdout.lines().skip(1).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].split_whitespace().nth(1), Some(max.as_str()));
}

#[test]
fn simulate_rejects_bad_length() {
    let output = encore_bin()
        .args(["simulate", "--length-secs", "0"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}
