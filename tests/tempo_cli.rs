//! Black-box tests for the `tempo_cli` binary.

use std::path::PathBuf;
use std::process::{Command, Output};

use golf_tempo_trainer::testing::{swing_schedule, synthesize_swings, SynthConfig};
use serde_json::Value;

fn cli() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_tempo_cli"));
    command.env_remove("GOLF_TEMPO_CONFIG");
    command
}

fn run_json(args: &[&str]) -> Value {
    let output = cli().args(args).output().expect("run tempo_cli");
    assert!(
        output.status.success(),
        "tempo_cli {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("JSON on stdout")
}

fn last_json_document(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let start = stdout.rfind("\n{\n").map(|idx| idx + 1).unwrap_or(0);
    serde_json::from_str(&stdout[start..]).expect("trailing JSON document")
}

#[test]
fn test_tempo_command_prints_durations() {
    let json = run_json(&["tempo", "--bpm", "60", "--ratio", "3"]);
    assert_eq!(json["backswing_secs"], 3.0);
    assert_eq!(json["downswing_secs"], 1.0);
    assert_eq!(json["metronome_spacing_secs"], 1.0);
}

#[test]
fn test_tempo_command_rejects_zero_bpm() {
    let output = cli()
        .args(["tempo", "--bpm", "0"])
        .output()
        .expect("run tempo_cli");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_catalog_lists_putting_pros() {
    let json = run_json(&["catalog", "--shot-type", "putting"]);
    let names: Vec<&str> = json
        .as_array()
        .expect("pro list")
        .iter()
        .filter_map(|pro| pro["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Adam Scott", "Tiger Woods", "Jake Armijo"]);
}

#[test]
fn test_simulate_reports_perfect_swings() {
    let json = run_json(&["simulate", "--swings", "6", "--interval", "0.5"]);
    assert_eq!(json["perfect"], 5);
    assert_eq!(json["needs_work"], 0);
    assert_eq!(json["observations"].as_array().map(Vec::len), Some(5));
}

#[test]
fn test_analyze_reads_wav_recording() {
    let bursts = swing_schedule(4, 0.3, 0.7, 0.0, 5);
    let recording = synthesize_swings(&bursts, 3.0, &SynthConfig::default());
    let path: PathBuf =
        std::env::temp_dir().join(format!("tempo_cli_analyze_{}.wav", std::process::id()));

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: recording.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).expect("create wav");
    for sample in &recording.samples {
        writer
            .write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .expect("write sample");
    }
    writer.finalize().expect("finalize wav");

    let json = run_json(&["analyze", "--wav", path.to_str().unwrap(), "--expected", "0.5"]);
    let _ = std::fs::remove_file(&path);

    assert_eq!(json["sample_rate"], 44_100);
    assert_eq!(json["needs_work"], 3);
    assert_eq!(json["perfect"], 0);
}

#[test]
fn test_silent_training_session_prints_summary() {
    let output = cli()
        .args([
            "train",
            "--silent",
            "--no-analyze",
            "--duration",
            "0.5",
            "--shot-type",
            "putting",
            "--pro",
            "jake armijo",
        ])
        .output()
        .expect("run tempo_cli");
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let summary = last_json_document(&output);
    assert_eq!(summary["pro_name"], "Jake Armijo");
    assert_eq!(summary["shot_type"], "putting");
    assert_eq!(summary["cycles_completed"], 0);
}
