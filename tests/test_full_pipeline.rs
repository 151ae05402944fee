//! Integration test: Full pipeline (files → labels → train → predict → output)

use emotion_net::cli::{train_and_predict, write_predictions};
use emotion_net::config::{RunConfig, StoppingMode};
use emotion_net::training::StopReason;
use std::fmt::Write as _;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

/// Grey level in [0, 31]; class `c` (0-based) lights rows 5c..5c+5 of the 20×20 image
fn pixel(class: usize, sample: usize, row: usize, col: usize) -> u32 {
    if row / 5 == class {
        (31 - (sample + row + col) % 4) as u32
    } else {
        ((sample * 3 + row * 7 + col) % 3) as u32
    }
}

fn write_image(out: &mut String, id: &str, class: usize, sample: usize) {
    writeln!(out, "{}", id).unwrap();
    for row in 0..20 {
        let line: Vec<String> = (0..20).map(|col| pixel(class, sample, row, col).to_string()).collect();
        writeln!(out, "{}", line.join(" ")).unwrap();
    }
}

/// Features file and labels file with `count` images, emotions interleaved 1, 2, 3, 4, 1, ...
fn dataset(count: usize, sample_offset: usize, prefix: &str) -> (String, String, Vec<(String, usize)>) {
    let mut features = String::from("# synthetic faces\n# 20x20, grey levels 0-31\n\n");
    let mut labels = String::from("# emotion codes\n");
    let mut expected = Vec::new();

    for i in 0..count {
        let class = i % 4;
        let id = format!("{}{}", prefix, i + 1);
        write_image(&mut features, &id, class, sample_offset + i / 4);
        writeln!(labels, "{} {}", id, class + 1).unwrap();
        expected.push((id, class + 1));
    }
    (features, labels, expected)
}

fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_fixed_epoch_pipeline() {
    let (train_features, train_labels, _) = dataset(20, 0, "Image");
    let (test_features, _, expected) = dataset(5, 40, "Image");

    let train_features = temp_file(&train_features);
    let train_labels = temp_file(&train_labels);
    let test_file = temp_file(&test_features);

    let config = RunConfig::default()
        .with_epochs(200)
        .with_learning_rate(0.01)
        .with_random_state(2024);

    let (outcome, predictions) =
        train_and_predict(&config, train_features.path(), train_labels.path(), test_file.path()).unwrap();

    assert_eq!(outcome.report.stop_reason, StopReason::EpochsCompleted);
    assert_eq!(outcome.report.forward_passes, 200 * 20);
    assert_eq!(predictions, expected);

    let mut out = Vec::new();
    write_predictions(&mut out, &predictions).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 5);
    assert!(text.starts_with("Image1 1\nImage2 2\n"));
}

#[test]
fn test_threshold_pipeline() {
    let (train_features, train_labels, _) = dataset(20, 0, "Image");
    let (test_features, _, _) = dataset(4, 60, "ImageT");

    let train_features = temp_file(&train_features);
    let train_labels = temp_file(&train_labels);
    let test_file = temp_file(&test_features);

    let config = RunConfig::default()
        .with_mode(StoppingMode::Threshold)
        .with_random_state(5);

    let (outcome, predictions) =
        train_and_predict(&config, train_features.path(), train_labels.path(), test_file.path()).unwrap();

    assert!(matches!(outcome.report.stop_reason, StopReason::ThresholdReached { .. }));
    assert!(outcome.report.epochs <= config.max_epochs);
    assert_eq!(predictions.len(), 4);
    assert_eq!(predictions[0].0, "ImageT1");
}

#[test]
fn test_unknown_label_identifier_fails() {
    let (train_features, mut train_labels, _) = dataset(4, 0, "Image");
    train_labels.push_str("Image99 2\n");
    let (test_features, _, _) = dataset(4, 0, "ImageT");

    let train_features = temp_file(&train_features);
    let train_labels = temp_file(&train_labels);
    let test_file = temp_file(&test_features);

    let err = train_and_predict(
        &RunConfig::default().with_epochs(1),
        train_features.path(),
        train_labels.path(),
        test_file.path(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("Image99"));
}

#[test]
fn test_binary_prints_predictions() {
    let (train_features, train_labels, _) = dataset(20, 0, "Image");
    let (test_features, _, expected) = dataset(4, 80, "ImageT");

    let train_features = temp_file(&train_features);
    let train_labels = temp_file(&train_labels);
    let test_file = temp_file(&test_features);

    let output = Command::new(env!("CARGO_BIN_EXE_emotion-net"))
        .arg(train_features.path())
        .arg(train_labels.path())
        .arg(test_file.path())
        .args(["--epochs", "200", "--learning-rate", "0.01", "--seed", "9"])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    let expected: Vec<String> = expected.iter().map(|(id, c)| format!("{} {}", id, c)).collect();
    assert_eq!(lines, expected);
}

#[test]
fn test_binary_fails_on_malformed_features() {
    let (train_features, train_labels, _) = dataset(4, 0, "Image");
    let train_features = temp_file(&format!("0 1 2\n{}", train_features));
    let train_labels = temp_file(&train_labels);
    let test_file = temp_file("Image1\n0\n");

    let output = Command::new(env!("CARGO_BIN_EXE_emotion-net"))
        .arg(train_features.path())
        .arg(train_labels.path())
        .arg(test_file.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Format error"));
}

#[test]
fn test_config_file_drives_run() {
    let config_file = temp_file(
        r#"{
            "epochs": 200,
            "learning_rate": 0.01,
            "random_state": 9,
            "loader": { "identifier_prefix": "Face" }
        }"#,
    );

    let config = RunConfig::load_from_file(config_file.path()).unwrap();
    assert_eq!(config.mode, StoppingMode::Fixed);
    assert_eq!(config.epochs, 200);
    assert_eq!(config.effective_learning_rate(), 0.01);
    assert_eq!(config.random_state, Some(9));
    assert_eq!(config.loader.identifier_prefix, "Face");
    assert_eq!(config.loader.comment_marker, "#");

    let (train_features, train_labels, _) = dataset(20, 0, "Face");
    let (test_features, _, expected) = dataset(4, 90, "FaceT");

    let train_features = temp_file(&train_features);
    let train_labels = temp_file(&train_labels);
    let test_file = temp_file(&test_features);

    let output = Command::new(env!("CARGO_BIN_EXE_emotion-net"))
        .arg(train_features.path())
        .arg(train_labels.path())
        .arg(test_file.path())
        .arg("--config")
        .arg(config_file.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    let expected: Vec<String> = expected.iter().map(|(id, c)| format!("{} {}", id, c)).collect();
    assert_eq!(lines, expected);
}

#[test]
fn test_invalid_config_file_rejected() {
    let config_file = temp_file(r#"{ "mode": "threshold", "precision_threshold": 1.5 }"#);
    assert!(RunConfig::load_from_file(config_file.path()).is_err());

    let (train_features, train_labels, _) = dataset(4, 0, "Image");
    let train_features = temp_file(&train_features);
    let train_labels = temp_file(&train_labels);

    let output = Command::new(env!("CARGO_BIN_EXE_emotion-net"))
        .arg(train_features.path())
        .arg(train_labels.path())
        .arg(train_features.path())
        .arg("--config")
        .arg(config_file.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("precision_threshold"));
}
