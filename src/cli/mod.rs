//! Command-line interface
//!
//! `emotion-net <training-images> <training-answers> <testing-images>`
//! trains on the first two files and prints `<identifier> <label>` for every
//! record of the third, in input order.

use clap::Parser;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{RunConfig, StoppingMode};
use crate::data::{split_records, Record};
use crate::error::{EmotionError, Result};
use crate::training::{measure_precision, LabelCodec, Predictor, StopReason, Trainer, TrainingOutcome};

#[derive(Parser, Debug)]
#[command(name = "emotion-net")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train a four-way facial emotion classifier and label unseen images")]
#[command(long_about = None)]
pub struct Cli {
    /// Training images (features file)
    pub training_images: PathBuf,

    /// Emotion codes for the training images (labels file)
    pub training_answers: PathBuf,

    /// Images to classify (features file)
    pub testing_images: PathBuf,

    /// JSON run configuration; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Stopping mode (fixed, threshold)
    #[arg(short, long)]
    pub mode: Option<StoppingMode>,

    /// Epochs in fixed mode
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Delta-rule learning rate
    #[arg(short, long)]
    pub learning_rate: Option<f64>,

    /// Validation precision to exceed in threshold mode
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Seed for weight initialization
    #[arg(short, long)]
    pub seed: Option<u64>,
}

impl Cli {
    /// Merge the config file (or defaults) with command-line overrides
    pub fn run_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load_from_file(path)?,
            None => RunConfig::default(),
        };

        if let Some(mode) = self.mode {
            config = config.with_mode(mode);
        }
        if let Some(epochs) = self.epochs {
            config = config.with_epochs(epochs);
        }
        if let Some(lr) = self.learning_rate {
            config = config.with_learning_rate(lr);
        }
        if let Some(threshold) = self.threshold {
            config = config.with_precision_threshold(threshold);
        }
        if let Some(seed) = self.seed {
            config = config.with_random_state(seed);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Load labeled training records: features file plus labels file
pub fn load_training_set(config: &RunConfig, features: &Path, labels: &Path) -> Result<Vec<Record>> {
    let loader = config.record_loader();
    let codec = LabelCodec::new(config.n_classes)?;

    let mut records = loader.load_features(features)?;
    let entries = loader.load_labels(labels)?;
    codec.assign_labels(&mut records, &entries)?;
    Ok(records)
}

/// Train according to `config` on already-labeled records
pub fn train(config: &RunConfig, records: Vec<Record>) -> Result<TrainingOutcome> {
    let mut trainer = Trainer::new(config.training_config())?;

    match config.mode {
        StoppingMode::Fixed => trainer.fit(&records, config.stopping_policy(&[])?),
        StoppingMode::Threshold => {
            let (training, validation) = split_records(records, config.training_fraction)?;
            info!(
                training = training.len(),
                validation = validation.len(),
                "Split labeled records"
            );
            let outcome = trainer.fit(&training, config.stopping_policy(&validation)?)?;
            if let StopReason::ThresholdReached { precision } = outcome.report.stop_reason {
                info!(precision, "Validation precision above threshold");
            } else {
                let precision = measure_precision(&outcome.predictor, &validation)?;
                info!(precision, "Final validation precision");
            }
            Ok(outcome)
        }
    }
}

/// Predict a label for every record, keeping input order
pub fn predict_all(predictor: &Predictor, records: &[Record]) -> Result<Vec<(String, usize)>> {
    if records.is_empty() {
        return Err(EmotionError::EmptyInput("testing set is empty".to_string()));
    }
    records
        .iter()
        .map(|r| Ok((r.id().to_string(), predictor.predict(r.features())?)))
        .collect()
}

/// Write one `<identifier> <label>` line per prediction
pub fn write_predictions<W: Write>(out: &mut W, predictions: &[(String, usize)]) -> io::Result<()> {
    for (id, label) in predictions {
        writeln!(out, "{} {}", id, label)?;
    }
    out.flush()
}

/// Full train-then-predict pipeline over three files
pub fn train_and_predict(
    config: &RunConfig,
    training_images: &Path,
    training_answers: &Path,
    testing_images: &Path,
) -> Result<(TrainingOutcome, Vec<(String, usize)>)> {
    let training = load_training_set(config, training_images, training_answers)?;
    let testing = config.record_loader().load_features(testing_images)?;
    let outcome = train(config, training)?;
    let predictions = predict_all(&outcome.predictor, &testing)?;
    Ok((outcome, predictions))
}

/// Entry point behind `main`
pub fn cmd_run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.run_config()?;
    info!(
        mode = ?config.mode,
        learning_rate = config.effective_learning_rate(),
        "Run configuration"
    );

    let (_, predictions) = train_and_predict(
        &config,
        &cli.training_images,
        &cli.training_answers,
        &cli.testing_images,
    )?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_predictions(&mut out, &predictions)?;
    Ok(())
}
