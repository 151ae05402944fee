//! Online delta-rule trainer
//!
//! One [`Trainer`] covers both ways of deciding when to stop:
//!
//! - [`StoppingPolicy::FixedEpochs`] runs exactly `n` full passes.
//! - [`StoppingPolicy::PrecisionThreshold`] measures precision on a
//!   validation set and stops as soon as it exceeds the threshold. An epoch
//!   cap (and optionally a wall-clock cap) bounds the run; when the cap is hit
//!   the run ends with [`StopReason::Exhausted`].

use super::config::TrainingConfig;
use super::evaluator::measure_precision;
use super::model::{EmotionClassifier, Predictor};
use crate::data::Record;
use crate::error::{EmotionError, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// When precision is measured under a threshold policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckFrequency {
    /// Before every training example
    #[default]
    PerExample,
    /// Before every epoch
    PerEpoch,
}

/// Stopping policy for a training run
#[derive(Debug, Clone)]
pub enum StoppingPolicy<'a> {
    /// Exactly `n` epochs, no early exit
    FixedEpochs(usize),
    /// Stop once validation precision is strictly above `threshold`
    PrecisionThreshold {
        validation: &'a [Record],
        threshold: f64,
        max_epochs: usize,
        max_duration: Option<Duration>,
        frequency: CheckFrequency,
    },
}

impl<'a> StoppingPolicy<'a> {
    pub fn fixed_epochs(n: usize) -> Self {
        StoppingPolicy::FixedEpochs(n)
    }

    /// Threshold policy checking before every example, capped at `max_epochs`
    pub fn precision_threshold(validation: &'a [Record], threshold: f64, max_epochs: usize) -> Self {
        StoppingPolicy::PrecisionThreshold {
            validation,
            threshold,
            max_epochs,
            max_duration: None,
            frequency: CheckFrequency::PerExample,
        }
    }

    /// Add a wall-clock cap. No effect on fixed-epoch policies.
    pub fn with_max_duration(mut self, limit: Duration) -> Self {
        if let StoppingPolicy::PrecisionThreshold { max_duration, .. } = &mut self {
            *max_duration = Some(limit);
        }
        self
    }

    /// Change how often precision is measured. No effect on fixed-epoch policies.
    pub fn with_frequency(mut self, check: CheckFrequency) -> Self {
        if let StoppingPolicy::PrecisionThreshold { frequency, .. } = &mut self {
            *frequency = check;
        }
        self
    }

    fn validate(&self) -> Result<()> {
        if let StoppingPolicy::PrecisionThreshold {
            validation,
            threshold,
            max_epochs,
            ..
        } = self
        {
            if !(*threshold > 0.0 && *threshold < 1.0) {
                return Err(EmotionError::invalid_parameter(
                    "precision_threshold",
                    threshold,
                    "must be in (0, 1)",
                ));
            }
            if *max_epochs == 0 {
                return Err(EmotionError::invalid_parameter(
                    "max_epochs",
                    max_epochs,
                    "threshold training needs an epoch cap of at least 1",
                ));
            }
            if validation.is_empty() {
                return Err(EmotionError::EmptyInput("validation set is empty".to_string()));
            }
        }
        Ok(())
    }
}

/// Why a training run ended
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// Fixed-epoch run finished all its passes
    EpochsCompleted,
    /// Validation precision exceeded the threshold
    ThresholdReached { precision: f64 },
    /// Epoch or time cap hit before the threshold was exceeded
    Exhausted { best_precision: f64 },
}

/// Statistics of one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Completed epochs
    pub epochs: usize,
    /// Forward passes over training examples (one per weight update)
    pub forward_passes: usize,
    /// Number of validation precision measurements
    pub precision_checks: usize,
    /// Most recent validation precision, if any was measured
    pub validation_precision: Option<f64>,
    pub stop_reason: StopReason,
    pub elapsed_secs: f64,
}

/// Frozen predictor plus the report of the run that produced it
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub predictor: Predictor,
    pub report: TrainingReport,
}

impl TrainingOutcome {
    /// True when a threshold run stopped on its caps instead of the threshold
    pub fn is_exhausted(&self) -> bool {
        matches!(self.report.stop_reason, StopReason::Exhausted { .. })
    }
}

/// Running counters shared by both policies
struct Progress {
    start: Instant,
    epochs: usize,
    forward_passes: usize,
    precision_checks: usize,
    last_precision: Option<f64>,
    best_precision: f64,
}

impl Progress {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            epochs: 0,
            forward_passes: 0,
            precision_checks: 0,
            last_precision: None,
            best_precision: 0.0,
        }
    }

    fn record_precision(&mut self, precision: f64) {
        self.precision_checks += 1;
        self.last_precision = Some(precision);
        self.best_precision = self.best_precision.max(precision);
    }

    fn finish(self, stop_reason: StopReason) -> TrainingReport {
        TrainingReport {
            epochs: self.epochs,
            forward_passes: self.forward_passes,
            precision_checks: self.precision_checks,
            validation_precision: self.last_precision,
            stop_reason,
            elapsed_secs: self.start.elapsed().as_secs_f64(),
        }
    }
}

/// Owns the classifier while it is being trained
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
    classifier: EmotionClassifier,
}

impl Trainer {
    /// Create a trainer with freshly initialized weights
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        let classifier = EmotionClassifier::new(config.n_features, config.n_classes, config.random_state);
        Ok(Self { config, classifier })
    }

    /// Continue from an existing classifier instead of random weights
    pub fn with_classifier(config: TrainingConfig, classifier: EmotionClassifier) -> Result<Self> {
        config.validate()?;
        if classifier.n_features() != config.n_features || classifier.n_classes() != config.n_classes {
            return Err(EmotionError::Shape {
                expected: format!("{}x{} weight matrix", config.n_features, config.n_classes),
                actual: format!("{}x{}", classifier.n_features(), classifier.n_classes()),
            });
        }
        Ok(Self { config, classifier })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Current (possibly mid-training) classifier
    pub fn classifier(&self) -> &EmotionClassifier {
        &self.classifier
    }

    /// Re-draw the weights from the configured seed
    pub fn reset(&mut self) {
        self.classifier =
            EmotionClassifier::new(self.config.n_features, self.config.n_classes, self.config.random_state);
    }

    /// Train from freshly initialized weights and return a frozen predictor
    pub fn fit(&mut self, training: &[Record], policy: StoppingPolicy<'_>) -> Result<TrainingOutcome> {
        self.reset();
        self.resume(training, policy)
    }

    /// Train starting from the current weights
    pub fn resume(&mut self, training: &[Record], policy: StoppingPolicy<'_>) -> Result<TrainingOutcome> {
        self.check_training_set(training)?;
        policy.validate()?;

        info!(
            records = training.len(),
            learning_rate = self.config.learning_rate,
            "Starting training"
        );

        let outcome = match policy {
            StoppingPolicy::FixedEpochs(n) => self.run_fixed(training, n),
            StoppingPolicy::PrecisionThreshold {
                validation,
                threshold,
                max_epochs,
                max_duration,
                frequency,
            } => self.run_threshold(training, validation, threshold, max_epochs, max_duration, frequency)?,
        };

        match outcome.report.stop_reason {
            StopReason::Exhausted { best_precision } => warn!(
                epochs = outcome.report.epochs,
                best_precision,
                "Stopping policy exhausted without reaching the precision threshold"
            ),
            reason => info!(
                epochs = outcome.report.epochs,
                forward_passes = outcome.report.forward_passes,
                elapsed_secs = outcome.report.elapsed_secs,
                ?reason,
                "Training finished"
            ),
        }

        Ok(outcome)
    }

    fn check_training_set(&self, training: &[Record]) -> Result<()> {
        if training.is_empty() {
            return Err(EmotionError::EmptyInput("training set is empty".to_string()));
        }

        for record in training {
            if record.features().len() != self.config.n_features {
                return Err(EmotionError::Shape {
                    expected: format!("{} features", self.config.n_features),
                    actual: format!("{} features in record '{}'", record.features().len(), record.id()),
                });
            }
            let label_len = record.label().map(|l| l.len());
            if label_len != Some(self.config.n_classes) {
                return Err(EmotionError::Shape {
                    expected: format!("one-hot label of length {}", self.config.n_classes),
                    actual: match label_len {
                        Some(len) => format!("length {} in record '{}'", len, record.id()),
                        None => format!("no label on record '{}'", record.id()),
                    },
                });
            }
        }
        Ok(())
    }

    /// One delta-rule update for one example. Shapes were checked up front.
    fn step(&mut self, record: &Record, progress: &mut Progress) {
        let features = record.features();
        let output = self.classifier.forward(features);
        progress.forward_passes += 1;

        if let Some(target) = record.label() {
            let error = &target - &output;
            self.classifier.apply_delta(features, &error, self.config.learning_rate);
        }
    }

    fn run_fixed(&mut self, training: &[Record], epochs: usize) -> TrainingOutcome {
        let mut progress = Progress::new();

        for epoch in 0..epochs {
            for record in training {
                self.step(record, &mut progress);
            }
            progress.epochs += 1;
            debug!(epoch, "Epoch complete");
        }

        TrainingOutcome {
            predictor: self.classifier.snapshot(),
            report: progress.finish(StopReason::EpochsCompleted),
        }
    }

    fn run_threshold(
        &mut self,
        training: &[Record],
        validation: &[Record],
        threshold: f64,
        max_epochs: usize,
        max_duration: Option<Duration>,
        frequency: CheckFrequency,
    ) -> Result<TrainingOutcome> {
        let mut progress = Progress::new();
        let out_of_time = |progress: &Progress| max_duration.is_some_and(|limit| progress.start.elapsed() >= limit);

        for epoch in 0..max_epochs {
            for (idx, record) in training.iter().enumerate() {
                let check = match frequency {
                    CheckFrequency::PerExample => true,
                    CheckFrequency::PerEpoch => idx == 0,
                };
                if check {
                    if let Some(outcome) = self.check_threshold(validation, threshold, &mut progress)? {
                        return Ok(outcome);
                    }
                }
                if out_of_time(&progress) {
                    return Ok(self.exhausted(progress));
                }
                self.step(record, &mut progress);
            }
            progress.epochs += 1;
            debug!(epoch, precision = ?progress.last_precision, "Epoch complete");
        }

        // The last update has not been measured yet
        if let Some(outcome) = self.check_threshold(validation, threshold, &mut progress)? {
            return Ok(outcome);
        }
        Ok(self.exhausted(progress))
    }

    fn check_threshold(
        &self,
        validation: &[Record],
        threshold: f64,
        progress: &mut Progress,
    ) -> Result<Option<TrainingOutcome>> {
        let precision = measure_precision(&self.classifier, validation)?;
        progress.record_precision(precision);

        if precision > threshold {
            let finished = std::mem::replace(progress, Progress::new());
            return Ok(Some(TrainingOutcome {
                predictor: self.classifier.snapshot(),
                report: finished.finish(StopReason::ThresholdReached { precision }),
            }));
        }
        Ok(None)
    }

    fn exhausted(&self, progress: Progress) -> TrainingOutcome {
        let best_precision = progress.best_precision;
        TrainingOutcome {
            predictor: self.classifier.snapshot(),
            report: progress.finish(StopReason::Exhausted { best_precision }),
        }
    }
}
