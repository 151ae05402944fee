//! Run configuration
//!
//! A [`RunConfig`] gathers everything a command-line run needs: how to read
//! the input files, how to train, and when to stop. It can be read from a
//! JSON file; missing fields fall back to the defaults, which give the two
//! standard runs (fixed mode: 1000 epochs at 0.001; threshold mode:
//! 0.68 precision on a 70/30 split at 0.005).

use crate::data::{RecordLoader, DEFAULT_COMMENT_MARKER, DEFAULT_IDENTIFIER_PREFIX, DEFAULT_PIXEL_SCALE};
use crate::data::Record;
use crate::error::{EmotionError, Result};
use crate::training::{CheckFrequency, StoppingPolicy, TrainingConfig, DEFAULT_N_CLASSES, DEFAULT_N_FEATURES};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Which stopping policy a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoppingMode {
    /// Train on every labeled record for a fixed number of epochs
    #[default]
    Fixed,
    /// Hold out a validation split and stop once precision clears a threshold
    Threshold,
}

impl StoppingMode {
    /// Learning rate used when the configuration does not set one
    pub fn default_learning_rate(&self) -> f64 {
        match self {
            StoppingMode::Fixed => 0.001,
            StoppingMode::Threshold => 0.005,
        }
    }
}

impl FromStr for StoppingMode {
    type Err = EmotionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" | "epochs" => Ok(StoppingMode::Fixed),
            "threshold" | "precision" => Ok(StoppingMode::Threshold),
            other => Err(EmotionError::invalid_parameter(
                "mode",
                other,
                "expected 'fixed' or 'threshold'",
            )),
        }
    }
}

/// How input files are read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    pub comment_marker: String,
    pub identifier_prefix: String,
    pub pixel_scale: f64,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            comment_marker: DEFAULT_COMMENT_MARKER.to_string(),
            identifier_prefix: DEFAULT_IDENTIFIER_PREFIX.to_string(),
            pixel_scale: DEFAULT_PIXEL_SCALE,
        }
    }
}

/// Complete configuration of a train-then-predict run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub mode: StoppingMode,
    /// Delta-rule step size; `None` takes the mode's default
    pub learning_rate: Option<f64>,
    /// Epochs in fixed mode
    pub epochs: usize,
    /// Precision to exceed in threshold mode
    pub precision_threshold: f64,
    /// Share of labeled records used for training in threshold mode
    pub training_fraction: f64,
    /// Epoch cap in threshold mode
    pub max_epochs: usize,
    /// Optional wall-clock cap in threshold mode
    pub max_duration_secs: Option<f64>,
    pub check_frequency: CheckFrequency,
    pub random_state: Option<u64>,
    pub n_features: usize,
    pub n_classes: usize,
    pub loader: LoaderSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mode: StoppingMode::Fixed,
            learning_rate: None,
            epochs: 1000,
            precision_threshold: 0.68,
            training_fraction: 0.7,
            max_epochs: 1000,
            max_duration_secs: None,
            check_frequency: CheckFrequency::PerExample,
            random_state: None,
            n_features: DEFAULT_N_FEATURES,
            n_classes: DEFAULT_N_CLASSES,
            loader: LoaderSettings::default(),
        }
    }
}

impl RunConfig {
    /// Load and validate a JSON configuration file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate a JSON configuration string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_mode(mut self, mode: StoppingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = Some(learning_rate);
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_precision_threshold(mut self, threshold: f64) -> Self {
        self.precision_threshold = threshold;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Learning rate after applying the mode default
    pub fn effective_learning_rate(&self) -> f64 {
        self.learning_rate
            .unwrap_or_else(|| self.mode.default_learning_rate())
    }

    pub fn validate(&self) -> Result<()> {
        self.training_config().validate()?;

        if !(self.loader.pixel_scale > 0.0) {
            return Err(EmotionError::invalid_parameter(
                "loader.pixel_scale",
                self.loader.pixel_scale,
                "must be positive",
            ));
        }
        if self.loader.identifier_prefix.is_empty() {
            return Err(EmotionError::invalid_parameter(
                "loader.identifier_prefix",
                "\"\"",
                "must not be empty",
            ));
        }

        if self.mode == StoppingMode::Threshold {
            if !(self.precision_threshold > 0.0 && self.precision_threshold < 1.0) {
                return Err(EmotionError::invalid_parameter(
                    "precision_threshold",
                    self.precision_threshold,
                    "must be in (0, 1)",
                ));
            }
            if !(self.training_fraction > 0.0 && self.training_fraction < 1.0) {
                return Err(EmotionError::invalid_parameter(
                    "training_fraction",
                    self.training_fraction,
                    "must be in (0, 1)",
                ));
            }
            if self.max_epochs == 0 {
                return Err(EmotionError::invalid_parameter(
                    "max_epochs",
                    self.max_epochs,
                    "must be at least 1",
                ));
            }
            self.max_duration()?;
        }
        Ok(())
    }

    /// Trainer settings derived from this run configuration
    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            learning_rate: self.effective_learning_rate(),
            n_features: self.n_features,
            n_classes: self.n_classes,
            random_state: self.random_state,
        }
    }

    /// Loader that enforces the configured feature length
    pub fn record_loader(&self) -> RecordLoader {
        RecordLoader::new()
            .with_comment_marker(self.loader.comment_marker.clone())
            .with_identifier_prefix(self.loader.identifier_prefix.clone())
            .with_pixel_scale(self.loader.pixel_scale)
            .with_expected_len(self.n_features)
    }

    /// Wall-clock cap as a `Duration`; negative, NaN or overflowing seconds are rejected
    pub fn max_duration(&self) -> Result<Option<Duration>> {
        self.max_duration_secs
            .map(|secs| {
                Duration::try_from_secs_f64(secs).map_err(|err| {
                    EmotionError::invalid_parameter("max_duration_secs", secs, err.to_string())
                })
            })
            .transpose()
    }

    /// Stopping policy for this mode. `validation` is ignored in fixed mode.
    pub fn stopping_policy<'a>(&self, validation: &'a [Record]) -> Result<StoppingPolicy<'a>> {
        match self.mode {
            StoppingMode::Fixed => Ok(StoppingPolicy::fixed_epochs(self.epochs)),
            StoppingMode::Threshold => {
                let policy = StoppingPolicy::precision_threshold(validation, self.precision_threshold, self.max_epochs)
                    .with_frequency(self.check_frequency);
                Ok(match self.max_duration()? {
                    Some(limit) => policy.with_max_duration(limit),
                    None => policy,
                })
            }
        }
    }
}
