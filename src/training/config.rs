//! Training configuration

use crate::error::{EmotionError, Result};
use serde::{Deserialize, Serialize};

use super::codec::DEFAULT_N_CLASSES;

/// Length of a face feature vector (a 20×20 image)
pub const DEFAULT_N_FEATURES: usize = 400;

/// Configuration for a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Step size of the delta rule
    pub learning_rate: f64,

    /// Feature vector length (rows of the weight matrix)
    pub n_features: usize,

    /// Number of labels (columns of the weight matrix)
    pub n_classes: usize,

    /// Seed for weight initialization (None = OS entropy)
    pub random_state: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            n_features: DEFAULT_N_FEATURES,
            n_classes: DEFAULT_N_CLASSES,
            random_state: None,
        }
    }
}

impl TrainingConfig {
    /// Create a new configuration with the given learning rate
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            ..Default::default()
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_shape(mut self, n_features: usize, n_classes: usize) -> Self {
        self.n_features = n_features;
        self.n_classes = n_classes;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Reject values the trainer cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(EmotionError::invalid_parameter(
                "learning_rate",
                self.learning_rate,
                "must be a positive finite number",
            ));
        }
        if self.n_features == 0 {
            return Err(EmotionError::invalid_parameter("n_features", 0, "must be at least 1"));
        }
        if self.n_classes == 0 {
            return Err(EmotionError::invalid_parameter("n_classes", 0, "must be at least 1"));
        }
        Ok(())
    }
}
