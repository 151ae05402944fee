//! Model training module
//!
//! - [`codec`] - one-hot label codec and label assignment
//! - [`model`] - single-layer sigmoid classifier and frozen predictor
//! - [`trainer`] - delta-rule trainer with pluggable stopping policy
//! - [`evaluator`] - classification precision

mod config;
pub mod codec;
pub mod evaluator;
pub mod model;
pub mod trainer;

pub use config::{TrainingConfig, DEFAULT_N_FEATURES};
pub use codec::{LabelCodec, DEFAULT_N_CLASSES};
pub use evaluator::{evaluate, measure_precision, Evaluation};
pub use model::{sigmoid, Classify, EmotionClassifier, Predictor};
pub use trainer::{CheckFrequency, StopReason, StoppingPolicy, Trainer, TrainingOutcome, TrainingReport};
