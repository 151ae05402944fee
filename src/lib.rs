//! emotion-net - four-way facial emotion classifier
//!
//! Trains a single-layer sigmoid network on 20×20 grayscale face images
//! (400 pixel features scaled to `[0, 1]`) and predicts one of four emotion
//! codes for unseen images.
//!
//! # Modules
//!
//! - [`data`] - records, features/labels file loader, train/validation split
//! - [`training`] - label codec, classifier, trainer, evaluator
//! - [`config`] - run configuration (JSON file + defaults)
//! - [`cli`] - command-line interface

pub mod error;

pub mod data;
pub mod training;

pub mod config;
pub mod cli;

pub use error::{EmotionError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{EmotionError, Result};

    pub use crate::data::{split_records, LabelEntry, Record, RecordLoader};

    pub use crate::training::{
        measure_precision, CheckFrequency, Classify, EmotionClassifier, LabelCodec, Predictor,
        StopReason, StoppingPolicy, Trainer, TrainingConfig, TrainingOutcome, TrainingReport,
    };

    pub use crate::config::{RunConfig, StoppingMode};
}
