//! Records and the line-oriented image/label file formats
//!
//! - [`Record`] - identifier, normalized pixel vector and optional one-hot label
//! - [`RecordLoader`] - parses features files and labels files
//! - [`split_records`] - ordered train/validation split

mod loader;

pub use loader::{LabelEntry, RecordLoader, DEFAULT_COMMENT_MARKER, DEFAULT_IDENTIFIER_PREFIX, DEFAULT_PIXEL_SCALE};

use crate::error::{EmotionError, Result};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// A single image: identifier, pixel features and (after labeling) a one-hot label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: String,
    features: Array1<f64>,
    label: Option<Array1<f64>>,
}

impl Record {
    /// Create an unlabeled record
    pub fn new(id: impl Into<String>, features: Array1<f64>) -> Self {
        Self {
            id: id.into(),
            features,
            label: None,
        }
    }

    /// Create a record with a one-hot label already attached
    pub fn labeled(id: impl Into<String>, features: Array1<f64>, label: Array1<f64>) -> Self {
        Self {
            id: id.into(),
            features,
            label: Some(label),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn features(&self) -> ArrayView1<'_, f64> {
        self.features.view()
    }

    pub fn label(&self) -> Option<ArrayView1<'_, f64>> {
        self.label.as_ref().map(|l| l.view())
    }

    pub fn is_labeled(&self) -> bool {
        self.label.is_some()
    }

    /// Attach or replace the one-hot label. The label is the only mutable part of a record.
    pub fn set_label(&mut self, label: Array1<f64>) {
        self.label = Some(label);
    }
}

/// Split labeled records into a training prefix and a validation suffix.
///
/// The first `floor(n * training_fraction)` records train, the rest validate.
/// Order is preserved; nothing is shuffled.
pub fn split_records(records: Vec<Record>, training_fraction: f64) -> Result<(Vec<Record>, Vec<Record>)> {
    if !(training_fraction > 0.0 && training_fraction < 1.0) {
        return Err(EmotionError::invalid_parameter(
            "training_fraction",
            training_fraction,
            "must be in (0, 1)",
        ));
    }

    let n = records.len();
    let train_size = (n as f64 * training_fraction) as usize;
    if train_size == 0 {
        return Err(EmotionError::EmptyInput(format!(
            "training split of {} records with fraction {} is empty",
            n, training_fraction
        )));
    }
    if train_size == n {
        return Err(EmotionError::EmptyInput(format!(
            "validation split of {} records with fraction {} is empty",
            n, training_fraction
        )));
    }

    let mut training = records;
    let validation = training.split_off(train_size);
    Ok((training, validation))
}
