//! One-hot label codec
//!
//! Emotion codes are 1-based integers in `[1, K]`; the network works with
//! one-hot vectors of length `K`.

use crate::data::{LabelEntry, Record};
use crate::error::{EmotionError, Result};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Number of emotion classes in the face data set
pub const DEFAULT_N_CLASSES: usize = 4;

/// Converts between label codes and one-hot vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCodec {
    n_classes: usize,
}

impl Default for LabelCodec {
    fn default() -> Self {
        Self {
            n_classes: DEFAULT_N_CLASSES,
        }
    }
}

impl LabelCodec {
    pub fn new(n_classes: usize) -> Result<Self> {
        if n_classes == 0 {
            return Err(EmotionError::invalid_parameter(
                "n_classes",
                n_classes,
                "must be at least 1",
            ));
        }
        Ok(Self { n_classes })
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Encode a label code as a one-hot vector
    pub fn encode(&self, label: i64) -> Result<Array1<f64>> {
        let max = self.n_classes as i64;
        if label < 1 || label > max {
            return Err(EmotionError::Range {
                value: label,
                min: 1,
                max,
                record: None,
            });
        }

        let mut one_hot = Array1::zeros(self.n_classes);
        one_hot[(label - 1) as usize] = 1.0;
        Ok(one_hot)
    }

    /// Decode a one-hot vector back to its label code
    pub fn decode(&self, one_hot: ArrayView1<f64>) -> Result<usize> {
        if one_hot.len() != self.n_classes {
            return Err(EmotionError::Shape {
                expected: format!("one-hot vector of length {}", self.n_classes),
                actual: format!("length {}", one_hot.len()),
            });
        }

        let mut hot = one_hot.iter().enumerate().filter(|&(_, &v)| v == 1.0);
        match (hot.next(), hot.next()) {
            (Some((idx, _)), None) => Ok(idx + 1),
            (None, _) => Err(EmotionError::format(0, "one-hot vector has no entry equal to 1")),
            (Some(_), Some(_)) => Err(EmotionError::format(
                0,
                "one-hot vector has more than one entry equal to 1",
            )),
        }
    }

    /// Attach encoded labels to the records they name.
    ///
    /// Identifiers are matched exactly; when a features file repeats an
    /// identifier, the first record with that identifier receives the label.
    /// Entries apply in order, so a later line for the same identifier wins.
    /// Returns the number of labels attached.
    pub fn assign_labels(&self, records: &mut [Record], entries: &[LabelEntry]) -> Result<usize> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            index.entry(record.id()).or_insert(pos);
        }

        let mut updates = Vec::with_capacity(entries.len());
        for entry in entries {
            let pos = *index
                .get(entry.id.as_str())
                .ok_or_else(|| EmotionError::Lookup {
                    id: entry.id.clone(),
                    line: entry.line,
                })?;
            let label = self.encode(entry.code).map_err(|err| match err {
                EmotionError::Range { value, min, max, .. } => EmotionError::Range {
                    value,
                    min,
                    max,
                    record: Some(format!("'{}' at labels line {}", entry.id, entry.line)),
                },
                other => other,
            })?;
            updates.push((pos, label));
        }

        let attached = updates.len();
        for (pos, label) in updates {
            records[pos].set_label(label);
        }

        info!(labels = attached, records = records.len(), "Attached labels");
        Ok(attached)
    }
}
