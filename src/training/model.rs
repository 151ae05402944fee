//! Single-layer sigmoid classifier
//!
//! The network is one `n_features × n_classes` weight matrix. The forward
//! pass is `sigmoid(features · W)`, evaluated in `f64` without clipping, and
//! the predicted label is the 1-based index of the largest output.

use crate::error::{EmotionError, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Anything that maps a feature vector to a 1-based label
pub trait Classify {
    /// Predict the 1-based label for `features`
    fn classify(&self, features: ArrayView1<f64>) -> Result<usize>;

    /// Number of labels this classifier chooses between
    fn n_classes(&self) -> usize;
}

/// Logistic sigmoid
#[inline]
pub fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

/// Index of the first maximum, converted to a 1-based label
fn argmax_label(output: &Array1<f64>) -> usize {
    let mut best_idx = 0;
    let mut best = f64::NEG_INFINITY;
    for (idx, &v) in output.iter().enumerate() {
        if v > best {
            best = v;
            best_idx = idx;
        }
    }
    best_idx + 1
}

fn check_features(n_features: usize, features: &ArrayView1<f64>) -> Result<()> {
    if features.len() != n_features {
        return Err(EmotionError::Shape {
            expected: format!("{} features", n_features),
            actual: format!("{} features", features.len()),
        });
    }
    Ok(())
}

/// Trainable classifier. Owns the only mutable copy of the weight matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionClassifier {
    weights: Array2<f64>,
}

impl EmotionClassifier {
    /// Create a classifier with weights drawn uniformly from `[0, 1)`.
    ///
    /// `random_state = None` seeds from OS entropy.
    pub fn new(n_features: usize, n_classes: usize, random_state: Option<u64>) -> Self {
        let mut rng = match random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let weights = Array2::from_shape_fn((n_features, n_classes), |_| rng.gen::<f64>());
        Self { weights }
    }

    /// Wrap an existing `n_features × n_classes` matrix
    pub fn from_weights(weights: Array2<f64>) -> Self {
        Self { weights }
    }

    pub fn n_features(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_classes(&self) -> usize {
        self.weights.ncols()
    }

    pub fn weights(&self) -> ArrayView2<'_, f64> {
        self.weights.view()
    }

    /// Elementwise sigmoid of `features · W`
    pub fn activate(&self, features: ArrayView1<f64>) -> Result<Array1<f64>> {
        check_features(self.n_features(), &features)?;
        Ok(self.forward(features))
    }

    /// 1-based label of the strongest output; ties go to the lowest label
    pub fn predict(&self, features: ArrayView1<f64>) -> Result<usize> {
        Ok(argmax_label(&self.activate(features)?))
    }

    /// Forward pass without the shape check. Callers validate shapes first.
    pub(crate) fn forward(&self, features: ArrayView1<f64>) -> Array1<f64> {
        features.dot(&self.weights).mapv(sigmoid)
    }

    /// Delta rule: `W[i, k] += features[i] * error[k] * learning_rate`
    pub(crate) fn apply_delta(&mut self, features: ArrayView1<f64>, error: &Array1<f64>, learning_rate: f64) {
        for (mut row, &x) in self.weights.rows_mut().into_iter().zip(features.iter()) {
            row.scaled_add(x * learning_rate, error);
        }
    }

    /// Freeze the current weights into an independent predictor
    pub fn snapshot(&self) -> Predictor {
        Predictor {
            weights: self.weights.clone(),
        }
    }
}

impl Classify for EmotionClassifier {
    fn classify(&self, features: ArrayView1<f64>) -> Result<usize> {
        self.predict(features)
    }

    fn n_classes(&self) -> usize {
        self.weights.ncols()
    }
}

/// Frozen prediction function.
///
/// Holds its own copy of the weights, so training that happens after the
/// snapshot was taken never changes its answers. Safe to share across threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predictor {
    weights: Array2<f64>,
}

impl Predictor {
    pub fn n_features(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_classes(&self) -> usize {
        self.weights.ncols()
    }

    pub fn weights(&self) -> ArrayView2<'_, f64> {
        self.weights.view()
    }

    /// Sigmoid outputs for every class
    pub fn scores(&self, features: ArrayView1<f64>) -> Result<Array1<f64>> {
        check_features(self.n_features(), &features)?;
        Ok(features.dot(&self.weights).mapv(sigmoid))
    }

    /// Predicted 1-based label
    pub fn predict(&self, features: ArrayView1<f64>) -> Result<usize> {
        Ok(argmax_label(&self.scores(features)?))
    }
}

impl Classify for Predictor {
    fn classify(&self, features: ArrayView1<f64>) -> Result<usize> {
        self.predict(features)
    }

    fn n_classes(&self) -> usize {
        self.weights.ncols()
    }
}
