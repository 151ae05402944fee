//! Classification precision over a labeled record set

use super::codec::LabelCodec;
use super::model::Classify;
use crate::data::Record;
use crate::error::{EmotionError, Result};
use serde::{Deserialize, Serialize};

/// Outcome of evaluating a classifier on labeled records
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub correct: usize,
    pub total: usize,
    /// `correct / total`, in `[0, 1]`
    pub precision: f64,
}

/// Count correct predictions. Every record must carry a label.
pub fn evaluate<C: Classify + ?Sized>(classifier: &C, records: &[Record]) -> Result<Evaluation> {
    if records.is_empty() {
        return Err(EmotionError::EmptyInput(
            "cannot measure precision on an empty record set".to_string(),
        ));
    }

    let codec = LabelCodec::new(classifier.n_classes())?;
    let mut correct = 0;

    for record in records {
        let label = record.label().ok_or_else(|| EmotionError::Shape {
            expected: format!("one-hot label of length {}", codec.n_classes()),
            actual: format!("no label on record '{}'", record.id()),
        })?;

        if classifier.classify(record.features())? == codec.decode(label)? {
            correct += 1;
        }
    }

    Ok(Evaluation {
        correct,
        total: records.len(),
        precision: correct as f64 / records.len() as f64,
    })
}

/// Fraction of records whose predicted label matches their one-hot label
pub fn measure_precision<C: Classify + ?Sized>(classifier: &C, records: &[Record]) -> Result<f64> {
    evaluate(classifier, records).map(|e| e.precision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, ArrayView1};

    /// Predicts label 1 when the first feature is positive, otherwise label 2
    struct SignClassifier;

    impl Classify for SignClassifier {
        fn classify(&self, features: ArrayView1<f64>) -> Result<usize> {
            Ok(if features[0] > 0.0 { 1 } else { 2 })
        }

        fn n_classes(&self) -> usize {
            4
        }
    }

    fn labeled(id: &str, x: f64, label: i64) -> Record {
        let codec = LabelCodec::default();
        Record::labeled(id, array![x], codec.encode(label).unwrap())
    }

    #[test]
    fn test_precision() {
        let records = vec![
            labeled("a", 1.0, 1),
            labeled("b", -1.0, 2),
            labeled("c", 1.0, 3),
            labeled("d", -1.0, 1),
        ];

        let eval = evaluate(&SignClassifier, &records).unwrap();
        assert_eq!(eval.correct, 2);
        assert_eq!(eval.total, 4);
        assert!((measure_precision(&SignClassifier, &records).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_set() {
        let err = measure_precision(&SignClassifier, &[]).unwrap_err();
        assert!(matches!(err, EmotionError::EmptyInput(_)));
    }

    #[test]
    fn test_unlabeled_record() {
        let records = vec![Record::new("x", Array1::from_elem(1, 1.0))];
        assert!(matches!(
            measure_precision(&SignClassifier, &records),
            Err(EmotionError::Shape { .. })
        ));
    }

    #[test]
    fn test_malformed_label() {
        let records = vec![Record::labeled("x", array![1.0], array![1.0, 1.0, 0.0, 0.0])];
        assert!(matches!(
            measure_precision(&SignClassifier, &records),
            Err(EmotionError::Format { .. })
        ));
    }
}
