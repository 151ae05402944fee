//! Error types for emotion-net

use thiserror::Error;

/// Result type alias for emotion-net operations
pub type Result<T> = std::result::Result<T, EmotionError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum EmotionError {
    /// Malformed input line, unparsable number or malformed one-hot vector.
    /// `line` is 1-based; 0 means the error is not tied to a source line.
    #[error("Format error at line {line}: {message}")]
    Format { line: usize, message: String },

    /// Labels line naming an identifier absent from the features file
    #[error("Lookup error at labels line {line}: no record with identifier '{id}'")]
    Lookup { id: String, line: usize },

    /// `record` names the offending label entry when there is one
    #[error("Range error: {value} is outside [{min}, {max}]{}", located(.record))]
    Range {
        value: i64,
        min: i64,
        max: i64,
        record: Option<String>,
    },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl EmotionError {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        EmotionError::Format {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_parameter(
        name: &str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        EmotionError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for EmotionError {
    fn from(err: serde_json::Error) -> Self {
        EmotionError::Serialization(err.to_string())
    }
}

fn located(record: &Option<String>) -> String {
    match record {
        Some(record) => format!(" ({})", record),
        None => String::new(),
    }
}
