//! Loader for the image features and image labels text formats
//!
//! Features file:
//!
//! ```text
//! # comment
//! Image1
//! 0 3 31 ...
//! 12 4 0 ...
//! Image2
//! ...
//! ```
//!
//! Every pixel token is divided by the pixel scale (31 by default) so that
//! features land in `[0, 1]`. Labels file lines are `<identifier> <code>`.

use super::Record;
use crate::error::{EmotionError, Result};
use ndarray::Array1;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

pub const DEFAULT_COMMENT_MARKER: &str = "#";
pub const DEFAULT_IDENTIFIER_PREFIX: &str = "Image";
pub const DEFAULT_PIXEL_SCALE: f64 = 31.0;

/// One non-comment line of a labels file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEntry {
    pub id: String,
    /// Raw label code, not yet range checked
    pub code: i64,
    /// 1-based line number in the source
    pub line: usize,
}

/// Parser for features and labels files
#[derive(Debug, Clone)]
pub struct RecordLoader {
    comment_marker: String,
    identifier_prefix: String,
    pixel_scale: f64,
    expected_len: Option<usize>,
}

impl Default for RecordLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordLoader {
    /// Create a loader with the default markers and a pixel scale of 31
    pub fn new() -> Self {
        Self {
            comment_marker: DEFAULT_COMMENT_MARKER.to_string(),
            identifier_prefix: DEFAULT_IDENTIFIER_PREFIX.to_string(),
            pixel_scale: DEFAULT_PIXEL_SCALE,
            expected_len: None,
        }
    }

    /// Set the leading marker of comment lines
    pub fn with_comment_marker(mut self, marker: impl Into<String>) -> Self {
        self.comment_marker = marker.into();
        self
    }

    /// Set the token that opens a new record
    pub fn with_identifier_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.identifier_prefix = prefix.into();
        self
    }

    /// Set the divisor applied to every raw pixel value
    pub fn with_pixel_scale(mut self, scale: f64) -> Self {
        self.pixel_scale = scale;
        self
    }

    /// Reject records whose feature vector does not have exactly `len` entries
    pub fn with_expected_len(mut self, len: usize) -> Self {
        self.expected_len = Some(len);
        self
    }

    fn is_skipped(&self, line: &str) -> bool {
        line.trim().is_empty() || (!self.comment_marker.is_empty() && line.starts_with(&self.comment_marker))
    }

    /// Load records from a features file
    pub fn load_features(&self, path: impl AsRef<Path>) -> Result<Vec<Record>> {
        let path = path.as_ref();
        let start = Instant::now();
        let file = File::open(path)?;
        let records = self.parse_features(BufReader::new(file))?;

        info!(
            path = %path.display(),
            records = records.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded feature records"
        );
        Ok(records)
    }

    /// Parse records from any buffered reader
    pub fn parse_features<R: BufRead>(&self, reader: R) -> Result<Vec<Record>> {
        if !(self.pixel_scale > 0.0) {
            return Err(EmotionError::invalid_parameter(
                "pixel_scale",
                self.pixel_scale,
                "must be positive",
            ));
        }

        let mut records = Vec::new();
        let mut current: Option<(String, Vec<f64>)> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            let line = line.trim_end();

            if self.is_skipped(line) {
                continue;
            }

            if line.starts_with(&self.identifier_prefix) {
                if let Some((id, pixels)) = current.take() {
                    records.push(self.finish_record(id, pixels)?);
                }
                current = Some((line.to_string(), Vec::new()));
                continue;
            }

            let (_, pixels) = current.as_mut().ok_or_else(|| {
                EmotionError::format(
                    line_no,
                    format!("feature line appears before any '{}' identifier line", self.identifier_prefix),
                )
            })?;

            for token in line.split_whitespace() {
                let value: f64 = token.parse().map_err(|_| {
                    EmotionError::format(line_no, format!("unparsable pixel value '{}'", token))
                })?;
                let scaled = value / self.pixel_scale;
                if !(0.0..=1.0).contains(&scaled) {
                    return Err(EmotionError::format(
                        line_no,
                        format!("pixel value '{}' is outside [0, {}]", token, self.pixel_scale),
                    ));
                }
                pixels.push(scaled);
            }
        }

        if let Some((id, pixels)) = current.take() {
            records.push(self.finish_record(id, pixels)?);
        }

        debug!(records = records.len(), "Parsed features");
        Ok(records)
    }

    /// Parse records from an in-memory string
    pub fn parse_features_str(&self, source: &str) -> Result<Vec<Record>> {
        self.parse_features(source.as_bytes())
    }

    fn finish_record(&self, id: String, pixels: Vec<f64>) -> Result<Record> {
        if let Some(expected) = self.expected_len {
            if pixels.len() != expected {
                return Err(EmotionError::Shape {
                    expected: format!("{} features", expected),
                    actual: format!("{} features in record '{}'", pixels.len(), id),
                });
            }
        }
        Ok(Record::new(id, Array1::from_vec(pixels)))
    }

    /// Load `<identifier> <code>` entries from a labels file
    pub fn load_labels(&self, path: impl AsRef<Path>) -> Result<Vec<LabelEntry>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let entries = self.parse_labels(BufReader::new(file))?;

        info!(path = %path.display(), labels = entries.len(), "Loaded labels");
        Ok(entries)
    }

    /// Parse label entries from any buffered reader
    pub fn parse_labels<R: BufRead>(&self, reader: R) -> Result<Vec<LabelEntry>> {
        let mut entries = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            let line = line.trim_end();

            if self.is_skipped(line) {
                continue;
            }

            let mut tokens = line.split_whitespace();
            let (id, code) = match (tokens.next(), tokens.next(), tokens.next()) {
                (Some(id), Some(code), None) => (id, code),
                _ => {
                    return Err(EmotionError::format(
                        line_no,
                        format!("expected '<identifier> <label>', got '{}'", line),
                    ))
                }
            };

            let code: i64 = code.parse().map_err(|_| {
                EmotionError::format(line_no, format!("unparsable label code '{}'", code))
            })?;

            entries.push(LabelEntry {
                id: id.to_string(),
                code,
                line: line_no,
            });
        }

        Ok(entries)
    }

    /// Parse label entries from an in-memory string
    pub fn parse_labels_str(&self, source: &str) -> Result<Vec<LabelEntry>> {
        self.parse_labels(source.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FEATURES: &str = "\
# Training images
# generated for tests

Image1
0 31 31
31 0

Image2
# inline comment
15.5 0 0 0 31
";

    #[test]
    fn test_parse_features() {
        let records = RecordLoader::new().parse_features_str(FEATURES).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), "Image1");
        assert_eq!(records[0].features().to_vec(), vec![0.0, 1.0, 1.0, 1.0, 0.0]);
        assert_eq!(records[1].id(), "Image2");
        assert_eq!(records[1].features().len(), 5);
        assert!((records[1].features()[0] - 0.5).abs() < 1e-12);
        assert!(records.iter().all(|r| !r.is_labeled()));
    }

    #[test]
    fn test_feature_line_before_identifier() {
        let err = RecordLoader::new()
            .parse_features_str("# header\n\n1 2 3\nImage1\n4 5 6\n")
            .unwrap_err();
        assert!(matches!(err, EmotionError::Format { line: 3, .. }), "{:?}", err);
    }

    #[test]
    fn test_unparsable_pixel() {
        let err = RecordLoader::new()
            .parse_features_str("Image1\n1 2 x3\n")
            .unwrap_err();
        assert!(matches!(err, EmotionError::Format { line: 2, .. }));
    }

    #[test]
    fn test_pixel_out_of_range() {
        let loader = RecordLoader::new();
        for source in ["Image1\nnan 0\n", "Image1\n0 inf\n", "Image1\n-1 0\n", "Image1\n0 32\n"] {
            let err = loader.parse_features_str(source).unwrap_err();
            assert!(matches!(err, EmotionError::Format { line: 2, .. }), "{:?}", err);
        }
    }

    #[test]
    fn test_expected_len() {
        let loader = RecordLoader::new().with_expected_len(5);
        assert!(loader.parse_features_str(FEATURES).is_ok());

        let loader = RecordLoader::new().with_expected_len(4);
        let err = loader.parse_features_str(FEATURES).unwrap_err();
        assert!(matches!(err, EmotionError::Shape { .. }));
    }

    #[test]
    fn test_custom_markers() {
        let loader = RecordLoader::new()
            .with_comment_marker("//")
            .with_identifier_prefix("Face")
            .with_pixel_scale(2.0);
        let records = loader.parse_features_str("// c\nFace-a\n2 1\n").unwrap();
        assert_eq!(records[0].id(), "Face-a");
        assert_eq!(records[0].features().to_vec(), vec![1.0, 0.5]);
    }

    #[test]
    fn test_parse_labels() {
        let entries = RecordLoader::new()
            .parse_labels_str("# answers\nImage1 3\n\nImage2 1\r\n")
            .unwrap();
        assert_eq!(
            entries,
            vec![
                LabelEntry { id: "Image1".into(), code: 3, line: 2 },
                LabelEntry { id: "Image2".into(), code: 1, line: 4 },
            ]
        );
    }

    #[test]
    fn test_parse_labels_malformed() {
        let loader = RecordLoader::new();
        assert!(matches!(
            loader.parse_labels_str("Image1\n"),
            Err(EmotionError::Format { line: 1, .. })
        ));
        assert!(matches!(
            loader.parse_labels_str("Image1 two\n"),
            Err(EmotionError::Format { line: 1, .. })
        ));
        assert!(matches!(
            loader.parse_labels_str("Image1 2 3\n"),
            Err(EmotionError::Format { .. })
        ));
    }

    #[test]
    fn test_load_from_files() {
        let mut features = NamedTempFile::new().unwrap();
        write!(features, "{}", FEATURES).unwrap();
        let mut labels = NamedTempFile::new().unwrap();
        writeln!(labels, "Image2 4").unwrap();

        let loader = RecordLoader::new();
        assert_eq!(loader.load_features(features.path()).unwrap().len(), 2);
        assert_eq!(loader.load_labels(labels.path()).unwrap()[0].code, 4);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = RecordLoader::new()
            .load_features("/definitely/not/here.txt")
            .unwrap_err();
        assert!(matches!(err, EmotionError::Io(_)));
    }
}
