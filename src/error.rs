//! Error types for the training pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for the pipeline.
///
/// Every stage propagates these to its immediate caller; nothing in the core
/// catches a data or shape error and continues with a degraded result.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Malformed or missing source columns
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// A requested feature or target column is absent
    #[error("Column missing: {0}")]
    ColumnMissing(String),

    /// Feature vector shape disagrees with the fitted scaler or model
    #[error("Dimension mismatch: expected {expected} columns, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Hyperparameter search or final fit failed
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    #[error("Artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    #[error("Artifact corrupt: {path}: {reason}", path = .path.display())]
    ArtifactCorrupt { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PipelineError {
    /// Wrap any error raised during search or fitting
    pub fn training(cause: impl std::fmt::Display) -> Self {
        PipelineError::TrainingFailed(cause.to_string())
    }

    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PipelineError::ArtifactCorrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        PipelineError::DataFormat(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PipelineError {
    fn from(err: ndarray::ShapeError) -> Self {
        PipelineError::Validation(format!("invalid array shape: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::ColumnMissing("COPD".to_string());
        assert_eq!(err.to_string(), "Column missing: COPD");

        let err = PipelineError::DimensionMismatch { expected: 10, actual: 9 };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 10 columns, got 9");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PipelineError = io_err.into();
        assert!(matches!(err, PipelineError::Io(_)));
    }

    #[test]
    fn test_corrupt_display_includes_path() {
        let err = PipelineError::corrupt("/tmp/model.bin", "bad magic");
        assert_eq!(err.to_string(), "Artifact corrupt: /tmp/model.bin: bad magic");
    }
}
