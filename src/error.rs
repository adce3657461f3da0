//! Error types for the pipeline.
//!
//! One `thiserror` enum covers the whole lifecycle: fatal configuration and
//! data errors for the batch components, checkpoint-load failures, and the
//! per-request failure conditions of the inference path.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for pipeline operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid CLI/config values; fatal, reported before any work begins.
    #[error("configuration error: {0}")]
    Config(String),

    /// Dataset unavailable or a batch could not be assembled; fatal for
    /// training and evaluation runs, never silently skipped.
    #[error("data error: {0}")]
    Data(String),

    /// No checkpoint file at the given path.
    #[error("checkpoint not found: {0}")]
    CheckpointNotFound(PathBuf),

    /// Stored parameters are incompatible with the constructed architecture.
    #[error("checkpoint mismatch: {0}")]
    CheckpointMismatch(String),

    /// The inference service never obtained a usable checkpoint.
    #[error("model unavailable: no checkpoint loaded")]
    ModelUnavailable,

    /// Malformed request payload; a user-input fault, isolated per request.
    #[error("failed to decode image: {0}")]
    ImageDecode(String),

    /// Unexpected failure during a forward pass; isolated per request.
    #[error("inference error: {0}")]
    Inference(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageDecode(err.to_string())
    }
}

/// Convenience Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Config("epochs must be positive".to_string());
        assert_eq!(err.to_string(), "configuration error: epochs must be positive");

        let err = Error::ModelUnavailable;
        assert_eq!(err.to_string(), "model unavailable: no checkpoint loaded");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_checkpoint_not_found_display() {
        let err = Error::CheckpointNotFound(PathBuf::from("/tmp/best.mpk"));
        assert!(err.to_string().contains("best.mpk"));
    }
}
