//! Error Handling Module
//!
//! Defines custom error types for the Bio-AD library.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for Bio-AD operations
#[derive(Error, Debug)]
pub enum BioAdError {
    /// Error loading or decoding an MRI scan
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// Error with dataset operations (loading, balancing, splitting)
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Convenience Result type for Bio-AD operations
pub type Result<T> = std::result::Result<T, BioAdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BioAdError::Dataset("no samples found".to_string());
        assert_eq!(format!("{}", err), "Dataset error: no samples found");
    }

    #[test]
    fn test_image_load_error() {
        let path = PathBuf::from("/data/mri/scan.jpg");
        let err = BioAdError::ImageLoad(path, "truncated file".to_string());
        assert!(format!("{}", err).contains("scan.jpg"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: BioAdError = io.into();
        assert!(matches!(err, BioAdError::Io(_)));
    }
}
