//! Error types for the guidebot library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`GuidebotError`] enum. The variants fall into two groups:
//!
//! - the faults the serving boundary reasons about (`Input`, `ModelUnavailable`,
//!   `UnknownTag`, `Inference`), and
//! - the concrete causes that feed them (I/O, JSON, storage, training, ...).
//!
//! # Examples
//!
//! ```
//! use guidebot::error::{GuidebotError, Result};
//!
//! fn check(tag: &str) -> Result<()> {
//!     Err(GuidebotError::unknown_tag(tag))
//! }
//!
//! assert_eq!(
//!     check("weather").unwrap_err().to_string(),
//!     "Unknown tag: weather"
//! );
//! ```

use std::io;

use thiserror::Error;

/// The main error type for guidebot operations.
#[derive(Error, Debug)]
pub enum GuidebotError {
    /// I/O errors (file operations, stdin/stdout, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input that the normalization contract does not accept.
    #[error("Input error: {0}")]
    Input(String),

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Invalid intent catalog.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Training failed (empty corpus, empty vocabulary, single label, ...).
    #[error("Training error: {0}")]
    Training(String),

    /// No servable model could be produced.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// A stored model artifact is missing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored model artifact exists but cannot be used.
    #[error("Corrupt artifact: {0}")]
    Corrupt(String),

    /// The predicted tag has no counterpart in the catalog.
    #[error("Unknown tag: {0}")]
    UnknownTag(String),

    /// Unexpected failure on the per-request inference path.
    #[error("Inference fault: {0}")]
    Inference(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid configuration or argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Storage backend failures.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The requested file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    IoError(String),

    /// The storage has been closed.
    #[error("Storage is closed")]
    StorageClosed,
}

/// Result type alias for operations that may fail with GuidebotError.
pub type Result<T> = std::result::Result<T, GuidebotError>;

impl GuidebotError {
    /// Create a new input error.
    pub fn input<S: Into<String>>(msg: S) -> Self {
        GuidebotError::Input(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        GuidebotError::Analysis(msg.into())
    }

    /// Create a new catalog error.
    pub fn catalog<S: Into<String>>(msg: S) -> Self {
        GuidebotError::Catalog(msg.into())
    }

    /// Create a new training error.
    pub fn training<S: Into<String>>(msg: S) -> Self {
        GuidebotError::Training(msg.into())
    }

    /// Create a new model-unavailable error.
    pub fn model_unavailable<S: Into<String>>(msg: S) -> Self {
        GuidebotError::ModelUnavailable(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        GuidebotError::NotFound(msg.into())
    }

    /// Create a new corrupt-artifact error.
    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        GuidebotError::Corrupt(msg.into())
    }

    /// Create a new unknown tag error.
    pub fn unknown_tag<S: Into<String>>(tag: S) -> Self {
        GuidebotError::UnknownTag(tag.into())
    }

    /// Create a new inference fault.
    pub fn inference<S: Into<String>>(msg: S) -> Self {
        GuidebotError::Inference(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        GuidebotError::InvalidArgument(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        GuidebotError::InvalidArgument(format!("Invalid configuration: {}", msg.into()))
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        GuidebotError::Other(format!("Internal error: {}", msg.into()))
    }

    /// Whether this error means "no usable stored model", i.e. the
    /// load-or-train path should fall back to training.
    pub fn is_unusable_model(&self) -> bool {
        matches!(
            self,
            GuidebotError::NotFound(_)
                | GuidebotError::Corrupt(_)
                | GuidebotError::Json(_)
                | GuidebotError::Io(_)
                | GuidebotError::Storage(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = GuidebotError::training("Test training error");
        assert_eq!(error.to_string(), "Training error: Test training error");

        let error = GuidebotError::corrupt("bad weights");
        assert_eq!(error.to_string(), "Corrupt artifact: bad weights");

        let error = GuidebotError::unknown_tag("weather");
        assert_eq!(error.to_string(), "Unknown tag: weather");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = GuidebotError::from(io_error);

        match error {
            GuidebotError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_storage_error_conversion() {
        let error: GuidebotError = StorageError::FileNotFound("vectorizer.json".into()).into();
        assert_eq!(
            error.to_string(),
            "Storage error: File not found: vectorizer.json"
        );
        assert!(error.is_unusable_model());
    }

    #[test]
    fn test_unusable_model_classification() {
        assert!(GuidebotError::not_found("classifier.json").is_unusable_model());
        assert!(GuidebotError::corrupt("version").is_unusable_model());
        assert!(!GuidebotError::training("empty corpus").is_unusable_model());
        assert!(!GuidebotError::unknown_tag("x").is_unusable_model());
    }
}
