//! Error types for the raga recognition engine

use std::fmt;

/// Errors that can occur during feature extraction, aggregation or recognition
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionError {
    /// Invalid input parameters
    InvalidInput(String),

    /// Too few voiced frames to estimate the tonic of a clip
    InsufficientVoicedFrames {
        /// Voiced frames available
        found: usize,
        /// Voiced frames required
        required: usize,
    },

    /// Features or signatures were built under an incompatible schema
    SchemaVersionMismatch {
        /// Schema tag the caller expected
        expected: String,
        /// Schema tag that was found
        found: String,
    },

    /// No signature exists for the named raga
    MissingSignature(String),

    /// The stability gate kept no frames, so no features exist for the clip
    EmptyFeatureResult,

    /// Processing error during analysis
    ProcessingError(String),

    /// Numerical error (non-finite values, degenerate normalization, etc.)
    NumericalError(String),

    /// Reading or writing persisted signatures / pitch tracks failed
    PersistenceError(String),
}

impl fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            RecognitionError::InsufficientVoicedFrames { found, required } => write!(
                f,
                "Insufficient voiced frames: {} found, at least {} required",
                found, required
            ),
            RecognitionError::SchemaVersionMismatch { expected, found } => write!(
                f,
                "Schema version mismatch: expected {}, found {}",
                expected, found
            ),
            RecognitionError::MissingSignature(label) => {
                write!(f, "Missing signature: {}", label)
            }
            RecognitionError::EmptyFeatureResult => {
                write!(f, "Empty feature result: stability gate kept no frames")
            }
            RecognitionError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            RecognitionError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
            RecognitionError::PersistenceError(msg) => write!(f, "Persistence error: {}", msg),
        }
    }
}

impl std::error::Error for RecognitionError {}

impl From<std::io::Error> for RecognitionError {
    fn from(err: std::io::Error) -> Self {
        RecognitionError::PersistenceError(err.to_string())
    }
}

impl From<serde_json::Error> for RecognitionError {
    fn from(err: serde_json::Error) -> Self {
        RecognitionError::PersistenceError(err.to_string())
    }
}
