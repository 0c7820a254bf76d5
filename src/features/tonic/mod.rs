//! Tonic (Sa) estimation
//!
//! Derive the reference pitch of a clip using:
//! - A coarse pitch histogram for seed peaks
//! - Octave expansion into a plausible tonic band
//! - Window scoring with a stable argmax
//! - Optional density/continuity validation of the same candidates

pub mod estimator;
pub mod histogram;
pub mod validator;

pub use estimator::{estimate_tonic, window_score};
pub use validator::{validate_tonic, validation_score};

use serde::{Deserialize, Serialize};

/// One scored tonic candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TonicCandidate {
    /// Candidate frequency in Hz
    pub hz: f32,

    /// Histogram seed the candidate was expanded from
    pub seed_hz: f32,

    /// Number of frames within the scoring window
    pub score: f32,
}

/// Outcome of post-hoc validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TonicValidation {
    /// Tonic chosen by the estimator
    pub original_hz: f32,

    /// Tonic after validation (equal to `original_hz` unless overridden)
    pub validated_hz: f32,

    /// Validation score per candidate, in candidate order
    pub scores: Vec<f32>,

    /// True if validation picked a different candidate
    pub overridden: bool,
}

/// Tonic estimation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TonicEstimate {
    /// Chosen tonic in Hz
    pub tonic_hz: f32,

    /// Index of the chosen tonic in `candidates`
    pub chosen_index: usize,

    /// Histogram seed frequencies, most populated first
    pub seeds_hz: Vec<f32>,

    /// Candidate set in insertion order
    pub candidates: Vec<TonicCandidate>,

    /// Present if the validator ran
    pub validation: Option<TonicValidation>,
}
