//! Feature extraction modules
//!
//! This module contains the per-clip pipeline:
//! - Tonic (Sa) estimation
//! - Pitch stability gating
//! - Pitch-class distribution
//! - Directional dyads
//! - Feature extraction driver

pub mod dyads;
pub mod extractor;
pub mod pitch_class;
pub mod stability;
pub mod tonic;

pub use extractor::{
    extract_clip_features, extract_with_tonic, ClipExtraction, ClipFeatures, LabeledFeatures,
};
