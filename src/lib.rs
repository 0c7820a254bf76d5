//! # Swara DSP
//!
//! Raga recognition from a pitch track. Clips are reduced to tonic-relative
//! pitch-class distributions and directional note-transition (dyad) matrices,
//! aggregated per raga into signatures, and matched with a confidence-gated
//! verdict.
//!
//! ## Features
//!
//! - **Tonic Estimation**: Histogram seeds, octave expansion and window scoring
//! - **Stability Gating**: Sliding-window drift test keeping only held notes
//! - **Features**: 36-bin PCD plus smoothed up/down dyad matrices
//! - **Signatures**: Per-raga mean/std with schema and gating guardrails
//! - **Recognition**: Genericness shaping, sibling escalation and abstention
//!
//! ## Quick Start
//!
//! ```no_run
//! use swara_dsp::io::{load_pitch_track, load_signature_set};
//! use swara_dsp::{recognize, RecognitionConfig};
//!
//! let signatures = load_signature_set("signatures/v1.2")?;
//! let track = load_pitch_track("query.json")?;
//!
//! let outcome = recognize(&track, signatures, RecognitionConfig::default())?;
//! println!("Verdict: {}", outcome.verdict);
//! for candidate in outcome.ranking.iter().take(3) {
//!     println!("{:20} {:.3}", candidate.label, candidate.final_score);
//! }
//! # Ok::<(), swara_dsp::RecognitionError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Pitch Track → Tonic → Stability Gate → PCD + Dyads → Signatures / Recognition
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;
pub mod signatures;

use std::sync::Arc;

// Re-export main types
pub use analysis::result::{AbstentionReason, CandidateScore, RecognitionOutcome, Verdict};
pub use analysis::RecognitionEngine;
pub use config::{FeatureConfig, RecognitionConfig};
pub use error::RecognitionError;
pub use features::{ClipExtraction, ClipFeatures};
pub use io::PitchTrack;
pub use signatures::{SignatureAggregator, SignatureSet};

/// Extract the features of one clip
///
/// Estimates the tonic, applies the stability gate and builds the PCD and
/// directional dyads.
///
/// # Arguments
///
/// * `track` - Pitch track of the clip
/// * `config` - Feature extraction parameters
///
/// # Returns
///
/// `ClipExtraction`; its `features` is `None` if the gate kept no frame
///
/// # Errors
///
/// Returns `RecognitionError` if the tonic cannot be estimated or the
/// configuration is invalid.
///
/// # Example
///
/// ```
/// use swara_dsp::{extract_features, FeatureConfig, PitchTrack};
///
/// let track = PitchTrack::from_pitch(vec![146.8f32; 400], 100.0)?;
/// let extraction = extract_features(&track, &FeatureConfig::default())?;
/// assert!(extraction.features.is_some());
/// # Ok::<(), swara_dsp::RecognitionError>(())
/// ```
pub fn extract_features(
    track: &PitchTrack,
    config: &FeatureConfig,
) -> Result<ClipExtraction, RecognitionError> {
    log::debug!(
        "Extracting features: {} frames at {:.2} fps",
        track.len(),
        track.frame_rate_hz()
    );
    features::extract_clip_features(track, config)
}

/// Recognize one clip against a signature set
///
/// Builds a one-off [`RecognitionEngine`]; hold an engine instead when
/// recognizing many clips.
///
/// # Errors
///
/// Returns `RecognitionError` if the tonic cannot be estimated or the
/// configuration is invalid. A clip with no stable frames is not an error;
/// its verdict is `UNKNOWN/LOW CONFIDENCE`.
pub fn recognize(
    track: &PitchTrack,
    signatures: SignatureSet,
    config: RecognitionConfig,
) -> Result<RecognitionOutcome, RecognitionError> {
    let engine = RecognitionEngine::new(Arc::new(signatures), config)?;
    engine.recognize(track)
}
