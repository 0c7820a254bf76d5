//! Per-clip feature extraction
//!
//! Runs the tonic estimator, the stability gate, the PCD and the directional
//! dyads on one pitch track. Aggregation and recognition both go through
//! this module, with the same `FeatureConfig`.

use serde::{Deserialize, Serialize};

use super::dyads::DirectionalDyads;
use super::pitch_class::{PitchBins, PitchClassDistribution};
use super::stability::apply_stability_gate;
use super::tonic::{estimate_tonic, validate_tonic, TonicEstimate};
use crate::config::{FeatureConfig, FeatureSchema};
use crate::error::RecognitionError;
use crate::io::PitchTrack;

/// PCD and directional dyads of one clip
///
/// Shapes are checked on construction: `pcd` has `bins` entries, `up` and
/// `down` have `bins * bins`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipFeatures {
    schema: FeatureSchema,
    bins: usize,
    pcd: Vec<f32>,
    up: Vec<f32>,
    down: Vec<f32>,
    transitions: usize,
    gating_ratio: f32,
    gated_frames: usize,
}

impl ClipFeatures {
    /// Assemble a feature record
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` on shape mismatch and `NumericalError` on
    /// non-finite or negative values.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        schema: FeatureSchema,
        pcd: Vec<f32>,
        up: Vec<f32>,
        down: Vec<f32>,
        transitions: usize,
        gating_ratio: f32,
        gated_frames: usize,
    ) -> Result<Self, RecognitionError> {
        let features = Self {
            schema,
            bins: pcd.len(),
            pcd,
            up,
            down,
            transitions,
            gating_ratio,
            gated_frames,
        };
        features.validate()?;
        Ok(features)
    }

    /// Re-check shapes and values, e.g. after deserialization
    pub fn validate(&self) -> Result<(), RecognitionError> {
        let n = self.bins;
        if n < 2 || self.pcd.len() != n {
            return Err(RecognitionError::InvalidInput(format!(
                "PCD has {} entries for {} bins",
                self.pcd.len(),
                n
            )));
        }
        if self.up.len() != n * n || self.down.len() != n * n {
            return Err(RecognitionError::InvalidInput(format!(
                "dyad matrices have {} / {} cells, expected {}",
                self.up.len(),
                self.down.len(),
                n * n
            )));
        }
        let all = self.pcd.iter().chain(self.up.iter()).chain(self.down.iter());
        if all.clone().any(|v| !v.is_finite()) || all.into_iter().any(|&v| v < 0.0) {
            return Err(RecognitionError::NumericalError(
                "feature values must be finite and non-negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.gating_ratio) {
            return Err(RecognitionError::NumericalError(format!(
                "gating ratio {} outside [0, 1]",
                self.gating_ratio
            )));
        }
        Ok(())
    }

    /// Schema the features were built under
    pub fn schema(&self) -> FeatureSchema {
        self.schema
    }

    /// Pitch-class bin count `N`
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Pitch-class distribution (length `N`)
    pub fn pcd(&self) -> &[f32] {
        &self.pcd
    }

    /// Normalized up matrix, flattened row-major (length `N * N`)
    pub fn up(&self) -> &[f32] {
        &self.up
    }

    /// Normalized down matrix, flattened row-major (length `N * N`)
    pub fn down(&self) -> &[f32] {
        &self.down
    }

    /// Stable note-to-note transitions counted
    pub fn transitions(&self) -> usize {
        self.transitions
    }

    /// Gated / voiced frame ratio
    pub fn gating_ratio(&self) -> f32 {
        self.gating_ratio
    }

    /// Frames kept by the stability gate
    pub fn gated_frames(&self) -> usize {
        self.gated_frames
    }
}

/// Clip features with their raga label, the aggregator's input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledFeatures {
    /// Clip identifier
    pub id: String,

    /// Raga label
    pub label: String,

    /// Extracted features
    pub features: ClipFeatures,
}

/// Everything extraction learned about one clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipExtraction {
    /// Tonic estimate (`None` if the caller supplied the tonic)
    pub tonic: Option<TonicEstimate>,

    /// Tonic used for normalization, in Hz
    pub tonic_hz: f32,

    /// Frames kept by the stability gate
    pub gated_frames: usize,

    /// Gated / voiced frame ratio
    pub gating_ratio: f32,

    /// `None` exactly when the gate kept no frame
    pub features: Option<ClipFeatures>,
}

impl ClipExtraction {
    /// Features, or `EmptyFeatureResult` if the gate kept nothing
    pub fn into_features(self) -> Result<ClipFeatures, RecognitionError> {
        self.features.ok_or(RecognitionError::EmptyFeatureResult)
    }
}

/// Estimate the tonic of a clip and extract its features
///
/// # Arguments
///
/// * `track` - Pitch track of the clip
/// * `config` - Feature extraction parameters
///
/// # Returns
///
/// `ClipExtraction` with the tonic estimate, gating statistics and, unless
/// the gate kept no frame, the clip features.
///
/// # Errors
///
/// Returns `InsufficientVoicedFrames` if the tonic cannot be estimated, or
/// `InvalidInput` for an invalid configuration.
///
/// # Example
///
/// ```no_run
/// use swara_dsp::config::FeatureConfig;
/// use swara_dsp::features::extractor::extract_clip_features;
/// use swara_dsp::io::load_pitch_track;
///
/// let track = load_pitch_track("clip.json")?;
/// let extraction = extract_clip_features(&track, &FeatureConfig::default())?;
/// println!("Gating ratio: {:.2}", extraction.gating_ratio);
/// # Ok::<(), swara_dsp::RecognitionError>(())
/// ```
pub fn extract_clip_features(
    track: &PitchTrack,
    config: &FeatureConfig,
) -> Result<ClipExtraction, RecognitionError> {
    config.validate()?;

    let voiced = track.voiced_pitches();
    let mut estimate = estimate_tonic(&voiced, &config.tonic)?;
    if config.tonic.validate_candidates {
        estimate = validate_tonic(&voiced, &estimate, &config.tonic);
    }

    let mut extraction = extract_with_tonic(track, estimate.tonic_hz, config)?;
    extraction.tonic = Some(estimate);
    Ok(extraction)
}

/// Extract features with a known tonic
///
/// # Errors
///
/// Returns `InvalidInput` for a non-positive tonic or an invalid configuration.
pub fn extract_with_tonic(
    track: &PitchTrack,
    tonic_hz: f32,
    config: &FeatureConfig,
) -> Result<ClipExtraction, RecognitionError> {
    config.validate()?;

    let gated = apply_stability_gate(track, tonic_hz, &config.gate)?;
    if gated.is_empty() {
        log::debug!("Stability gate kept no frames; no features for this clip");
        return Ok(ClipExtraction {
            tonic: None,
            tonic_hz,
            gated_frames: 0,
            gating_ratio: gated.gating_ratio,
            features: None,
        });
    }

    let bins = PitchBins::new(config.bins)?;
    let pcd = PitchClassDistribution::from_cents(&gated.cents, &bins);
    let dyads = DirectionalDyads::from_cents(&gated.cents, &bins, config.min_stable_frames, config.alpha);

    let features = ClipFeatures::new(
        config.schema,
        pcd.into_vec(),
        dyads.up().to_vec(),
        dyads.down().to_vec(),
        dyads.transitions(),
        gated.gating_ratio,
        gated.len(),
    )?;

    log::debug!(
        "Extracted features: {} bins, {} gated frames, {} transitions",
        features.bins(),
        features.gated_frames(),
        features.transitions()
    );

    Ok(ClipExtraction {
        tonic: None,
        tonic_hz,
        gated_frames: gated.len(),
        gating_ratio: gated.gating_ratio,
        features: Some(features),
    })
}
