//! Configuration parameters for feature extraction, aggregation and recognition
//!
//! Every constant the pipeline depends on lives here with its default. Configs
//! deserialize with `#[serde(default)]`, so a JSON file only has to name the
//! fields it overrides.

use serde::{Deserialize, Serialize};

use crate::analysis::siblings::SiblingPairs;
use crate::error::RecognitionError;
use crate::signatures::AggregationMetadata;

/// Numerical stability epsilon shared by all normalizations
pub const EPSILON: f32 = 1e-8;

/// Feature schema a clip or signature was built under
///
/// Only the directional, smoothed, run-length-filtered dyad schema is
/// supported. Older undirected variants are not readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FeatureSchema {
    /// Split up/down dyads, Laplace smoothed, minimum-stable-frame filtered
    #[serde(rename = "v1.2")]
    #[default]
    DirectionalV12,
}

impl FeatureSchema {
    /// Schema tag as persisted (e.g. `"v1.2"`)
    pub fn tag(&self) -> &'static str {
        match self {
            FeatureSchema::DirectionalV12 => "v1.2",
        }
    }

    /// Parse a persisted schema tag
    ///
    /// # Errors
    ///
    /// Returns `SchemaVersionMismatch` for any tag other than a supported one.
    pub fn from_tag(tag: &str) -> Result<Self, RecognitionError> {
        match tag {
            "v1.2" => Ok(FeatureSchema::DirectionalV12),
            other => Err(RecognitionError::SchemaVersionMismatch {
                expected: FeatureSchema::DirectionalV12.tag().to_string(),
                found: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Tonic (Sa) estimation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TonicConfig {
    /// Minimum voiced frames needed before a tonic is estimated (default: 200)
    pub min_voiced_frames: usize,

    /// Number of linear-frequency histogram bins for seed peaks (default: 200)
    pub histogram_bins: usize,

    /// Number of histogram peaks used as seeds (default: 5)
    pub top_k_peaks: usize,

    /// Octave multipliers applied to each seed (default: [0.5, 1.0, 2.0])
    pub octave_multipliers: Vec<f32>,

    /// Lowest plausible tonic in Hz (default: 80.0)
    pub min_tonic_hz: f32,

    /// Highest plausible tonic in Hz (default: 400.0)
    pub max_tonic_hz: f32,

    /// Half-width of the scoring window in cents (default: 50.0)
    pub window_cents: f32,

    /// Re-score candidates with density + continuity (default: false)
    pub validate_candidates: bool,

    /// Weight of the near-Sa density term in validation (default: 0.7)
    pub validation_density_weight: f32,

    /// Weight of the adjacent-frame continuity term in validation (default: 0.3)
    pub validation_continuity_weight: f32,
}

impl Default for TonicConfig {
    fn default() -> Self {
        Self {
            min_voiced_frames: 200,
            histogram_bins: 200,
            top_k_peaks: 5,
            octave_multipliers: vec![0.5, 1.0, 2.0],
            min_tonic_hz: 80.0,
            max_tonic_hz: 400.0,
            window_cents: 50.0,
            validate_candidates: false,
            validation_density_weight: 0.7,
            validation_continuity_weight: 0.3,
        }
    }
}

impl TonicConfig {
    /// Check parameter ranges
    pub fn validate(&self) -> Result<(), RecognitionError> {
        if self.histogram_bins == 0 || self.top_k_peaks == 0 {
            return Err(RecognitionError::InvalidInput(
                "tonic histogram_bins and top_k_peaks must be positive".to_string(),
            ));
        }
        if self.octave_multipliers.is_empty() || self.octave_multipliers.iter().any(|m| *m <= 0.0) {
            return Err(RecognitionError::InvalidInput(
                "tonic octave_multipliers must be non-empty and positive".to_string(),
            ));
        }
        if !(self.min_tonic_hz > 0.0 && self.min_tonic_hz < self.max_tonic_hz) {
            return Err(RecognitionError::InvalidInput(format!(
                "invalid tonic band [{}, {}] Hz",
                self.min_tonic_hz, self.max_tonic_hz
            )));
        }
        if self.window_cents <= 0.0 {
            return Err(RecognitionError::InvalidInput(
                "tonic window_cents must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Cents domain the stability gate measures half-window drift in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DriftDomain {
    /// Cents folded into `[0, 1200)`; a pitch class held across an octave
    /// leap is stable, a note wobbling across Sa's 0/1200 seam is not
    #[default]
    PitchClass,

    /// Signed cents from the tonic; the reverse of `PitchClass`
    Unwrapped,
}

/// Pitch stability gate parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityGateConfig {
    /// Sliding window length in frames (default: 10)
    pub window_size: usize,

    /// Maximum half-window mean drift in cents for a stable window (default: 25.0)
    pub drift_threshold_cents: f32,

    /// Minimum fraction of voiced frames in a window (default: 0.6)
    pub voiced_ratio_threshold: f32,

    /// Domain of the drift test (default: pitch class)
    pub drift_domain: DriftDomain,
}

impl Default for StabilityGateConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            drift_threshold_cents: 25.0,
            voiced_ratio_threshold: 0.6,
            drift_domain: DriftDomain::PitchClass,
        }
    }
}

impl StabilityGateConfig {
    /// Check parameter ranges
    pub fn validate(&self) -> Result<(), RecognitionError> {
        if self.window_size < 2 {
            return Err(RecognitionError::InvalidInput(format!(
                "gate window_size must be at least 2, got {}",
                self.window_size
            )));
        }
        if self.drift_threshold_cents < 0.0 {
            return Err(RecognitionError::InvalidInput(
                "gate drift_threshold_cents must be non-negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.voiced_ratio_threshold) {
            return Err(RecognitionError::InvalidInput(format!(
                "gate voiced_ratio_threshold must be in [0, 1], got {}",
                self.voiced_ratio_threshold
            )));
        }
        Ok(())
    }
}

/// Feature extraction parameters
///
/// Aggregation and recognition must run with identical values; a
/// [`crate::signatures::SignatureSet`] records the values it was built with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Feature schema tag
    pub schema: FeatureSchema,

    /// Pitch-class bins over one octave (default: 36)
    pub bins: usize,

    /// Laplace smoothing added to every dyad cell (default: 0.5)
    pub alpha: f32,

    /// Minimum run length, in gated frames, of a held note (default: 5)
    pub min_stable_frames: usize,

    /// Stability gate parameters
    pub gate: StabilityGateConfig,

    /// Tonic estimation parameters
    pub tonic: TonicConfig,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            schema: FeatureSchema::default(),
            bins: 36,
            alpha: 0.5,
            min_stable_frames: 5,
            gate: StabilityGateConfig::default(),
            tonic: TonicConfig::default(),
        }
    }
}

impl FeatureConfig {
    /// Rebuild the extraction parameters a signature set was aggregated with
    pub fn from_metadata(metadata: &AggregationMetadata) -> Self {
        Self {
            schema: metadata.schema,
            bins: metadata.bins,
            alpha: metadata.alpha,
            min_stable_frames: metadata.min_stable_frames,
            gate: metadata.gate.clone(),
            tonic: metadata.tonic.clone(),
        }
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<(), RecognitionError> {
        if self.bins < 2 {
            return Err(RecognitionError::InvalidInput(format!(
                "bins must be at least 2, got {}",
                self.bins
            )));
        }
        if !(self.alpha >= 0.0 && self.alpha.is_finite()) {
            return Err(RecognitionError::InvalidInput(format!(
                "alpha must be finite and non-negative, got {}",
                self.alpha
            )));
        }
        if self.min_stable_frames == 0 {
            return Err(RecognitionError::InvalidInput(
                "min_stable_frames must be positive".to_string(),
            ));
        }
        self.gate.validate()?;
        self.tonic.validate()
    }
}

/// Corpus aggregation guardrails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Clips below this gating ratio carry too little stable signal (default: 0.05)
    pub min_gating_ratio: f32,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            min_gating_ratio: 0.05,
        }
    }
}

/// Candidate scoring path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScoringMethod {
    /// Cosine similarity on PCD and flattened dyads
    #[default]
    Cosine,
    /// `1 - Jensen-Shannon distance` on PCD and flattened dyads
    JensenShannon,
}

impl ScoringMethod {
    /// Default PCD/dyad weighting for this path
    pub fn default_weights(&self) -> ScoreWeights {
        match self {
            ScoringMethod::Cosine => ScoreWeights { pcd: 0.5, dyad: 0.5 },
            ScoringMethod::JensenShannon => ScoreWeights { pcd: 0.6, dyad: 0.4 },
        }
    }
}

/// Relative weight of PCD and dyad similarity in a candidate score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// PCD similarity weight
    pub pcd: f32,
    /// Dyad similarity weight
    pub dyad: f32,
}

impl ScoreWeights {
    /// Sibling escalation weighting (0.2 PCD / 0.8 dyad)
    pub fn escalated() -> Self {
        Self { pcd: 0.2, dyad: 0.8 }
    }

    fn validate(&self, name: &str) -> Result<(), RecognitionError> {
        if self.pcd < 0.0 || self.dyad < 0.0 || self.pcd + self.dyad <= 0.0 {
            return Err(RecognitionError::InvalidInput(format!(
                "{} weights must be non-negative with a positive sum, got {:?}",
                name, self
            )));
        }
        Ok(())
    }
}

/// Verdict abstention thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbstentionConfig {
    /// Top-2 margin below which the verdict is always UNKNOWN (default: 0.03)
    pub hard_margin: f32,

    /// Top-2 margin below which a flat 2-3 gap also forces UNKNOWN (default: 0.06)
    pub soft_margin: f32,

    /// 2-3 margin counted as "flat" under the soft rule (default: 0.03)
    pub flat_margin_23: f32,
}

impl Default for AbstentionConfig {
    fn default() -> Self {
        Self {
            hard_margin: 0.03,
            soft_margin: 0.06,
            flat_margin_23: 0.03,
        }
    }
}

/// Recognition engine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Scoring path (default: Cosine)
    pub scoring: ScoringMethod,

    /// Default PCD/dyad weights; `None` uses the scoring path's defaults
    pub weights: Option<ScoreWeights>,

    /// Weights used after sibling escalation (default: 0.2 / 0.8)
    pub escalated_weights: ScoreWeights,

    /// Top-2 margin under which a sibling pair escalates (default: 0.08)
    pub sibling_escalation_margin: f32,

    /// Registered confusable raga pairs
    pub siblings: SiblingPairs,

    /// Genericness penalty strength λ (default: 0.15)
    pub genericness_lambda: f32,

    /// Minimum stable transitions to trust dyad evidence (default: 50)
    pub min_transitions: usize,

    /// Uniform discount applied below `min_transitions` (default: 0.9)
    pub sparse_transition_discount: f32,

    /// PCD bins at or above this mass count as occupied (default: 0.01)
    pub near_empty_bin_threshold: f32,

    /// Clips are truncated to this duration before processing (default: 360 s)
    pub max_duration_secs: f32,

    /// Abstention thresholds
    pub abstention: AbstentionConfig,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringMethod::Cosine,
            weights: None,
            escalated_weights: ScoreWeights::escalated(),
            sibling_escalation_margin: 0.08,
            siblings: SiblingPairs::default(),
            genericness_lambda: 0.15,
            min_transitions: 50,
            sparse_transition_discount: 0.9,
            near_empty_bin_threshold: 0.01,
            max_duration_secs: 360.0,
            abstention: AbstentionConfig::default(),
        }
    }
}

impl RecognitionConfig {
    /// Weights for the default (non-escalated) ranking
    pub fn default_weights(&self) -> ScoreWeights {
        self.weights.unwrap_or_else(|| self.scoring.default_weights())
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<(), RecognitionError> {
        self.default_weights().validate("default")?;
        self.escalated_weights.validate("escalated")?;
        if !(0.0..=1.0).contains(&self.genericness_lambda) {
            return Err(RecognitionError::InvalidInput(format!(
                "genericness_lambda must be in [0, 1], got {}",
                self.genericness_lambda
            )));
        }
        if !(0.0..=1.0).contains(&self.sparse_transition_discount) {
            return Err(RecognitionError::InvalidInput(format!(
                "sparse_transition_discount must be in [0, 1], got {}",
                self.sparse_transition_discount
            )));
        }
        if self.max_duration_secs <= 0.0 {
            return Err(RecognitionError::InvalidInput(
                "max_duration_secs must be positive".to_string(),
            ));
        }
        let a = &self.abstention;
        if a.hard_margin < 0.0 || a.soft_margin < a.hard_margin || a.flat_margin_23 < 0.0 {
            return Err(RecognitionError::InvalidInput(format!(
                "abstention margins must satisfy 0 <= hard <= soft, got {:?}",
                a
            )));
        }
        Ok(())
    }
}
