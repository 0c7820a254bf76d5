//! Recognition engine
//!
//! Holds a read-only signature set and the extraction parameters recorded
//! with it. Every query runs the same pipeline the signatures were built
//! with, then:
//!
//! 1. Genericness index of the query
//! 2. Default-weight scoring and shaping of every candidate
//! 3. Sibling escalation: if the top two are registered siblings within the
//!    escalation margin, the ranking is recomputed with escalated weights and
//!    replaces the default one
//! 4. Abstention on the final ranking
//!
//! The engine is `Send + Sync`; one instance can serve concurrent queries.

use std::sync::Arc;

use super::confidence::{confidence_factor, decide_verdict};
use super::genericness::genericness_index;
use super::result::{AbstentionReason, RecognitionFlag, RecognitionOutcome, Verdict};
use super::scoring::score_candidates;
use crate::config::{FeatureConfig, RecognitionConfig};
use crate::error::RecognitionError;
use crate::features::{extract_clip_features, extract_with_tonic, ClipExtraction, ClipFeatures};
use crate::io::PitchTrack;
use crate::signatures::SignatureSet;

/// Raga recognizer over a fixed signature set
#[derive(Debug, Clone)]
pub struct RecognitionEngine {
    signatures: Arc<SignatureSet>,
    features: FeatureConfig,
    config: RecognitionConfig,
}

impl RecognitionEngine {
    /// Create an engine
    ///
    /// Extraction parameters come from the signature set's metadata.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the recognition config or the recorded
    /// extraction parameters are invalid.
    pub fn new(
        signatures: Arc<SignatureSet>,
        config: RecognitionConfig,
    ) -> Result<Self, RecognitionError> {
        config.validate()?;
        let features = FeatureConfig::from_metadata(signatures.metadata());
        features.validate()?;
        log::debug!(
            "Recognition engine: {} signatures, {} bins, scoring {:?}",
            signatures.len(),
            features.bins,
            config.scoring
        );
        Ok(Self {
            signatures,
            features,
            config,
        })
    }

    /// Signature set
    pub fn signatures(&self) -> &SignatureSet {
        &self.signatures
    }

    /// Extraction parameters applied to queries
    pub fn feature_config(&self) -> &FeatureConfig {
        &self.features
    }

    /// Recognition parameters
    pub fn config(&self) -> &RecognitionConfig {
        &self.config
    }

    /// Recognize a clip, estimating its tonic
    ///
    /// The track is truncated to `max_duration_secs` first.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientVoicedFrames` if the tonic cannot be estimated.
    /// A clip whose gate keeps no frame is not an error; it yields an
    /// `UNKNOWN` verdict.
    pub fn recognize(&self, track: &PitchTrack) -> Result<RecognitionOutcome, RecognitionError> {
        let track = track.truncated(self.config.max_duration_secs);
        let extraction = extract_clip_features(&track, &self.features)?;
        self.recognize_extraction(extraction)
    }

    /// Recognize a clip with a known tonic
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a non-positive tonic.
    pub fn recognize_with_tonic(
        &self,
        track: &PitchTrack,
        tonic_hz: f32,
    ) -> Result<RecognitionOutcome, RecognitionError> {
        let track = track.truncated(self.config.max_duration_secs);
        let extraction = extract_with_tonic(&track, tonic_hz, &self.features)?;
        self.recognize_extraction(extraction)
    }

    /// Score pre-extracted features
    ///
    /// # Errors
    ///
    /// Returns `SchemaVersionMismatch` or `InvalidInput` if the features were
    /// built under a different schema or bin count than the signatures.
    pub fn recognize_features(
        &self,
        features: &ClipFeatures,
    ) -> Result<RecognitionOutcome, RecognitionError> {
        features.validate()?;
        if features.schema() != self.features.schema {
            return Err(RecognitionError::SchemaVersionMismatch {
                expected: self.features.schema.tag().to_string(),
                found: features.schema().tag().to_string(),
            });
        }
        if features.bins() != self.features.bins {
            return Err(RecognitionError::InvalidInput(format!(
                "query has {} bins, signatures have {}",
                features.bins(),
                self.features.bins
            )));
        }

        let config = &self.config;
        let genericness = genericness_index(
            features.pcd(),
            features.up(),
            features.down(),
            config.near_empty_bin_threshold,
        );
        let factor = confidence_factor(features.transitions(), genericness, config);

        let mut flags = Vec::new();
        if features.transitions() < config.min_transitions {
            flags.push(RecognitionFlag::SparseTransitions);
        }

        let mut ranking = score_candidates(
            features,
            &self.signatures,
            config.scoring,
            config.default_weights(),
            genericness,
            factor,
        );

        // Escalation is decided on the default ranking only.
        let escalate = match ranking.as_slice() {
            [first, second, ..] => {
                let margin = first.final_score - second.final_score;
                let siblings = margin < config.sibling_escalation_margin
                    && config.siblings.are_siblings(&first.label, &second.label);
                if siblings {
                    log::debug!(
                        "Sibling escalation: {} vs {} (margin {:.4})",
                        first.label,
                        second.label,
                        margin
                    );
                }
                siblings
            }
            _ => false,
        };
        if escalate {
            ranking = score_candidates(
                features,
                &self.signatures,
                config.scoring,
                config.escalated_weights,
                genericness,
                factor,
            );
            flags.push(RecognitionFlag::SiblingEscalation);
        }

        let (verdict, margins) = decide_verdict(&ranking, &config.abstention);

        Ok(RecognitionOutcome {
            ranking,
            verdict,
            genericness_index: genericness,
            transitions: features.transitions(),
            gating_ratio: features.gating_ratio(),
            margin_12: margins.margin_12,
            margin_23: margins.margin_23,
            escalated: escalate,
            tonic: None,
            flags,
        })
    }

    fn recognize_extraction(
        &self,
        extraction: ClipExtraction,
    ) -> Result<RecognitionOutcome, RecognitionError> {
        let ClipExtraction {
            tonic,
            gating_ratio,
            features,
            ..
        } = extraction;

        let mut outcome = match features {
            Some(features) => self.recognize_features(&features)?,
            None => {
                log::debug!("No stable frames; verdict is UNKNOWN");
                RecognitionOutcome {
                    ranking: Vec::new(),
                    verdict: Verdict::Unknown(AbstentionReason::EmptyFeatures),
                    genericness_index: 0.0,
                    transitions: 0,
                    gating_ratio,
                    margin_12: None,
                    margin_23: None,
                    escalated: false,
                    tonic: None,
                    flags: Vec::new(),
                }
            }
        };
        outcome.tonic = tonic;
        Ok(outcome)
    }
}
