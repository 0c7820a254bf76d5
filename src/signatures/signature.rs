//! Raga signatures and signature sets

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{FeatureSchema, StabilityGateConfig, TonicConfig};
use crate::error::RecognitionError;

/// Corpus-level PCD and dyad statistics of one raga
///
/// Built by [`super::SignatureAggregator`] or loaded from disk, then read-only.
/// Dyad vectors are flattened row-major `N * N` matrices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagaSignature {
    label: String,
    schema: FeatureSchema,
    bins: usize,
    mean_pcd: Vec<f32>,
    std_pcd: Vec<f32>,
    mean_up: Vec<f32>,
    mean_down: Vec<f32>,
    std_up: Vec<f32>,
    std_down: Vec<f32>,
    clip_count: usize,
    mean_gating_ratio: f32,
    mean_transitions: f32,
}

/// Element-wise statistics of one feature across a raga's clips
pub(crate) struct MeanStd {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl RagaSignature {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        label: String,
        schema: FeatureSchema,
        bins: usize,
        pcd: MeanStd,
        up: MeanStd,
        down: MeanStd,
        clip_count: usize,
        mean_gating_ratio: f32,
        mean_transitions: f32,
    ) -> Result<Self, RecognitionError> {
        let signature = Self {
            label,
            schema,
            bins,
            mean_pcd: pcd.mean,
            std_pcd: pcd.std,
            mean_up: up.mean,
            mean_down: down.mean,
            std_up: up.std,
            std_down: down.std,
            clip_count,
            mean_gating_ratio,
            mean_transitions,
        };
        signature.validate()?;
        Ok(signature)
    }

    /// Check vector shapes and values
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty label, a zero clip count or a
    /// shape mismatch, and `NumericalError` for non-finite values.
    pub fn validate(&self) -> Result<(), RecognitionError> {
        if self.label.is_empty() {
            return Err(RecognitionError::InvalidInput(
                "signature label is empty".to_string(),
            ));
        }
        if self.clip_count == 0 {
            return Err(RecognitionError::InvalidInput(format!(
                "signature '{}' was built from zero clips",
                self.label
            )));
        }
        let n = self.bins;
        let shapes = [
            (self.mean_pcd.len(), n),
            (self.std_pcd.len(), n),
            (self.mean_up.len(), n * n),
            (self.mean_down.len(), n * n),
            (self.std_up.len(), n * n),
            (self.std_down.len(), n * n),
        ];
        if n < 2 || shapes.iter().any(|(got, want)| got != want) {
            return Err(RecognitionError::InvalidInput(format!(
                "signature '{}' has inconsistent shapes for {} bins",
                self.label, n
            )));
        }
        let finite = self
            .mean_pcd
            .iter()
            .chain(&self.std_pcd)
            .chain(&self.mean_up)
            .chain(&self.mean_down)
            .chain(&self.std_up)
            .chain(&self.std_down)
            .all(|v| v.is_finite());
        if !finite || !self.mean_gating_ratio.is_finite() || !self.mean_transitions.is_finite() {
            return Err(RecognitionError::NumericalError(format!(
                "signature '{}' contains non-finite values",
                self.label
            )));
        }
        Ok(())
    }

    /// Raga label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Schema the signature was built under
    pub fn schema(&self) -> FeatureSchema {
        self.schema
    }

    /// Pitch-class bin count `N`
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Mean PCD across clips
    pub fn mean_pcd(&self) -> &[f32] {
        &self.mean_pcd
    }

    /// Population std of the PCD across clips
    pub fn std_pcd(&self) -> &[f32] {
        &self.std_pcd
    }

    /// Mean up matrix
    pub fn mean_up(&self) -> &[f32] {
        &self.mean_up
    }

    /// Mean down matrix
    pub fn mean_down(&self) -> &[f32] {
        &self.mean_down
    }

    /// Population std of the up matrix
    pub fn std_up(&self) -> &[f32] {
        &self.std_up
    }

    /// Population std of the down matrix
    pub fn std_down(&self) -> &[f32] {
        &self.std_down
    }

    /// Clips aggregated
    pub fn clip_count(&self) -> usize {
        self.clip_count
    }

    /// Mean gating ratio of the aggregated clips
    pub fn mean_gating_ratio(&self) -> f32 {
        self.mean_gating_ratio
    }

    /// Mean transition count of the aggregated clips
    pub fn mean_transitions(&self) -> f32 {
        self.mean_transitions
    }
}

/// Accept/reject tallies of an aggregation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationCounts {
    /// Clips offered to the aggregator
    pub files_seen: usize,

    /// Clips included in a signature
    pub accepted: usize,

    /// Clips whose schema or bin layout did not match
    pub skipped_schema: usize,

    /// Clips below the minimum gating ratio
    pub skipped_low_gating: usize,

    /// Clips whose stability gate kept no frame
    pub empty_features: usize,

    /// Clips whose extraction failed
    pub errors: usize,
}

impl AggregationCounts {
    /// Clips not included, for any reason
    pub fn rejected(&self) -> usize {
        self.skipped_schema + self.skipped_low_gating + self.empty_features + self.errors
    }
}

/// Run-level record of how a signature set was built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationMetadata {
    /// Feature schema tag
    pub schema: FeatureSchema,

    /// Pitch-class bin count
    pub bins: usize,

    /// Laplace smoothing
    pub alpha: f32,

    /// Minimum run length of a held note
    pub min_stable_frames: usize,

    /// Stability gate parameters
    pub gate: StabilityGateConfig,

    /// Tonic estimation parameters
    pub tonic: TonicConfig,

    /// Time the aggregation ran (UTC)
    pub timestamp: DateTime<Utc>,

    /// Corpus location, if known
    pub corpus_path: Option<String>,

    /// Labels with a signature, sorted
    pub labels: Vec<String>,

    /// Accept/reject tallies
    pub counts: AggregationCounts,
}

/// Immutable set of raga signatures sharing one feature layout
///
/// Signatures are keyed by label in sorted order, so iteration never depends
/// on how the set was built or loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureSet {
    metadata: AggregationMetadata,
    signatures: BTreeMap<String, RagaSignature>,
    missing: Vec<String>,
}

impl SignatureSet {
    /// Build a set, checking every signature against the metadata
    ///
    /// # Errors
    ///
    /// Returns `MissingSignature` for an empty set, `SchemaVersionMismatch` if
    /// a signature's schema differs from the metadata, and `InvalidInput` for
    /// a bin-count mismatch or a duplicate label.
    pub fn new(
        metadata: AggregationMetadata,
        signatures: Vec<RagaSignature>,
    ) -> Result<Self, RecognitionError> {
        if signatures.is_empty() {
            return Err(RecognitionError::MissingSignature(
                "signature set is empty".to_string(),
            ));
        }
        let mut map = BTreeMap::new();
        for signature in signatures {
            signature.validate()?;
            check_layout(&metadata, &signature)?;
            let label = signature.label().to_string();
            if map.insert(label.clone(), signature).is_some() {
                return Err(RecognitionError::InvalidInput(format!(
                    "duplicate signature label '{}'",
                    label
                )));
            }
        }
        Ok(Self {
            metadata,
            signatures: map,
            missing: Vec::new(),
        })
    }

    /// Record labels listed in the metadata whose signature could not be found
    pub(crate) fn with_missing(mut self, mut missing: Vec<String>) -> Self {
        missing.sort();
        self.missing = missing;
        self
    }

    /// Signature of `label`
    ///
    /// # Errors
    ///
    /// Returns `MissingSignature` if the set has no such label.
    pub fn get(&self, label: &str) -> Result<&RagaSignature, RecognitionError> {
        self.signatures
            .get(label)
            .ok_or_else(|| RecognitionError::MissingSignature(label.to_string()))
    }

    /// True if a signature exists for `label`
    pub fn contains(&self, label: &str) -> bool {
        self.signatures.contains_key(label)
    }

    /// Labels with a signature, sorted
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.signatures.keys().map(|k| k.as_str())
    }

    /// Signatures in label order
    pub fn iter(&self) -> impl Iterator<Item = &RagaSignature> {
        self.signatures.values()
    }

    /// Number of signatures
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    /// True if the set holds no signature
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Labels named in the metadata but absent from the set
    pub fn missing_labels(&self) -> &[String] {
        &self.missing
    }

    /// How the set was built
    pub fn metadata(&self) -> &AggregationMetadata {
        &self.metadata
    }
}

fn check_layout(
    metadata: &AggregationMetadata,
    signature: &RagaSignature,
) -> Result<(), RecognitionError> {
    if signature.schema() != metadata.schema {
        return Err(RecognitionError::SchemaVersionMismatch {
            expected: metadata.schema.tag().to_string(),
            found: signature.schema().tag().to_string(),
        });
    }
    if signature.bins() != metadata.bins {
        return Err(RecognitionError::InvalidInput(format!(
            "signature '{}' has {} bins, set has {}",
            signature.label(),
            signature.bins(),
            metadata.bins
        )));
    }
    Ok(())
}
