//! Corpus aggregation into raga signatures
//!
//! Clips are extracted (or read back from feature records) in parallel,
//! filtered through the schema and gating guardrails, grouped by label in
//! sorted order, and reduced to element-wise mean/std. The reduction never
//! depends on completion order.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use rayon::prelude::*;

use super::signature::{
    AggregationCounts, AggregationMetadata, MeanStd, RagaSignature, SignatureSet,
};
use super::statistics::{element_mean_std, scalar_mean};
use crate::config::{AggregationConfig, FeatureConfig};
use crate::error::RecognitionError;
use crate::features::{extract_clip_features, ClipFeatures, LabeledFeatures};
use crate::io::{load_clip_features, load_pitch_track, CorpusFile, LabeledPitchTrack, PitchTrack};

/// Builds a [`SignatureSet`] from a labeled corpus
#[derive(Debug, Clone)]
pub struct SignatureAggregator {
    features: FeatureConfig,
    config: AggregationConfig,
    corpus_path: Option<String>,
}

enum ClipOutcome {
    Features(LabeledFeatures),
    Empty,
    ForeignSchema,
    Failed,
}

impl SignatureAggregator {
    /// Create an aggregator
    pub fn new(features: FeatureConfig, config: AggregationConfig) -> Self {
        Self {
            features,
            config,
            corpus_path: None,
        }
    }

    /// Record the corpus location in the run metadata
    pub fn with_corpus_path(mut self, path: impl Into<String>) -> Self {
        self.corpus_path = Some(path.into());
        self
    }

    /// Extraction parameters every clip is built with
    pub fn feature_config(&self) -> &FeatureConfig {
        &self.features
    }

    /// Aggregate pre-extracted clip features
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the configuration is invalid or no clip
    /// passes the guardrails.
    pub fn aggregate_features(
        &self,
        clips: &[LabeledFeatures],
    ) -> Result<SignatureSet, RecognitionError> {
        self.features.validate()?;
        let counts = AggregationCounts {
            files_seen: clips.len(),
            ..AggregationCounts::default()
        };
        self.reduce(clips.iter(), counts)
    }

    /// Extract every track in parallel, then aggregate
    ///
    /// A failing clip is counted and logged; it never aborts the run.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the configuration is invalid or no clip
    /// passes the guardrails.
    pub fn aggregate_tracks(
        &self,
        tracks: &[LabeledPitchTrack],
    ) -> Result<SignatureSet, RecognitionError> {
        self.features.validate()?;
        log::info!("Aggregating {} clips", tracks.len());

        let outcomes: Vec<ClipOutcome> = tracks
            .par_iter()
            .map(|clip| self.extract_outcome(&clip.id, &clip.label, &clip.track))
            .collect();
        self.reduce_outcomes(outcomes)
    }

    /// Load and extract every pitch-track file of a corpus, then aggregate
    ///
    /// An unreadable file is counted in `files_seen` and `errors`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the configuration is invalid or no clip
    /// passes the guardrails.
    pub fn aggregate_track_files(
        &self,
        files: &[CorpusFile],
    ) -> Result<SignatureSet, RecognitionError> {
        self.features.validate()?;
        log::info!("Aggregating {} clip files", files.len());

        let outcomes: Vec<ClipOutcome> = files
            .par_iter()
            .map(|file| match load_pitch_track(&file.path) {
                Ok(track) => self.extract_outcome(&file.id, &file.label, &track),
                Err(e) => {
                    log::warn!("{}: unreadable pitch track: {}", file.id, e);
                    ClipOutcome::Failed
                }
            })
            .collect();
        self.reduce_outcomes(outcomes)
    }

    /// Aggregate persisted per-clip feature records
    ///
    /// A record tagged with another feature schema is counted in
    /// `skipped_schema`; an unreadable or inconsistent record in `errors`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the configuration is invalid or no record
    /// passes the guardrails.
    pub fn aggregate_feature_files<P: AsRef<Path> + Sync>(
        &self,
        paths: &[P],
    ) -> Result<SignatureSet, RecognitionError> {
        self.features.validate()?;
        log::info!("Aggregating {} feature records", paths.len());

        let outcomes: Vec<ClipOutcome> = paths
            .par_iter()
            .map(|path| {
                let path = path.as_ref();
                match load_clip_features(path) {
                    Ok(record) => ClipOutcome::Features(record),
                    Err(RecognitionError::SchemaVersionMismatch { expected, found }) => {
                        log::warn!(
                            "{}: schema {} does not match {}, skipped",
                            path.display(),
                            found,
                            expected
                        );
                        ClipOutcome::ForeignSchema
                    }
                    Err(e) => {
                        log::warn!("{}: unreadable feature record: {}", path.display(), e);
                        ClipOutcome::Failed
                    }
                }
            })
            .collect();
        self.reduce_outcomes(outcomes)
    }

    fn extract_outcome(&self, id: &str, label: &str, track: &PitchTrack) -> ClipOutcome {
        match extract_clip_features(track, &self.features) {
            Ok(extraction) => match extraction.features {
                Some(features) => ClipOutcome::Features(LabeledFeatures {
                    id: id.to_string(),
                    label: label.to_string(),
                    features,
                }),
                None => {
                    log::warn!("{}: stability gate kept no frames, skipped", id);
                    ClipOutcome::Empty
                }
            },
            Err(e) => {
                log::warn!("{}: extraction failed: {}", id, e);
                ClipOutcome::Failed
            }
        }
    }

    fn reduce_outcomes(&self, outcomes: Vec<ClipOutcome>) -> Result<SignatureSet, RecognitionError> {
        let mut counts = AggregationCounts {
            files_seen: outcomes.len(),
            ..AggregationCounts::default()
        };
        let mut extracted = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                ClipOutcome::Features(f) => extracted.push(f),
                ClipOutcome::Empty => counts.empty_features += 1,
                ClipOutcome::ForeignSchema => counts.skipped_schema += 1,
                ClipOutcome::Failed => counts.errors += 1,
            }
        }

        self.reduce(extracted.iter(), counts)
    }

    fn reduce<'a>(
        &self,
        clips: impl Iterator<Item = &'a LabeledFeatures>,
        mut counts: AggregationCounts,
    ) -> Result<SignatureSet, RecognitionError> {
        let mut by_label: BTreeMap<&str, Vec<&ClipFeatures>> = BTreeMap::new();

        for clip in clips {
            if clip.label.is_empty() {
                log::warn!("{}: empty label, skipped", clip.id);
                counts.errors += 1;
                continue;
            }
            if let Err(e) = clip.features.validate() {
                log::warn!("{}: invalid features: {}", clip.id, e);
                counts.errors += 1;
                continue;
            }
            let f = &clip.features;
            if f.schema() != self.features.schema || f.bins() != self.features.bins {
                log::warn!(
                    "{}: schema {} / {} bins does not match {} / {} bins, skipped",
                    clip.id,
                    f.schema(),
                    f.bins(),
                    self.features.schema,
                    self.features.bins
                );
                counts.skipped_schema += 1;
                continue;
            }
            if f.gating_ratio() < self.config.min_gating_ratio {
                log::warn!(
                    "{}: gating ratio {:.3} below {:.3}, skipped",
                    clip.id,
                    f.gating_ratio(),
                    self.config.min_gating_ratio
                );
                counts.skipped_low_gating += 1;
                continue;
            }
            counts.accepted += 1;
            by_label.entry(clip.label.as_str()).or_default().push(f);
        }

        if counts.accepted == 0 {
            return Err(RecognitionError::InvalidInput(format!(
                "no clip passed aggregation guardrails ({:?})",
                counts
            )));
        }

        let mut signatures = Vec::with_capacity(by_label.len());
        for (label, clips) in &by_label {
            signatures.push(self.build_signature(label, clips)?);
        }

        log::info!(
            "Aggregated {} signatures: {} of {} clips accepted, {} skipped (schema), {} skipped (gating), {} empty, {} errors",
            signatures.len(),
            counts.accepted,
            counts.files_seen,
            counts.skipped_schema,
            counts.skipped_low_gating,
            counts.empty_features,
            counts.errors
        );

        let metadata = AggregationMetadata {
            schema: self.features.schema,
            bins: self.features.bins,
            alpha: self.features.alpha,
            min_stable_frames: self.features.min_stable_frames,
            gate: self.features.gate.clone(),
            tonic: self.features.tonic.clone(),
            timestamp: Utc::now(),
            corpus_path: self.corpus_path.clone(),
            labels: by_label.keys().map(|l| l.to_string()).collect(),
            counts,
        };

        SignatureSet::new(metadata, signatures)
    }

    fn build_signature(
        &self,
        label: &str,
        clips: &[&ClipFeatures],
    ) -> Result<RagaSignature, RecognitionError> {
        let stats = |select: fn(&ClipFeatures) -> &[f32]| -> Result<MeanStd, RecognitionError> {
            let rows: Vec<&[f32]> = clips.iter().map(|c| select(c)).collect();
            let (mean, std) = element_mean_std(&rows)?;
            Ok(MeanStd { mean, std })
        };

        let gating: Vec<f32> = clips.iter().map(|c| c.gating_ratio()).collect();
        let transitions: Vec<f32> = clips.iter().map(|c| c.transitions() as f32).collect();

        log::debug!("Signature '{}': {} clips", label, clips.len());

        RagaSignature::from_parts(
            label.to_string(),
            self.features.schema,
            self.features.bins,
            stats(ClipFeatures::pcd)?,
            stats(ClipFeatures::up)?,
            stats(ClipFeatures::down)?,
            clips.len(),
            scalar_mean(&gating),
            scalar_mean(&transitions),
        )
    }
}
