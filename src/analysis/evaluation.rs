//! Batch evaluation over a labeled corpus
//!
//! Each clip is recognized independently (in parallel); failures are
//! recorded per clip and never stop the batch. Clips whose true label has no
//! signature are reported separately and left out of accuracy.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::engine::RecognitionEngine;
use crate::io::LabeledPitchTrack;

/// Recognition result for one evaluated clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRow {
    /// Clip identifier
    pub id: String,

    /// Ground-truth label
    pub true_label: String,

    /// Top-ranked label, if any candidate was scored
    pub predicted: Option<String>,

    /// Verdict text (label or `UNKNOWN/LOW CONFIDENCE`)
    pub verdict: String,

    /// Raw score of the top candidate
    pub raw_score: Option<f32>,

    /// Final score of the top candidate
    pub final_score: Option<f32>,

    /// Genericness index of the clip
    pub genericness_index: f32,

    /// Stable transitions in the clip
    pub transitions: usize,

    /// Top-2 margin
    pub margin_12: Option<f32>,

    /// Sibling escalation fired
    pub escalated: bool,

    /// True if the verdict names the true label
    pub correct: bool,

    /// True if the true label has no signature
    pub missing_signature: bool,

    /// Error message if recognition failed
    pub error: Option<String>,
}

/// Totals for one raga
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RagaTally {
    /// Scored clips of this raga
    pub total: usize,

    /// Correct verdicts
    pub correct: usize,

    /// `correct / total`
    pub accuracy: f32,
}

/// Corpus-level evaluation summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    /// Clips seen
    pub total: usize,

    /// Clips with a raga verdict
    pub recognized: usize,

    /// Correct verdicts
    pub correct: usize,

    /// UNKNOWN verdicts
    pub unknown: usize,

    /// Clips whose recognition failed
    pub errors: usize,

    /// Clips whose true label has no signature
    pub missing_signature: usize,

    /// Per-raga tallies, by label
    pub per_raga: BTreeMap<String, RagaTally>,

    /// Correct / scored clips (scored = no error, signature present)
    pub accuracy: f32,
}

/// Rows in input order plus summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// One row per clip
    pub rows: Vec<EvaluationRow>,

    /// Totals
    pub summary: EvaluationSummary,
}

/// Recognize every clip of a labeled corpus and tally the results
pub fn evaluate_corpus(engine: &RecognitionEngine, clips: &[LabeledPitchTrack]) -> EvaluationReport {
    log::info!("Evaluating {} clips", clips.len());

    let rows: Vec<EvaluationRow> = clips.par_iter().map(|clip| evaluate_clip(engine, clip)).collect();
    let summary = summarize(&rows);

    log::info!(
        "Evaluation: {} clips, {} correct, {} unknown, {} errors, {} missing signature, accuracy {:.3}",
        summary.total,
        summary.correct,
        summary.unknown,
        summary.errors,
        summary.missing_signature,
        summary.accuracy
    );

    EvaluationReport { rows, summary }
}

fn evaluate_clip(engine: &RecognitionEngine, clip: &LabeledPitchTrack) -> EvaluationRow {
    let missing_signature = !engine.signatures().contains(&clip.label);
    if missing_signature {
        log::warn!("{}: no signature for '{}'", clip.id, clip.label);
    }

    match engine.recognize(&clip.track) {
        Ok(outcome) => {
            let top = outcome.top();
            EvaluationRow {
                id: clip.id.clone(),
                true_label: clip.label.clone(),
                predicted: top.map(|c| c.label.clone()),
                verdict: outcome.verdict.to_string(),
                raw_score: top.map(|c| c.raw_score),
                final_score: top.map(|c| c.final_score),
                genericness_index: outcome.genericness_index,
                transitions: outcome.transitions,
                margin_12: outcome.margin_12,
                escalated: outcome.escalated,
                correct: outcome.verdict.label() == Some(clip.label.as_str()),
                missing_signature,
                error: None,
            }
        }
        Err(e) => {
            log::warn!("{}: recognition failed: {}", clip.id, e);
            EvaluationRow {
                id: clip.id.clone(),
                true_label: clip.label.clone(),
                predicted: None,
                verdict: String::new(),
                raw_score: None,
                final_score: None,
                genericness_index: 0.0,
                transitions: 0,
                margin_12: None,
                escalated: false,
                correct: false,
                missing_signature,
                error: Some(e.to_string()),
            }
        }
    }
}

fn summarize(rows: &[EvaluationRow]) -> EvaluationSummary {
    let mut summary = EvaluationSummary {
        total: rows.len(),
        ..EvaluationSummary::default()
    };

    for row in rows {
        if row.error.is_some() {
            summary.errors += 1;
            continue;
        }
        if row.missing_signature {
            summary.missing_signature += 1;
            continue;
        }
        let tally = summary.per_raga.entry(row.true_label.clone()).or_default();
        tally.total += 1;
        if row.verdict == super::result::UNKNOWN_VERDICT {
            summary.unknown += 1;
        } else {
            summary.recognized += 1;
        }
        if row.correct {
            tally.correct += 1;
            summary.correct += 1;
        }
    }

    let mut scored = 0usize;
    for tally in summary.per_raga.values_mut() {
        tally.accuracy = tally.correct as f32 / tally.total.max(1) as f32;
        scored += tally.total;
    }
    summary.accuracy = summary.correct as f32 / scored.max(1) as f32;
    summary
}
