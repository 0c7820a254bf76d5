//! Confidence shaping and abstention
//!
//! Two stages follow candidate scoring:
//!
//! 1. **Shaping**: every raw score is multiplied by one factor per query.
//!    Below `min_transitions` the dyad evidence is thin and a flat discount
//!    applies; otherwise the genericness index sets the discount. The factor
//!    is shared by all candidates, so relative order is preserved.
//! 2. **Abstention**: the verdict is `UNKNOWN/LOW CONFIDENCE` when the top
//!    of the ranking is too close to call.
//!
//! # Example
//!
//! ```
//! use swara_dsp::analysis::confidence::decide_verdict;
//! use swara_dsp::analysis::result::{CandidateScore, Verdict};
//! use swara_dsp::config::AbstentionConfig;
//!
//! let candidate = |label: &str, score: f32| CandidateScore {
//!     label: label.to_string(),
//!     pcd_similarity: score,
//!     dyad_similarity: score,
//!     raw_score: score,
//!     final_score: score,
//!     genericness_index: 0.0,
//!     transition_count: 100,
//!     gating_ratio: 0.8,
//! };
//! let ranking = vec![candidate("Kalyani", 0.90), candidate("Todi", 0.70)];
//! let (verdict, _) = decide_verdict(&ranking, &AbstentionConfig::default());
//! assert_eq!(verdict, Verdict::Raga("Kalyani".to_string()));
//! ```

use serde::{Deserialize, Serialize};

use super::result::{AbstentionReason, CandidateScore, Verdict};
use crate::config::{AbstentionConfig, RecognitionConfig};

/// Score gaps at the top of a ranking
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    /// First minus second (`None` with fewer than two candidates)
    pub margin_12: Option<f32>,

    /// Second minus third (`None` with fewer than three candidates)
    pub margin_23: Option<f32>,
}

impl Margins {
    /// Margins of a ranking sorted by descending final score
    pub fn of(ranking: &[CandidateScore]) -> Self {
        let gap = |i: usize| {
            ranking
                .get(i + 1)
                .map(|next| ranking[i].final_score - next.final_score)
        };
        Self {
            margin_12: gap(0),
            margin_23: gap(1),
        }
    }
}

/// Multiplier applied to every raw score of a query
///
/// `sparse_transition_discount` below `min_transitions`, otherwise
/// `1 - λ·G`.
pub fn confidence_factor(transitions: usize, genericness: f32, config: &RecognitionConfig) -> f32 {
    if transitions < config.min_transitions {
        config.sparse_transition_discount
    } else {
        1.0 - config.genericness_lambda * genericness.clamp(0.0, 1.0)
    }
}

/// Derive the verdict from a ranking
///
/// A missing second or third candidate counts as an infinite margin.
///
/// # Arguments
///
/// * `ranking` - Candidates sorted by descending final score
/// * `config` - Abstention thresholds
///
/// # Returns
///
/// The verdict and the margins it was based on
pub fn decide_verdict(ranking: &[CandidateScore], config: &AbstentionConfig) -> (Verdict, Margins) {
    let margins = Margins::of(ranking);
    let best = match ranking.first() {
        Some(best) => best,
        None => return (Verdict::Unknown(AbstentionReason::NoCandidates), margins),
    };

    let m12 = margins.margin_12.unwrap_or(f32::INFINITY);
    let m23 = margins.margin_23.unwrap_or(f32::INFINITY);

    let verdict = if m12 < config.hard_margin {
        Verdict::Unknown(AbstentionReason::NarrowLead)
    } else if m12 < config.soft_margin && m23 < config.flat_margin_23 {
        Verdict::Unknown(AbstentionReason::FlatTop)
    } else {
        Verdict::Raga(best.label.clone())
    };

    log::debug!(
        "Verdict: {} (margin_12={:?}, margin_23={:?})",
        verdict,
        margins.margin_12,
        margins.margin_23
    );

    (verdict, margins)
}
