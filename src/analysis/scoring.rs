//! Candidate scoring against raga signatures
//!
//! Each candidate gets a PCD similarity and a dyad similarity (mean of the
//! up and down matrices), combined with configurable weights. Two paths
//! exist: cosine similarity, and `1 - Jensen-Shannon distance`.

use std::cmp::Ordering;

use super::result::CandidateScore;
use super::similarity::{cosine_similarity, jensen_shannon_distance};
use crate::config::{ScoreWeights, ScoringMethod};
use crate::features::ClipFeatures;
use crate::signatures::{RagaSignature, SignatureSet};

/// PCD and dyad similarity of a query to one signature
pub fn similarity(
    features: &ClipFeatures,
    signature: &RagaSignature,
    method: ScoringMethod,
) -> (f32, f32) {
    match method {
        ScoringMethod::Cosine => {
            let pcd = cosine_similarity(features.pcd(), signature.mean_pcd());
            let up = cosine_similarity(features.up(), signature.mean_up());
            let down = cosine_similarity(features.down(), signature.mean_down());
            (pcd, 0.5 * (up + down))
        }
        ScoringMethod::JensenShannon => {
            let pcd = 1.0 - jensen_shannon_distance(features.pcd(), signature.mean_pcd());
            let up = jensen_shannon_distance(features.up(), signature.mean_up());
            let down = jensen_shannon_distance(features.down(), signature.mean_down());
            (pcd, 1.0 - 0.5 * (up + down))
        }
    }
}

/// Score every signature in the set and rank the result
///
/// # Arguments
///
/// * `features` - Query clip features
/// * `signatures` - Candidate signatures
/// * `method` - Similarity path
/// * `weights` - PCD/dyad weights
/// * `genericness` - Query genericness index (carried into each row)
/// * `factor` - Shaping factor applied to every raw score
pub fn score_candidates(
    features: &ClipFeatures,
    signatures: &SignatureSet,
    method: ScoringMethod,
    weights: ScoreWeights,
    genericness: f32,
    factor: f32,
) -> Vec<CandidateScore> {
    let mut ranking: Vec<CandidateScore> = signatures
        .iter()
        .map(|signature| {
            let (pcd_similarity, dyad_similarity) = similarity(features, signature, method);
            let raw_score = weights.pcd * pcd_similarity + weights.dyad * dyad_similarity;
            CandidateScore {
                label: signature.label().to_string(),
                pcd_similarity,
                dyad_similarity,
                raw_score,
                final_score: raw_score * factor,
                genericness_index: genericness,
                transition_count: features.transitions(),
                gating_ratio: features.gating_ratio(),
            }
        })
        .collect();
    rank(&mut ranking);
    ranking
}

/// Sort by descending final score; equal scores order by label
pub fn rank(candidates: &mut [CandidateScore]) {
    candidates.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(label: &str, score: f32) -> CandidateScore {
        CandidateScore {
            label: label.to_string(),
            pcd_similarity: score,
            dyad_similarity: score,
            raw_score: score,
            final_score: score,
            genericness_index: 0.0,
            transition_count: 0,
            gating_ratio: 1.0,
        }
    }

    #[test]
    fn test_rank_descending() {
        let mut c = vec![candidate("a", 0.2), candidate("b", 0.9), candidate("c", 0.5)];
        rank(&mut c);
        let labels: Vec<&str> = c.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_rank_ties_by_label() {
        let mut c = vec![candidate("z", 0.5), candidate("m", 0.5), candidate("a", 0.5)];
        rank(&mut c);
        let labels: Vec<&str> = c.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "m", "z"]);
    }
}
