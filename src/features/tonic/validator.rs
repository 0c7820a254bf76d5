//! Post-hoc tonic validation
//!
//! Re-scores the candidates an estimate already produced with a second
//! criterion: how densely the voice sits near the candidate, and how often it
//! stays there across adjacent frames. The candidate list itself is never
//! changed; only the selection may move.

use super::{TonicEstimate, TonicValidation};
use crate::config::TonicConfig;
use crate::preprocessing::cents::{hz_to_cents, CENTS_PER_OCTAVE};

/// Validation score of one candidate
///
/// `density_weight * density + continuity_weight * continuity`, where density
/// is the fraction of frames within `window_cents` of the candidate and
/// continuity is the fraction of adjacent frame pairs that both are. Frames
/// more than an octave away are ignored. Returns `None` if no frame is left.
pub fn validation_score(
    voiced_pitches: &[f32],
    candidate_hz: f32,
    config: &TonicConfig,
) -> Option<f32> {
    let near: Vec<bool> = voiced_pitches
        .iter()
        .map(|&p| hz_to_cents(p, candidate_hz))
        .filter(|c| *c > -CENTS_PER_OCTAVE && *c < CENTS_PER_OCTAVE)
        .map(|c| c.abs() < config.window_cents)
        .collect();

    if near.is_empty() {
        return None;
    }

    let density = near.iter().filter(|&&n| n).count() as f32 / near.len() as f32;
    let continuity = if near.len() > 1 {
        near.windows(2).filter(|w| w[0] && w[1]).count() as f32 / (near.len() - 1) as f32
    } else {
        0.0
    };

    Some(config.validation_density_weight * density + config.validation_continuity_weight * continuity)
}

/// Re-score an estimate's candidates and possibly override its tonic
///
/// The override happens only when another candidate scores strictly higher
/// than the originally chosen one. Both the original and validated tonic are
/// recorded on the returned estimate.
pub fn validate_tonic(
    voiced_pitches: &[f32],
    estimate: &TonicEstimate,
    config: &TonicConfig,
) -> TonicEstimate {
    let Some(original_candidate) = estimate.candidates.get(estimate.chosen_index) else {
        log::warn!(
            "Tonic validation skipped: chosen index {} outside {} candidates",
            estimate.chosen_index,
            estimate.candidates.len()
        );
        return estimate.clone();
    };

    let scores: Vec<f32> = estimate
        .candidates
        .iter()
        .map(|c| validation_score(voiced_pitches, c.hz, config).unwrap_or(f32::NEG_INFINITY))
        .collect();

    let original = estimate.chosen_index;
    let mut best = original;
    for (i, &s) in scores.iter().enumerate() {
        if s > scores[best] {
            best = i;
        }
    }

    let original_hz = original_candidate.hz;
    let validated_hz = estimate.candidates.get(best).map_or(original_hz, |c| c.hz);
    let overridden = best != original;

    if overridden {
        log::info!(
            "Tonic validation override: {:.2} Hz -> {:.2} Hz ({:.3} -> {:.3})",
            original_hz,
            validated_hz,
            scores[original],
            scores[best]
        );
    }

    let mut validated = estimate.clone();
    validated.tonic_hz = validated_hz;
    validated.chosen_index = best;
    validated.validation = Some(TonicValidation {
        original_hz,
        validated_hz,
        scores,
        overridden,
    });
    validated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tonic::TonicCandidate;

    fn estimate_with(candidates: &[f32], chosen: usize) -> TonicEstimate {
        TonicEstimate {
            tonic_hz: candidates[chosen],
            chosen_index: chosen,
            seeds_hz: candidates.to_vec(),
            candidates: candidates
                .iter()
                .map(|&hz| TonicCandidate {
                    hz,
                    seed_hz: hz,
                    score: 0.0,
                })
                .collect(),
            validation: None,
        }
    }

    #[test]
    fn test_validation_score_range() {
        let pitches = vec![200.0f32; 50];
        let s = validation_score(&pitches, 200.0, &TonicConfig::default()).unwrap();
        assert!((s - 1.0).abs() < 1e-6);
        assert!(validation_score(&pitches, 2000.0, &TonicConfig::default()).is_none());
    }

    #[test]
    fn test_continuity_prefers_held_note() {
        // Same density for both candidates, but 200 Hz is held while 300 Hz flickers.
        let mut pitches = vec![200.0f32; 20];
        for i in 0..40 {
            pitches.push(if i % 2 == 0 { 300.0 } else { 250.0 });
        }
        let config = TonicConfig::default();
        let held = validation_score(&pitches, 200.0, &config).unwrap();
        let flicker = validation_score(&pitches, 300.0, &config).unwrap();
        assert!(held > flicker);
    }

    #[test]
    fn test_override_keeps_candidates() {
        let mut pitches = vec![200.0f32; 100];
        pitches.extend(vec![250.0f32; 10]);
        let estimate = estimate_with(&[250.0, 200.0], 0);
        let validated = validate_tonic(&pitches, &estimate, &TonicConfig::default());

        assert_eq!(validated.candidates, estimate.candidates);
        assert_eq!(validated.tonic_hz, 200.0);
        let v = validated.validation.unwrap();
        assert!(v.overridden);
        assert_eq!(v.original_hz, 250.0);
        assert_eq!(v.validated_hz, 200.0);
    }

    #[test]
    fn test_no_override_on_tie() {
        let pitches = vec![200.0f32; 100];
        let estimate = estimate_with(&[200.0, 200.5], 1);
        let validated = validate_tonic(&pitches, &estimate, &TonicConfig::default());
        assert_eq!(validated.tonic_hz, 200.5);
        assert!(!validated.validation.unwrap().overridden);
    }

    #[test]
    fn test_out_of_range_choice_left_unchanged() {
        let pitches = vec![200.0f32; 100];
        let mut estimate = estimate_with(&[250.0, 200.0], 0);
        estimate.chosen_index = 5;
        let validated = validate_tonic(&pitches, &estimate, &TonicConfig::default());
        assert_eq!(validated, estimate);
        assert!(validated.validation.is_none());
    }
}
