//! Tonic (Sa) estimation from a clip's voiced pitch
//!
//! # Algorithm
//!
//! 1. Build a coarse linear-frequency histogram of voiced pitch
//! 2. Take the centres of the top-K bins as seeds
//! 3. Expand each seed by octave multipliers, keeping candidates inside the
//!    plausible tonic band
//! 4. Score each candidate by the number of frames within a cents window of it
//! 5. Pick the highest score; the first candidate wins ties

use super::histogram::{pitch_histogram, top_bin_centers};
use super::{TonicCandidate, TonicEstimate};
use crate::config::TonicConfig;
use crate::error::RecognitionError;
use crate::preprocessing::cents::{hz_to_cents, CENTS_PER_OCTAVE};

/// Estimate the tonic of a clip
///
/// # Arguments
///
/// * `voiced_pitches` - Pitch in Hz of every voiced frame, in time order
/// * `config` - Tonic estimation parameters
///
/// # Returns
///
/// `TonicEstimate` with the chosen tonic, the seeds and every scored candidate
///
/// # Errors
///
/// Returns `InsufficientVoicedFrames` if fewer than `config.min_voiced_frames`
/// pitches are supplied, `ProcessingError` if no candidate falls inside the
/// tonic band.
///
/// # Example
///
/// ```
/// use swara_dsp::config::TonicConfig;
/// use swara_dsp::features::tonic::estimate_tonic;
///
/// let pitches = vec![146.8f32; 400];
/// let estimate = estimate_tonic(&pitches, &TonicConfig::default())?;
/// assert!((estimate.tonic_hz - 146.8).abs() < 1.0);
/// # Ok::<(), swara_dsp::RecognitionError>(())
/// ```
pub fn estimate_tonic(
    voiced_pitches: &[f32],
    config: &TonicConfig,
) -> Result<TonicEstimate, RecognitionError> {
    log::debug!(
        "Estimating tonic from {} voiced frames ({} histogram bins, top {})",
        voiced_pitches.len(),
        config.histogram_bins,
        config.top_k_peaks
    );

    if voiced_pitches.len() < config.min_voiced_frames {
        return Err(RecognitionError::InsufficientVoicedFrames {
            found: voiced_pitches.len(),
            required: config.min_voiced_frames,
        });
    }

    if voiced_pitches.iter().any(|p| !(p.is_finite() && *p > 0.0)) {
        return Err(RecognitionError::InvalidInput(
            "voiced pitches must be finite and positive".to_string(),
        ));
    }

    // Step 1-2: seeds from the most populated histogram bins
    let (counts, edges) = pitch_histogram(voiced_pitches, config.histogram_bins);
    let seeds = top_bin_centers(&counts, &edges, config.top_k_peaks);

    // Step 3: octave expansion inside the plausible band
    let mut candidates = Vec::with_capacity(seeds.len() * config.octave_multipliers.len());
    for &seed in &seeds {
        for &mult in &config.octave_multipliers {
            let hz = seed * mult;
            if hz >= config.min_tonic_hz && hz <= config.max_tonic_hz {
                candidates.push(TonicCandidate {
                    hz,
                    seed_hz: seed,
                    score: 0.0,
                });
            }
        }
    }

    if candidates.is_empty() {
        return Err(RecognitionError::ProcessingError(format!(
            "no tonic candidate inside [{:.0}, {:.0}] Hz (seeds: {:?})",
            config.min_tonic_hz, config.max_tonic_hz, seeds
        )));
    }

    // Step 4: window score
    for candidate in candidates.iter_mut() {
        candidate.score = window_score(voiced_pitches, candidate.hz, config.window_cents) as f32;
    }

    // Step 5: stable argmax (strictly greater replaces)
    let mut best = 0usize;
    for (i, candidate) in candidates.iter().enumerate().skip(1) {
        if candidate.score > candidates[best].score {
            best = i;
        }
    }

    let tonic_hz = candidates[best].hz;
    log::debug!(
        "Tonic estimate: {:.2} Hz (score {}, {} candidates from {} seeds)",
        tonic_hz,
        candidates[best].score,
        candidates.len(),
        seeds.len()
    );

    Ok(TonicEstimate {
        tonic_hz,
        chosen_index: best,
        seeds_hz: seeds,
        candidates,
        validation: None,
    })
}

/// Count pitches within `window_cents` of `candidate_hz`
///
/// Only distances inside one octave either side, (-1200, 1200), are considered.
pub fn window_score(voiced_pitches: &[f32], candidate_hz: f32, window_cents: f32) -> usize {
    voiced_pitches
        .iter()
        .map(|&p| hz_to_cents(p, candidate_hz))
        .filter(|c| *c > -CENTS_PER_OCTAVE && *c < CENTS_PER_OCTAVE)
        .filter(|c| c.abs() < window_cents)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held_notes(tonic: f32, notes: &[(f32, usize)]) -> Vec<f32> {
        let mut out = Vec::new();
        for &(cents, frames) in notes {
            let hz = tonic * 2f32.powf(cents / 1200.0);
            out.extend(std::iter::repeat(hz).take(frames));
        }
        out
    }

    #[test]
    fn test_insufficient_voiced_frames() {
        let result = estimate_tonic(&[150.0; 199], &TonicConfig::default());
        assert_eq!(
            result.unwrap_err(),
            RecognitionError::InsufficientVoicedFrames {
                found: 199,
                required: 200
            }
        );
    }

    #[test]
    fn test_dominant_note_becomes_tonic() {
        let pitches = held_notes(146.83, &[(0.0, 300), (700.0, 120), (400.0, 80)]);
        let estimate = estimate_tonic(&pitches, &TonicConfig::default()).unwrap();
        let err_cents = hz_to_cents(estimate.tonic_hz, 146.83).abs();
        assert!(err_cents < 10.0, "tonic off by {:.1} cents", err_cents);
    }

    #[test]
    fn test_high_voice_folds_down_an_octave() {
        // Dominant pitch at 440 Hz is outside the band; 220 Hz is inside.
        let pitches = held_notes(440.0, &[(0.0, 300), (200.0, 100)]);
        let estimate = estimate_tonic(&pitches, &TonicConfig::default()).unwrap();
        assert!(estimate.tonic_hz >= 80.0 && estimate.tonic_hz <= 400.0);
        assert!(hz_to_cents(estimate.tonic_hz, 220.0).abs() < 10.0);
    }

    #[test]
    fn test_candidates_inside_band() {
        let pitches = held_notes(130.0, &[(0.0, 250), (500.0, 100), (900.0, 50)]);
        let config = TonicConfig::default();
        let estimate = estimate_tonic(&pitches, &config).unwrap();
        assert!(!estimate.candidates.is_empty());
        for c in &estimate.candidates {
            assert!(c.hz >= config.min_tonic_hz && c.hz <= config.max_tonic_hz);
        }
        assert!(estimate.seeds_hz.len() <= config.top_k_peaks);
    }

    #[test]
    fn test_no_candidate_in_band() {
        let pitches = vec![2000.0f32; 300];
        let result = estimate_tonic(&pitches, &TonicConfig::default());
        assert!(matches!(result, Err(RecognitionError::ProcessingError(_))));
    }

    #[test]
    fn test_deterministic() {
        let pitches = held_notes(155.0, &[(0.0, 200), (700.0, 200), (300.0, 60)]);
        let a = estimate_tonic(&pitches, &TonicConfig::default()).unwrap();
        let b = estimate_tonic(&pitches, &TonicConfig::default()).unwrap();
        assert_eq!(a.tonic_hz, b.tonic_hz);
        assert_eq!(a.chosen_index, b.chosen_index);
    }

    #[test]
    fn test_tie_prefers_first_candidate() {
        let pitches = held_notes(150.0, &[(0.0, 200), (700.0, 200)]);
        let estimate = estimate_tonic(&pitches, &TonicConfig::default()).unwrap();
        let best = estimate.candidates[estimate.chosen_index].score;
        let first_max = estimate
            .candidates
            .iter()
            .position(|c| c.score == best)
            .unwrap();
        assert_eq!(estimate.chosen_index, first_max);
    }

    #[test]
    fn test_window_score() {
        let pitches = vec![100.0, 101.0, 110.0, 200.0];
        // 101 Hz is ~17 cents above 100; 110 Hz is ~165 cents; 200 Hz is exactly 1200 (excluded).
        assert_eq!(window_score(&pitches, 100.0, 50.0), 2);
    }
}
