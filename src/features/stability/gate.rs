//! Sliding-window pitch stability gate
//!
//! Keeps frames that belong to held notes and drops transient, ornamented
//! pitch. A window of `window_size` frames slides with step 1; a window is
//! stable when enough of it is voiced and the mean pitch of its second half
//! stays within `drift_threshold_cents` of its first half. Every frame of a
//! stable window is marked, and marks accumulate across overlapping windows,
//! so note centres are reinforced while glides between notes are not.
//!
//! Drift is measured on pitch classes by default, so an octave leap on the
//! same swara does not break a window. [`DriftDomain::Unwrapped`] measures it
//! on signed cents instead, which keeps a Sa wobbling around the tonic stable.

use super::GatedCents;
use crate::config::{DriftDomain, StabilityGateConfig, EPSILON};
use crate::error::RecognitionError;
use crate::io::PitchTrack;
use crate::preprocessing::cents::{hz_to_cents, pitch_class_cents};

/// Apply the stability gate to a pitch track
///
/// # Arguments
///
/// * `track` - Full pitch track with voiced flags
/// * `tonic_hz` - Tonic of the clip (0 cents)
/// * `config` - Gate parameters
///
/// # Returns
///
/// Pitch-class cents of every gated voiced frame, their frame indices, and the
/// gating ratio `gated / voiced`.
///
/// # Errors
///
/// Returns `InvalidInput` for a non-positive tonic or invalid gate parameters.
pub fn apply_stability_gate(
    track: &PitchTrack,
    tonic_hz: f32,
    config: &StabilityGateConfig,
) -> Result<GatedCents, RecognitionError> {
    if !(tonic_hz.is_finite() && tonic_hz > 0.0) {
        return Err(RecognitionError::InvalidInput(format!(
            "tonic must be positive, got {}",
            tonic_hz
        )));
    }
    config.validate()?;

    let n = track.len();
    let window = config.window_size;
    let half = window / 2;

    let usable: Vec<bool> = (0..n).map(|i| track.is_usable(i)).collect();
    let cents: Vec<f32> = track
        .pitch_hz()
        .iter()
        .zip(usable.iter())
        .map(|(&p, &u)| if u { pitch_class_cents(p, tonic_hz) } else { 0.0 })
        .collect();
    let drift_cents: Vec<f32> = match config.drift_domain {
        DriftDomain::PitchClass => cents.clone(),
        DriftDomain::Unwrapped => track
            .pitch_hz()
            .iter()
            .zip(usable.iter())
            .map(|(&p, &u)| if u { hz_to_cents(p, tonic_hz) } else { 0.0 })
            .collect(),
    };

    let mut gated = vec![false; n];
    let mut stable_windows = 0usize;

    if n >= window {
        for start in 0..=(n - window) {
            let end = start + window;
            let voiced_in_window = usable[start..end].iter().filter(|&&u| u).count();
            if (voiced_in_window as f32 / window as f32) < config.voiced_ratio_threshold {
                continue;
            }

            let first = mean_usable(&drift_cents[start..start + half], &usable[start..start + half]);
            let second = mean_usable(&drift_cents[start + half..end], &usable[start + half..end]);
            let (first, second) = match (first, second) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };

            if (second - first).abs() < config.drift_threshold_cents {
                stable_windows += 1;
                for mark in gated[start..end].iter_mut() {
                    *mark = true;
                }
            }
        }
    }

    let mut gated_cents = Vec::new();
    let mut frame_indices = Vec::new();
    for i in 0..n {
        if gated[i] && usable[i] {
            gated_cents.push(cents[i]);
            frame_indices.push(i);
        }
    }

    let voiced_frames = usable.iter().filter(|&&u| u).count();
    let gating_ratio = (gated_cents.len() as f32 / (voiced_frames as f32 + EPSILON)).clamp(0.0, 1.0);

    log::debug!(
        "Stability gate: {} of {} voiced frames kept ({} stable windows, ratio {:.3})",
        gated_cents.len(),
        voiced_frames,
        stable_windows,
        gating_ratio
    );

    Ok(GatedCents {
        cents: gated_cents,
        frame_indices,
        voiced_frames,
        gating_ratio,
    })
}

/// Mean of the usable values in a half-window
fn mean_usable(values: &[f32], usable: &[bool]) -> Option<f32> {
    let mut sum = 0.0f32;
    let mut count = 0usize;
    for (&v, &u) in values.iter().zip(usable.iter()) {
        if u {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TONIC: f32 = 150.0;

    fn hz(cents: f32) -> f32 {
        TONIC * 2f32.powf(cents / 1200.0)
    }

    fn track_from_cents(cents: &[f32]) -> PitchTrack {
        PitchTrack::from_pitch(cents.iter().map(|&c| hz(c)).collect(), 100.0).unwrap()
    }

    #[test]
    fn test_held_note_fully_gated() {
        let track = track_from_cents(&[200.0; 40]);
        let gated = apply_stability_gate(&track, TONIC, &StabilityGateConfig::default()).unwrap();
        assert_eq!(gated.cents.len(), 40);
        assert!((gated.gating_ratio - 1.0).abs() < 1e-4);
        assert!(gated.cents.iter().all(|c| (c - 200.0).abs() < 0.1));
    }

    #[test]
    fn test_glide_rejected() {
        // 20 cents per frame: every window drifts ~100 cents.
        let cents: Vec<f32> = (0..60).map(|i| i as f32 * 20.0).collect();
        let track = track_from_cents(&cents);
        let gated = apply_stability_gate(&track, TONIC, &StabilityGateConfig::default()).unwrap();
        assert!(gated.cents.is_empty());
        assert_eq!(gated.gating_ratio, 0.0);
    }

    #[test]
    fn test_short_track_has_no_window() {
        let track = track_from_cents(&[0.0; 9]);
        let gated = apply_stability_gate(&track, TONIC, &StabilityGateConfig::default()).unwrap();
        assert!(gated.cents.is_empty());
    }

    #[test]
    fn test_last_window_included() {
        let track = track_from_cents(&[300.0; 10]);
        let gated = apply_stability_gate(&track, TONIC, &StabilityGateConfig::default()).unwrap();
        assert_eq!(gated.cents.len(), 10);
    }

    #[test]
    fn test_unvoiced_frames_not_emitted() {
        let mut pitch: Vec<f32> = vec![hz(500.0); 30];
        pitch[12] = f32::NAN;
        pitch[17] = f32::NAN;
        let track = PitchTrack::from_pitch(pitch, 100.0).unwrap();
        let gated = apply_stability_gate(&track, TONIC, &StabilityGateConfig::default()).unwrap();
        assert_eq!(gated.voiced_frames, 28);
        assert_eq!(gated.cents.len(), 28);
        assert!(!gated.frame_indices.contains(&12));
        assert!(gated.gating_ratio <= 1.0);
    }

    #[test]
    fn test_mostly_unvoiced_window_skipped() {
        let mut voiced = vec![false; 30];
        for v in voiced.iter_mut().take(5) {
            *v = true;
        }
        let track = PitchTrack::new(vec![hz(0.0); 30], voiced, 100.0).unwrap();
        let gated = apply_stability_gate(&track, TONIC, &StabilityGateConfig::default()).unwrap();
        assert!(gated.cents.is_empty());
    }

    #[test]
    fn test_octave_leap_on_same_pitch_class_is_stable() {
        // Pitch class 100 throughout, one octave apart.
        let mut cents = vec![-1100.0f32; 5];
        cents.extend([100.0f32; 5]);
        let track = track_from_cents(&cents);
        let gated = apply_stability_gate(&track, TONIC, &StabilityGateConfig::default()).unwrap();
        assert_eq!(gated.cents.len(), 10);
        assert!((gated.gating_ratio - 1.0).abs() < 1e-4);
        assert!(gated.cents.iter().all(|c| (c - 100.0).abs() < 0.1));

        let unwrapped = StabilityGateConfig {
            drift_domain: DriftDomain::Unwrapped,
            ..StabilityGateConfig::default()
        };
        let gated = apply_stability_gate(&track, TONIC, &unwrapped).unwrap();
        assert!(gated.cents.is_empty());
    }

    #[test]
    fn test_sa_wobble_across_seam() {
        let cents: Vec<f32> = (0..40).map(|i| if i % 2 == 0 { -4.0 } else { 4.0 }).collect();
        let track = track_from_cents(&cents);

        // Folded, the wobble alternates between 1196 and 4 cents.
        let gated = apply_stability_gate(&track, TONIC, &StabilityGateConfig::default()).unwrap();
        assert!(gated.cents.is_empty());

        let unwrapped = StabilityGateConfig {
            drift_domain: DriftDomain::Unwrapped,
            ..StabilityGateConfig::default()
        };
        let gated = apply_stability_gate(&track, TONIC, &unwrapped).unwrap();
        assert_eq!(gated.cents.len(), 40);
        assert!(gated.cents.iter().all(|&c| !(10.0..1190.0).contains(&c)));
    }

    #[test]
    fn test_widening_thresholds_never_reduces_ratio() {
        // Held notes joined by glides, with some dropouts.
        let mut pitch = Vec::new();
        for (k, note) in [0.0f32, 200.0, 400.0, 700.0, 400.0].iter().enumerate() {
            for i in 0..25 {
                let wobble = ((i * 7 + k * 3) % 11) as f32 - 5.0;
                pitch.push(hz(note + wobble));
            }
            for i in 0..6 {
                pitch.push(hz(note + 40.0 * i as f32));
            }
        }
        pitch[33] = f32::NAN;
        pitch[90] = f32::NAN;
        let track = PitchTrack::from_pitch(pitch, 100.0).unwrap();

        let base = StabilityGateConfig::default();
        let base_ratio = apply_stability_gate(&track, TONIC, &base).unwrap().gating_ratio;

        let wider_drift = StabilityGateConfig {
            drift_threshold_cents: 60.0,
            ..base.clone()
        };
        let looser_voicing = StabilityGateConfig {
            voiced_ratio_threshold: 0.3,
            ..base.clone()
        };
        let drift_ratio = apply_stability_gate(&track, TONIC, &wider_drift).unwrap().gating_ratio;
        let voicing_ratio = apply_stability_gate(&track, TONIC, &looser_voicing).unwrap().gating_ratio;

        assert!(drift_ratio >= base_ratio);
        assert!(voicing_ratio >= base_ratio);
    }

    #[test]
    fn test_invalid_tonic() {
        let track = track_from_cents(&[0.0; 20]);
        assert!(apply_stability_gate(&track, 0.0, &StabilityGateConfig::default()).is_err());
    }
}
