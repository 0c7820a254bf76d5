//! Tonic normalization: Hz to cents relative to Sa
//!
//! Cents are logarithmic: 1200 per octave. A pitch class folds cents into a
//! single octave, `[0, 1200)`.

/// Cents in one octave
pub const CENTS_PER_OCTAVE: f32 = 1200.0;

/// Signed cents distance of `pitch_hz` above `reference_hz`
///
/// `1200 * log2(pitch / reference)`; not folded into an octave.
#[inline]
pub fn hz_to_cents(pitch_hz: f32, reference_hz: f32) -> f32 {
    CENTS_PER_OCTAVE * (pitch_hz / reference_hz).log2()
}

/// Fold a cents value into `[0, 1200)`
///
/// `rem_euclid` can round a tiny negative input up to exactly 1200.0 in `f32`;
/// that case folds to 0.
#[inline]
pub fn fold_to_octave(cents: f32) -> f32 {
    let folded = cents.rem_euclid(CENTS_PER_OCTAVE);
    if folded >= CENTS_PER_OCTAVE {
        0.0
    } else {
        folded
    }
}

/// Pitch class of `pitch_hz` relative to the tonic, in `[0, 1200)`
#[inline]
pub fn pitch_class_cents(pitch_hz: f32, tonic_hz: f32) -> f32 {
    fold_to_octave(hz_to_cents(pitch_hz, tonic_hz))
}
