//! Pitch preprocessing
//!
//! Tonic normalization of raw pitch into cents and pitch classes. The input
//! duration cap lives on [`crate::io::PitchTrack::truncated`].

pub mod cents;

pub use cents::{fold_to_octave, hz_to_cents, pitch_class_cents, CENTS_PER_OCTAVE};
