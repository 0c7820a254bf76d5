//! Pitch-class binning and distribution
//!
//! Tonic-relative cents are split into `N` equal-width bins over one octave
//! (default 36, i.e. one-third semitone). The same bins index the PCD and
//! the dyad matrices.

pub mod binning;
pub mod distribution;

pub use binning::PitchBins;
pub use distribution::PitchClassDistribution;
