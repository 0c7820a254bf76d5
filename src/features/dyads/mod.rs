//! Directional dyads
//!
//! Transitions between held notes, split by direction:
//! - Run-length filter of the digitized gated sequence
//! - Up/down count matrices
//! - Laplace smoothing and per-matrix normalization

pub mod matrices;
pub mod run_length;

pub use matrices::DirectionalDyads;
pub use run_length::stable_bin_sequence;
