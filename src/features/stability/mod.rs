//! Pitch stability gating
//!
//! Select the frames of a clip that sit on held notes:
//! - Sliding windows with a voiced-ratio floor
//! - Half-window mean drift test in cents
//! - Union of all stable windows

pub mod gate;

pub use gate::apply_stability_gate;

use serde::{Deserialize, Serialize};

/// Stable pitch-class frames of one clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatedCents {
    /// Pitch-class cents in `[0, 1200)` of each gated frame, in time order
    pub cents: Vec<f32>,

    /// Source frame index of each entry in `cents`
    pub frame_indices: Vec<usize>,

    /// Voiced frames in the clip (denominator of `gating_ratio`)
    pub voiced_frames: usize,

    /// Gated frames / voiced frames, in `[0, 1]`
    pub gating_ratio: f32,
}

impl GatedCents {
    /// Number of gated frames
    pub fn len(&self) -> usize {
        self.cents.len()
    }

    /// True if the gate kept no frames
    pub fn is_empty(&self) -> bool {
        self.cents.is_empty()
    }
}
