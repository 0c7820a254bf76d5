//! Directional dyad matrices
//!
//! # Algorithm
//!
//! 1. Digitize gated cents into the PCD bins, dropping out-of-range values
//! 2. Run-length filter into a stable-bin sequence
//! 3. Count each adjacent move `i -> j` in `up` if `j > i`, in `down` if `j < i`
//! 4. Add `alpha` to every cell of both matrices
//! 5. L1-normalize each matrix on its own
//!
//! Fewer gated frames than `min_stable_frames` yields all-zero matrices and no
//! smoothing.

use serde::{Deserialize, Serialize};

use super::run_length::stable_bin_sequence;
use crate::config::EPSILON;
use crate::features::pitch_class::PitchBins;

/// Up/down transition matrices between stable pitch regions
///
/// Matrices are stored row-major as flat `N * N` vectors; cell `[i, j]` is at
/// `i * N + j`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionalDyads {
    bins: usize,
    up: Vec<f32>,
    down: Vec<f32>,
    raw_up: Vec<u32>,
    raw_down: Vec<u32>,
    transitions: usize,
}

impl DirectionalDyads {
    /// Build dyad matrices from a gated cents sequence
    ///
    /// # Arguments
    ///
    /// * `cents` - Gated pitch-class cents in time order
    /// * `bins` - Pitch-class bins shared with the PCD
    /// * `min_stable_frames` - Shortest run that counts as a held note
    /// * `alpha` - Laplace smoothing added to every cell
    pub fn from_cents(cents: &[f32], bins: &PitchBins, min_stable_frames: usize, alpha: f32) -> Self {
        let n = bins.len();
        let mut raw_up = vec![0u32; n * n];
        let mut raw_down = vec![0u32; n * n];

        if cents.len() < min_stable_frames {
            log::debug!(
                "Dyads: {} gated frames below min_stable_frames {}, returning empty matrices",
                cents.len(),
                min_stable_frames
            );
            return Self {
                bins: n,
                up: vec![0.0; n * n],
                down: vec![0.0; n * n],
                raw_up,
                raw_down,
                transitions: 0,
            };
        }

        let indices: Vec<usize> = cents.iter().filter_map(|&c| bins.digitize(c)).collect();
        let stable = stable_bin_sequence(&indices, min_stable_frames);

        let mut transitions = 0usize;
        for pair in stable.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            if to > from {
                raw_up[from * n + to] += 1;
                transitions += 1;
            } else if to < from {
                raw_down[from * n + to] += 1;
                transitions += 1;
            }
        }

        let up = smooth_and_normalize(&raw_up, alpha);
        let down = smooth_and_normalize(&raw_down, alpha);

        log::debug!(
            "Dyads: {} digitized frames, {} held notes, {} transitions",
            indices.len(),
            stable.len(),
            transitions
        );

        Self {
            bins: n,
            up,
            down,
            raw_up,
            raw_down,
            transitions,
        }
    }

    /// Number of bins per side
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Normalized ascending-transition matrix (flat, row-major)
    pub fn up(&self) -> &[f32] {
        &self.up
    }

    /// Normalized descending-transition matrix (flat, row-major)
    pub fn down(&self) -> &[f32] {
        &self.down
    }

    /// Raw ascending counts before smoothing
    pub fn raw_up(&self) -> &[u32] {
        &self.raw_up
    }

    /// Raw descending counts before smoothing
    pub fn raw_down(&self) -> &[u32] {
        &self.raw_down
    }

    /// Counted up + down transitions
    pub fn transitions(&self) -> usize {
        self.transitions
    }
}

fn smooth_and_normalize(raw: &[u32], alpha: f32) -> Vec<f32> {
    let mut out: Vec<f32> = raw.iter().map(|&c| c as f32 + alpha).collect();
    let total: f32 = out.iter().sum();
    for v in out.iter_mut() {
        *v /= total + EPSILON;
    }
    out
}
