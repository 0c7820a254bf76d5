//! Equal-width pitch-class bins over one octave

use crate::error::RecognitionError;
use crate::preprocessing::cents::CENTS_PER_OCTAVE;

/// `n` equal-width bins spanning `[0, 1200)` cents
///
/// The PCD and the dyad matrices of a clip share one `PitchBins`, so a bin
/// index means the same pitch region in both.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchBins {
    edges: Vec<f32>,
}

impl PitchBins {
    /// Create `n` bins
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `n < 2`.
    pub fn new(n: usize) -> Result<Self, RecognitionError> {
        if n < 2 {
            return Err(RecognitionError::InvalidInput(format!(
                "need at least 2 pitch-class bins, got {}",
                n
            )));
        }
        let width = CENTS_PER_OCTAVE / n as f32;
        let mut edges: Vec<f32> = (0..=n).map(|i| i as f32 * width).collect();
        edges[n] = CENTS_PER_OCTAVE;
        Ok(Self { edges })
    }

    /// Number of bins
    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    /// Always false; a `PitchBins` has at least two bins
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Bin edges (`len() + 1` values, first 0, last 1200)
    pub fn edges(&self) -> &[f32] {
        &self.edges
    }

    /// Width of one bin in cents
    pub fn width(&self) -> f32 {
        CENTS_PER_OCTAVE / self.len() as f32
    }

    /// Centre of bin `index` in cents
    pub fn center(&self, index: usize) -> f32 {
        (index as f32 + 0.5) * self.width()
    }

    /// Histogram bin of `cents`, with the last edge inclusive
    ///
    /// Values outside `[0, 1200]` or non-finite values have no bin.
    pub fn histogram_index(&self, cents: f32) -> Option<usize> {
        let last = self.len();
        if cents.is_finite() && cents == self.edges[last] {
            return Some(last - 1);
        }
        self.digitize(cents)
    }

    /// Bin `i` with `edges[i] <= cents < edges[i + 1]`
    ///
    /// Anything outside the half-open octave maps to `None` and is dropped
    /// from the dyad sequence.
    pub fn digitize(&self, cents: f32) -> Option<usize> {
        if !cents.is_finite() {
            return None;
        }
        let upper = self.edges.partition_point(|&e| e <= cents);
        if upper == 0 || upper > self.len() {
            None
        } else {
            Some(upper - 1)
        }
    }
}
