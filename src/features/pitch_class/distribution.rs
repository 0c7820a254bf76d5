//! Pitch-class distribution (PCD)
//!
//! Histogram of gated pitch-class cents over `[0, 1200)`, L1-normalized with
//! an epsilon-stabilized denominator. Empty input gives an all-zero PCD.

use serde::{Deserialize, Serialize};

use super::binning::PitchBins;
use crate::config::EPSILON;

/// L1-normalized pitch-class histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PitchClassDistribution {
    values: Vec<f32>,
}

impl PitchClassDistribution {
    /// Histogram `cents` into `bins` and normalize
    ///
    /// # Example
    ///
    /// ```
    /// use swara_dsp::features::pitch_class::{PitchBins, PitchClassDistribution};
    ///
    /// let bins = PitchBins::new(12).unwrap();
    /// let pcd = PitchClassDistribution::from_cents(&[50.0, 50.0, 750.0, 750.0], &bins);
    /// assert!((pcd.as_slice()[0] - 0.5).abs() < 1e-6);
    /// assert!((pcd.as_slice()[7] - 0.5).abs() < 1e-6);
    /// ```
    pub fn from_cents(cents: &[f32], bins: &PitchBins) -> Self {
        let mut counts = vec![0.0f32; bins.len()];
        for &c in cents {
            if let Some(i) = bins.histogram_index(c) {
                counts[i] += 1.0;
            }
        }
        Self::from_counts(counts)
    }

    /// Normalize raw counts to sum to 1 (all-zero stays all-zero)
    pub fn from_counts(mut counts: Vec<f32>) -> Self {
        let total: f32 = counts.iter().sum();
        for v in counts.iter_mut() {
            *v /= total + EPSILON;
        }
        Self { values: counts }
    }

    /// Bin masses
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Number of bins
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the distribution has no bins
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True if no mass was recorded
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }

    /// Shannon entropy (nats) divided by `ln(N)`; 1.0 for a flat PCD
    pub fn entropy(&self) -> f32 {
        crate::analysis::similarity::normalized_entropy(&self.values)
    }

    /// Fraction of bins with mass at or above `threshold`
    pub fn occupied_fraction(&self, threshold: f32) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let occupied = self.values.iter().filter(|&&v| v >= threshold).count();
        occupied as f32 / self.values.len() as f32
    }

    /// Consume into the bin vector
    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sums_to_one() {
        let bins = PitchBins::new(36).unwrap();
        let cents: Vec<f32> = (0..500).map(|i| (i as f32 * 7.3) % 1200.0).collect();
        let pcd = PitchClassDistribution::from_cents(&cents, &bins);
        let sum: f32 = pcd.as_slice().iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(pcd.as_slice().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_empty_is_zero() {
        let bins = PitchBins::new(36).unwrap();
        let pcd = PitchClassDistribution::from_cents(&[], &bins);
        assert_eq!(pcd.len(), 36);
        assert!(pcd.is_zero());
        assert_eq!(pcd.entropy(), 0.0);
    }

    #[test]
    fn test_flat_entropy_is_one() {
        let pcd = PitchClassDistribution::from_counts(vec![1.0; 12]);
        assert!((pcd.entropy() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_single_bin_entropy_is_zero() {
        let bins = PitchBins::new(12).unwrap();
        let pcd = PitchClassDistribution::from_cents(&[10.0; 50], &bins);
        assert!(pcd.entropy().abs() < 1e-4);
    }

    #[test]
    fn test_occupied_fraction() {
        let pcd = PitchClassDistribution::from_counts(vec![50.0, 49.5, 0.5, 0.0]);
        assert!((pcd.occupied_fraction(0.01) - 0.5).abs() < 1e-6);
    }
}
