//! Genericness index
//!
//! `G = H · A · O` in `[0, 1]`:
//! - `H`: normalized PCD entropy (flat usage is generic)
//! - `A = 1 / (1 + asymmetry(up, down))` (symmetric motion is generic)
//! - `O`: fraction of PCD bins at or above the near-empty threshold
//!
//! A high index means the clip's tonal profile says little about any
//! particular raga.

use super::similarity::{directional_asymmetry, normalized_entropy};

/// Compute the genericness index of a clip
///
/// # Arguments
///
/// * `pcd` - Query pitch-class distribution
/// * `up` - Flattened normalized up matrix
/// * `down` - Flattened normalized down matrix
/// * `near_empty_threshold` - Bins below this mass count as omitted
///
/// # Returns
///
/// Index in `[0, 1]`
pub fn genericness_index(pcd: &[f32], up: &[f32], down: &[f32], near_empty_threshold: f32) -> f32 {
    if pcd.is_empty() {
        return 0.0;
    }
    let h = normalized_entropy(pcd);
    let a = 1.0 / (1.0 + directional_asymmetry(up, down));
    let occupied = pcd.iter().filter(|&&v| v >= near_empty_threshold).count();
    let o = occupied as f32 / pcd.len() as f32;

    let g = (h * a * o).clamp(0.0, 1.0);
    log::debug!("Genericness: H={:.3} A={:.3} O={:.3} -> G={:.3}", h, a, o, g);
    g
}
