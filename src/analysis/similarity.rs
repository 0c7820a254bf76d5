//! Vector similarity and distribution statistics
//!
//! All functions accept plain slices so PCDs, flattened dyad matrices and
//! signature means can be compared directly.

use crate::config::EPSILON;

/// Cosine similarity `a·b / (|a||b| + ε)`
///
/// Zero vectors give 0.0. Slices of different length compare over the
/// shorter one.
///
/// # Example
///
/// ```
/// use swara_dsp::analysis::similarity::cosine_similarity;
///
/// let s = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]);
/// assert!((s - 1.0).abs() < 1e-6);
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    let mut na = 0.0f64;
    let mut nb = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    (dot / (na.sqrt() * nb.sqrt() + EPSILON as f64)) as f32
}

/// Jensen-Shannon distance with base-2 logarithms, in `[0, 1]`
///
/// Both inputs are normalized to sum to 1 first. The distance is the square
/// root of the divergence. Returns 1.0 if either input has no mass.
pub fn jensen_shannon_distance(p: &[f32], q: &[f32]) -> f32 {
    let sp: f64 = p.iter().map(|&v| v as f64).sum();
    let sq: f64 = q.iter().map(|&v| v as f64).sum();
    if sp <= 0.0 || sq <= 0.0 {
        return 1.0;
    }

    let mut divergence = 0.0f64;
    for (&a, &b) in p.iter().zip(q.iter()) {
        let a = a as f64 / sp;
        let b = b as f64 / sq;
        let m = 0.5 * (a + b);
        if a > 0.0 {
            divergence += 0.5 * a * (a / m).log2();
        }
        if b > 0.0 {
            divergence += 0.5 * b * (b / m).log2();
        }
    }
    divergence.clamp(0.0, 1.0).sqrt() as f32
}

/// Shannon entropy in nats, ignoring empty bins
pub fn entropy(p: &[f32]) -> f32 {
    p.iter()
        .filter(|&&v| v > 0.0)
        .map(|&v| -(v as f64) * (v as f64 + EPSILON as f64).ln())
        .sum::<f64>() as f32
}

/// Entropy divided by `ln(N)`: 1.0 for a flat distribution, 0.0 for a spike
pub fn normalized_entropy(p: &[f32]) -> f32 {
    if p.len() < 2 {
        return 0.0;
    }
    (entropy(p) / (p.len() as f32).ln()).max(0.0)
}

/// KL-style directional asymmetry `Σ u·ln((u+ε)/(d+ε))`
///
/// `up` and `down` are each normalized to sum to 1 first. Equal matrices
/// give 0.0.
pub fn directional_asymmetry(up: &[f32], down: &[f32]) -> f32 {
    let su: f64 = up.iter().map(|&v| v as f64).sum();
    let sd: f64 = down.iter().map(|&v| v as f64).sum();
    let eps = EPSILON as f64;
    up.iter()
        .zip(down.iter())
        .map(|(&u, &d)| {
            let u = u as f64 / (su + eps);
            let d = d as f64 / (sd + eps);
            u * ((u + eps) / (d + eps)).ln()
        })
        .sum::<f64>() as f32
}
