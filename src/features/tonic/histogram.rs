//! Linear-frequency pitch histogram and seed-peak selection

/// Equal-width histogram over `[min, max]` of the input, last edge inclusive
///
/// Returns `(counts, edges)` with `edges.len() == counts.len() + 1`. A
/// degenerate range (all values equal) is widened to ±0.5 around the value.
pub fn pitch_histogram(values: &[f32], n_bins: usize) -> (Vec<usize>, Vec<f32>) {
    if values.is_empty() || n_bins == 0 {
        return (vec![0; n_bins], vec![0.0; n_bins + 1]);
    }

    let mut lo = values.iter().copied().fold(f32::INFINITY, f32::min);
    let mut hi = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if hi - lo <= f32::EPSILON * hi.abs().max(1.0) {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / n_bins as f32;
    let edges: Vec<f32> = (0..=n_bins).map(|i| lo + width * i as f32).collect();

    let mut counts = vec![0usize; n_bins];
    for &v in values {
        let idx = ((v - lo) / width).floor() as isize;
        let idx = idx.clamp(0, n_bins as isize - 1) as usize;
        counts[idx] += 1;
    }

    (counts, edges)
}

/// Centres of the `k` most populated non-empty bins
///
/// Ordered by count descending; equal counts keep ascending bin order, so the
/// result is deterministic for a given histogram.
pub fn top_bin_centers(counts: &[usize], edges: &[f32], k: usize) -> Vec<f32> {
    let mut order: Vec<usize> = (0..counts.len()).filter(|&i| counts[i] > 0).collect();
    // Stable sort keeps index order among ties.
    order.sort_by(|&a, &b| counts[b].cmp(&counts[a]));
    order
        .into_iter()
        .take(k)
        .map(|i| 0.5 * (edges[i] + edges[i + 1]))
        .collect()
}
