//! Run-length filtering of a digitized pitch sequence
//!
//! Consecutive equal bin indices form a run. Runs shorter than the
//! minimum-stable-frames threshold are passing tones and are dropped; each
//! surviving run contributes one entry to the stable-bin sequence.

/// Collapse bin indices into the sequence of held notes
///
/// # Arguments
///
/// * `bin_indices` - Digitized gated cents, in time order
/// * `min_stable_frames` - Shortest run that counts as a held note
///
/// # Returns
///
/// One bin index per surviving run. Two adjacent entries can share a bin
/// when the short run separating them was dropped.
///
/// # Example
///
/// ```
/// use swara_dsp::features::dyads::stable_bin_sequence;
///
/// let seq = [3, 3, 3, 3, 3, 7, 7, 9, 9, 9, 9, 9];
/// assert_eq!(stable_bin_sequence(&seq, 5), vec![3, 9]);
/// ```
pub fn stable_bin_sequence(bin_indices: &[usize], min_stable_frames: usize) -> Vec<usize> {
    let mut stable = Vec::new();
    let mut iter = bin_indices.iter().copied();
    let mut current = match iter.next() {
        Some(first) => first,
        None => return stable,
    };
    let mut run_len = 1usize;

    for bin in iter {
        if bin == current {
            run_len += 1;
        } else {
            if run_len >= min_stable_frames {
                stable.push(current);
            }
            current = bin;
            run_len = 1;
        }
    }
    if run_len >= min_stable_frames {
        stable.push(current);
    }

    stable
}
