//! Element-wise corpus statistics

use crate::error::RecognitionError;

/// Element-wise mean and population standard deviation of equal-length rows
///
/// # Errors
///
/// Returns `InvalidInput` if `rows` is empty or the rows differ in length.
///
/// # Example
///
/// ```
/// use swara_dsp::signatures::statistics::element_mean_std;
///
/// let a = [0.0f32, 1.0];
/// let b = [2.0f32, 1.0];
/// let (mean, std) = element_mean_std(&[&a[..], &b[..]])?;
/// assert_eq!(mean, vec![1.0, 1.0]);
/// assert_eq!(std, vec![1.0, 0.0]);
/// # Ok::<(), swara_dsp::RecognitionError>(())
/// ```
pub fn element_mean_std(rows: &[&[f32]]) -> Result<(Vec<f32>, Vec<f32>), RecognitionError> {
    let first = rows.first().ok_or_else(|| {
        RecognitionError::InvalidInput("cannot take statistics of zero rows".to_string())
    })?;
    let width = first.len();
    if let Some(bad) = rows.iter().find(|r| r.len() != width) {
        return Err(RecognitionError::InvalidInput(format!(
            "row length {} differs from {}",
            bad.len(),
            width
        )));
    }

    let count = rows.len() as f64;
    let mut mean = vec![0.0f64; width];
    for row in rows {
        for (m, &v) in mean.iter_mut().zip(row.iter()) {
            *m += v as f64;
        }
    }
    for m in mean.iter_mut() {
        *m /= count;
    }

    let mut var = vec![0.0f64; width];
    for row in rows {
        for ((s, &v), &m) in var.iter_mut().zip(row.iter()).zip(mean.iter()) {
            let d = v as f64 - m;
            *s += d * d;
        }
    }

    let std = var.iter().map(|s| (s / count).sqrt() as f32).collect();
    let mean = mean.into_iter().map(|m| m as f32).collect();
    Ok((mean, std))
}

/// Arithmetic mean of scalars (0.0 for an empty slice)
pub fn scalar_mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64) as f32
}
