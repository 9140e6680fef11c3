//! Robust summary statistics.

/// Scale factor turning a median absolute deviation into a consistent
/// estimator of the standard deviation for normally distributed data.
pub const MAD_SCALE: f64 = 1.4826;

/// Median of a sample. Even-length samples average the two middle values.
///
/// Returns `None` for an empty sample. NaNs sort last.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Median absolute deviation around `center`, scaled by [`MAD_SCALE`].
pub fn scaled_mad(values: &[f64], center: f64) -> Option<f64> {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations).map(|mad| mad * MAD_SCALE)
}
