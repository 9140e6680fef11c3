//! Snapshot filters.
//!
//! - Robust k-NN outlier rejection on the distance matrix
//! - Bounding-box, recency and radius pre-filters on raw fixes

use serde::{Deserialize, Serialize};

use crate::error::{MassError, Result};
use crate::projection::{DistanceMatrix, EARTH_RADIUS_M};
use crate::stats::{median, scaled_mad};
use crate::{BoundingBox, TrackerFix};

/// Threshold floor in meters; tight low-noise crowds are never over-trimmed.
pub const MIN_KNN_THRESHOLD_M: f64 = 30.0;

/// Additive margin used when the MAD collapses to zero.
pub const ZERO_MAD_MARGIN_M: f64 = 50.0;

/// Configuration for the k-NN outlier filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnnFilterConfig {
    /// Neighbor index, 0-based with the point itself at index 0.
    /// Default: 4 (the 4th nearest distinct neighbor)
    pub k: usize,
    /// Tolerance above the median in MAD units.
    /// Default: 3.0
    pub n_sigmas: f64,
}

impl Default for KnnFilterConfig {
    fn default() -> Self {
        Self {
            k: 4,
            n_sigmas: 3.0,
        }
    }
}

impl KnnFilterConfig {
    /// Apply the filter to a distance matrix.
    pub fn apply(&self, distances: &DistanceMatrix) -> Result<KnnFilterResult> {
        keep_by_knn(distances, self.k, self.n_sigmas)
    }
}

/// Outcome of the k-NN filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnFilterResult {
    /// `true` for inliers, parallel to the matrix rows
    pub keep: Vec<bool>,
    /// Median k-th neighbor distance in meters
    pub k_med: f64,
    /// Cutoff actually applied, never below [`MIN_KNN_THRESHOLD_M`]
    pub threshold: f64,
    /// k-th neighbor distance of every point
    pub kth_distances: Vec<f64>,
}

impl KnnFilterResult {
    pub fn inlier_count(&self) -> usize {
        self.keep.iter().filter(|&&k| k).count()
    }

    pub fn outlier_count(&self) -> usize {
        self.keep.len() - self.inlier_count()
    }
}

/// Flag points whose local density is statistically anomalous.
///
/// For every point the k-th smallest entry of its distance row is taken
/// (index 0 is the point itself). The cutoff is
/// `median + n_sigmas * mad`, or `median + 50 m` when the MAD is zero,
/// floored at 30 m. A point is kept iff its k-th distance is at most the cutoff.
///
/// Fails with [`MassError::InsufficientPoints`] when `k >= n`.
pub fn keep_by_knn(distances: &DistanceMatrix, k: usize, n_sigmas: f64) -> Result<KnnFilterResult> {
    let n = distances.len();
    if k >= n {
        return Err(MassError::InsufficientPoints { k, point_count: n });
    }

    let mut scratch = vec![0.0; n];
    let kth_distances: Vec<f64> = distances
        .rows()
        .map(|row| {
            scratch.copy_from_slice(row);
            let (_, kth, _) = scratch.select_nth_unstable_by(k, f64::total_cmp);
            *kth
        })
        .collect();

    // n > k >= 0, so the sample is non-empty
    let k_med = median(&kth_distances).unwrap_or(0.0);
    let mad = scaled_mad(&kth_distances, k_med).unwrap_or(0.0);

    let raw = if mad > 0.0 {
        k_med + n_sigmas * mad
    } else {
        k_med + ZERO_MAD_MARGIN_M
    };
    let threshold = raw.max(MIN_KNN_THRESHOLD_M);

    let keep = kth_distances.iter().map(|&d| d <= threshold).collect();

    Ok(KnnFilterResult {
        keep,
        k_med,
        threshold,
        kth_distances,
    })
}

/// Keep the fixes inside an inclusive bounding box.
pub fn filter_bounds(fixes: &[TrackerFix], bounds: &BoundingBox) -> Vec<TrackerFix> {
    fixes
        .iter()
        .filter(|f| bounds.contains(f.latitude, f.longitude))
        .cloned()
        .collect()
}

/// Keep fixes reported within `max_age_s` seconds of the newest fix.
///
/// Fixes without a timestamp are always kept. If no fix carries a timestamp
/// the snapshot is returned unchanged.
pub fn filter_recent(fixes: &[TrackerFix], max_age_s: i64) -> Vec<TrackerFix> {
    let Some(newest) = fixes.iter().filter_map(|f| f.timestamp).max() else {
        return fixes.to_vec();
    };
    let oldest_allowed = newest.saturating_sub(max_age_s);

    fixes
        .iter()
        .filter(|f| f.timestamp.map_or(true, |t| t >= oldest_allowed))
        .cloned()
        .collect()
}

/// Keep fixes within `radius_m` great-circle meters of `center` (lat, lon).
pub fn filter_circle(fixes: &[TrackerFix], center: (f64, f64), radius_m: f64) -> Vec<TrackerFix> {
    fixes
        .iter()
        .filter(|f| great_circle_distance((f.latitude, f.longitude), center) <= radius_m)
        .cloned()
        .collect()
}

/// Haversine distance in meters between two (lat, lon) pairs in degrees.
pub fn great_circle_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let lat1 = a.0.to_radians();
    let lat2 = b.0.to_radians();
    let dlat = (b.0 - a.0).to_radians();
    let dlon = (b.1 - a.1).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}
