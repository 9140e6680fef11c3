//! Local planar projection and dense pairwise distances.
//!
//! Uses an equirectangular approximation around a reference point. This is
//! accurate over a few tens of kilometers, which is the scale of a single
//! crowd snapshot, and must not be used for large-scale mapping.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_same_len, MassError, Result};
use crate::stats::median;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Planar coordinates in meters, parallel to the input fixes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanarPoints {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    /// Reference (latitude, longitude) the projection was taken around.
    pub reference: (f64, f64),
}

impl PlanarPoints {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Euclidean distance between points `i` and `j` in meters.
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        (self.xs[j] - self.xs[i]).hypot(self.ys[j] - self.ys[i])
    }
}

/// Project latitude/longitude (degrees) to local planar meters.
///
/// If `reference` is `None`, the median latitude and median longitude of the
/// input are used, which keeps the origin near the bulk of the data even when
/// a few fixes are far away.
///
/// # Example
/// ```
/// use critmass::project;
///
/// let planar = project(&[53.5, 53.501], &[10.0, 10.0], Some((53.5, 10.0))).unwrap();
/// assert_eq!(planar.xs[0], 0.0);
/// assert!((planar.ys[1] - 111.19).abs() < 0.01);
/// ```
pub fn project(
    latitudes: &[f64],
    longitudes: &[f64],
    reference: Option<(f64, f64)>,
) -> Result<PlanarPoints> {
    ensure_same_len(latitudes.len(), longitudes.len())?;

    let (lat0, lon0) = match reference {
        Some(r) => r,
        None => match (median(latitudes), median(longitudes)) {
            (Some(lat0), Some(lon0)) => (lat0, lon0),
            _ => return Ok(PlanarPoints::default()),
        },
    };

    let cos_lat0 = lat0.to_radians().cos();
    let xs = longitudes
        .iter()
        .map(|lon| (lon - lon0).to_radians() * EARTH_RADIUS_M * cos_lat0)
        .collect();
    let ys = latitudes
        .iter()
        .map(|lat| (lat - lat0).to_radians() * EARTH_RADIUS_M)
        .collect();

    Ok(PlanarPoints {
        xs,
        ys,
        reference: (lat0, lon0),
    })
}

/// Dense, symmetric matrix of planar distances in meters.
///
/// Stored row-major. The diagonal is zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Build from explicit rows. Every row must have exactly `rows.len()` entries.
    ///
    /// Symmetry is the caller's responsibility here; matrices produced by
    /// [`pairwise_distances`] are symmetric by construction.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != n {
                return Err(MassError::NonSquareMatrix {
                    row,
                    len: values.len(),
                    expected: n,
                });
            }
            data.extend(values);
        }
        Ok(Self { n, data })
    }

    /// Number of points (rows).
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Distance between `i` and `j`. Panics if either index is out of range.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.n && j < self.n, "index ({i}, {j}) out of {}", self.n);
        self.data[i * self.n + j]
    }

    /// Distances from `i` to every point.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on a zero chunk size
        self.data.chunks_exact(self.n.max(1))
    }
}

/// Compute the n×n Euclidean distance matrix of planar points.
///
/// Tolerates `n = 0` (empty matrix) and `n = 1` (`[[0]]`).
pub fn pairwise_distances(points: &PlanarPoints) -> Result<DistanceMatrix> {
    ensure_same_len(points.xs.len(), points.ys.len())?;

    let n = points.len();
    let mut data = vec![0.0; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = points.distance(i, j);
            data[i * n + j] = d;
            data[j * n + i] = d;
        }
    }
    Ok(DistanceMatrix { n, data })
}
