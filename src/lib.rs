//! # Critmass
//!
//! Crowd-extent measurement from anonymous, independently reporting GPS
//! trackers (for example the riders of a group bicycle ride).
//!
//! The library turns one snapshot of raw fixes into:
//! - a denoised point set (robust k-NN outlier filter),
//! - a ranked partition into spatially connected clusters,
//! - an approximate "diameter" path through the largest cluster, chosen under
//!   a turn-penalized cost and reported with its true geometric length.
//!
//! ## Features
//!
//! - **`parallel`** - Process independent snapshot files concurrently with rayon
//! - **`cli`** - Build the `critmass-cli` binary
//!
//! ## Quick Start
//!
//! ```rust
//! use critmass::{Pipeline, PipelineConfig, TrackerFix};
//!
//! // A short column of riders heading north, roughly 10 m apart.
//! let fixes: Vec<TrackerFix> = (0..20)
//!     .map(|i| TrackerFix::new(format!("rider-{i}"), 53.55 + i as f64 * 0.0001, 9.99))
//!     .collect();
//!
//! let result = Pipeline::new(PipelineConfig::default()).run(&fixes).unwrap();
//! assert_eq!(result.largest_cluster_size(), 20);
//! assert!(result.length_m() > 200.0);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{MassError, Result};

// Median / MAD helpers
pub mod stats;

// Equirectangular projection and dense distance matrix
pub mod projection;
pub use projection::{pairwise_distances, project, DistanceMatrix, PlanarPoints};

// Robust k-NN outlier filter and snapshot pre-filters
pub mod filtering;
pub use filtering::{keep_by_knn, KnnFilterConfig, KnnFilterResult};

// Proximity graph with long-edge penalty
pub mod graph;
pub use graph::{build_graph, connection_radius, AdjacencyGraph, GraphConfig, ProximityGraph};

// Connected components ranked by size
pub mod clustering;
pub use clustering::{assign_from_components, ClusterAssignment};

// Angle-biased routing and diameter heuristics
pub mod routing;
pub use routing::{
    diameter_endpoints, path_true_length, shortest_paths, AngleBiasedRouter, ExpandedSearch,
    MassPath, RouterConfig, SearchState, ShortestPaths,
};

// End-to-end orchestration
pub mod pipeline;
pub use pipeline::{MassMetrics, MassPoint, MassResult, Pipeline, PipelineConfig};

// Bounding-box presets
pub mod cities;
pub use cities::City;

// Snapshot ingestion
pub mod io;
pub use io::{FixSource, JsonLocationsFile};

// Batch processing of snapshot files
pub mod batch;
pub use batch::{process_file, process_files, BatchRecord};
#[cfg(feature = "parallel")]
pub use batch::process_files_parallel;

// ============================================================================
// Core Types
// ============================================================================

/// A single position report from one tracker.
///
/// # Example
/// ```
/// use critmass::TrackerFix;
/// let fix = TrackerFix::new("a1b2", 53.5511, 9.9937).with_timestamp(1_700_000_000);
/// assert!(fix.is_valid());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerFix {
    /// Opaque tracker identifier
    pub id: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Unix timestamp in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl TrackerFix {
    /// Create a fix without a timestamp.
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
            timestamp: None,
        }
    }

    /// Attach a timestamp (seconds since epoch).
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Check if the fix has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Geographic bounding box in degrees. Edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    /// Smallest box enclosing all fixes. `None` for an empty slice.
    pub fn from_fixes(fixes: &[TrackerFix]) -> Option<Self> {
        if fixes.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for f in fixes {
            min_lat = min_lat.min(f.latitude);
            max_lat = max_lat.max(f.latitude);
            min_lng = min_lng.min(f.longitude);
            max_lng = max_lng.max(f.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Inclusive containment test.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_lat
            && latitude <= self.max_lat
            && longitude >= self.min_lng
            && longitude <= self.max_lng
    }

    /// A box with `min > max` on either axis contains nothing.
    pub fn is_empty(&self) -> bool {
        self.min_lat > self.max_lat || self.min_lng > self.max_lng
    }

    /// Center as (latitude, longitude).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}
