//! End-to-end computation over one snapshot.
//!
//! Pre-filter → project → k-NN outlier filter → re-project the inliers →
//! proximity graph → ranked clusters → angle-biased diameter path through
//! the largest cluster.

use std::fs;
use std::path::Path;

use geo::LineString;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::cities::City;
use crate::clustering::{assign_from_components, ClusterAssignment};
use crate::error::{ensure_non_negative, MassError, Result};
use crate::filtering::{filter_bounds, filter_recent, KnnFilterConfig};
use crate::graph::{build_graph, AdjacencyGraph, GraphConfig};
use crate::io::FixSource;
use crate::projection::{pairwise_distances, project, DistanceMatrix, PlanarPoints};
use crate::routing::{AngleBiasedRouter, MassPath, RouterConfig};
use crate::{BoundingBox, TrackerFix};

/// All tunables of one computation.
///
/// Deserializes with defaults for missing keys, so a config file only needs
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Optional region applied before anything else.
    /// Default: None (keep everything)
    pub bounds: Option<BoundingBox>,
    /// Drop fixes older than this many seconds relative to the newest fix.
    /// Default: None
    pub max_fix_age_s: Option<i64>,
    pub filter: KnnFilterConfig,
    pub graph: GraphConfig,
    pub routing: RouterConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bounds: None,
            max_fix_age_s: None,
            filter: KnnFilterConfig::default(),
            graph: GraphConfig::default(),
            routing: RouterConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults restricted to a city preset.
    pub fn for_city(name: &str) -> Result<Self> {
        Ok(Self {
            bounds: Some(City::preset(name)?.bounds),
            ..Self::default()
        })
    }

    /// Load a (partial) JSON config file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| MassError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| MassError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject non-finite or negative tunables.
    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("filter.n_sigmas", self.filter.n_sigmas)?;
        ensure_non_negative("graph.l0_m", self.graph.l0_m)?;
        ensure_non_negative("graph.penalty_factor", self.graph.penalty_factor)?;
        self.routing.validate()?;
        if let Some(age) = self.max_fix_age_s {
            if age < 0 {
                return Err(MassError::InvalidConfig(format!(
                    "max_fix_age_s must be non-negative, got {age}"
                )));
            }
        }
        Ok(())
    }
}

/// An inlier fix with its planar position and cluster rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassPoint {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Planar x in meters
    pub x: f64,
    /// Planar y in meters
    pub y: f64,
    /// Rank of the point's cluster, 0 = largest
    pub cluster: i32,
}

/// One summary row per snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MassMetrics {
    pub n_input: usize,
    /// Fixes left after bounding-box and recency pre-filters
    pub n_bbox: usize,
    pub n_filtered: usize,
    pub n_outliers: usize,
    pub n_clusters: usize,
    pub largest_cluster_size: usize,
    pub k_med_m: f64,
    pub connection_radius_m: f64,
    pub path_nodes: usize,
    pub length_m: f64,
    pub angle_bias_m_per_rad: f64,
    pub l0_m: f64,
    pub penalty_factor: f64,
}

/// Everything one computation produces.
#[derive(Debug, Clone, Serialize)]
pub struct MassResult {
    /// Inliers, indexed like the graph nodes
    pub points: Vec<MassPoint>,
    /// Fixes rejected by the k-NN filter
    pub outliers: Vec<TrackerFix>,
    pub n_input: usize,
    pub n_bbox: usize,
    pub k_med_m: f64,
    pub knn_threshold_m: f64,
    pub connection_radius_m: f64,
    pub clusters: ClusterAssignment,
    /// Diameter path of the largest cluster, if it has at least two points
    pub path: Option<MassPath>,
    pub graph: AdjacencyGraph,
    pub distances: DistanceMatrix,
    pub config: PipelineConfig,
}

impl MassResult {
    /// True length of the path in meters (0 without a path).
    pub fn length_m(&self) -> f64 {
        self.path.as_ref().map_or(0.0, |p| p.length_m)
    }

    /// Path node indices into [`Self::points`] (empty without a path).
    pub fn path_nodes(&self) -> &[usize] {
        self.path
            .as_ref()
            .map(|p| p.nodes.as_slice())
            .unwrap_or_default()
    }

    pub fn largest_cluster_size(&self) -> usize {
        self.clusters.largest().map_or(0, <[usize]>::len)
    }

    /// Cluster sizes, largest first.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        self.clusters.ranked_sizes()
    }

    /// Path geometry as (longitude, latitude) coordinates.
    pub fn path_line(&self) -> LineString<f64> {
        self.path_nodes()
            .iter()
            .map(|&i| (self.points[i].longitude, self.points[i].latitude))
            .collect::<Vec<_>>()
            .into()
    }

    pub fn metrics(&self) -> MassMetrics {
        MassMetrics {
            n_input: self.n_input,
            n_bbox: self.n_bbox,
            n_filtered: self.points.len(),
            n_outliers: self.outliers.len(),
            n_clusters: self.clusters.len(),
            largest_cluster_size: self.largest_cluster_size(),
            k_med_m: self.k_med_m,
            connection_radius_m: self.connection_radius_m,
            path_nodes: self.path_nodes().len(),
            length_m: self.length_m(),
            angle_bias_m_per_rad: self.config.routing.angle_bias_m_per_rad,
            l0_m: self.config.graph.l0_m,
            penalty_factor: self.config.graph.penalty_factor,
        }
    }
}

/// Runs the full computation with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

fn coordinates(fixes: &[TrackerFix]) -> (Vec<f64>, Vec<f64>) {
    fixes.iter().map(|f| (f.latitude, f.longitude)).unzip()
}

fn project_fixes(fixes: &[TrackerFix]) -> Result<(PlanarPoints, DistanceMatrix)> {
    let (lats, lons) = coordinates(fixes);
    let planar = project(&lats, &lons, None)?;
    let distances = pairwise_distances(&planar)?;
    Ok((planar, distances))
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load a snapshot from `source` and run on it.
    pub fn run_source(&self, source: &dyn FixSource) -> Result<MassResult> {
        self.run(&source.load_fixes()?)
    }

    /// Compute clusters and the diameter path for one snapshot.
    ///
    /// Fails on an invalid configuration, or if fewer than `k + 1` fixes
    /// survive the pre-filters. A largest cluster of fewer than two points is
    /// not an error: the result simply has no path and zero length.
    pub fn run(&self, fixes: &[TrackerFix]) -> Result<MassResult> {
        self.config.validate()?;
        let n_input = fixes.len();

        let mut working: Vec<TrackerFix> = fixes.iter().filter(|f| f.is_valid()).cloned().collect();
        if working.len() < n_input {
            debug!(
                "[Pipeline] Dropped {} fixes with invalid coordinates",
                n_input - working.len()
            );
        }
        if let Some(bounds) = &self.config.bounds {
            working = filter_bounds(&working, bounds);
        }
        if let Some(max_age) = self.config.max_fix_age_s {
            working = filter_recent(&working, max_age);
        }
        let n_bbox = working.len();
        debug!("[Pipeline] {} of {} fixes after pre-filters", n_bbox, n_input);

        let (_, distances) = project_fixes(&working)?;
        let knn = self.config.filter.apply(&distances)?;

        let (kept, outliers): (Vec<_>, Vec<_>) = working
            .into_iter()
            .zip(&knn.keep)
            .partition(|(_, keep)| **keep);
        let kept: Vec<TrackerFix> = kept.into_iter().map(|(f, _)| f).collect();
        let outliers: Vec<TrackerFix> = outliers.into_iter().map(|(f, _)| f).collect();
        debug!(
            "[Pipeline] k-NN filter kept {} / {} (k_med={:.1}m, threshold={:.1}m)",
            kept.len(),
            n_bbox,
            knn.k_med,
            knn.threshold
        );

        // The point set changed, so the reference and matrix are rebuilt.
        let (planar, distances) = project_fixes(&kept)?;
        let graph = build_graph(&distances, knn.k_med, &self.config.graph);
        let clusters = assign_from_components(&graph.adjacency);
        debug!(
            "[Pipeline] {} clusters, radius {:.1}m, {} edges",
            clusters.len(),
            graph.radius,
            graph.adjacency.edge_count()
        );

        let path = match clusters.largest() {
            Some(main) if main.len() >= 2 => {
                let router = AngleBiasedRouter::new(&planar, self.config.routing)?;
                router.longest_path(&graph.adjacency, &distances, main)?
            }
            _ => None,
        };

        let points = kept
            .into_iter()
            .enumerate()
            .map(|(i, f)| MassPoint {
                id: f.id,
                latitude: f.latitude,
                longitude: f.longitude,
                timestamp: f.timestamp,
                x: planar.xs[i],
                y: planar.ys[i],
                cluster: clusters.cluster_id[i],
            })
            .collect();

        let result = MassResult {
            points,
            outliers,
            n_input,
            n_bbox,
            k_med_m: knn.k_med,
            knn_threshold_m: knn.threshold,
            connection_radius_m: graph.radius,
            clusters,
            path,
            graph: graph.adjacency,
            distances,
            config: self.config.clone(),
        };

        info!(
            "[Pipeline] {} fixes -> {} inliers, largest cluster {}, length {:.0}m",
            n_input,
            result.points.len(),
            result.largest_cluster_size(),
            result.length_m()
        );

        Ok(result)
    }
}
