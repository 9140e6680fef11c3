//! Proximity graph construction.
//!
//! Nodes are points, edges connect every pair closer than a density-scaled
//! radius. Edge *cost* carries a linear penalty beyond `l0_m` so routing
//! avoids long jumps; the true geometric length stays in the distance matrix.

use serde::{Deserialize, Serialize};

use crate::error::{MassError, Result};
use crate::projection::DistanceMatrix;

/// Lower bound of the connection radius in meters.
pub const MIN_RADIUS_M: f64 = 30.0;

/// Upper bound of the connection radius in meters.
pub const MAX_RADIUS_M: f64 = 300.0;

/// Radius as a multiple of the median k-NN distance.
pub const RADIUS_KNN_FACTOR: f64 = 1.6;

/// Configuration for the long-edge penalty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Edge length in meters after which the penalty starts.
    /// Default: 50.0
    pub l0_m: f64,
    /// Extra cost per meter of length beyond `l0_m`.
    /// Default: 3.0 (0.0 disables the penalty)
    pub penalty_factor: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            l0_m: 50.0,
            penalty_factor: 3.0,
        }
    }
}

impl GraphConfig {
    /// Cost of an edge with geometric length `length`.
    #[inline]
    pub fn edge_cost(&self, length: f64) -> f64 {
        if length > self.l0_m {
            length + self.penalty_factor * (length - self.l0_m)
        } else {
            length
        }
    }
}

/// Adjacency list: for each node, `(neighbor, cost)` pairs.
///
/// Stored directed, but every graph built here lists both directions of an
/// edge, so connectivity is effectively undirected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyGraph {
    nodes: Vec<Vec<(usize, f64)>>,
}

impl AdjacencyGraph {
    /// Wrap explicit neighbor lists, validating every neighbor index.
    pub fn from_lists(nodes: Vec<Vec<(usize, f64)>>) -> Result<Self> {
        let len = nodes.len();
        for (node, neighbors) in nodes.iter().enumerate() {
            if let Some(&(neighbor, _)) = neighbors.iter().find(|(v, _)| *v >= len) {
                return Err(MassError::NeighborOutOfRange {
                    node,
                    neighbor,
                    len,
                });
            }
        }
        Ok(Self { nodes })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Outgoing `(neighbor, cost)` pairs of `node`.
    pub fn neighbors(&self, node: usize) -> &[(usize, f64)] {
        &self.nodes[node]
    }

    /// Total number of stored (directed) entries.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(Vec::len).sum()
    }

    /// Cost of the stored `from -> to` entry, if present.
    pub fn cost(&self, from: usize, to: usize) -> Option<f64> {
        self.nodes
            .get(from)?
            .iter()
            .find(|(v, _)| *v == to)
            .map(|&(_, c)| c)
    }

    /// Same connectivity, with every cost replaced by the geometric distance.
    pub fn geometric(&self, distances: &DistanceMatrix) -> Result<Self> {
        if distances.len() != self.len() {
            return Err(MassError::LengthMismatch {
                left: self.len(),
                right: distances.len(),
            });
        }
        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, nbrs)| nbrs.iter().map(|&(j, _)| (j, distances.get(i, j))).collect())
            .collect();
        Ok(Self { nodes })
    }
}

/// A built proximity graph and the radius used to connect it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityGraph {
    pub adjacency: AdjacencyGraph,
    /// Connection radius in meters
    pub radius: f64,
}

/// `clamp(1.6 * k_med, 30, 300)`.
pub fn connection_radius(k_med: f64) -> f64 {
    (RADIUS_KNN_FACTOR * k_med).clamp(MIN_RADIUS_M, MAX_RADIUS_M)
}

/// Connect every pair `i != j` with `D[i][j] <= r`.
///
/// # Example
/// ```
/// use critmass::{build_graph, DistanceMatrix, GraphConfig};
///
/// let d = DistanceMatrix::from_rows(vec![
///     vec![0.0, 10.0, 110.0],
///     vec![10.0, 0.0, 100.0],
///     vec![110.0, 100.0, 0.0],
/// ])
/// .unwrap();
/// let graph = build_graph(&d, 70.0, &GraphConfig { l0_m: 50.0, penalty_factor: 3.0 });
/// assert_eq!(graph.adjacency.cost(1, 2), Some(250.0));
/// ```
pub fn build_graph(distances: &DistanceMatrix, k_med: f64, config: &GraphConfig) -> ProximityGraph {
    let radius = connection_radius(k_med);
    let n = distances.len();

    let nodes = (0..n)
        .map(|i| {
            distances
                .row(i)
                .iter()
                .enumerate()
                .filter(|&(j, &d)| j != i && d <= radius)
                .map(|(j, &d)| (j, config.edge_cost(d)))
                .collect()
        })
        .collect();

    ProximityGraph {
        adjacency: AdjacencyGraph { nodes },
        radius,
    }
}
