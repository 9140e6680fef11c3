//! Angle-biased routing through a proximity graph.
//!
//! The crowd "length" is the length of a smooth path between the two most
//! distant points of the largest cluster. Endpoints come from a geometric
//! double sweep; the path shape comes from a Dijkstra over expanded states
//! `(node, previous node)` whose transition cost is
//!
//! ```text
//! max(w, min_edge_cost_m) + step_penalty_m + angle_bias_m_per_rad * |turn|
//! ```
//!
//! The turn term needs the incoming heading, hence the expanded state. The
//! reported length is the plain sum of distances along the chosen path.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::f64::consts::PI;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_same_len, MassError, Result};
use crate::graph::AdjacencyGraph;
use crate::projection::{DistanceMatrix, PlanarPoints};

/// Minimum improvement for a relaxation to count.
const IMPROVEMENT_EPS: f64 = 1e-9;

/// Tunables for the angle-biased metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Cost in meters per radian of heading change.
    /// Default: 8.0
    pub angle_bias_m_per_rad: f64,
    /// Flat cost added to every hop, discourages fragmentation.
    /// Default: 5.0
    pub step_penalty_m: f64,
    /// Floor on a hop's edge cost so chains of tiny hops are not free.
    /// Default: 15.0
    pub min_edge_cost_m: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            angle_bias_m_per_rad: 8.0,
            step_penalty_m: 5.0,
            min_edge_cost_m: 15.0,
        }
    }
}

impl RouterConfig {
    /// Reject non-finite or negative tunables.
    ///
    /// Every transition must cost at least zero, otherwise the expanded
    /// search can keep improving around a cycle and never settle.
    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("routing.angle_bias_m_per_rad", self.angle_bias_m_per_rad)?;
        ensure_non_negative("routing.step_penalty_m", self.step_penalty_m)?;
        ensure_non_negative("routing.min_edge_cost_m", self.min_edge_cost_m)
    }
}

/// Search state: where we are and where we came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SearchState {
    pub node: usize,
    /// `None` only for the source state
    pub prev: Option<usize>,
}

impl SearchState {
    pub fn source(node: usize) -> Self {
        Self { node, prev: None }
    }
}

/// Result of an expanded-state search from one source.
#[derive(Debug, Clone)]
pub struct ExpandedSearch {
    pub source: usize,
    /// Best cost to reach each node over all arrival states (infinite if unreachable)
    pub best_dist_to: Vec<f64>,
    /// Previous node of the arrival state that achieved `best_dist_to`
    pub best_last_prev: Vec<Option<usize>>,
    /// Backpointers between states
    pub prev_state: HashMap<SearchState, SearchState>,
}

impl ExpandedSearch {
    /// Node sequence from the source to `target` through the best arrival state.
    ///
    /// Returns `None` if `target` was not reached.
    pub fn reconstruct_path(&self, target: usize) -> Option<Vec<usize>> {
        if !self.best_dist_to.get(target)?.is_finite() {
            return None;
        }
        let end = SearchState {
            node: target,
            prev: self.best_last_prev[target],
        };
        Some(self.reconstruct_from(end))
    }

    /// Follow backpointers from an arbitrary state back to the source.
    pub fn reconstruct_from(&self, end: SearchState) -> Vec<usize> {
        let mut nodes = vec![end.node];
        let mut cur = end;
        // Backpointers form a tree; the bound only protects against misuse.
        for _ in 0..=self.prev_state.len() {
            match self.prev_state.get(&cur) {
                Some(&p) => {
                    nodes.push(p.node);
                    cur = p;
                }
                None => break,
            }
        }
        nodes.reverse();
        nodes
    }
}

/// Result of a single-state Dijkstra.
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    pub source: usize,
    /// Cost from the source (infinite if unreachable)
    pub dist: Vec<f64>,
    /// Parent on the shortest-path tree
    pub prev: Vec<Option<usize>>,
}

impl ShortestPaths {
    /// Node sequence from the source to `target`, if reachable.
    pub fn path_to(&self, target: usize) -> Option<Vec<usize>> {
        if !self.dist.get(target)?.is_finite() {
            return None;
        }
        let mut nodes = vec![target];
        let mut cur = target;
        while let Some(p) = self.prev[cur] {
            nodes.push(p);
            cur = p;
            if nodes.len() > self.dist.len() {
                break;
            }
        }
        nodes.reverse();
        Some(nodes)
    }

    /// Reachable member of `candidates` with the largest cost.
    /// The first one wins on ties.
    pub fn farthest_in(&self, candidates: &[usize]) -> Option<usize> {
        farthest(&self.dist, candidates)
    }
}

fn farthest(dist: &[f64], candidates: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for &c in candidates {
        let d = dist[c];
        if !d.is_finite() {
            continue;
        }
        match best {
            Some((_, bd)) if d <= bd => {}
            _ => best = Some((c, d)),
        }
    }
    best.map(|(c, _)| c)
}

fn check_node(node: usize, len: usize) -> Result<()> {
    if node >= len {
        return Err(MassError::NodeOutOfRange { node, len });
    }
    Ok(())
}

/// Standard Dijkstra using the stored edge weights as-is.
///
/// Run on [`AdjacencyGraph::geometric`] to get pure geometric distances,
/// independent of any turn or step penalty.
pub fn shortest_paths(graph: &AdjacencyGraph, source: usize) -> Result<ShortestPaths> {
    let n = graph.len();
    check_node(source, n)?;

    let mut dist = vec![f64::INFINITY; n];
    let mut prev = vec![None; n];
    dist[source] = 0.0;

    let mut heap = BinaryHeap::new();
    heap.push(Reverse((OrderedFloat(0.0), source)));

    while let Some(Reverse((OrderedFloat(d), u))) = heap.pop() {
        if d > dist[u] {
            continue;
        }
        for &(v, w) in graph.neighbors(u) {
            let nd = d + w;
            if nd < dist[v] - IMPROVEMENT_EPS {
                dist[v] = nd;
                prev[v] = Some(u);
                heap.push(Reverse((OrderedFloat(nd), v)));
            }
        }
    }

    Ok(ShortestPaths { source, dist, prev })
}

/// Approximate the two most distant nodes of a component (double sweep).
///
/// Sweeps from the first member to its farthest node `a`, then from `a` to
/// its farthest node `b`. This is a heuristic: on unlucky topologies `(a, b)`
/// is shorter than the true diameter. Returns `None` for an empty component.
pub fn diameter_endpoints(
    graph: &AdjacencyGraph,
    component: &[usize],
) -> Result<Option<(usize, usize)>> {
    let Some(&s0) = component.first() else {
        return Ok(None);
    };
    for &c in component {
        check_node(c, graph.len())?;
    }

    let Some(a) = shortest_paths(graph, s0)?.farthest_in(component) else {
        return Ok(None);
    };
    let b = shortest_paths(graph, a)?.farthest_in(component);
    Ok(b.map(|b| (a, b)))
}

/// Unpenalized length of a node path: sum of consecutive distances.
pub fn path_true_length(distances: &DistanceMatrix, path: &[usize]) -> f64 {
    path.windows(2).map(|w| distances.get(w[0], w[1])).sum()
}

/// A path through the largest cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassPath {
    /// Node indices, consecutive nodes are graph neighbors
    pub nodes: Vec<usize>,
    pub start: usize,
    pub end: usize,
    /// Cost under the angle-biased metric (selection only)
    pub penalized_cost_m: f64,
    /// Sum of true distances along `nodes`
    pub length_m: f64,
}

impl MassPath {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Expanded-state router over planar coordinates.
#[derive(Debug, Clone)]
pub struct AngleBiasedRouter<'a> {
    xs: &'a [f64],
    ys: &'a [f64],
    config: RouterConfig,
}

impl<'a> AngleBiasedRouter<'a> {
    pub fn new(points: &'a PlanarPoints, config: RouterConfig) -> Result<Self> {
        Self::from_coords(&points.xs, &points.ys, config)
    }

    pub fn from_coords(xs: &'a [f64], ys: &'a [f64], config: RouterConfig) -> Result<Self> {
        ensure_same_len(xs.len(), ys.len())?;
        config.validate()?;
        Ok(Self { xs, ys, config })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    fn heading(&self, from: usize, to: usize) -> f64 {
        (self.ys[to] - self.ys[from]).atan2(self.xs[to] - self.xs[from])
    }

    /// Absolute heading change in radians for the move `prev -> u -> v`,
    /// in `[0, PI]`. Zero when there is no previous node.
    pub fn turn_angle(&self, prev: Option<usize>, u: usize, v: usize) -> f64 {
        let Some(p) = prev else {
            return 0.0;
        };
        let incoming = self.heading(p, u);
        let outgoing = self.heading(u, v);
        ((outgoing - incoming + PI).rem_euclid(2.0 * PI) - PI).abs()
    }

    /// Cost of moving from `state` to `v` over an edge of weight `weight`.
    pub fn transition_cost(&self, state: SearchState, v: usize, weight: f64) -> f64 {
        weight.max(self.config.min_edge_cost_m)
            + self.config.step_penalty_m
            + self.config.angle_bias_m_per_rad * self.turn_angle(state.prev, state.node, v)
    }

    /// Dijkstra over `(node, prev)` states from `source`.
    pub fn search(&self, graph: &AdjacencyGraph, source: usize) -> Result<ExpandedSearch> {
        let n = graph.len();
        ensure_same_len(n, self.xs.len())?;
        check_node(source, n)?;

        let mut dist: HashMap<SearchState, f64> = HashMap::new();
        let mut prev_state: HashMap<SearchState, SearchState> = HashMap::new();
        let mut best_dist_to = vec![f64::INFINITY; n];
        let mut best_last_prev = vec![None; n];

        let start = SearchState::source(source);
        dist.insert(start, 0.0);
        best_dist_to[source] = 0.0;

        let mut heap = BinaryHeap::new();
        heap.push(Reverse((OrderedFloat(0.0), start)));

        while let Some(Reverse((OrderedFloat(d), state))) = heap.pop() {
            if dist.get(&state).is_some_and(|&best| d > best) {
                continue;
            }
            for &(v, w) in graph.neighbors(state.node) {
                let nd = d + self.transition_cost(state, v, w);
                let next = SearchState {
                    node: v,
                    prev: Some(state.node),
                };
                let known = dist.get(&next).copied().unwrap_or(f64::INFINITY);
                if nd < known - IMPROVEMENT_EPS {
                    dist.insert(next, nd);
                    prev_state.insert(next, state);
                    heap.push(Reverse((OrderedFloat(nd), next)));
                    if nd < best_dist_to[v] - IMPROVEMENT_EPS {
                        best_dist_to[v] = nd;
                        best_last_prev[v] = Some(state.node);
                    }
                }
            }
        }

        Ok(ExpandedSearch {
            source,
            best_dist_to,
            best_last_prev,
            prev_state,
        })
    }

    /// Smooth "diameter" path through `component`.
    ///
    /// Endpoints come from [`diameter_endpoints`] on the geometric copy of
    /// `graph`; the path shape from [`Self::search`] on `graph` itself; the
    /// length from `distances`. Components with fewer than two nodes have no
    /// path and yield `None`.
    pub fn longest_path(
        &self,
        graph: &AdjacencyGraph,
        distances: &DistanceMatrix,
        component: &[usize],
    ) -> Result<Option<MassPath>> {
        if component.len() < 2 {
            return Ok(None);
        }

        let geometric = graph.geometric(distances)?;
        let Some((start, end)) = diameter_endpoints(&geometric, component)? else {
            return Ok(None);
        };

        let search = self.search(graph, start)?;
        let Some(nodes) = search.reconstruct_path(end) else {
            return Ok(None);
        };

        Ok(Some(MassPath {
            length_m: path_true_length(distances, &nodes),
            penalized_cost_m: search.best_dist_to[end],
            nodes,
            start,
            end,
        }))
    }
}
