//! Connected components ranked by size.

use serde::{Deserialize, Serialize};

use crate::graph::AdjacencyGraph;

/// Rank assigned to nodes that belong to no component.
pub const UNASSIGNED: i32 = -1;

/// Components of a graph and their size ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    /// Node indices per component, in traversal order (not a contract)
    pub components: Vec<Vec<usize>>,
    /// Size of each component, parallel to `components`
    pub sizes: Vec<usize>,
    /// Component indices sorted by size, largest first
    pub order: Vec<usize>,
    /// Rank of each node's component (0 = largest), or [`UNASSIGNED`]
    pub cluster_id: Vec<i32>,
}

impl ClusterAssignment {
    /// Nodes of the component with the given rank.
    pub fn ranked(&self, rank: usize) -> Option<&[usize]> {
        let idx = *self.order.get(rank)?;
        self.components.get(idx).map(Vec::as_slice)
    }

    /// Nodes of the largest component.
    pub fn largest(&self) -> Option<&[usize]> {
        self.ranked(0)
    }

    /// Component sizes in rank order.
    pub fn ranked_sizes(&self) -> Vec<usize> {
        self.order.iter().map(|&c| self.sizes[c]).collect()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Partition the graph into connected components and rank them.
///
/// Depth-first with an explicit stack, O(n + m). Edge costs are ignored.
/// Equal-size components keep their discovery order.
///
/// # Example
/// ```
/// use critmass::{assign_from_components, AdjacencyGraph};
///
/// let graph = AdjacencyGraph::from_lists(vec![
///     vec![(1, 1.0)],
///     vec![(0, 1.0), (2, 1.0)],
///     vec![(1, 1.0)],
/// ])
/// .unwrap();
/// let clusters = assign_from_components(&graph);
/// assert_eq!(clusters.sizes, vec![3]);
/// assert_eq!(clusters.cluster_id, vec![0, 0, 0]);
/// ```
pub fn assign_from_components(graph: &AdjacencyGraph) -> ClusterAssignment {
    let n = graph.len();
    let mut seen = vec![false; n];
    let mut components: Vec<Vec<usize>> = Vec::new();

    for start in 0..n {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut stack = vec![start];
        let mut nodes = vec![start];
        while let Some(u) = stack.pop() {
            for &(v, _) in graph.neighbors(u) {
                if !seen[v] {
                    seen[v] = true;
                    stack.push(v);
                    nodes.push(v);
                }
            }
        }
        components.push(nodes);
    }

    let sizes: Vec<usize> = components.iter().map(Vec::len).collect();
    let mut order: Vec<usize> = (0..components.len()).collect();
    // Stable, so ties stay in discovery order
    order.sort_by(|&a, &b| sizes[b].cmp(&sizes[a]));

    let mut cluster_id = vec![UNASSIGNED; n];
    for (rank, &comp) in order.iter().enumerate() {
        for &node in &components[comp] {
            cluster_id[node] = rank as i32;
        }
    }

    ClusterAssignment {
        components,
        sizes,
        order,
        cluster_id,
    }
}
