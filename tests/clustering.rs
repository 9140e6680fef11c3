//! Tests for clustering module

use critmass::clustering::UNASSIGNED;
use critmass::{assign_from_components, build_graph, AdjacencyGraph, DistanceMatrix, GraphConfig};

/// Undirected graph from an edge list, unit costs.
fn graph_from_edges(n: usize, edges: &[(usize, usize)]) -> AdjacencyGraph {
    let mut lists = vec![Vec::new(); n];
    for &(a, b) in edges {
        lists[a].push((b, 1.0));
        lists[b].push((a, 1.0));
    }
    AdjacencyGraph::from_lists(lists).unwrap()
}

#[test]
fn test_fully_connected_triangle() {
    let graph = graph_from_edges(3, &[(0, 1), (1, 2), (0, 2)]);
    let clusters = assign_from_components(&graph);

    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters.sizes, vec![3]);
    assert_eq!(clusters.cluster_id, vec![0, 0, 0]);
}

#[test]
fn test_ranked_by_size() {
    // {0, 4} and {1, 2, 3, 5} and {6}
    let graph = graph_from_edges(7, &[(0, 4), (1, 2), (2, 3), (3, 5)]);
    let clusters = assign_from_components(&graph);

    assert_eq!(clusters.len(), 3);
    assert_eq!(clusters.ranked_sizes(), vec![4, 2, 1]);
    assert_eq!(clusters.cluster_id, vec![1, 0, 0, 0, 1, 0, 2]);

    let mut largest = clusters.largest().unwrap().to_vec();
    largest.sort_unstable();
    assert_eq!(largest, vec![1, 2, 3, 5]);
    assert_eq!(clusters.ranked(2).unwrap(), &[6]);
    assert!(clusters.ranked(3).is_none());
}

#[test]
fn test_equal_sizes_keep_discovery_order() {
    let graph = graph_from_edges(4, &[(0, 1), (2, 3)]);
    let clusters = assign_from_components(&graph);

    assert_eq!(clusters.order, vec![0, 1]);
    assert_eq!(clusters.cluster_id, vec![0, 0, 1, 1]);
}

#[test]
fn test_isolated_nodes_are_singletons() {
    let graph = graph_from_edges(3, &[]);
    let clusters = assign_from_components(&graph);

    assert_eq!(clusters.sizes, vec![1, 1, 1]);
    assert_eq!(clusters.cluster_id, vec![0, 1, 2]);
    assert!(clusters.cluster_id.iter().all(|&c| c != UNASSIGNED));
}

#[test]
fn test_empty_graph() {
    let clusters = assign_from_components(&AdjacencyGraph::default());
    assert!(clusters.is_empty());
    assert!(clusters.largest().is_none());
    assert!(clusters.cluster_id.is_empty());
}

#[test]
fn test_every_node_in_exactly_one_component() {
    let graph = graph_from_edges(8, &[(0, 7), (7, 3), (1, 6), (2, 4), (4, 5)]);
    let clusters = assign_from_components(&graph);

    let mut seen: Vec<usize> = clusters.components.iter().flatten().copied().collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..8).collect::<Vec<_>>());
    assert_eq!(clusters.sizes.iter().sum::<usize>(), 8);
}

#[test]
fn test_long_chain_does_not_overflow() {
    let n = 100_000;
    let edges: Vec<(usize, usize)> = (1..n).map(|i| (i - 1, i)).collect();
    let clusters = assign_from_components(&graph_from_edges(n, &edges));
    assert_eq!(clusters.sizes, vec![n]);
}

#[test]
fn test_components_from_proximity_graph() {
    // Two pairs 1 km apart
    let d = DistanceMatrix::from_rows(vec![
        vec![0.0, 20.0, 1000.0, 1020.0],
        vec![20.0, 0.0, 980.0, 1000.0],
        vec![1000.0, 980.0, 0.0, 20.0],
        vec![1020.0, 1000.0, 20.0, 0.0],
    ])
    .unwrap();
    let graph = build_graph(&d, 20.0, &GraphConfig::default());
    let clusters = assign_from_components(&graph.adjacency);

    assert_eq!(clusters.ranked_sizes(), vec![2, 2]);
    assert_eq!(clusters.cluster_id, vec![0, 0, 1, 1]);
}
