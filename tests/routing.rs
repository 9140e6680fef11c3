//! Tests for routing module

use std::f64::consts::PI;

use critmass::{
    build_graph, diameter_endpoints, pairwise_distances, path_true_length, shortest_paths,
    AdjacencyGraph, AngleBiasedRouter, DistanceMatrix, GraphConfig, MassError, PlanarPoints,
    RouterConfig, SearchState,
};

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

fn planar(coords: &[(f64, f64)]) -> PlanarPoints {
    PlanarPoints {
        xs: coords.iter().map(|c| c.0).collect(),
        ys: coords.iter().map(|c| c.1).collect(),
        reference: (0.0, 0.0),
    }
}

/// Chain graph 0 - 1 - ... - n-1 with geometric costs.
fn chain(points: &PlanarPoints) -> AdjacencyGraph {
    let n = points.len();
    let lists = (0..n)
        .map(|i| {
            let mut nbrs = Vec::new();
            if i > 0 {
                nbrs.push((i - 1, points.distance(i, i - 1)));
            }
            if i + 1 < n {
                nbrs.push((i + 1, points.distance(i, i + 1)));
            }
            nbrs
        })
        .collect();
    AdjacencyGraph::from_lists(lists).unwrap()
}

#[test]
fn test_path_true_length_collinear() {
    let points = planar(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
    let d = pairwise_distances(&points).unwrap();

    assert_eq!(path_true_length(&d, &[0, 1, 2]), 20.0);
    assert_eq!(path_true_length(&d, &[0, 2]), 20.0);
    assert_eq!(path_true_length(&d, &[1]), 0.0);
    assert_eq!(path_true_length(&d, &[]), 0.0);
}

#[test]
fn test_turn_angle() {
    let points = planar(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (20.0, 0.0)]);
    let router = AngleBiasedRouter::new(&points, RouterConfig::default()).unwrap();

    assert_eq!(router.turn_angle(None, 0, 1), 0.0);
    assert!(approx_eq(router.turn_angle(Some(0), 1, 3), 0.0, 1e-12));
    assert!(approx_eq(router.turn_angle(Some(0), 1, 2), PI / 2.0, 1e-12));
    assert!(approx_eq(router.turn_angle(Some(3), 1, 2), PI / 2.0, 1e-12));
    assert!(approx_eq(router.turn_angle(Some(0), 1, 0), PI, 1e-12));
}

#[test]
fn test_turn_angle_wraps_across_pi() {
    // Heading just above -PI, then just below PI: a small left turn
    let points = planar(&[(10.0, 0.1), (0.0, 0.0), (-10.0, 0.1)]);
    let router = AngleBiasedRouter::new(&points, RouterConfig::default()).unwrap();

    let turn = router.turn_angle(Some(0), 1, 2);
    assert!(turn < 0.05);
}

#[test]
fn test_transition_cost() {
    let points = planar(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
    let router = AngleBiasedRouter::new(&points, RouterConfig::default()).unwrap();

    // Short edge floored to 15, plus 5 per hop, no turn from the source
    assert_eq!(router.transition_cost(SearchState::source(0), 1, 10.0), 20.0);

    let state = SearchState {
        node: 1,
        prev: Some(0),
    };
    let cost = router.transition_cost(state, 2, 40.0);
    assert!(approx_eq(cost, 40.0 + 5.0 + 8.0 * PI / 2.0, 1e-9));
}

#[test]
fn test_search_accumulates_turn_cost() {
    let points = planar(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
    let router = AngleBiasedRouter::new(&points, RouterConfig::default()).unwrap();
    let search = router.search(&chain(&points), 0).unwrap();

    assert_eq!(search.best_dist_to[0], 0.0);
    assert_eq!(search.best_dist_to[1], 20.0);
    assert!(approx_eq(search.best_dist_to[2], 40.0 + 4.0 * PI, 1e-9));
    assert_eq!(search.best_last_prev[2], Some(1));
    assert_eq!(search.reconstruct_path(2), Some(vec![0, 1, 2]));
}

#[test]
fn test_search_prefers_direct_hop_over_step_penalty() {
    let points = planar(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
    let d = pairwise_distances(&points).unwrap();
    let graph = build_graph(&d, 20.0, &GraphConfig::default());
    let router = AngleBiasedRouter::new(&points, RouterConfig::default()).unwrap();

    // Direct: max(20, 15) + 5 = 25. Via node 1: 2 * (15 + 5) = 40
    let search = router.search(&graph.adjacency, 0).unwrap();
    assert_eq!(search.best_dist_to[2], 25.0);
    assert_eq!(search.reconstruct_path(2), Some(vec![0, 2]));
}

#[test]
fn test_angle_bias_avoids_zigzag() {
    // 0 -> 4 either straight through 1, 2, 3 or zig-zagging through 5, 6, 7
    let points = planar(&[
        (0.0, 0.0),
        (30.0, 0.0),
        (60.0, 0.0),
        (90.0, 0.0),
        (120.0, 0.0),
        (15.0, 12.0),
        (60.0, -12.0),
        (105.0, 12.0),
    ]);
    let link = |a: usize, b: usize| (b, points.distance(a, b));
    let graph = AdjacencyGraph::from_lists(vec![
        vec![link(0, 1), link(0, 5)],
        vec![link(1, 0), link(1, 2)],
        vec![link(2, 1), link(2, 3)],
        vec![link(3, 2), link(3, 4)],
        vec![link(4, 3), link(4, 7)],
        vec![link(5, 0), link(5, 6)],
        vec![link(6, 5), link(6, 7)],
        vec![link(7, 6), link(7, 4)],
    ])
    .unwrap();
    let router = AngleBiasedRouter::new(&points, RouterConfig::default()).unwrap();

    let search = router.search(&graph, 0).unwrap();
    assert_eq!(search.reconstruct_path(4), Some(vec![0, 1, 2, 3, 4]));
}

#[test]
fn test_unreachable_target() {
    let points = planar(&[(0.0, 0.0), (10.0, 0.0), (500.0, 0.0)]);
    let graph =
        AdjacencyGraph::from_lists(vec![vec![(1, 10.0)], vec![(0, 10.0)], vec![]]).unwrap();
    let router = AngleBiasedRouter::new(&points, RouterConfig::default()).unwrap();

    let search = router.search(&graph, 0).unwrap();
    assert!(search.best_dist_to[2].is_infinite());
    assert_eq!(search.best_last_prev[2], None);
    assert_eq!(search.reconstruct_path(2), None);
    assert_eq!(search.reconstruct_path(0), Some(vec![0]));
}

#[test]
fn test_search_rejects_bad_source() {
    let points = planar(&[(0.0, 0.0), (10.0, 0.0)]);
    let router = AngleBiasedRouter::new(&points, RouterConfig::default()).unwrap();
    let result = router.search(&chain(&points), 5);
    assert!(matches!(
        result,
        Err(MassError::NodeOutOfRange { node: 5, len: 2 })
    ));
}

#[test]
fn test_router_coordinate_mismatch() {
    let result = AngleBiasedRouter::from_coords(&[0.0, 1.0], &[0.0], RouterConfig::default());
    assert!(matches!(result, Err(MassError::LengthMismatch { .. })));
}

#[test]
fn test_router_rejects_negative_costs() {
    let points = planar(&[(0.0, 0.0), (10.0, 0.0)]);

    let negative_step = RouterConfig {
        step_penalty_m: -100.0,
        ..RouterConfig::default()
    };
    assert!(matches!(
        AngleBiasedRouter::new(&points, negative_step),
        Err(MassError::InvalidConfig(_))
    ));

    let negative_floor = RouterConfig {
        min_edge_cost_m: -1.0,
        ..RouterConfig::default()
    };
    assert!(AngleBiasedRouter::new(&points, negative_floor).is_err());

    let nan_bias = RouterConfig {
        angle_bias_m_per_rad: f64::NAN,
        ..RouterConfig::default()
    };
    assert!(nan_bias.validate().is_err());
    assert!(RouterConfig::default().validate().is_ok());
}

#[test]
fn test_zero_costs_still_terminate() {
    let points = planar(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
    let graph =
        AdjacencyGraph::from_lists(vec![vec![(1, 0.0)], vec![(0, 0.0), (2, 0.0)], vec![(1, 0.0)]])
            .unwrap();
    let free = RouterConfig {
        angle_bias_m_per_rad: 0.0,
        step_penalty_m: 0.0,
        min_edge_cost_m: 0.0,
    };
    let router = AngleBiasedRouter::new(&points, free).unwrap();

    let search = router.search(&graph, 0).unwrap();
    assert_eq!(search.best_dist_to, vec![0.0, 0.0, 0.0]);
    assert_eq!(search.reconstruct_path(2), Some(vec![0, 1, 2]));
}

#[test]
fn test_shortest_paths() {
    let points = planar(&[(0.0, 0.0), (10.0, 0.0), (30.0, 0.0), (60.0, 0.0)]);
    let paths = shortest_paths(&chain(&points), 1).unwrap();

    assert_eq!(paths.dist, vec![10.0, 0.0, 20.0, 50.0]);
    assert_eq!(paths.path_to(3), Some(vec![1, 2, 3]));
    assert_eq!(paths.farthest_in(&[0, 1, 2, 3]), Some(3));
    assert_eq!(paths.farthest_in(&[0, 1]), Some(0));
}

#[test]
fn test_farthest_skips_unreachable_and_keeps_first_on_ties() {
    let graph = AdjacencyGraph::from_lists(vec![
        vec![(1, 10.0), (2, 10.0)],
        vec![(0, 10.0)],
        vec![(0, 10.0)],
        vec![],
    ])
    .unwrap();
    let paths = shortest_paths(&graph, 0).unwrap();

    assert!(paths.dist[3].is_infinite());
    assert_eq!(paths.farthest_in(&[3, 2, 1]), Some(2));
    assert_eq!(paths.farthest_in(&[3]), None);
}

#[test]
fn test_double_sweep_on_line() {
    let points = planar(&[
        (0.0, 0.0),
        (10.0, 0.0),
        (20.0, 0.0),
        (30.0, 0.0),
        (40.0, 0.0),
        (50.0, 0.0),
    ]);
    let graph = chain(&points);

    let ends = diameter_endpoints(&graph, &[2, 0, 1, 3, 4, 5]).unwrap();
    assert_eq!(ends, Some((5, 0)));
    assert_eq!(diameter_endpoints(&graph, &[]).unwrap(), None);
}

#[test]
fn test_double_sweep_tie_break() {
    let points = planar(&[(0.0, 0.0), (-10.0, 0.0), (10.0, 0.0)]);
    let graph = AdjacencyGraph::from_lists(vec![
        vec![(1, 10.0), (2, 10.0)],
        vec![(0, 10.0)],
        vec![(0, 10.0)],
    ])
    .unwrap();
    assert_eq!(points.len(), 3);

    let ends = diameter_endpoints(&graph, &[0, 1, 2]).unwrap();
    assert_eq!(ends, Some((1, 2)));
}

#[test]
fn test_longest_path_collinear() {
    let points = planar(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
    let d = pairwise_distances(&points).unwrap();
    let graph = build_graph(&d, 20.0, &GraphConfig::default());
    let router = AngleBiasedRouter::new(&points, RouterConfig::default()).unwrap();

    let path = router
        .longest_path(&graph.adjacency, &d, &[0, 1, 2])
        .unwrap()
        .unwrap();
    assert_eq!((path.start, path.end), (2, 0));
    assert_eq!(path.nodes, vec![2, 0]);
    assert_eq!(path.length_m, 20.0);
    assert_eq!(path.penalized_cost_m, 25.0);
}

#[test]
fn test_longest_path_length_ignores_penalties() {
    let points = planar(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
    let d = pairwise_distances(&points).unwrap();
    let graph = chain(&points);

    let heavy = RouterConfig {
        angle_bias_m_per_rad: 500.0,
        step_penalty_m: 100.0,
        min_edge_cost_m: 50.0,
    };
    let router = AngleBiasedRouter::new(&points, heavy).unwrap();
    let path = router.longest_path(&graph, &d, &[0, 1, 2]).unwrap().unwrap();

    assert_eq!(path.len(), 3);
    assert!(approx_eq(path.length_m, 20.0, 1e-12));
    assert!(path.penalized_cost_m > 1000.0);
}

#[test]
fn test_longest_path_degenerate_components() {
    let points = planar(&[(0.0, 0.0), (10.0, 0.0)]);
    let d = pairwise_distances(&points).unwrap();
    let graph = chain(&points);
    let router = AngleBiasedRouter::new(&points, RouterConfig::default()).unwrap();

    assert_eq!(router.longest_path(&graph, &d, &[]).unwrap(), None);
    assert_eq!(router.longest_path(&graph, &d, &[1]).unwrap(), None);

    let pair = router.longest_path(&graph, &d, &[0, 1]).unwrap().unwrap();
    assert_eq!(pair.length_m, 10.0);
}

#[test]
fn test_longest_path_matrix_mismatch() {
    let points = planar(&[(0.0, 0.0), (10.0, 0.0)]);
    let graph = chain(&points);
    let router = AngleBiasedRouter::new(&points, RouterConfig::default()).unwrap();

    let result = router.longest_path(&graph, &DistanceMatrix::default(), &[0, 1]);
    assert!(result.is_err());
}
