#![cfg(feature = "dev")]

use approx::assert_relative_eq;
use dualtree_lpr::internals::algorithms::moments::MomentSet;
use dualtree_lpr::internals::engine::accumulator::{
    push_down, settle, NodeStatus, PendingMoments, QueryAccumulator,
};
use dualtree_lpr::internals::math::multi_index::MultiIndexSet;
use dualtree_lpr::internals::math::tree::SpaceTree;
use dualtree_lpr::internals::primitives::buffer::NormalEquations;

fn constant_moments(weight: f64, target: f64) -> (Vec<f64>, Vec<f64>) {
    // Degree 0 in 1-D: wide set is {0}, basis is {0}
    (vec![weight], vec![weight * target])
}

/// Degree-1 moments in 1-D of one reference `r` about `centre`.
fn line_moments(r: f64, weight: f64, target: f64, centre: f64) -> PendingMoments<f64> {
    let u = r - centre;
    PendingMoments {
        data: vec![weight, weight * u, weight * u * u],
        target: vec![weight * target, weight * target * u],
    }
}

// ============================================================================
// Recording Tests
// ============================================================================

#[test]
fn test_record_prune_updates_pending_and_bounds() {
    let wide = MultiIndexSet::new(1, 0);
    let (data, target) = constant_moments(4.0, 2.5);
    let moments = MomentSet {
        data: &data,
        target: &target,
    };

    let mut state = QueryAccumulator::new(1, 1);
    assert_eq!(state.status, NodeStatus::Unvisited);
    state.touch();
    assert_eq!(state.status, NodeStatus::Partial);

    state.record_prune(&wide, 0.5, moments, &[3.0], 0.1, 1.6);
    assert_relative_eq!(state.pending.data[0], 2.0);
    assert_relative_eq!(state.pending.target[0], 5.0);
    assert_relative_eq!(state.bounds.resolved, 4.0);
    assert_relative_eq!(state.bounds.used_error, 0.1);
    assert_relative_eq!(state.bounds.weight_sum_lower, 1.6);
    assert_relative_eq!(state.delta.resolved, 4.0);
}

#[test]
fn test_record_prune_moves_moments_to_query_centre() {
    // One reference at 7 stored about its node centre 6; query node centre 2.
    let wide = MultiIndexSet::new(1, 2);
    let reference = line_moments(7.0, 1.0, 3.0, 6.0);
    let mut state = QueryAccumulator::new(3, 2);

    state.record_prune(
        &wide,
        2.0,
        MomentSet {
            data: &reference.data,
            target: &reference.target,
        },
        &[4.0],
        0.0,
        0.0,
    );

    let expected = line_moments(7.0, 2.0, 3.0, 2.0);
    for (x, y) in state.pending.data.iter().zip(&expected.data) {
        assert_relative_eq!(*x, *y, epsilon = 1e-12);
    }
    for (x, y) in state.pending.target.iter().zip(&expected.target) {
        assert_relative_eq!(*x, *y, epsilon = 1e-12);
    }
}

#[test]
fn test_zero_weight_prune_only_resolves_mass() {
    let wide = MultiIndexSet::new(1, 0);
    let (data, target) = constant_moments(3.0, 1.0);
    let mut state = QueryAccumulator::new(1, 1);
    state.record_prune(
        &wide,
        0.0,
        MomentSet {
            data: &data,
            target: &target,
        },
        &[0.0],
        0.0,
        0.0,
    );
    assert!(state.pending.is_empty());
    assert_relative_eq!(state.bounds.resolved, 3.0);
}

#[test]
fn test_push_down_moves_pending_and_deltas() {
    let points = [0.0, 1.0, 2.0, 3.0];
    let tree = SpaceTree::new(&points, 1, 2);
    let wide = MultiIndexSet::new(1, 2);
    let root = tree.root();
    let (l, r) = tree.node(root).children.unwrap();
    let centre = |i: usize| tree.node(i).bounds.centre()[0];

    let mut parent = QueryAccumulator::new(3, 2);
    parent.pending = line_moments(10.0, 2.0, 3.0, centre(root));
    parent.record_exact(5.0, 1.5);

    let mut left = QueryAccumulator::new(3, 2);
    let mut right = QueryAccumulator::new(3, 2);
    right.record_exact(1.0, 0.5);

    push_down(&wide, &tree, root, &mut parent, &mut left, &mut right);

    assert!(parent.pending.is_empty());
    assert!(parent.delta.is_zero());
    // Parent bounds are kept
    assert_relative_eq!(parent.bounds.resolved, 5.0);

    for (state, child) in [(&left, l), (&right, r)] {
        let expected = line_moments(10.0, 2.0, 3.0, centre(child));
        for (x, y) in state.pending.data.iter().zip(&expected.data) {
            assert_relative_eq!(*x, *y, epsilon = 1e-12);
        }
        assert_relative_eq!(state.pending.target[1], expected.target[1], epsilon = 1e-12);
    }
    assert_relative_eq!(left.bounds.resolved, 5.0);
    assert_relative_eq!(right.bounds.resolved, 6.0);
    assert_relative_eq!(right.bounds.weight_sum_lower, 2.0);
}

#[test]
fn test_recombine_takes_conservative_bounds() {
    let mut left = QueryAccumulator::<f64>::new(1, 1);
    left.record_exact(4.0, 3.0);
    let mut right = QueryAccumulator::<f64>::new(1, 1);
    right.record_exact(6.0, 1.0);

    let mut parent = QueryAccumulator::new(1, 1);
    parent.recombine(&left, &right);
    assert_relative_eq!(parent.bounds.resolved, 4.0);
    assert_relative_eq!(parent.bounds.weight_sum_lower, 1.0);
    assert!(parent.delta.is_zero());
}

// ============================================================================
// Settle Tests
// ============================================================================

#[test]
fn test_settle_reaches_every_point() {
    let points: Vec<f64> = (0..10).map(|i| i as f64).collect();
    let tree = SpaceTree::new(&points, 1, 2);
    let wide = MultiIndexSet::new(1, 2);
    let table = MultiIndexSet::new(1, 1).sum_table(&wide).unwrap();
    let mut states = vec![QueryAccumulator::new(3, 2); tree.nodes().len()];
    let mut systems = vec![NormalEquations::new(2); tree.len()];

    // A root-level contribution and one leaf-level contribution, both from
    // a reference at 20.
    let root_centre = tree.node(tree.root()).bounds.centre()[0];
    states[0].pending = line_moments(20.0, 1.0, 2.0, root_centre);
    states[0].record_exact(10.0, 1.0);
    let leaf = tree
        .nodes()
        .iter()
        .position(|n| n.is_leaf())
        .unwrap();
    let leaf_centre = tree.node(leaf).bounds.centre()[0];
    states[leaf].pending = line_moments(20.0, 0.5, 4.0, leaf_centre);

    let incomplete = settle(&tree, &wide, &table, &mut states, &mut systems, 10.0);
    assert_eq!(incomplete, 0);

    let leaf_node = tree.node(leaf);
    for (pos, system) in systems.iter().enumerate() {
        let offset = 20.0 - tree.point(pos)[0];
        let (w, wy) = if pos >= leaf_node.begin && pos < leaf_node.end {
            (1.5, 4.0)
        } else {
            (1.0, 2.0)
        };
        // Columns of the normal matrix are monomials of r − q.
        assert_relative_eq!(system.weight_sum(), w, epsilon = 1e-12);
        assert_relative_eq!(system.xtw_x[1], w * offset, epsilon = 1e-9);
        assert_relative_eq!(system.xtw_x[3], w * offset * offset, epsilon = 1e-9);
        assert_relative_eq!(system.xtw_y[0], wy, epsilon = 1e-12);
    }

    for state in &states {
        assert!(state.pending.is_empty());
        assert_eq!(state.status, NodeStatus::Complete);
    }
}

#[test]
fn test_settle_counts_incomplete_leaves() {
    let points: Vec<f64> = (0..4).map(|i| i as f64).collect();
    let tree = SpaceTree::new(&points, 1, 1);
    let wide = MultiIndexSet::new(1, 0);
    let mut states = vec![QueryAccumulator::new(1, 1); tree.nodes().len()];
    let mut systems = vec![NormalEquations::new(1); tree.len()];

    let incomplete = settle(&tree, &wide, &[0], &mut states, &mut systems, 5.0);
    assert_eq!(incomplete, tree.num_leaves());
}
