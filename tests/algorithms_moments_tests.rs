#![cfg(feature = "dev")]

use approx::assert_relative_eq;
use dualtree_lpr::internals::algorithms::moments::MomentCache;
use dualtree_lpr::internals::math::multi_index::MultiIndexSet;
use dualtree_lpr::internals::math::tree::SpaceTree;

fn scattered_2d(n: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut points = Vec::with_capacity(2 * n);
    let mut targets = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f64;
        let x = (t * 0.37).sin() * 2.0;
        let y = (t * 0.61).cos() * 1.5;
        points.push(x);
        points.push(y);
        targets.push(x - 0.5 * y + 1.0);
        weights.push(1.0 + (i % 3) as f64 * 0.5);
    }
    (points, targets, weights)
}

/// Direct sums of `ω (r − c)^γ` and `ω y (r − c)^α` over a node's points.
fn direct_moments(
    tree: &SpaceTree<f64>,
    node: usize,
    targets: &[f64],
    weights: &[f64],
    wide: &MultiIndexSet,
    basis_len: usize,
) -> (Vec<f64>, Vec<f64>) {
    let node = tree.node(node);
    let centre = node.bounds.centre();
    let mut data = vec![0.0; wide.len()];
    let mut target = vec![0.0; basis_len];
    let mut monomials = vec![0.0; wide.len()];
    for pos in node.begin..node.end {
        let offset: Vec<f64> = tree
            .point(pos)
            .iter()
            .zip(&centre)
            .map(|(x, c)| x - c)
            .collect();
        wide.evaluate(&offset, &mut monomials);
        for k in 0..wide.len() {
            data[k] += weights[pos] * monomials[k];
        }
        for k in 0..basis_len {
            target[k] += weights[pos] * targets[pos] * monomials[k];
        }
    }
    (data, target)
}

#[test]
fn test_every_node_matches_direct_sums_about_its_centre() {
    let (points, targets, weights) = scattered_2d(90);
    let tree = SpaceTree::new(&points, 2, 8);
    let targets = tree.permute(&targets);
    let weights = tree.permute(&weights);
    let wide = MultiIndexSet::new(2, 4);
    let basis_len = MultiIndexSet::num_terms(2, 2);
    let cache = MomentCache::new(&tree, &targets, &weights, &wide, basis_len);

    assert_eq!(cache.len(), tree.nodes().len());
    assert_eq!(cache.wide_len(), 15);
    assert_eq!(cache.basis_len(), 6);

    for i in 0..tree.nodes().len() {
        let (data, target) = direct_moments(&tree, i, &targets, &weights, &wide, basis_len);
        let m = cache.get(i);
        for k in 0..cache.wide_len() {
            assert_relative_eq!(m.get(k), data[k], epsilon = 1e-9, max_relative = 1e-9);
        }
        for k in 0..cache.basis_len() {
            assert_relative_eq!(m.target[k], target[k], epsilon = 1e-9, max_relative = 1e-9);
        }
    }
}

#[test]
fn test_internal_moments_are_sum_of_translated_children() {
    let (points, targets, weights) = scattered_2d(70);
    let tree = SpaceTree::new(&points, 2, 6);
    let wide = MultiIndexSet::new(2, 2);
    let cache = MomentCache::new(
        &tree,
        &tree.permute(&targets),
        &tree.permute(&weights),
        &wide,
        3,
    );

    for (i, node) in tree.nodes().iter().enumerate() {
        let Some((left, right)) = node.children else {
            continue;
        };
        let mut sum = vec![0.0; wide.len()];
        let mut shift = [0.0; 2];
        for child in [left, right] {
            tree.node(child).bounds.centre_offset(&node.bounds, &mut shift);
            wide.shift_moments_into(cache.get(child).data, &shift, 1.0, &mut sum);
        }
        for (k, s) in sum.iter().enumerate() {
            assert_relative_eq!(cache.get(i).get(k), *s, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_root_moments_about_root_centre() {
    let (points, targets, weights) = scattered_2d(40);
    let tree = SpaceTree::new(&points, 2, 5);
    let wide = MultiIndexSet::new(2, 2);
    let cache = MomentCache::new(
        &tree,
        &tree.permute(&targets),
        &tree.permute(&weights),
        &wide,
        3,
    );
    let root = cache.get(tree.root());
    let centre = tree.node(tree.root()).bounds.centre();

    let total: f64 = weights.iter().sum();
    assert_relative_eq!(root.total_weight(), total, epsilon = 1e-9);

    // data[(1,1)] = Σ ω (x − c_x)(y − c_y)
    let xy = wide.position(&[1, 1]).unwrap();
    let direct: f64 = points
        .chunks_exact(2)
        .zip(weights.iter())
        .map(|(p, w)| w * (p[0] - centre[0]) * (p[1] - centre[1]))
        .sum();
    assert_relative_eq!(root.get(xy), direct, epsilon = 1e-9);

    // target[(0,1)] = Σ ω y_r (r_2 − c_y)
    let ty: f64 = points
        .chunks_exact(2)
        .zip(targets.iter().zip(weights.iter()))
        .map(|(p, (t, w))| w * t * (p[1] - centre[1]))
        .sum();
    assert_relative_eq!(root.target[2], ty, epsilon = 1e-9);
}

#[test]
fn test_leaf_moments_cover_own_points() {
    let points = vec![1.0, 2.0, 3.0, 4.0];
    let targets = vec![1.0, 1.0, 1.0, 1.0];
    let weights = vec![1.0, 1.0, 1.0, 1.0];
    let tree = SpaceTree::new(&points, 1, 2);
    let wide = MultiIndexSet::new(1, 2);
    let cache = MomentCache::new(
        &tree,
        &tree.permute(&targets),
        &tree.permute(&weights),
        &wide,
        2,
    );

    for (i, node) in tree.nodes().iter().enumerate() {
        let m = cache.get(i);
        assert_relative_eq!(m.total_weight(), node.count() as f64);
        // Symmetric points about the box centre cancel the first moment.
        let c = node.bounds.centre()[0];
        let sum: f64 = (node.begin..node.end).map(|p| tree.point(p)[0] - c).sum();
        assert_relative_eq!(m.get(1), sum, epsilon = 1e-12);
    }
}

#[test]
fn test_far_offset_data_keeps_precision() {
    // Two clusters a long way from zero: local centres keep the second
    // moments small and exact.
    let points = vec![1.0e6, 1.0e6 + 1.0, 1.0e6 + 2.0, 1.0e6 + 3.0];
    let ones = vec![1.0; 4];
    let tree = SpaceTree::new(&points, 1, 2);
    let wide = MultiIndexSet::new(1, 2);
    let cache = MomentCache::new(&tree, &ones, &ones, &wide, 2);

    let root = cache.get(tree.root());
    // Σ (x − c)² with c = 1e6 + 1.5
    assert_relative_eq!(root.get(2), 5.0, epsilon = 1e-9);
    assert_relative_eq!(root.get(1), 0.0, epsilon = 1e-9);
}
