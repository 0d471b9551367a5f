#![cfg(feature = "dev")]

use dualtree_lpr::internals::math::tree::SpaceTree;

fn grid_2d(n: usize) -> Vec<f64> {
    let mut points = Vec::with_capacity(2 * n * n);
    for i in 0..n {
        for j in 0..n {
            points.push(i as f64);
            points.push((j * j) as f64 * 0.1);
        }
    }
    points
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_tree_single_leaf() {
    let points = vec![0.0, 1.0, 2.0];
    let tree = SpaceTree::new(&points, 1, 8);
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.nodes().len(), 1);
    assert!(tree.node(tree.root()).is_leaf());
    assert_eq!(tree.depth(), 1);
    assert_eq!(tree.num_leaves(), 1);
}

#[test]
fn test_tree_empty() {
    let tree = SpaceTree::<f64>::new(&[], 2, 4);
    assert!(tree.is_empty());
    assert!(tree.nodes().is_empty());
    assert_eq!(tree.depth(), 0);
}

#[test]
fn test_tree_leaf_size_and_children() {
    let points = grid_2d(10);
    let tree = SpaceTree::new(&points, 2, 7);

    for node in tree.nodes() {
        match node.children {
            None => assert!(node.count() <= 7 && node.count() > 0),
            Some((left, right)) => {
                let l = tree.node(left);
                let r = tree.node(right);
                assert!(l.count() > 0 && r.count() > 0);
                assert_eq!(l.begin, node.begin);
                assert_eq!(l.end, r.begin);
                assert_eq!(r.end, node.end);
                assert!(node.bounds.contains_box(&l.bounds));
                assert!(node.bounds.contains_box(&r.bounds));
            }
        }
    }
}

#[test]
fn test_tree_preorder_layout() {
    let points = grid_2d(8);
    let tree = SpaceTree::new(&points, 2, 4);

    for (i, node) in tree.nodes().iter().enumerate() {
        if let Some((left, right)) = node.children {
            assert_eq!(left, i + 1);
            assert_eq!(right, tree.subtree_end(left));
        }
    }
    assert_eq!(tree.subtree_end(tree.root()), tree.nodes().len());
}

#[test]
fn test_tree_boxes_contain_points() {
    let points = grid_2d(9);
    let tree = SpaceTree::new(&points, 2, 5);
    for node in tree.nodes() {
        for pos in node.begin..node.end {
            assert!(node.bounds.contains_point(tree.point(pos)));
        }
    }
}

#[test]
fn test_tree_permutation_is_bijection() {
    let points = grid_2d(7);
    let tree = SpaceTree::new(&points, 2, 3);

    let mut seen = vec![false; tree.len()];
    for pos in 0..tree.len() {
        let i = tree.original_index(pos);
        assert!(!seen[i]);
        seen[i] = true;
        assert_eq!(tree.point(pos), &points[2 * i..2 * i + 2]);
    }
    assert!(seen.iter().all(|&s| s));

    let labels: Vec<usize> = (0..tree.len()).collect();
    assert_eq!(tree.permute(&labels), tree.permutation().to_vec());
}

#[test]
fn test_tree_duplicate_points() {
    let points = vec![1.0; 20];
    let tree = SpaceTree::new(&points, 1, 3);
    assert_eq!(tree.len(), 20);
    for node in tree.nodes() {
        if node.is_leaf() {
            assert!(node.count() <= 3);
        }
    }
}

#[test]
fn test_tree_construction_is_deterministic() {
    let points = grid_2d(12);
    let a = SpaceTree::new(&points, 2, 6);
    let b = SpaceTree::new(&points, 2, 6);
    assert_eq!(a.permutation(), b.permutation());
    assert_eq!(a.nodes(), b.nodes());
}

#[test]
fn test_tree_zero_leaf_size_clamped() {
    let points = vec![0.0, 1.0, 2.0, 3.0];
    let tree = SpaceTree::new(&points, 1, 0);
    assert_eq!(tree.num_leaves(), 4);
    assert!(tree.nodes().iter().filter(|n| n.is_leaf()).all(|n| n.count() == 1));
    assert_eq!(tree.dimensions(), 1);
}
