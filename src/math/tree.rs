//! Space-partitioning tree over a point set.
//!
//! ## Purpose
//!
//! This module builds the binary partition trees traversed by the dual-tree
//! algorithm: one over the reference points and one over the query points.
//! Each node caches the bounding box of its points, so distance bounds between
//! two subtrees cost `O(d)`.
//!
//! ## Design notes
//!
//! * **Static Construction**: The tree is built once per fit and then read.
//! * **Preorder Arena**: Nodes live in a flat `Vec` in preorder, addressed by
//!   `usize`. A node's left child is the next node; the subtree of a node is a
//!   contiguous index range, which lets the traversal split per-node state
//!   with `split_at_mut`.
//! * **Permuted Copy**: Points are copied into tree order; every node owns a
//!   contiguous range `[begin, end)` of that copy. `permutation` maps tree
//!   positions back to caller indices.
//! * **Median Split**: Each node splits its widest dimension at the median
//!   position using `select_nth_unstable_by`, ties broken by caller index.
//!
//! ## Invariants
//!
//! * A node's box contains every point of its range; a child box is contained
//!   in its parent box.
//! * Every leaf holds at most `leaf_size` points; internal nodes have exactly
//!   two non-empty children.
//! * `permutation` is a bijection on `0..len()`.
//! * Construction is a pure function of (points, dimensions, leaf size).
//!
//! ## Non-goals
//!
//! * This module does not support dynamic insertions or deletions.
//! * Tree types other than axis-aligned binary partitions are not provided.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use core::cmp::Ordering::Equal;
use num_traits::Float;

// Internal dependencies
use crate::math::bounds::BoundingBox;

// ============================================================================
// Tree Node
// ============================================================================

/// A node of the partition tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeNode<T> {
    /// Bounding box of the node's points.
    pub bounds: BoundingBox<T>,

    /// First tree position owned by the node.
    pub begin: usize,

    /// One past the last tree position owned by the node.
    pub end: usize,

    /// Arena indices of the (left, right) children, `None` for leaves.
    pub children: Option<(usize, usize)>,
}

impl<T> TreeNode<T> {
    /// Number of points in the node.
    #[inline]
    pub fn count(&self) -> usize {
        self.end - self.begin
    }

    /// Returns `true` if the node has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

// ============================================================================
// Space Tree
// ============================================================================

/// Binary space-partitioning tree stored as a preorder arena.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpaceTree<T> {
    dimensions: usize,

    /// Points in tree order, flattened.
    points: Vec<T>,

    /// Tree position -> caller index.
    permutation: Vec<usize>,

    nodes: Vec<TreeNode<T>>,
}

impl<T: Float> SpaceTree<T> {
    /// Build a tree over `points` (flattened, `dimensions` per point).
    ///
    /// `leaf_size` is clamped to at least 1.
    pub fn new(points: &[T], dimensions: usize, leaf_size: usize) -> Self {
        let n = if dimensions == 0 {
            0
        } else {
            points.len() / dimensions
        };
        let leaf_size = leaf_size.max(1);

        let mut order: Vec<usize> = (0..n).collect();
        let mut nodes = Vec::with_capacity(2 * n.div_ceil(leaf_size));

        if n > 0 {
            Self::build_recursive(points, dimensions, leaf_size, &mut order, 0, n, &mut nodes);
        }

        let mut permuted = Vec::with_capacity(n * dimensions);
        for &i in &order {
            permuted.extend_from_slice(&points[i * dimensions..(i + 1) * dimensions]);
        }

        Self {
            dimensions,
            points: permuted,
            permutation: order,
            nodes,
        }
    }

    fn build_recursive(
        points: &[T],
        dimensions: usize,
        leaf_size: usize,
        order: &mut [usize],
        begin: usize,
        end: usize,
        nodes: &mut Vec<TreeNode<T>>,
    ) -> usize {
        let bounds = BoundingBox::from_points(
            order[begin..end]
                .iter()
                .map(|&i| &points[i * dimensions..(i + 1) * dimensions]),
            dimensions,
        );

        let index = nodes.len();
        nodes.push(TreeNode {
            bounds,
            begin,
            end,
            children: None,
        });

        if end - begin <= leaf_size {
            return index;
        }

        let (dim, _) = nodes[index].bounds.widest_dimension();
        let mid = begin + (end - begin) / 2;

        order[begin..end].select_nth_unstable_by(mid - begin, |&a, &b| {
            points[a * dimensions + dim]
                .partial_cmp(&points[b * dimensions + dim])
                .unwrap_or(Equal)
                .then(a.cmp(&b))
        });

        let left = Self::build_recursive(points, dimensions, leaf_size, order, begin, mid, nodes);
        let right = Self::build_recursive(points, dimensions, leaf_size, order, mid, end, nodes);
        nodes[index].children = Some((left, right));

        index
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Index of the root node.
    #[inline]
    pub fn root(&self) -> usize {
        0
    }

    /// Node at arena index `i`.
    #[inline]
    pub fn node(&self, i: usize) -> &TreeNode<T> {
        &self.nodes[i]
    }

    /// All nodes in preorder.
    #[inline]
    pub fn nodes(&self) -> &[TreeNode<T>] {
        &self.nodes
    }

    /// Coordinates of the point at tree position `pos`.
    #[inline]
    pub fn point(&self, pos: usize) -> &[T] {
        &self.points[pos * self.dimensions..(pos + 1) * self.dimensions]
    }

    /// All points in tree order, flattened.
    #[inline]
    pub fn points(&self) -> &[T] {
        &self.points
    }

    /// Caller index of the point at tree position `pos`.
    #[inline]
    pub fn original_index(&self, pos: usize) -> usize {
        self.permutation[pos]
    }

    /// Tree position -> caller index map.
    #[inline]
    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    /// Reorder per-point values from caller order into tree order.
    pub fn permute<V: Copy>(&self, values: &[V]) -> Vec<V> {
        self.permutation.iter().map(|&i| values[i]).collect()
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.permutation.len()
    }

    /// Returns `true` if the tree holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.permutation.is_empty()
    }

    /// Number of dimensions.
    #[inline]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of leaves.
    pub fn num_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Length of the longest root-to-leaf path, counted in nodes.
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }

        let mut depths = vec![0usize; self.nodes.len()];
        depths[0] = 1;
        let mut deepest = 1;
        for (i, node) in self.nodes.iter().enumerate() {
            if let Some((left, right)) = node.children {
                depths[left] = depths[i] + 1;
                depths[right] = depths[i] + 1;
                deepest = deepest.max(depths[i] + 1);
            }
        }
        deepest
    }

    /// One past the last arena index of the subtree rooted at `i`.
    pub fn subtree_end(&self, i: usize) -> usize {
        let mut current = i;
        while let Some((_, right)) = self.nodes[current].children {
            current = right;
        }
        current + 1
    }
}
