//! Dual-tree traversal.
//!
//! ## Purpose
//!
//! This module walks pairs of (query node, reference node) from the two
//! roots, and for each pair either approximates the reference node's whole
//! contribution from its moments, evaluates it exactly point by point, or
//! splits and recurses.
//!
//! ## Design notes
//!
//! * **Split borrows**: Query-node state lives in a preorder slice, so the
//!   subtree of a node is a contiguous run; per-point systems live in a slice
//!   ordered by query tree position, so a node's points are contiguous too.
//!   Splitting a node splits both slices with `split_at_mut`, and the two
//!   halves are handed to independent tasks without locks.
//! * **Task parallelism**: With the `parallel` feature, sibling query subtrees
//!   above a size threshold run under `rayon::join`. Each subtree is always
//!   processed by one task in a fixed order, so results do not depend on the
//!   number of threads.
//! * **Nearest first**: Reference children are visited in order of centre
//!   distance, so the near (heavy) contribution tightens the bounds before
//!   the far one is considered.
//! * **Functional stats**: Each call returns its `TraversalStats`; callers
//!   add them up.
//! * **Local coordinates**: Base cases evaluate the basis at `r − q`, and
//!   pruned moments are shifted from the reference node's centre to the
//!   query node's, so no system is ever formed in raw coordinates.
//!
//! ## Invariants
//!
//! * Every (query point, reference point) pair is accounted for exactly once,
//!   either exactly in a base case or through exactly one pruned node pair.
//! * The reference tree, moment cache and kernel are never mutated.

// External dependencies
use core::ops::Add;

// Internal dependencies
use crate::algorithms::moments::MomentCache;
use crate::algorithms::pruning::{PruneDecision, Pruner};
use crate::engine::accumulator::{push_down, QueryAccumulator};
use crate::math::distance::ScaledMetric;
use crate::math::kernel::Kernel;
use crate::math::linalg::FloatLinalg;
use crate::math::multi_index::MultiIndexSet;
use crate::math::tree::{SpaceTree, TreeNode};
use crate::primitives::buffer::NormalEquations;

/// Minimum query subtree size processed as a separate task.
pub const PARALLEL_THRESHOLD: usize = 256;

// ============================================================================
// Traversal Statistics
// ============================================================================

/// Work counters of a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraversalStats {
    /// Node pairs examined.
    pub visited_pairs: usize,

    /// Node pairs approximated from moments.
    pub prunes: usize,

    /// Node pairs evaluated exhaustively.
    pub base_cases: usize,

    /// Point-pair kernel evaluations in base cases.
    pub kernel_evaluations: usize,
}

impl TraversalStats {
    /// Combine the counters of two disjoint pieces of work.
    pub fn merge(self, other: Self) -> Self {
        Self {
            visited_pairs: self.visited_pairs + other.visited_pairs,
            prunes: self.prunes + other.prunes,
            base_cases: self.base_cases + other.base_cases,
            kernel_evaluations: self.kernel_evaluations + other.kernel_evaluations,
        }
    }
}

impl Add for TraversalStats {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.merge(other)
    }
}

// ============================================================================
// Dual-Tree Traversal
// ============================================================================

/// Read-only inputs of the traversal, all in tree order.
pub struct DualTreeTraversal<'a, T, K: ?Sized> {
    query_tree: &'a SpaceTree<T>,
    reference_tree: &'a SpaceTree<T>,
    moments: &'a MomentCache<T>,
    pruner: Pruner<'a, T, K>,
    kernel: &'a K,
    metric: &'a ScaledMetric<T>,
    basis: &'a MultiIndexSet,

    /// Degree-`2p` set the moments are indexed by.
    wide: &'a MultiIndexSet,
    targets: &'a [T],
    weights: &'a [T],
    parallel: bool,
}

impl<'a, T: FloatLinalg, K: Kernel<T> + ?Sized> DualTreeTraversal<'a, T, K> {
    /// Assemble a traversal.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        query_tree: &'a SpaceTree<T>,
        reference_tree: &'a SpaceTree<T>,
        moments: &'a MomentCache<T>,
        pruner: Pruner<'a, T, K>,
        kernel: &'a K,
        metric: &'a ScaledMetric<T>,
        basis: &'a MultiIndexSet,
        wide: &'a MultiIndexSet,
        targets: &'a [T],
        weights: &'a [T],
        parallel: bool,
    ) -> Self {
        debug_assert_eq!(moments.basis_len(), basis.len());
        debug_assert_eq!(moments.wide_len(), wide.len());
        Self {
            query_tree,
            reference_tree,
            moments,
            pruner,
            kernel,
            metric,
            basis,
            wide,
            targets,
            weights,
            parallel,
        }
    }

    /// Traverse from the two roots.
    ///
    /// `states` holds one accumulator per query node (preorder), `points` one
    /// system per query tree position.
    pub fn run(
        &self,
        states: &mut [QueryAccumulator<T>],
        points: &mut [NormalEquations<T>],
    ) -> TraversalStats {
        if self.query_tree.is_empty() || self.reference_tree.is_empty() {
            return TraversalStats::default();
        }

        let stats = self.visit(
            self.query_tree.root(),
            self.reference_tree.root(),
            states,
            points,
        );

        tracing::debug!(
            target: "lpr",
            visited_pairs = stats.visited_pairs,
            prunes = stats.prunes,
            base_cases = stats.base_cases,
            kernel_evaluations = stats.kernel_evaluations,
            "traversal_finished"
        );

        stats
    }

    /// Visit `(q, r)`. `states[0]` is `q`'s state and `points` covers `q`'s points.
    fn visit(
        &self,
        q: usize,
        r: usize,
        states: &mut [QueryAccumulator<T>],
        points: &mut [NormalEquations<T>],
    ) -> TraversalStats {
        let q_node = self.query_tree.node(q);
        let r_node = self.reference_tree.node(r);
        let moments = self.moments.get(r);
        let mut stats = TraversalStats {
            visited_pairs: 1,
            ..TraversalStats::default()
        };

        let Some((state, rest)) = states.split_first_mut() else {
            return stats;
        };
        state.touch();

        match self
            .pruner
            .decide(q_node, r_node, &state.bounds, moments.total_weight())
        {
            PruneDecision::Approximate {
                weight,
                error,
                lower,
            } => {
                let mut shift = vec![T::zero(); self.query_tree.dimensions()];
                r_node.bounds.centre_offset(&q_node.bounds, &mut shift);
                state.record_prune(self.wide, weight, moments, &shift, error, lower);
                stats.prunes += 1;
            }

            PruneDecision::BaseCase => {
                let min_weight_sum = self.base_case(q_node, r_node, points);
                state.record_exact(moments.total_weight(), min_weight_sum);
                stats.base_cases += 1;
                stats.kernel_evaluations += q_node.count() * r_node.count();
            }

            PruneDecision::Recurse => match q_node.children {
                None => {
                    stats = stats + self.descend_reference(q, r, states, points);
                }
                Some((left, right)) => {
                    let (left_states, right_states) = rest.split_at_mut(right - left);
                    push_down(
                        self.wide,
                        self.query_tree,
                        q,
                        state,
                        &mut left_states[0],
                        &mut right_states[0],
                    );

                    let left_count = self.query_tree.node(left).count();
                    let (left_points, right_points) = points.split_at_mut(left_count);

                    let (left_stats, right_stats) = join(
                        self.parallel && q_node.count() >= PARALLEL_THRESHOLD,
                        || self.descend_reference(left, r, left_states, left_points),
                        || self.descend_reference(right, r, right_states, right_points),
                    );

                    state.recombine(&left_states[0], &right_states[0]);
                    stats = stats + left_stats + right_stats;
                }
            },
        }

        stats
    }

    /// Visit `q` against the children of `r` nearest first, or `r` itself if it is a leaf.
    fn descend_reference(
        &self,
        q: usize,
        r: usize,
        states: &mut [QueryAccumulator<T>],
        points: &mut [NormalEquations<T>],
    ) -> TraversalStats {
        let Some((a, b)) = self.reference_tree.node(r).children else {
            return self.visit(q, r, states, points);
        };

        let q_bounds = &self.query_tree.node(q).bounds;
        let scales = self.metric.scales();
        let dist_a = q_bounds.centre_distance_sq(&self.reference_tree.node(a).bounds, scales);
        let dist_b = q_bounds.centre_distance_sq(&self.reference_tree.node(b).bounds, scales);
        let (near, far) = if dist_b < dist_a { (b, a) } else { (a, b) };

        let first = self.visit(q, near, states, points);
        first + self.visit(q, far, states, points)
    }

    /// Exhaustive evaluation of every point pair. Returns the smallest
    /// kernel-weight sum received by any query point.
    fn base_case(
        &self,
        q_node: &TreeNode<T>,
        r_node: &TreeNode<T>,
        points: &mut [NormalEquations<T>],
    ) -> T {
        debug_assert_eq!(points.len(), q_node.count());

        let mut min_weight_sum = T::infinity();
        let mut delta = vec![T::zero(); self.query_tree.dimensions()];
        let mut values = vec![T::zero(); self.basis.len()];

        for (offset, equations) in points.iter_mut().enumerate() {
            let query = self.query_tree.point(q_node.begin + offset);
            let mut weight_sum = T::zero();

            for pos in r_node.begin..r_node.end {
                let reference = self.reference_tree.point(pos);
                let distance = self.metric.distance(query, reference);
                let w = self.kernel.evaluate(distance) * self.weights[pos];
                if w > T::zero() {
                    for ((d, &r), &q) in delta.iter_mut().zip(reference).zip(query) {
                        *d = r - q;
                    }
                    self.basis.evaluate(&delta, &mut values);
                    equations.add_point(w, &values, self.targets[pos]);
                    weight_sum = weight_sum + w;
                }
            }

            min_weight_sum = min_weight_sum.min(weight_sum);
        }

        if min_weight_sum.is_finite() {
            min_weight_sum
        } else {
            T::zero()
        }
    }
}

// ============================================================================
// Task Helpers
// ============================================================================

#[cfg(feature = "parallel")]
fn join<A, B, RA, RB>(parallel: bool, a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    if parallel {
        rayon::join(a, b)
    } else {
        (a(), b())
    }
}

#[cfg(not(feature = "parallel"))]
fn join<A, B, RA, RB>(_parallel: bool, a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA,
    B: FnOnce() -> RB,
{
    (a(), b())
}
