//! Per-query-node accumulation state.
//!
//! ## Purpose
//!
//! This module holds what the traversal knows about a query node between
//! visits: contributions postponed at the node instead of being pushed to
//! its points, bounds valid for all of its points, and a status.
//!
//! ## Design notes
//!
//! * **Postponement**: A pruned reference node's contribution is added once to
//!   the query node's pending moments, not once per query point. Pending
//!   moments flow to children only when the node is split, and to points in
//!   the final settle pass.
//! * **Query-centred frames**: Pending moments are held about the query
//!   node's box centre. Every hand-over (reference node to query node,
//!   parent to child, leaf to point) is a binomial moment shift, so each
//!   point finally receives its normal equations in monomials of `r − q`.
//! * **Deltas**: Bound changes made at a node since its last push-down are
//!   also kept pending, so children inherit them instead of recomputing.
//! * **Recombination**: After both children return, a node's bounds are
//!   rebuilt from theirs (min resolved, max error, min weight sum).
//!
//! ## Invariants
//!
//! * Whenever the traversal visits a node, its ancestors hold no deltas, so
//!   the node's bounds hold for every query point of its subtree.
//! * After `settle`, all pending moments have reached the points and every
//!   node's pending moments are empty.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::algorithms::moments::MomentSet;
use crate::algorithms::pruning::QueryBounds;
use crate::math::multi_index::MultiIndexSet;
use crate::math::tree::SpaceTree;
use crate::primitives::buffer::NormalEquations;

// ============================================================================
// Node Status
// ============================================================================

/// Processing status of a query node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeStatus {
    /// Not yet reached by the traversal.
    #[default]
    Unvisited,

    /// Reached, but not every reference has been accounted for.
    Partial,

    /// Every reference has been accounted for.
    Complete,
}

// ============================================================================
// Bounds Delta
// ============================================================================

/// Bound increments not yet inherited by a node's children.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsDelta<T> {
    /// Reference mass resolved.
    pub resolved: T,
    /// Error consumed.
    pub used_error: T,
    /// Guaranteed kernel-weight sum added.
    pub weight_sum_lower: T,
}

impl<T: Float> BoundsDelta<T> {
    /// No change.
    pub fn zero() -> Self {
        Self {
            resolved: T::zero(),
            used_error: T::zero(),
            weight_sum_lower: T::zero(),
        }
    }

    /// Returns `true` if the delta changes nothing.
    pub fn is_zero(&self) -> bool {
        self.resolved.is_zero() && self.used_error.is_zero() && self.weight_sum_lower.is_zero()
    }

    fn add(&mut self, other: &Self) {
        self.resolved = self.resolved + other.resolved;
        self.used_error = self.used_error + other.used_error;
        self.weight_sum_lower = self.weight_sum_lower + other.weight_sum_lower;
    }
}

// ============================================================================
// Pending Moments
// ============================================================================

/// Kernel-weighted moment sums postponed at a query node, about its centre.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMoments<T> {
    /// Monomial sums over the wide (degree `2p`) set.
    pub data: Vec<T>,
    /// Target sums over the basis.
    pub target: Vec<T>,
}

impl<T: Float> PendingMoments<T> {
    /// All-zero sums.
    pub fn new(wide_len: usize, basis_len: usize) -> Self {
        Self {
            data: vec![T::zero(); wide_len],
            target: vec![T::zero(); basis_len],
        }
    }

    /// Returns `true` if nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|v| v.is_zero()) && self.target.iter().all(|v| v.is_zero())
    }

    /// Reset to zero, keeping the allocation.
    pub fn clear(&mut self) {
        self.data.iter_mut().for_each(|v| *v = T::zero());
        self.target.iter_mut().for_each(|v| *v = T::zero());
    }

    /// Add `scale` times sums taken about another centre.
    ///
    /// `shift` is that centre minus this one.
    pub fn add_shifted(
        &mut self,
        wide: &MultiIndexSet,
        data: &[T],
        target: &[T],
        shift: &[T],
        scale: T,
    ) {
        wide.shift_moments_into(data, shift, scale, &mut self.data);
        wide.shift_moments_into(target, shift, scale, &mut self.target);
    }

    /// Add another set held about a centre offset by `shift`.
    pub fn merge_shifted(&mut self, wide: &MultiIndexSet, other: &Self, shift: &[T]) {
        self.add_shifted(wide, &other.data, &other.target, shift, T::one());
    }
}

// ============================================================================
// Query Accumulator
// ============================================================================

/// Accumulation state of one query node.
#[derive(Debug, Clone)]
pub struct QueryAccumulator<T> {
    /// Contributions postponed at this node.
    pub pending: PendingMoments<T>,

    /// Bound increments not yet pushed to the children.
    pub delta: BoundsDelta<T>,

    /// Bounds valid for every point of the node.
    pub bounds: QueryBounds<T>,

    /// Processing status.
    pub status: NodeStatus,
}

impl<T: Float> QueryAccumulator<T> {
    /// Fresh state for moment tables of the given widths.
    pub fn new(wide_len: usize, basis_len: usize) -> Self {
        Self {
            pending: PendingMoments::new(wide_len, basis_len),
            delta: BoundsDelta::zero(),
            bounds: QueryBounds::zero(),
            status: NodeStatus::Unvisited,
        }
    }

    /// Mark the node as reached.
    #[inline]
    pub fn touch(&mut self) {
        if self.status == NodeStatus::Unvisited {
            self.status = NodeStatus::Partial;
        }
    }

    fn apply(&mut self, delta: &BoundsDelta<T>) {
        self.bounds.resolved = self.bounds.resolved + delta.resolved;
        self.bounds.used_error = self.bounds.used_error + delta.used_error;
        self.bounds.weight_sum_lower = self.bounds.weight_sum_lower + delta.weight_sum_lower;
        self.delta.add(delta);
    }

    /// Record a pruned reference node approximated with constant `weight`.
    ///
    /// `shift` is the reference node's centre minus this node's centre.
    pub fn record_prune(
        &mut self,
        wide: &MultiIndexSet,
        weight: T,
        moments: MomentSet<'_, T>,
        shift: &[T],
        error: T,
        lower: T,
    ) {
        if !weight.is_zero() {
            self.pending
                .add_shifted(wide, moments.data, moments.target, shift, weight);
        }
        self.apply(&BoundsDelta {
            resolved: moments.total_weight(),
            used_error: error,
            weight_sum_lower: lower,
        });
    }

    /// Record a reference node evaluated exactly against every point.
    ///
    /// `min_weight_sum` is the smallest kernel-weight sum any point of the
    /// node received from it.
    pub fn record_exact(&mut self, mass: T, min_weight_sum: T) {
        self.apply(&BoundsDelta {
            resolved: mass,
            used_error: T::zero(),
            weight_sum_lower: min_weight_sum,
        });
    }

    /// Rebuild bounds from the two children after they return.
    pub fn recombine(&mut self, left: &Self, right: &Self) {
        self.bounds = left.bounds.combine(&right.bounds);
    }
}

/// Push node `index`'s pending moments and deltas into both children.
///
/// Does nothing to the moments of a leaf.
pub fn push_down<T: Float>(
    wide: &MultiIndexSet,
    tree: &SpaceTree<T>,
    index: usize,
    parent: &mut QueryAccumulator<T>,
    left: &mut QueryAccumulator<T>,
    right: &mut QueryAccumulator<T>,
) {
    let node = tree.node(index);
    if let Some((l, r)) = node.children {
        if !parent.pending.is_empty() {
            let mut shift = vec![T::zero(); tree.dimensions()];
            node.bounds.centre_offset(&tree.node(l).bounds, &mut shift);
            left.pending.merge_shifted(wide, &parent.pending, &shift);
            node.bounds.centre_offset(&tree.node(r).bounds, &mut shift);
            right.pending.merge_shifted(wide, &parent.pending, &shift);
            parent.pending.clear();
        }
    }
    if !parent.delta.is_zero() {
        let delta = parent.delta;
        left.apply(&delta);
        right.apply(&delta);
        parent.delta = BoundsDelta::zero();
    }
}

// ============================================================================
// Settle
// ============================================================================

/// Push all pending moments down to the query points.
///
/// `states` is indexed by query node, `points` by query tree position. Each
/// point receives its share as normal equations in monomials of `r − q`,
/// using `sum_table` from the basis to `wide`. Nodes whose resolved mass
/// reaches `total_weight` are marked complete. Returns the number of leaves
/// left incomplete.
pub fn settle<T: Float>(
    tree: &SpaceTree<T>,
    wide: &MultiIndexSet,
    sum_table: &[usize],
    states: &mut [QueryAccumulator<T>],
    points: &mut [NormalEquations<T>],
    total_weight: T,
) -> usize {
    let slack = total_weight * T::epsilon().sqrt();
    let mut incomplete = 0;
    let mut shift = vec![T::zero(); tree.dimensions()];
    let mut scratch: Option<PendingMoments<T>> = None;

    for index in 0..states.len() {
        let node = tree.node(index);

        match node.children {
            Some((left, right)) => {
                let (head, tail) = states.split_at_mut(index + 1);
                let (left_states, right_states) = tail.split_at_mut(right - index - 1);
                debug_assert_eq!(left, index + 1);
                push_down(
                    wide,
                    tree,
                    index,
                    &mut head[index],
                    &mut left_states[0],
                    &mut right_states[0],
                );
            }
            None => {
                let state = &mut states[index];
                if !state.pending.is_empty() {
                    let local = scratch.get_or_insert_with(|| {
                        PendingMoments::new(state.pending.data.len(), state.pending.target.len())
                    });
                    for pos in node.begin..node.end {
                        node.bounds.centre_offset_to_point(tree.point(pos), &mut shift);
                        local.clear();
                        local.merge_shifted(wide, &state.pending, &shift);
                        points[pos].add_moments(T::one(), &local.data, &local.target, sum_table);
                    }
                    state.pending.clear();
                }
                state.delta = BoundsDelta::zero();
            }
        }

        let state = &mut states[index];
        if total_weight - state.bounds.resolved <= slack {
            state.status = NodeStatus::Complete;
        } else if node.is_leaf() {
            incomplete += 1;
        }
    }

    incomplete
}
