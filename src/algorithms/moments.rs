//! Kernel moment cache over the reference tree.
//!
//! ## Purpose
//!
//! This module precomputes, for every reference node `R` with box centre
//! `c_R`, the weighted monomial sums needed to add `R`'s whole contribution
//! to a query's normal equations at once:
//!
//! * `data[γ] = Σ_{r ∈ R} ω_r (r − c_R)^γ` for `|γ| ≤ 2p`
//! * `target[α] = Σ_{r ∈ R} ω_r y_r (r − c_R)^α` for `|α| ≤ p`
//!
//! When the kernel weight is approximated by a constant `w` over a node pair,
//! the sets are moved to the query side's centre by a binomial shift; the
//! contribution to `XᵀWX[α][β]` is then `w · data[α + β]` and to `XᵀWy[α]`
//! is `w · target[α]`.
//!
//! ## Design notes
//!
//! * **Eager, bottom-up**: All sets are built in one reverse-preorder pass.
//!   Leaves sum over their points; an internal node shifts its two
//!   children's sets to its own centre and adds them. Children always come
//!   later in preorder.
//! * **Local centres**: Monomials never see raw coordinates, only offsets
//!   within one node, so data far from the origin keeps full precision.
//! * **Flat storage**: One `Vec` per table, one fixed-width row per node.
//!
//! ## Invariants
//!
//! * An internal node's sets equal the direct sums over its points about its
//!   own centre.
//! * `data[0]` is the node's total reference weight.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::math::multi_index::MultiIndexSet;
use crate::math::tree::SpaceTree;

// ============================================================================
// Moment Set View
// ============================================================================

/// Borrowed view of one reference node's moments.
#[derive(Debug, Clone, Copy)]
pub struct MomentSet<'a, T> {
    /// Weighted monomial sums over the wide (degree `2p`) set.
    pub data: &'a [T],
    /// Weighted target sums over the basis (degree `p`) set.
    pub target: &'a [T],
}

impl<'a, T: Float> MomentSet<'a, T> {
    /// Total reference weight of the node.
    #[inline]
    pub fn total_weight(&self) -> T {
        self.data[0]
    }

    /// Weighted sum of the monomial at position `i` of the wide set.
    #[inline]
    pub fn get(&self, i: usize) -> T {
        self.data[i]
    }
}

// ============================================================================
// Moment Cache
// ============================================================================

/// Moment sets for every node of a reference tree.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MomentCache<T> {
    data: Vec<T>,
    target: Vec<T>,
    wide_len: usize,
    basis_len: usize,
}

impl<T: Float> MomentCache<T> {
    /// Build the cache.
    ///
    /// `targets` and `weights` are in tree order. `wide` is the degree-`2p`
    /// multi-index set; the first `basis_len` of its positions form the basis.
    pub fn new(
        tree: &SpaceTree<T>,
        targets: &[T],
        weights: &[T],
        wide: &MultiIndexSet,
        basis_len: usize,
    ) -> Self {
        let wide_len = wide.len();
        let n_nodes = tree.nodes().len();
        let mut data = vec![T::zero(); n_nodes * wide_len];
        let mut target = vec![T::zero(); n_nodes * basis_len];
        let mut monomials = vec![T::zero(); wide_len];
        let mut offset = vec![T::zero(); tree.dimensions()];

        for index in (0..n_nodes).rev() {
            let node = tree.node(index);

            match node.children {
                Some(children) => {
                    // Children sit after the parent in preorder.
                    let (head, tail) = data.split_at_mut((index + 1) * wide_len);
                    let (target_head, target_tail) = target.split_at_mut((index + 1) * basis_len);
                    let row = &mut head[index * wide_len..];
                    let target_row = &mut target_head[index * basis_len..];

                    for child in [children.0, children.1] {
                        tree.node(child).bounds.centre_offset(&node.bounds, &mut offset);
                        let local = child - index - 1;
                        wide.shift_moments_into(
                            &tail[local * wide_len..(local + 1) * wide_len],
                            &offset,
                            T::one(),
                            row,
                        );
                        wide.shift_moments_into(
                            &target_tail[local * basis_len..(local + 1) * basis_len],
                            &offset,
                            T::one(),
                            target_row,
                        );
                    }
                }
                None => {
                    let row = &mut data[index * wide_len..(index + 1) * wide_len];
                    let target_row = &mut target[index * basis_len..(index + 1) * basis_len];
                    let centre = node.bounds.centre();

                    for pos in node.begin..node.end {
                        let omega = weights[pos];
                        let wy = omega * targets[pos];
                        for ((o, &x), &c) in offset.iter_mut().zip(tree.point(pos)).zip(&centre) {
                            *o = x - c;
                        }
                        wide.evaluate(&offset, &mut monomials);

                        for (entry, &m) in row.iter_mut().zip(monomials.iter()) {
                            *entry = *entry + omega * m;
                        }
                        for (entry, &m) in target_row.iter_mut().zip(monomials.iter()) {
                            *entry = *entry + wy * m;
                        }
                    }
                }
            }
        }

        tracing::trace!(
            target: "lpr",
            nodes = n_nodes,
            wide_len,
            basis_len,
            "moment_cache_built"
        );

        Self {
            data,
            target,
            wide_len,
            basis_len,
        }
    }

    /// Moments of node `node`.
    #[inline]
    pub fn get(&self, node: usize) -> MomentSet<'_, T> {
        MomentSet {
            data: &self.data[node * self.wide_len..(node + 1) * self.wide_len],
            target: &self.target[node * self.basis_len..(node + 1) * self.basis_len],
        }
    }

    /// Number of nodes covered.
    #[inline]
    pub fn len(&self) -> usize {
        if self.wide_len == 0 {
            0
        } else {
            self.data.len() / self.wide_len
        }
    }

    /// Returns `true` if the cache covers no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width of the data table (size of the wide multi-index set).
    #[inline]
    pub fn wide_len(&self) -> usize {
        self.wide_len
    }

    /// Width of the target table (size of the basis).
    #[inline]
    pub fn basis_len(&self) -> usize {
        self.basis_len
    }
}
