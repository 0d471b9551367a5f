//! Layer 2: Math
//!
//! # Purpose
//!
//! This layer provides the geometric and numerical building blocks of the
//! regression:
//! - Multi-index enumeration and monomial evaluation
//! - Kernel functions and their distance-range bounds
//! - Bandwidth-scaled distances and bounding boxes
//! - The space-partitioning tree
//! - Conditioned dense solves
//!
//! These are reusable mathematical building blocks with no traversal logic.
//!
//! # Architecture
//!
//! ```text
//! Layer 5: API
//!   ↓
//! Layer 4: Engine
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math ← You are here
//!   ↓
//! Layer 1: Primitives
//! ```

/// Graded-lexicographic multi-index sets.
pub mod multi_index;

/// Kernel (weight) functions.
pub mod kernel;

/// Bandwidth-scaled distances.
pub mod distance;

/// Axis-aligned bounding boxes.
pub mod bounds;

/// Space-partitioning tree.
pub mod tree;

/// Linear algebra backend.
pub mod linalg;
