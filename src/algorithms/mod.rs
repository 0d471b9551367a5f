//! Layer 3: Algorithms
//!
//! # Purpose
//!
//! This layer provides the core pieces of local polynomial regression:
//! - Per-node kernel moments of the reference tree
//! - The pruning rule for query/reference node pairs
//! - The local weighted least-squares solve and its fallbacks
//! - The brute-force oracle
//!
//! # Architecture
//!
//! ```text
//! Layer 5: API
//!   ↓
//! Layer 4: Engine
//!   ↓
//! Layer 3: Algorithms ← You are here
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Kernel moment cache.
pub mod moments;

/// Pruning rule.
pub mod pruning;

/// Local solve.
pub mod solve;

/// Brute-force regression.
pub mod naive;
