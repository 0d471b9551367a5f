//! Layer 4: Engine
//!
//! # Purpose
//!
//! This layer orchestrates a regression run:
//! - Input and parameter validation
//! - Per-query-node accumulation state and the settle pass
//! - The dual-tree traversal
//! - Pipeline execution and result assembly
//!
//! # Architecture
//!
//! ```text
//! Layer 5: API
//!   ↓
//! Layer 4: Engine ← You are here
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Input validation.
pub mod validator;

/// Query node accumulators.
pub mod accumulator;

/// Dual-tree traversal.
pub mod traversal;

/// Pipeline execution.
pub mod executor;

/// Result types.
pub mod output;
