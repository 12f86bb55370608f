//! # sandcmp Kernel
//!
//! Structural equivalence of sandbox-profile graphs.
//!
//! A sandbox profile, whether written as source or recovered from a
//! compiled binary, is reduced to an [`OperationGraph`]: each operation
//! name maps to the set of rule paths that govern it. This crate compares
//! two such graphs, a trusted **reference** and a **candidate** under
//! verification, and reports what is missing, what is spurious, and how
//! much of each side is covered.
//!
//! It does not interpret filter values. How two nodes are judged the same
//! is delegated to a [`NodeEquivalence`] strategy.
//!
//! ## Architecture
//!
//! ```text
//! FilterValue / FilterNode   ← frozen tuples of primitive values
//!     │
//! RulePath                   ← ordered chain of nodes (one rule)
//!     │
//! OperationGraph             ← operation → set of RulePath
//!     │
//! compare_graphs             ← operation alignment + path alignment
//!     │
//! ComparisonReport           ← diff blocks, four coverage ratios
//! ```

pub mod compare;
pub mod equivalence;
pub mod error;
pub mod graph;
pub mod node;
pub mod report;

pub use compare::{
    OperationComparison, PathTally, compare_graphs, compare_operation, paths_match,
    unmatched_paths,
};
pub use equivalence::{LiteralEquality, NodeEqualityMode, NodeEquivalence};
pub use error::{GraphShapeError, StrategyError};
pub use graph::{GraphFingerprint, OperationGraph, RulePath};
pub use node::{FilterNode, FilterValue, Float};
pub use report::{
    ComparisonMetrics, ComparisonReport, OperationBlock, OperationDiff, REPORT_KIND,
    REPORT_SCHEMA, Ratio,
};
