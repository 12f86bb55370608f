//! Error types for sandcmp kernel operations.

use crate::equivalence::NodeEqualityMode;

/// A raw graph document does not have the canonical shape
/// `{ operation: [ [ [value, ...], ... ], ... ] }`.
///
/// Every variant locates the offending element so the loader can report
/// it alongside the file name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphShapeError {
    /// The document root is not an object.
    #[error("graph root must be an object mapping operation names to rule lists, found {found}")]
    RootNotObject { found: &'static str },

    /// An operation maps to something other than a list of rules.
    #[error("operation `{operation}`: rules must be a list, found {found}")]
    RulesNotList {
        operation: String,
        found: &'static str,
    },

    /// A rule is not a list of nodes.
    #[error("operation `{operation}` rule #{rule}: rule must be a list of nodes, found {found}")]
    RuleNotList {
        operation: String,
        rule: usize,
        found: &'static str,
    },

    /// A node is not a list of values.
    #[error(
        "operation `{operation}` rule #{rule} node #{node}: node must be a list of values, found {found}"
    )]
    NodeNotList {
        operation: String,
        rule: usize,
        node: usize,
        found: &'static str,
    },

    /// A node contains a value that cannot be frozen into a filter value.
    #[error("operation `{operation}` rule #{rule} node #{node}: unsupported value of kind {found}")]
    UnsupportedValue {
        operation: String,
        rule: usize,
        node: usize,
        found: &'static str,
    },
}

/// The configured node-equality strategy cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StrategyError {
    #[error("node equality strategy `{0}` is not available in this build")]
    Unavailable(NodeEqualityMode),
}
