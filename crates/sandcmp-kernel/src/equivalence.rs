//! Node equivalence strategies.
//!
//! The comparator never compares nodes with `==` directly. It asks a
//! [`NodeEquivalence`] strategy, chosen once at startup:
//!
//! - **Literal**: nodes are equivalent iff they are structurally equal.
//! - **RegexAutomaton**: nodes encoding regular expressions are equivalent
//!   iff their automata accept the same language. Declared as an extension
//!   point; no automaton backend ships with this crate.

use crate::error::StrategyError;
use crate::node::FilterNode;

/// How two filter nodes are judged equivalent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum NodeEqualityMode {
    /// Structural value equality.
    Literal,

    /// Regular-expression values compared as automata.
    RegexAutomaton,
}

impl NodeEqualityMode {
    /// Build the strategy for this mode.
    pub fn strategy(self) -> Result<Box<dyn NodeEquivalence>, StrategyError> {
        match self {
            Self::Literal => Ok(Box::new(LiteralEquality)),
            Self::RegexAutomaton => Err(StrategyError::Unavailable(self)),
        }
    }
}

impl Default for NodeEqualityMode {
    fn default() -> Self {
        Self::Literal
    }
}

impl std::fmt::Display for NodeEqualityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal => write!(f, "literal"),
            Self::RegexAutomaton => write!(f, "regex-automaton"),
        }
    }
}

impl std::str::FromStr for NodeEqualityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "literal" | "string" => Ok(Self::Literal),
            "regex-automaton" | "regex_automaton" | "regex" | "automaton" => {
                Ok(Self::RegexAutomaton)
            }
            _ => Err(format!("unknown node equality mode: {s}")),
        }
    }
}

/// Predicate deciding whether two filter nodes denote the same condition.
pub trait NodeEquivalence {
    fn nodes_equivalent(&self, a: &FilterNode, b: &FilterNode) -> bool;
}

/// Structural equality of node tuples.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralEquality;

impl NodeEquivalence for LiteralEquality {
    fn nodes_equivalent(&self, a: &FilterNode, b: &FilterNode) -> bool {
        a == b
    }
}

impl<F> NodeEquivalence for F
where
    F: Fn(&FilterNode, &FilterNode) -> bool,
{
    fn nodes_equivalent(&self, a: &FilterNode, b: &FilterNode) -> bool {
        self(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node;

    #[test]
    fn literal_equality_is_structural() {
        let eq = LiteralEquality;
        assert!(eq.nodes_equivalent(&node!["path", "/tmp"], &node!["path", "/tmp"]));
        assert!(!eq.nodes_equivalent(&node!["path", "/tmp"], &node!["path", "/var"]));
        assert!(!eq.nodes_equivalent(&node!["path"], &node!["path", "/tmp"]));
    }

    #[test]
    fn mode_parse_and_display() {
        assert_eq!(
            "literal".parse::<NodeEqualityMode>().unwrap(),
            NodeEqualityMode::Literal
        );
        assert_eq!(
            "regex".parse::<NodeEqualityMode>().unwrap(),
            NodeEqualityMode::RegexAutomaton
        );
        assert_eq!(NodeEqualityMode::RegexAutomaton.to_string(), "regex-automaton");
        assert!("fuzzy".parse::<NodeEqualityMode>().is_err());
    }

    #[test]
    fn regex_automaton_strategy_is_unavailable() {
        let err = NodeEqualityMode::RegexAutomaton
            .strategy()
            .err()
            .expect("automaton strategy should be unavailable");
        assert_eq!(err, StrategyError::Unavailable(NodeEqualityMode::RegexAutomaton));
        let literal = NodeEqualityMode::Literal.strategy().unwrap();
        assert!(literal.nodes_equivalent(&node!["deny"], &node!["deny"]));
    }

    #[test]
    fn closures_act_as_strategies() {
        let first_value_only =
            |a: &FilterNode, b: &FilterNode| a.values().first() == b.values().first();
        assert!(first_value_only.nodes_equivalent(&node!["path", "/a"], &node!["path", "/b"]));
    }
}
