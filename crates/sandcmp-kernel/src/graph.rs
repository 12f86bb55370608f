//! Canonical operation graphs.
//!
//! An [`OperationGraph`] maps operation names to the set of rule paths
//! recorded for that operation. Both the reference policy and the candidate
//! policy are reduced to this shape before comparison.
//!
//! ```text
//! raw JSON  { "file-read*": [ [ ["path", "/etc"], ["require-not", ...] ], ... ] }
//!     │  from_json (strict shape check, dedup)
//! OperationGraph  BTreeMap<operation, BTreeSet<RulePath>>
//! ```
//!
//! The path set is ordered only so that iteration and rendering are
//! deterministic; nodes inside a path keep their original order.

use crate::error::GraphShapeError;
use crate::node::{FilterNode, NodeShapeProblem, json_kind};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// An ordered chain of filter nodes: one rule of an operation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RulePath(Vec<FilterNode>);

impl RulePath {
    pub fn new(nodes: impl IntoIterator<Item = FilterNode>) -> Self {
        Self(nodes.into_iter().collect())
    }

    pub fn nodes(&self) -> &[FilterNode] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Array(self.0.iter().map(FilterNode::to_json).collect())
    }
}

impl FromIterator<FilterNode> for RulePath {
    fn from_iter<I: IntoIterator<Item = FilterNode>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl Serialize for RulePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for node in &self.0 {
            seq.serialize_element(node)?;
        }
        seq.end()
    }
}

/// SHA-256 over the canonical JSON text of a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct GraphFingerprint(pub String);

impl fmt::Display for GraphFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operation name → deduplicated set of rule paths.
///
/// An operation present with an empty set is distinct from an absent
/// operation: the former means "recorded, no rules", the latter "not
/// recorded at all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationGraph {
    operations: BTreeMap<String, BTreeSet<RulePath>>,
}

impl OperationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an operation without adding any path to it.
    pub fn insert_operation(&mut self, operation: impl Into<String>) {
        self.operations.entry(operation.into()).or_default();
    }

    /// Add a path to an operation. Returns `false` if the path was already
    /// recorded for that operation.
    pub fn insert_path(&mut self, operation: impl Into<String>, path: RulePath) -> bool {
        self.operations
            .entry(operation.into())
            .or_default()
            .insert(path)
    }

    pub fn contains_operation(&self, operation: &str) -> bool {
        self.operations.contains_key(operation)
    }

    pub fn paths(&self, operation: &str) -> Option<&BTreeSet<RulePath>> {
        self.operations.get(operation)
    }

    /// Operation names in ascending order.
    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<RulePath>)> {
        self.operations
            .iter()
            .map(|(name, paths)| (name.as_str(), paths))
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    pub fn path_count(&self) -> usize {
        self.operations.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Build a graph from raw rule lists, collapsing duplicate paths.
    pub fn from_rules<I, R>(rules: I) -> Self
    where
        I: IntoIterator<Item = (String, R)>,
        R: IntoIterator<Item = RulePath>,
    {
        let mut graph = Self::new();
        for (operation, paths) in rules {
            graph.insert_operation(operation.clone());
            for path in paths {
                graph.insert_path(operation.clone(), path);
            }
        }
        graph
    }

    /// Parse and normalize a raw graph document.
    ///
    /// Fails on the first element that does not fit the canonical shape;
    /// no partial graph is returned.
    pub fn from_json(document: &Value) -> Result<Self, GraphShapeError> {
        let Value::Object(map) = document else {
            return Err(GraphShapeError::RootNotObject {
                found: json_kind(document),
            });
        };

        let mut graph = Self::new();
        for (operation, rules) in map {
            let Value::Array(rules) = rules else {
                return Err(GraphShapeError::RulesNotList {
                    operation: operation.clone(),
                    found: json_kind(rules),
                });
            };
            let mut paths = BTreeSet::new();
            for (rule_idx, rule) in rules.iter().enumerate() {
                let path = parse_rule(operation, rule_idx, rule)?;
                if path.is_empty() {
                    log::debug!("operation `{operation}` rule #{rule_idx} has no filters");
                }
                paths.insert(path);
            }
            graph.operations.insert(operation.clone(), paths);
        }
        Ok(graph)
    }

    /// Canonical JSON: operations and paths sorted, duplicates removed.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (operation, paths) in &self.operations {
            map.insert(
                operation.clone(),
                Value::Array(paths.iter().map(RulePath::to_json).collect()),
            );
        }
        Value::Object(map)
    }

    /// Content fingerprint of the canonical form.
    ///
    /// Two graphs loaded from documents that differ only in path order or
    /// duplicated paths share a fingerprint.
    pub fn fingerprint(&self) -> GraphFingerprint {
        let canonical = self.to_json().to_string();
        let hash = Sha256::digest(canonical.as_bytes());
        GraphFingerprint(format!("{hash:x}"))
    }
}

fn parse_rule(operation: &str, rule_idx: usize, rule: &Value) -> Result<RulePath, GraphShapeError> {
    let Value::Array(nodes) = rule else {
        return Err(GraphShapeError::RuleNotList {
            operation: operation.to_string(),
            rule: rule_idx,
            found: json_kind(rule),
        });
    };
    nodes
        .iter()
        .enumerate()
        .map(|(node_idx, node)| {
            FilterNode::from_json(node).map_err(|problem| match problem {
                NodeShapeProblem::NotList(found) => GraphShapeError::NodeNotList {
                    operation: operation.to_string(),
                    rule: rule_idx,
                    node: node_idx,
                    found,
                },
                NodeShapeProblem::BadValue(found) => GraphShapeError::UnsupportedValue {
                    operation: operation.to_string(),
                    rule: rule_idx,
                    node: node_idx,
                    found,
                },
            })
        })
        .collect()
}
