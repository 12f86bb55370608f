//! Filter nodes: the atomic conditions of a rule chain.
//!
//! A node is a frozen tuple of primitive values. Upstream tooling encodes
//! nodes as JSON arrays such as `["path", "/etc/passwd"]` or
//! `["local-port", 80]`; nested arrays become nested tuples.
//!
//! Values carry a total order so that node sets, path sets and rendered
//! reports are deterministic. The order is by variant first
//! (`null < bool < int < uint < float < string < tuple`), then by value.

use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A finite float with total ordering and bitwise hashing.
///
/// JSON cannot carry NaN or infinities, so every `Float` is finite.
/// Negative zero is folded into positive zero on construction.
#[derive(Debug, Clone, Copy)]
pub struct Float(f64);

impl Float {
    pub fn new(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Some(Self(if value == 0.0 { 0.0 } else { value }))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for Float {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Float {}

impl PartialOrd for Float {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Float {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Float {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// One primitive value inside a filter node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Only used for integers above `i64::MAX`.
    UInt(u64),
    Float(Float),
    Str(String),
    Tuple(Vec<FilterValue>),
}

impl FilterValue {
    /// Convert a JSON value into a filter value.
    ///
    /// Integral floats are folded into `Int` (or `UInt` above `i64::MAX`),
    /// so `80` and `80.0` describe the same port. Objects are rejected; the error
    /// carries the JSON kind that was found.
    pub fn from_json(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(Self::UInt(u))
                } else {
                    let f = n.as_f64().ok_or("number")?;
                    Ok(Self::from_f64(f).ok_or("non-finite number")?)
                }
            }
            Value::String(s) => Ok(Self::Str(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Tuple),
            Value::Object(_) => Err("object"),
        }
    }

    fn from_f64(f: f64) -> Option<Self> {
        const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
        const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

        if f.fract() == 0.0 {
            if (-TWO_POW_63..TWO_POW_63).contains(&f) {
                return Some(Self::Int(f as i64));
            }
            if (TWO_POW_63..TWO_POW_64).contains(&f) {
                return Some(Self::UInt(f as u64));
            }
        }
        Float::new(f).map(Self::Float)
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::UInt(u) => Value::from(*u),
            Self::Float(f) => Value::from(f.get()),
            Self::Str(s) => Value::String(s.clone()),
            Self::Tuple(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float(x) => write!(f, "{:?}", x.get()),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Tuple(items) => write_tuple(f, items),
        }
    }
}

impl Serialize for FilterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::UInt(u) => serializer.serialize_u64(*u),
            Self::Float(x) => serializer.serialize_f64(x.get()),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

/// Tuples render the way they read in rule dumps: `("path", "/tmp")`,
/// with a trailing comma for one-element tuples.
fn write_tuple(f: &mut fmt::Formatter<'_>, items: &[FilterValue]) -> fmt::Result {
    write!(f, "(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    if items.len() == 1 {
        write!(f, ",")?;
    }
    write!(f, ")")
}

/// One atomic condition of a rule chain: an immutable tuple of values.
///
/// Equality is structural. Comparison code should not call `==` directly
/// but go through a [`crate::NodeEquivalence`] strategy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FilterNode(Vec<FilterValue>);

impl FilterNode {
    pub fn new(values: impl IntoIterator<Item = FilterValue>) -> Self {
        Self(values.into_iter().collect())
    }

    pub fn values(&self) -> &[FilterValue] {
        &self.0
    }

    /// Parse a node from its JSON array encoding.
    ///
    /// On failure returns the JSON kind of the offending element: the node
    /// itself when it is not an array, or the first bad value inside it.
    pub fn from_json(value: &Value) -> Result<Self, NodeShapeProblem> {
        let Value::Array(items) = value else {
            return Err(NodeShapeProblem::NotList(json_kind(value)));
        };
        items
            .iter()
            .map(FilterValue::from_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
            .map_err(NodeShapeProblem::BadValue)
    }

    pub fn to_json(&self) -> Value {
        Value::Array(self.0.iter().map(FilterValue::to_json).collect())
    }
}

/// Why a JSON element could not be read as a filter node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShapeProblem {
    NotList(&'static str),
    BadValue(&'static str),
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tuple(f, &self.0)
    }
}

impl Serialize for FilterNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for value in &self.0 {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

/// Short JSON kind name used in shape diagnostics.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Build a node from a comma-separated list of values.
///
/// ```
/// use sandcmp_kernel::{FilterValue, node};
/// let n = node!["path", "/etc/passwd"];
/// assert_eq!(n.values()[0], FilterValue::from("path"));
/// ```
#[macro_export]
macro_rules! node {
    ($($value:expr),* $(,)?) => {
        $crate::FilterNode::new(vec![$($crate::FilterValue::from($value)),*])
    };
}
