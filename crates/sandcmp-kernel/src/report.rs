//! Comparison reports: structured diff, coverage ratios, text rendering.

use crate::graph::RulePath;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

pub const REPORT_KIND: &str = "sandcmp.graph_comparison.v1";
pub const REPORT_SCHEMA: u64 = 1;

const MISSING_SIGN: char = '-';
const SPURIOUS_SIGN: char = '+';

/// `matched` out of `total`. A zero total is a defined, reportable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ratio {
    pub matched: usize,
    pub total: usize,
}

impl Ratio {
    pub fn new(matched: usize, total: usize) -> Self {
        Self { matched, total }
    }

    /// Percentage in `[0, 100]`, or `None` when there is nothing to measure.
    pub fn percent(self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(self.matched as f64 * 100.0 / self.total as f64)
    }

    pub fn is_complete(self) -> bool {
        self.matched == self.total
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percent() {
            Some(pct) => write!(f, "{}/{}: {pct:.2}%", self.matched, self.total),
            None => write!(f, "{}/{}", self.matched, self.total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct RatioPayload {
    matched: usize,
    total: usize,
    percent: Option<f64>,
}

impl From<Ratio> for RatioPayload {
    fn from(ratio: Ratio) -> Self {
        Self {
            matched: ratio.matched,
            total: ratio.total,
            percent: ratio.percent(),
        }
    }
}

/// Coverage figures for one comparison run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComparisonMetrics {
    /// Candidate paths (in shared operations) with a counterpart in the reference.
    pub candidate_paths: Ratio,
    /// Reference paths (in shared operations) with a counterpart in the candidate.
    pub reference_paths: Ratio,
    /// Candidate operations also present in the reference.
    pub candidate_operations: Ratio,
    /// Reference operations also present in the candidate.
    pub reference_operations: Ratio,
}

impl Serialize for ComparisonMetrics {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Payload {
            candidate_paths: RatioPayload,
            reference_paths: RatioPayload,
            candidate_operations: RatioPayload,
            reference_operations: RatioPayload,
        }
        Payload {
            candidate_paths: self.candidate_paths.into(),
            reference_paths: self.reference_paths.into(),
            candidate_operations: self.candidate_operations.into(),
            reference_operations: self.reference_operations.into(),
        }
        .serialize(serializer)
    }
}

/// An operation present in only one graph, with that graph's own paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationBlock {
    pub operation: String,
    pub paths: Vec<RulePath>,
}

/// Unmatched paths of an operation present in both graphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDiff {
    pub operation: String,
    /// Reference paths without a counterpart in the candidate.
    pub missing: Vec<RulePath>,
    /// Candidate paths without a counterpart in the reference.
    pub spurious: Vec<RulePath>,
}

impl OperationDiff {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.spurious.is_empty()
    }
}

/// Result of comparing a reference graph with a candidate graph.
///
/// All lists are sorted by operation name; path lists follow the canonical
/// path order. `operations` only holds shared operations that have at
/// least one unmatched path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub missing_operations: Vec<OperationBlock>,
    pub spurious_operations: Vec<OperationBlock>,
    pub operations: Vec<OperationDiff>,
    pub metrics: ComparisonMetrics,
}

enum Section<'a> {
    Missing(&'a OperationBlock),
    Shared(&'a OperationDiff),
}

impl Section<'_> {
    fn operation(&self) -> &str {
        match self {
            Self::Missing(block) => &block.operation,
            Self::Shared(diff) => &diff.operation,
        }
    }
}

impl ComparisonReport {
    /// True iff any operation or path is missing or spurious.
    pub fn has_discrepancy(&self) -> bool {
        !self.missing_operations.is_empty()
            || !self.spurious_operations.is_empty()
            || self.operations.iter().any(|diff| !diff.is_clean())
    }

    pub fn is_equivalent(&self) -> bool {
        !self.has_discrepancy()
    }

    pub fn result(&self) -> &'static str {
        if self.has_discrepancy() {
            "diverged"
        } else {
            "equivalent"
        }
    }

    /// Human-readable diff followed by the summary block.
    ///
    /// Reference-side sections (missing operations and shared operations
    /// with unmatched paths) come first, interleaved in operation order,
    /// followed by spurious operations.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        let mut sections: Vec<Section<'_>> = self
            .missing_operations
            .iter()
            .map(Section::Missing)
            .chain(self.operations.iter().map(Section::Shared))
            .collect();
        sections.sort_by(|a, b| a.operation().cmp(b.operation()));

        for section in sections {
            match section {
                Section::Missing(block) => render_operation_block(&mut out, MISSING_SIGN, block),
                Section::Shared(diff) => {
                    if diff.is_clean() {
                        continue;
                    }
                    let _ = writeln!(out, "{}:", diff.operation);
                    for path in &diff.missing {
                        render_path(&mut out, MISSING_SIGN, path);
                    }
                    for path in &diff.spurious {
                        render_path(&mut out, SPURIOUS_SIGN, path);
                    }
                }
            }
        }
        for block in &self.spurious_operations {
            render_operation_block(&mut out, SPURIOUS_SIGN, block);
        }

        if !out.is_empty() {
            out.push('\n');
        }
        self.render_summary(&mut out);
        out
    }

    fn render_summary(&self, out: &mut String) {
        let m = &self.metrics;
        let _ = writeln!(out, "candidate paths matched: {}", m.candidate_paths);
        let _ = writeln!(out, "reference paths matched: {}", m.reference_paths);
        let _ = writeln!(out, "candidate operations matched: {}", m.candidate_operations);
        let _ = writeln!(out, "reference operations matched: {}", m.reference_operations);
    }
}

fn render_operation_block(out: &mut String, sign: char, block: &OperationBlock) {
    let _ = writeln!(out, "{sign}{sign}{sign} {}:", block.operation);
    for path in &block.paths {
        render_path(out, sign, path);
    }
}

fn render_path(out: &mut String, sign: char, path: &RulePath) {
    let _ = writeln!(out, "{sign} {{");
    for node in path.nodes() {
        let _ = writeln!(out, "{sign}\t{node}");
    }
    let _ = writeln!(out, "{sign} }}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node;

    #[test]
    fn ratio_display_guards_zero_total() {
        assert_eq!(Ratio::new(0, 0).to_string(), "0/0");
        assert_eq!(Ratio::new(0, 0).percent(), None);
        assert_eq!(Ratio::new(1, 2).to_string(), "1/2: 50.00%");
        assert_eq!(Ratio::new(2, 3).to_string(), "2/3: 66.67%");
        assert_eq!(Ratio::new(4, 4).to_string(), "4/4: 100.00%");
    }

    #[test]
    fn clean_report_has_no_discrepancy() {
        let report = ComparisonReport {
            missing_operations: vec![],
            spurious_operations: vec![],
            operations: vec![OperationDiff {
                operation: "file-read*".to_string(),
                missing: vec![],
                spurious: vec![],
            }],
            metrics: ComparisonMetrics::default(),
        };
        assert!(report.is_equivalent());
        assert_eq!(report.result(), "equivalent");
    }

    #[test]
    fn spurious_operation_alone_is_a_discrepancy() {
        let report = ComparisonReport {
            missing_operations: vec![],
            spurious_operations: vec![OperationBlock {
                operation: "network-outbound".to_string(),
                paths: vec![RulePath::new([node!["remote-port", 80]])],
            }],
            operations: vec![],
            metrics: ComparisonMetrics::default(),
        };
        assert!(report.has_discrepancy());
        assert_eq!(report.result(), "diverged");
    }

    #[test]
    fn render_interleaves_reference_sections_by_name() {
        let report = ComparisonReport {
            missing_operations: vec![OperationBlock {
                operation: "b-op".to_string(),
                paths: vec![RulePath::new([node!["x"]])],
            }],
            spurious_operations: vec![OperationBlock {
                operation: "a-extra".to_string(),
                paths: vec![],
            }],
            operations: vec![
                OperationDiff {
                    operation: "a-op".to_string(),
                    missing: vec![RulePath::new([node!["m"]])],
                    spurious: vec![],
                },
                OperationDiff {
                    operation: "c-op".to_string(),
                    missing: vec![],
                    spurious: vec![RulePath::new([node!["s"]])],
                },
            ],
            metrics: ComparisonMetrics::default(),
        };
        let text = report.render_text();
        let a = text.find("a-op:").unwrap();
        let b = text.find("--- b-op:").unwrap();
        let c = text.find("c-op:").unwrap();
        let extra = text.find("+++ a-extra:").unwrap();
        assert!(a < b && b < c && c < extra);
        assert!(text.contains("+\t(\"s\",)\n"));
    }
}
