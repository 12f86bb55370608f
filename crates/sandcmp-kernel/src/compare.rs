//! The graph comparison engine.
//!
//! Alignment happens at two levels:
//!
//! 1. **Operations**: reference-only names are missing, candidate-only
//!    names are spurious, shared names go to path alignment.
//! 2. **Paths** (per shared operation, in both directions): a source path
//!    is matched by the first target path of equal length whose nodes are
//!    pairwise equivalent position by position. Node order is never
//!    realigned.
//!
//! Path totals only cover shared operations; operations present on one side
//! are accounted for by the operation ratios.

use crate::equivalence::NodeEquivalence;
use crate::graph::{OperationGraph, RulePath};
use crate::report::{ComparisonMetrics, ComparisonReport, OperationBlock, OperationDiff, Ratio};
use std::collections::{BTreeMap, BTreeSet};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Paths examined and matched in one direction.
///
/// Per-operation tallies combine by summation, so the order in which
/// operations are processed never changes the totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathTally {
    pub examined: usize,
    pub matched: usize,
}

impl PathTally {
    pub fn unmatched(self) -> usize {
        self.examined - self.matched
    }

    pub fn ratio(self) -> Ratio {
        Ratio::new(self.matched, self.examined)
    }
}

impl Add for PathTally {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            examined: self.examined + rhs.examined,
            matched: self.matched + rhs.matched,
        }
    }
}

impl AddAssign for PathTally {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for PathTally {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Outcome of aligning one shared operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationComparison {
    pub diff: OperationDiff,
    /// Reference paths checked against the candidate.
    pub reference: PathTally,
    /// Candidate paths checked against the reference.
    pub candidate: PathTally,
}

/// True iff `p` and `q` have the same length and every node of `p` is
/// equivalent to the node of `q` at the same position.
pub fn paths_match(p: &RulePath, q: &RulePath, equivalence: &dyn NodeEquivalence) -> bool {
    p.len() == q.len()
        && p
            .nodes()
            .iter()
            .zip(q.nodes())
            .all(|(a, b)| equivalence.nodes_equivalent(a, b))
}

/// Target paths grouped by length so only same-length candidates are tried.
struct LengthBuckets<'a> {
    by_len: BTreeMap<usize, Vec<&'a RulePath>>,
}

impl<'a> LengthBuckets<'a> {
    fn new(paths: &'a BTreeSet<RulePath>) -> Self {
        let mut by_len: BTreeMap<usize, Vec<&'a RulePath>> = BTreeMap::new();
        for path in paths {
            by_len.entry(path.len()).or_default().push(path);
        }
        Self { by_len }
    }

    fn find_match(
        &self,
        path: &RulePath,
        equivalence: &dyn NodeEquivalence,
    ) -> Option<&'a RulePath> {
        self.by_len
            .get(&path.len())?
            .iter()
            .copied()
            .find(|candidate| paths_match(path, candidate, equivalence))
    }
}

/// Paths of `source` with no counterpart in `target`, in canonical order.
pub fn unmatched_paths(
    source: &BTreeSet<RulePath>,
    target: &BTreeSet<RulePath>,
    equivalence: &dyn NodeEquivalence,
) -> (Vec<RulePath>, PathTally) {
    let buckets = LengthBuckets::new(target);
    let mut unmatched = Vec::new();
    let mut tally = PathTally::default();

    for path in source {
        tally.examined += 1;
        if buckets.find_match(path, equivalence).is_some() {
            tally.matched += 1;
        } else {
            unmatched.push(path.clone());
        }
    }
    (unmatched, tally)
}

/// Align the paths of one operation present in both graphs.
pub fn compare_operation(
    operation: &str,
    reference: &BTreeSet<RulePath>,
    candidate: &BTreeSet<RulePath>,
    equivalence: &dyn NodeEquivalence,
) -> OperationComparison {
    let (missing, reference_tally) = unmatched_paths(reference, candidate, equivalence);
    let (spurious, candidate_tally) = unmatched_paths(candidate, reference, equivalence);

    log::debug!(
        "operation {operation}: reference {}/{} matched, candidate {}/{} matched",
        reference_tally.matched,
        reference_tally.examined,
        candidate_tally.matched,
        candidate_tally.examined,
    );

    OperationComparison {
        diff: OperationDiff {
            operation: operation.to_string(),
            missing,
            spurious,
        },
        reference: reference_tally,
        candidate: candidate_tally,
    }
}

/// Compare a candidate graph against a reference graph.
///
/// Neither graph is modified. The report content does not depend on any
/// iteration order: operations and paths are emitted sorted.
pub fn compare_graphs(
    reference: &OperationGraph,
    candidate: &OperationGraph,
    equivalence: &dyn NodeEquivalence,
) -> ComparisonReport {
    let mut missing_operations = Vec::new();
    let mut operations = Vec::new();
    let mut reference_tally = PathTally::default();
    let mut candidate_tally = PathTally::default();
    let mut shared = 0usize;

    for (name, reference_paths) in reference.iter() {
        let Some(candidate_paths) = candidate.paths(name) else {
            missing_operations.push(OperationBlock {
                operation: name.to_string(),
                paths: reference_paths.iter().cloned().collect(),
            });
            continue;
        };

        shared += 1;
        let comparison = compare_operation(name, reference_paths, candidate_paths, equivalence);
        reference_tally += comparison.reference;
        candidate_tally += comparison.candidate;
        if !comparison.diff.is_clean() {
            operations.push(comparison.diff);
        }
    }

    let spurious_operations: Vec<OperationBlock> = candidate
        .iter()
        .filter(|(name, _)| !reference.contains_operation(name))
        .map(|(name, paths)| OperationBlock {
            operation: name.to_string(),
            paths: paths.iter().cloned().collect(),
        })
        .collect();

    let metrics = ComparisonMetrics {
        candidate_paths: candidate_tally.ratio(),
        reference_paths: reference_tally.ratio(),
        candidate_operations: Ratio::new(shared, candidate.operation_count()),
        reference_operations: Ratio::new(shared, reference.operation_count()),
    };

    log::info!(
        "compared {} reference and {} candidate operations ({shared} shared, {} missing, {} spurious)",
        reference.operation_count(),
        candidate.operation_count(),
        missing_operations.len(),
        spurious_operations.len(),
    );

    ComparisonReport {
        missing_operations,
        spurious_operations,
        operations,
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equivalence::LiteralEquality;
    use crate::node;
    use crate::node::FilterNode;

    fn path(nodes: &[FilterNode]) -> RulePath {
        RulePath::new(nodes.iter().cloned())
    }

    fn graph(entries: &[(&str, Vec<RulePath>)]) -> OperationGraph {
        OperationGraph::from_rules(
            entries
                .iter()
                .map(|(name, paths)| (name.to_string(), paths.clone())),
        )
    }

    #[test]
    fn paths_of_different_length_never_match() {
        let short = path(&[node!["path", "/tmp"]]);
        let long = path(&[node!["path", "/tmp"], node!["require-any"]]);
        assert!(!paths_match(&short, &long, &LiteralEquality));
        assert!(!paths_match(&long, &short, &LiteralEquality));

        let always = |_: &FilterNode, _: &FilterNode| true;
        assert!(!paths_match(&short, &long, &always));
    }

    #[test]
    fn paths_match_position_by_position() {
        let ab = path(&[node!["a"], node!["b"]]);
        let ba = path(&[node!["b"], node!["a"]]);
        assert!(paths_match(&ab, &ab.clone(), &LiteralEquality));
        assert!(!paths_match(&ab, &ba, &LiteralEquality));
    }

    #[test]
    fn prefix_path_is_reported_in_both_directions() {
        let reference = graph(&[("file-read*", vec![path(&[node!["path", "/a"]])])]);
        let candidate = graph(&[(
            "file-read*",
            vec![path(&[node!["path", "/a"], node!["mode", "r"]])],
        )]);

        let report = compare_graphs(&reference, &candidate, &LiteralEquality);
        assert_eq!(report.operations.len(), 1);
        assert_eq!(report.operations[0].missing.len(), 1);
        assert_eq!(report.operations[0].spurious.len(), 1);
        assert_eq!(report.metrics.reference_paths, Ratio::new(0, 1));
        assert_eq!(report.metrics.candidate_paths, Ratio::new(0, 1));
        assert!(report.has_discrepancy());
    }

    #[test]
    fn comparing_a_graph_with_itself_is_clean() {
        let reference = graph(&[
            (
                "file-read*",
                vec![
                    path(&[node!["path", "/etc/passwd"]]),
                    path(&[node!["subpath", "/usr"], node!["require-not", "x"]]),
                ],
            ),
            ("mach-lookup", vec![path(&[node!["global-name", "com.apple.x"]])]),
            ("sysctl-read", vec![]),
        ]);
        let copy = reference.clone();

        let report = compare_graphs(&reference, &copy, &LiteralEquality);
        assert!(report.is_equivalent());
        assert!(report.operations.is_empty());
        assert_eq!(report.metrics.reference_paths, Ratio::new(3, 3));
        assert_eq!(report.metrics.candidate_paths, Ratio::new(3, 3));
        assert_eq!(report.metrics.reference_operations, Ratio::new(3, 3));
        assert_eq!(report.metrics.candidate_operations, Ratio::new(3, 3));
    }

    #[test]
    fn empty_graphs_give_zero_over_zero() {
        let report = compare_graphs(
            &OperationGraph::new(),
            &OperationGraph::new(),
            &LiteralEquality,
        );
        assert!(report.is_equivalent());
        assert_eq!(report.metrics.candidate_paths, Ratio::new(0, 0));
        assert_eq!(report.metrics.reference_operations.percent(), None);
        assert!(report.render_text().contains("reference operations matched: 0/0\n"));
    }

    #[test]
    fn empty_operation_differs_from_absent_operation() {
        let reference = graph(&[("sysctl-read", vec![])]);
        let candidate = OperationGraph::new();

        let report = compare_graphs(&reference, &candidate, &LiteralEquality);
        assert_eq!(
            report.missing_operations,
            vec![OperationBlock {
                operation: "sysctl-read".to_string(),
                paths: vec![],
            }]
        );
        assert!(report.spurious_operations.is_empty());
        assert!(report.has_discrepancy());
        assert_eq!(report.metrics.reference_operations, Ratio::new(0, 1));
        assert_eq!(report.metrics.reference_paths, Ratio::new(0, 0));
        assert_eq!(
            report.render_text(),
            "--- sysctl-read:\n\n\
             candidate paths matched: 0/0\n\
             reference paths matched: 0/0\n\
             candidate operations matched: 0/0\n\
             reference operations matched: 0/1: 0.00%\n"
        );
    }

    #[test]
    fn operation_classification_is_symmetric() {
        let reference = graph(&[
            ("only-ref", vec![path(&[node!["r"]])]),
            ("both", vec![path(&[node!["x"]])]),
        ]);
        let candidate = graph(&[
            ("both", vec![path(&[node!["x"]])]),
            ("only-cand", vec![path(&[node!["c"]]), path(&[node!["d"]])]),
        ]);

        let report = compare_graphs(&reference, &candidate, &LiteralEquality);
        let missing: Vec<_> = report
            .missing_operations
            .iter()
            .map(|b| b.operation.as_str())
            .collect();
        let spurious: Vec<_> = report
            .spurious_operations
            .iter()
            .map(|b| b.operation.as_str())
            .collect();
        assert_eq!(missing, vec!["only-ref"]);
        assert_eq!(spurious, vec!["only-cand"]);
        assert!(!missing.contains(&"neither") && !spurious.contains(&"neither"));

        // spurious operations carry their own paths
        assert_eq!(
            report.spurious_operations[0].paths,
            vec![path(&[node!["c"]]), path(&[node!["d"]])]
        );
        assert_eq!(report.metrics.reference_paths, Ratio::new(1, 1));
        assert_eq!(report.metrics.candidate_operations, Ratio::new(1, 2));
        assert_eq!(report.metrics.reference_operations, Ratio::new(1, 2));
    }

    #[test]
    fn injected_equivalence_drives_matching() {
        let reference = graph(&[("file-read*", vec![path(&[node!["regex", "^/a.*$"]])])]);
        let candidate = graph(&[("file-read*", vec![path(&[node!["regex", "^/a(.*)$"]])])]);

        let literal = compare_graphs(&reference, &candidate, &LiteralEquality);
        assert!(literal.has_discrepancy());

        let same_kind = |a: &FilterNode, b: &FilterNode| a.values().first() == b.values().first();
        let loose = compare_graphs(&reference, &candidate, &same_kind);
        assert!(loose.is_equivalent());
    }

    #[test]
    fn tallies_sum_independently_of_order() {
        let parts = [
            PathTally { examined: 3, matched: 1 },
            PathTally { examined: 2, matched: 2 },
        ];
        let forward: PathTally = parts.iter().copied().sum();
        let backward: PathTally = parts.iter().rev().copied().sum();
        assert_eq!(forward, backward);
        assert_eq!(forward.unmatched(), 2);
    }
}
