//! Full-data comparison: deterministic row ordering plus structural equality.
//!
//! Physical row order on disk is arbitrary, so both sides are sorted by the
//! full column tuple before comparison. The sort key is positional (columns
//! in schema-declared order) with nulls ordering before any value, which
//! `ScalarValue`'s total order provides.

use crate::value::RowRecord;
use std::cmp::Ordering;

/// Outcome of comparing two materialized row sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompareResult {
    /// Sequences are structurally identical.
    Match,
    /// First divergence found between the sorted sequences.
    Mismatch {
        /// Position in the sorted sequences where the divergence occurred.
        index: usize,
        expected: String,
        actual: String,
    },
}

impl CompareResult {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }
}

/// Compare two rows by their column tuples in declared order.
fn cmp_rows(a: &RowRecord, b: &RowRecord) -> Ordering {
    for (left, right) in a.values().zip(b.values()) {
        match left.cmp(right) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Sort rows into the deterministic comparison order.
pub fn sort_rows(rows: &mut [RowRecord]) {
    rows.sort_by(cmp_rows);
}

/// Sort both sequences and compare them element-wise.
///
/// Row equality is structural: same column set, same values, types strict.
/// The result is invariant under any permutation of the inputs.
pub fn compare_row_sets(
    mut primary: Vec<RowRecord>,
    mut replica: Vec<RowRecord>,
) -> CompareResult {
    sort_rows(&mut primary);
    sort_rows(&mut replica);

    if primary.len() != replica.len() {
        return CompareResult::Mismatch {
            index: primary.len().min(replica.len()),
            expected: format!("{} rows", primary.len()),
            actual: format!("{} rows", replica.len()),
        };
    }

    for (index, (expected, actual)) in primary.iter().zip(replica.iter()).enumerate() {
        if expected != actual {
            let (exp, act) = describe_divergence(expected, actual);
            return CompareResult::Mismatch {
                index,
                expected: exp,
                actual: act,
            };
        }
    }

    CompareResult::Match
}

/// Render the first differing column of two unequal rows.
fn describe_divergence(expected: &RowRecord, actual: &RowRecord) -> (String, String) {
    for name in expected.column_names() {
        match (expected.get(name), actual.get(name)) {
            (Some(exp), Some(act)) if exp != act => {
                return (format!("{name}={exp}"), format!("{name}={act}"));
            }
            (Some(exp), None) => {
                return (format!("{name}={exp}"), format!("{name} missing"));
            }
            _ => {}
        }
    }
    // Columns present on the replica but not the primary
    for name in actual.column_names() {
        if expected.get(name).is_none() {
            if let Some(act) = actual.get(name) {
                return (format!("{name} missing"), format!("{name}={act}"));
            }
        }
    }
    (format!("{expected:?}"), format!("{actual:?}"))
}
