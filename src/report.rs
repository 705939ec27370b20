//! Verdict model: per-table results and the aggregated comparison verdict.

use crate::lag::LagReport;
use crate::schema::TableSetDiff;
use serde::Serialize;
use std::fmt::Write as _;

/// Result of reconciling one table present on both stores.
#[derive(Debug, Clone, Serialize)]
pub struct TableResult {
    pub table: String,
    /// `None` when the count query failed on that side.
    pub primary_count: Option<i64>,
    pub replica_count: Option<i64>,
    pub count_match: bool,
    /// Present only when a full-data comparison actually ran.
    pub data_match: Option<bool>,
    /// True when the full-data step was skipped (count mismatch, per-table
    /// error, or the table is at/over the threshold).
    pub skipped_data_check: bool,
    /// First error encountered for this table, if any.
    pub error: Option<String>,
}

impl TableResult {
    /// A table contributes "matched" iff its counts agree and either the
    /// data comparison passed or was legitimately skipped.
    pub fn is_match(&self) -> bool {
        self.count_match && (self.data_match == Some(true) || self.skipped_data_check)
    }
}

/// The final structured result of one comparison run.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonVerdict {
    /// Lag report consulted before comparison (informational).
    pub lag: LagReport,
    pub table_diff: TableSetDiff,
    /// Per-table results, sorted by table name.
    pub tables: Vec<TableResult>,
}

impl ComparisonVerdict {
    /// True iff the table sets are identical and every common table matched.
    /// This single boolean drives the CLI exit code.
    pub fn tables_match(&self) -> bool {
        self.table_diff.is_empty() && self.tables.iter().all(TableResult::is_match)
    }

    /// Human-readable summary in the shape operators expect.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Table Comparison ===");

        if !self.table_diff.is_empty() {
            let _ = writeln!(out, "Table mismatch between primary and replica:");
            if !self.table_diff.only_in_primary.is_empty() {
                let _ = writeln!(
                    out,
                    "  only in primary: {}",
                    join(&self.table_diff.only_in_primary)
                );
            }
            if !self.table_diff.only_in_replica.is_empty() {
                let _ = writeln!(
                    out,
                    "  only in replica: {}",
                    join(&self.table_diff.only_in_replica)
                );
            }
        }

        for result in &self.tables {
            let status = if result.is_match() { "ok" } else { "MISMATCH" };
            let counts = match (result.primary_count, result.replica_count) {
                (Some(p), Some(r)) if p == r => format!("{p} rows"),
                (p, r) => format!(
                    "primary {} / replica {}",
                    count_or_error(p),
                    count_or_error(r)
                ),
            };
            let data = match (result.data_match, result.skipped_data_check) {
                (Some(true), _) => ", data verified",
                (Some(false), _) => ", data differs",
                (None, true) => ", data check skipped",
                (None, false) => "",
            };
            let _ = writeln!(out, "  [{status}] {}: {counts}{data}", result.table);
            if let Some(error) = &result.error {
                let _ = writeln!(out, "           error: {error}");
            }
        }

        let _ = writeln!(out);
        if self.tables_match() {
            let _ = writeln!(out, "SUCCESS: replica is consistent with primary");
        } else {
            let _ = writeln!(out, "FAILED: replication drift detected");
        }
        out
    }
}

fn join(names: &std::collections::BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join(", ")
}

fn count_or_error(count: Option<i64>) -> String {
    match count {
        Some(n) => n.to_string(),
        None => "error".to_string(),
    }
}
