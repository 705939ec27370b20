//! The consistency engine: lag-aware wait, schema diff, per-table
//! reconciliation, verdict aggregation.
//!
//! The run is a linear state machine with no retries:
//! probe lag → optional one-shot wait → diff table sets → for each common
//! table, count and (below the threshold) compare full data → aggregate.
//! Connectivity and schema-introspection failures are fatal; anything that
//! goes wrong for a single table is captured into that table's result and
//! the engine moves on.

use crate::compare::{compare_row_sets, CompareResult};
use crate::error::VerifyError;
use crate::report::{ComparisonVerdict, TableResult};
use crate::schema::{common_tables, diff_tables};
use crate::store::Store;
use tracing::{debug, info, warn};

/// Engine configuration, constructed once at process start and threaded
/// through: never read from ambient state.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Row-count cutoff below which full row-level comparison runs.
    pub threshold: i64,
    /// Whether to honor the lag-driven grace wait before comparing.
    pub wait_for_lag: bool,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            threshold: 1000,
            wait_for_lag: true,
        }
    }
}

/// Compares a replica store against its primary and produces a verdict.
pub struct ReplicaVerifier<'a> {
    primary: &'a dyn Store,
    replica: &'a dyn Store,
    config: VerifyConfig,
}

impl<'a> ReplicaVerifier<'a> {
    pub fn new(primary: &'a dyn Store, replica: &'a dyn Store, config: VerifyConfig) -> Self {
        Self {
            primary,
            replica,
            config,
        }
    }

    /// Run one full verification pass.
    pub async fn verify(&self) -> Result<ComparisonVerdict, VerifyError> {
        let lag = self.replica.replication_lag().await;
        info!("Replication lag: {lag}");

        if self.config.wait_for_lag {
            let wait = lag.wait_duration();
            if !wait.is_zero() {
                // One shot, before any table is read. Drift still present
                // afterwards is reported as a real mismatch.
                info!(
                    "Waiting {}s for replication to catch up",
                    wait.as_secs()
                );
                tokio::time::sleep(wait).await;
            }
        }

        let primary_tables = self.primary.list_tables().await?;
        let replica_tables = self.replica.list_tables().await?;

        let table_diff = diff_tables(&primary_tables, &replica_tables);
        if !table_diff.is_empty() {
            warn!(
                "Table sets differ: {} only on primary, {} only on replica",
                table_diff.only_in_primary.len(),
                table_diff.only_in_replica.len()
            );
        }

        // Tables on both sides are still compared even when the sets differ.
        let mut tables = Vec::new();
        for table in common_tables(&primary_tables, &replica_tables) {
            debug!("Verifying table '{table}'");
            tables.push(self.verify_table(&table).await);
        }

        Ok(ComparisonVerdict {
            lag,
            table_diff,
            tables,
        })
    }

    /// Reconcile one table: counts first, full data only when the counts
    /// agree and the table is under the threshold.
    async fn verify_table(&self, table: &str) -> TableResult {
        let primary_count = self.primary.count_rows(table).await;
        let replica_count = self.replica.count_rows(table).await;

        let (primary_count, replica_count) = match (primary_count, replica_count) {
            (Ok(p), Ok(r)) => (p, r),
            (p, r) => {
                let primary_count = p.as_ref().ok().copied();
                let replica_count = r.as_ref().ok().copied();
                let error = p.err().or_else(|| r.err()).map(|e| e.to_string());
                // A failed count is treated as a mismatch for aggregation,
                // not overloaded onto a sentinel count value.
                return TableResult {
                    table: table.to_string(),
                    primary_count,
                    replica_count,
                    count_match: false,
                    data_match: None,
                    skipped_data_check: true,
                    error,
                };
            }
        };

        if primary_count != replica_count {
            warn!(
                "Row count mismatch for '{table}': primary {primary_count}, \
                 replica {replica_count}"
            );
            // Data comparison without matching counts is guaranteed
            // inconclusive, so it is skipped outright.
            return TableResult {
                table: table.to_string(),
                primary_count: Some(primary_count),
                replica_count: Some(replica_count),
                count_match: false,
                data_match: None,
                skipped_data_check: true,
                error: None,
            };
        }

        if primary_count >= self.config.threshold {
            debug!(
                "Table '{table}' has {primary_count} rows, at or over the \
                 threshold - counts-only comparison"
            );
            return TableResult {
                table: table.to_string(),
                primary_count: Some(primary_count),
                replica_count: Some(replica_count),
                count_match: true,
                data_match: None,
                skipped_data_check: true,
                error: None,
            };
        }

        match self.compare_table_data(table).await {
            Ok(result) => {
                let data_match = result.is_match();
                if let CompareResult::Mismatch {
                    index,
                    expected,
                    actual,
                } = &result
                {
                    warn!(
                        "Data mismatch in '{table}' at sorted row {index}: \
                         expected {expected}, found {actual}"
                    );
                }
                TableResult {
                    table: table.to_string(),
                    primary_count: Some(primary_count),
                    replica_count: Some(replica_count),
                    count_match: true,
                    data_match: Some(data_match),
                    skipped_data_check: false,
                    error: None,
                }
            }
            Err(e) => TableResult {
                table: table.to_string(),
                primary_count: Some(primary_count),
                replica_count: Some(replica_count),
                // Fetch failure counts as a mismatch for aggregation
                count_match: false,
                data_match: None,
                skipped_data_check: true,
                error: Some(e.to_string()),
            },
        }
    }

    async fn compare_table_data(&self, table: &str) -> Result<CompareResult, VerifyError> {
        let primary_rows = self.primary.fetch_rows(table).await?;
        let replica_rows = self.replica.fetch_rows(table).await?;
        Ok(compare_row_sets(primary_rows, replica_rows))
    }
}
