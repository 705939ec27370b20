//! The store seam: everything the verifier needs from a database.
//!
//! The consistency engine never talks SQL itself; it consumes an
//! already-opened store through this trait. That keeps the engine testable
//! against an in-memory implementation and keeps connection plumbing out of
//! the comparison logic.

use crate::error::VerifyError;
use crate::lag::LagReport;
use crate::value::RowRecord;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Which side of the replication pair a store handle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreRole {
    Primary,
    Replica,
}

impl std::fmt::Display for StoreRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Replica => write!(f, "replica"),
        }
    }
}

/// Read-only access to one data store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Which side of the pair this handle is.
    fn role(&self) -> StoreRole;

    /// Enumerate user table names. Failure here is fatal to the run: there
    /// is no meaningful partial verdict without the table set.
    async fn list_tables(&self) -> Result<BTreeSet<String>, VerifyError>;

    /// Exact row count for one table.
    async fn count_rows(&self, table: &str) -> Result<i64, VerifyError>;

    /// Materialize every row of one table. Column order within a row follows
    /// the table's declared schema and is stable for the duration of the run.
    async fn fetch_rows(&self, table: &str) -> Result<Vec<RowRecord>, VerifyError>;

    /// Estimate replication delay. Only meaningful on the replica; primaries
    /// report [`LagReport::Unsupported`]. This must never fail the run;
    /// implementations downgrade probe errors per their own policy.
    async fn replication_lag(&self) -> LagReport;
}
