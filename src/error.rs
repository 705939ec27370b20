//! Error types for replica verification.

use crate::store::StoreRole;
use thiserror::Error;

/// Errors raised while verifying a replica against its primary.
///
/// `Connection` and `SchemaIntrospection` are fatal to the run; `TableQuery`
/// is recoverable and captured into the affected table's result. Lag-probe
/// failures never surface here at all; the probe downgrades them itself.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Could not acquire a usable connection to one of the stores.
    #[error("failed to connect to {role} database: {source}")]
    Connection {
        role: StoreRole,
        #[source]
        source: tokio_postgres::Error,
    },

    /// Could not enumerate tables for one of the stores.
    #[error("failed to list tables on {role}: {source}")]
    SchemaIntrospection {
        role: StoreRole,
        #[source]
        source: tokio_postgres::Error,
    },

    /// A count or data query failed for one table.
    #[error("query failed for table '{table}' on {role}: {message}")]
    TableQuery {
        role: StoreRole,
        table: String,
        message: String,
    },
}

impl VerifyError {
    /// Per-table failures are recorded in the verdict instead of aborting
    /// the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::TableQuery { .. })
    }
}
