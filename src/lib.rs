//! Point-in-time consistency auditor for a PostgreSQL primary/replica pair.
//!
//! Verifies that a replica is consistent with its primary: same table set,
//! same per-table row counts, and, for tables under a size threshold,
//! identical row-level content, after giving observed replication lag a
//! bounded grace period to close.
//!
//! # Example
//!
//! ```ignore
//! use replica_verify::{acquire_store, ReplicaVerifier, StoreRole, VerifyConfig};
//!
//! let primary = acquire_store(&primary_config, StoreRole::Primary).await?;
//! let replica = acquire_store(&replica_config, StoreRole::Replica).await?;
//!
//! let verifier = ReplicaVerifier::new(&primary, &replica, VerifyConfig::default());
//! let verdict = verifier.verify().await?;
//! assert!(verdict.tables_match());
//! ```

pub mod args;
pub mod compare;
pub mod connect;
pub mod error;
pub mod lag;
pub mod postgres;
pub mod report;
pub mod schema;
pub mod store;
pub mod value;
pub mod verifier;

pub use args::VerifyArgs;
pub use compare::{compare_row_sets, sort_rows, CompareResult};
pub use connect::{acquire_store, ConnectionConfig};
pub use error::VerifyError;
pub use lag::LagReport;
pub use postgres::PostgresStore;
pub use report::{ComparisonVerdict, TableResult};
pub use schema::{common_tables, diff_tables, TableSetDiff};
pub use store::{Store, StoreRole};
pub use value::{RowRecord, ScalarValue};
pub use verifier::{ReplicaVerifier, VerifyConfig};
