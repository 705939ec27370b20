//! PostgreSQL implementation of the store seam.
//!
//! Rows are decoded column-by-column into [`ScalarValue`] based on the
//! server-reported type, so the comparison layer never sees wire formats.
//! The lag probe runs the WAL receive/replay query and downgrades every
//! failure mode per an explicit policy: a server that lacks the functions is
//! `Unsupported`; any other probe failure is treated as zero lag, because
//! the goal is verification, not lag SLA enforcement.

use crate::error::VerifyError;
use crate::lag::LagReport;
use crate::store::{Store, StoreRole};
use crate::value::{RowRecord, ScalarValue};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::Type;
use tokio_postgres::{Client, Row};
use tracing::warn;

/// Reports 0 when the replica has replayed everything it received, otherwise
/// the whole seconds elapsed since the last replayed transaction.
const LAG_QUERY: &str = "
    SELECT
        CASE
            WHEN pg_last_wal_receive_lsn() = pg_last_wal_replay_lsn() THEN 0
            ELSE EXTRACT(EPOCH FROM now() - pg_last_xact_replay_timestamp())::INTEGER
        END AS lag_seconds";

/// One side of the replication pair, backed by a tokio-postgres client.
pub struct PostgresStore {
    role: StoreRole,
    client: Client,
    table_schema: String,
}

impl PostgresStore {
    pub fn new(role: StoreRole, client: Client, table_schema: impl Into<String>) -> Self {
        Self {
            role,
            client,
            table_schema: table_schema.into(),
        }
    }

    fn table_query_error(&self, table: &str, message: impl ToString) -> VerifyError {
        VerifyError::TableQuery {
            role: self.role,
            table: table.to_string(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl Store for PostgresStore {
    fn role(&self) -> StoreRole {
        self.role
    }

    async fn list_tables(&self) -> Result<BTreeSet<String>, VerifyError> {
        let query = "
            SELECT table_name FROM information_schema.tables
            WHERE table_schema = $1 AND table_type = 'BASE TABLE'";
        let rows = self
            .client
            .query(query, &[&self.table_schema])
            .await
            .map_err(|source| VerifyError::SchemaIntrospection {
                role: self.role,
                source,
            })?;
        Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
    }

    async fn count_rows(&self, table: &str) -> Result<i64, VerifyError> {
        let query = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        let row = self
            .client
            .query_one(&query, &[])
            .await
            .map_err(|e| self.table_query_error(table, e))?;
        Ok(row.get::<_, i64>(0))
    }

    async fn fetch_rows(&self, table: &str) -> Result<Vec<RowRecord>, VerifyError> {
        let query = format!("SELECT * FROM {}", quote_ident(table));
        let rows = self
            .client
            .query(&query, &[])
            .await
            .map_err(|e| self.table_query_error(table, e))?;

        rows.iter()
            .map(|row| row_to_record(row).map_err(|msg| self.table_query_error(table, msg)))
            .collect()
    }

    async fn replication_lag(&self) -> LagReport {
        if self.role == StoreRole::Primary {
            // The WAL replay functions only mean something on a standby.
            return LagReport::Unsupported;
        }

        match self.client.query_one(LAG_QUERY, &[]).await {
            Ok(row) => match row.try_get::<_, Option<i32>>(0) {
                // NULL reading (e.g. no transaction replayed yet) counts as
                // no lag.
                Ok(reading) => LagReport::from_raw_seconds(i64::from(reading.unwrap_or(0))),
                Err(e) => {
                    warn!("Could not decode replication lag reading: {e}");
                    LagReport::Measured(0)
                }
            },
            Err(e) => {
                let report = classify_probe_failure(e.code());
                match report {
                    LagReport::Unsupported => {
                        warn!("Replication lag query not supported on this server")
                    }
                    _ => warn!("Replication lag probe failed, assuming zero lag: {e}"),
                }
                report
            }
        }
    }
}

/// Fail-open classification of a lag-probe failure: a server without the
/// WAL functions is `Unsupported`; any other error is treated as zero lag.
fn classify_probe_failure(code: Option<&SqlState>) -> LagReport {
    match code {
        Some(code)
            if *code == SqlState::UNDEFINED_FUNCTION
                || *code == SqlState::FEATURE_NOT_SUPPORTED =>
        {
            LagReport::Unsupported
        }
        _ => LagReport::Measured(0),
    }
}

/// Quote a table identifier, doubling embedded quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Decode a full row into the comparison representation, columns in the
/// order the server returned them.
fn row_to_record(row: &Row) -> Result<RowRecord, String> {
    let mut columns = Vec::with_capacity(row.columns().len());
    for (index, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, index).map_err(|msg| {
            format!("column '{}' ({}): {msg}", column.name(), column.type_())
        })?;
        columns.push((column.name().to_string(), value));
    }
    Ok(RowRecord::new(columns))
}

/// Decode one column by its PostgreSQL type.
fn decode_column(row: &Row, index: usize) -> Result<ScalarValue, String> {
    let pg_type = row.columns()[index].type_();

    let value = match *pg_type {
        Type::BOOL => row
            .try_get::<_, Option<bool>>(index)
            .map_err(stringify)?
            .map(ScalarValue::Bool),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(index)
            .map_err(stringify)?
            .map(|i| ScalarValue::Int(i64::from(i))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(index)
            .map_err(stringify)?
            .map(|i| ScalarValue::Int(i64::from(i))),
        Type::INT8 => row
            .try_get::<_, Option<i64>>(index)
            .map_err(stringify)?
            .map(ScalarValue::Int),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(index)
            .map_err(stringify)?
            .map(|f| ScalarValue::Float(f64::from(f))),
        Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(index)
            .map_err(stringify)?
            .map(ScalarValue::Float),
        Type::NUMERIC => row
            .try_get::<_, Option<Decimal>>(index)
            .map_err(stringify)?
            .map(ScalarValue::Numeric),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => row
            .try_get::<_, Option<String>>(index)
            .map_err(stringify)?
            .map(ScalarValue::Text),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(index)
            .map_err(stringify)?
            .map(|ts| ScalarValue::Timestamp(DateTime::<Utc>::from_naive_utc_and_offset(ts, Utc))),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(index)
            .map_err(stringify)?
            .map(ScalarValue::Timestamp),
        Type::DATE => match row.try_get::<_, Option<NaiveDate>>(index).map_err(stringify)? {
            Some(date) => {
                let midnight = date
                    .and_hms_opt(0, 0, 0)
                    .ok_or_else(|| "invalid date".to_string())?;
                Some(ScalarValue::Timestamp(
                    DateTime::<Utc>::from_naive_utc_and_offset(midnight, Utc),
                ))
            }
            None => None,
        },
        Type::TIME => row
            .try_get::<_, Option<NaiveTime>>(index)
            .map_err(stringify)?
            .map(|time| ScalarValue::Text(time.to_string())),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<serde_json::Value>>(index)
            .map_err(stringify)?
            .map(ScalarValue::Json),
        Type::UUID => row
            .try_get::<_, Option<uuid::Uuid>>(index)
            .map_err(stringify)?
            .map(ScalarValue::Uuid),
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(index)
            .map_err(stringify)?
            .map(|bytes| {
                ScalarValue::Text(base64::Engine::encode(
                    &base64::engine::general_purpose::STANDARD,
                    bytes,
                ))
            }),
        _ => {
            // Unknown types fall back to their text representation
            match row.try_get::<_, Option<String>>(index) {
                Ok(value) => value.map(ScalarValue::Text),
                Err(_) => return Err(format!("unsupported PostgreSQL type: {pg_type}")),
            }
        }
    };

    Ok(value.unwrap_or(ScalarValue::Null))
}

fn stringify(e: tokio_postgres::Error) -> String {
    e.to_string()
}
