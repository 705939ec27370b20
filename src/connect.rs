//! Store acquisition: connection config and the connect/liveness handshake.

use crate::error::VerifyError;
use crate::postgres::PostgresStore;
use crate::store::StoreRole;
use tokio_postgres::NoTls;
use tracing::{error, info};

/// Connection parameters for one store, built once at process start and
/// passed in explicitly.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Carried into the conninfo string; no TLS connector is wired, so
    /// modes beyond "prefer"/"disable" require a TLS-terminating proxy.
    pub sslmode: String,
    /// PostgreSQL schema to audit (usually "public").
    pub table_schema: String,
}

impl ConnectionConfig {
    fn conninfo(&self) -> String {
        format!(
            "host={} user={} password={} dbname={} sslmode={}",
            self.host, self.user, self.password, self.database, self.sslmode
        )
    }
}

/// Open a connection to one store and prove it usable with `SELECT 1`.
/// Any failure here is fatal to the run.
pub async fn acquire_store(
    config: &ConnectionConfig,
    role: StoreRole,
) -> Result<PostgresStore, VerifyError> {
    info!("Connecting to {role} database at {}", config.host);

    let (client, connection) = tokio_postgres::connect(&config.conninfo(), NoTls)
        .await
        .map_err(|source| VerifyError::Connection { role, source })?;

    // The connection object drives the socket; it must be polled for the
    // client to make progress.
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("{role} connection error: {e}");
        }
    });

    client
        .query_one("SELECT 1", &[])
        .await
        .map_err(|source| VerifyError::Connection { role, source })?;

    info!("Connected successfully to {role} database");
    Ok(PostgresStore::new(role, client, config.table_schema.clone()))
}
