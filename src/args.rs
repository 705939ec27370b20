//! CLI argument definitions.

use crate::connect::ConnectionConfig;
use clap::Args;

/// Arguments for verifying a replica against its primary.
///
/// Environment variable names match the deployment that provisions the
/// database pair, so the tool runs unmodified inside that environment.
#[derive(Args, Clone, Debug)]
pub struct VerifyArgs {
    /// Primary server hostname
    #[arg(long, env = "PRIMARY_SERVER_FQDN")]
    pub primary_host: String,

    /// Replica server hostname
    #[arg(long, env = "REPLICA_SERVER_FQDN")]
    pub replica_host: String,

    /// Database user (same credentials on both servers)
    #[arg(long, env = "POSTGRES_ADMIN_USERNAME")]
    pub user: String,

    /// Database password
    #[arg(long, env = "POSTGRES_ADMIN_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Database name
    #[arg(long, env = "DATABASE_NAME")]
    pub database: String,

    /// PostgreSQL sslmode carried into the connection string
    #[arg(long, default_value = "prefer")]
    pub sslmode: String,

    /// Schema whose tables are audited
    #[arg(long, default_value = "public")]
    pub table_schema: String,

    /// Row-count cutoff below which full row-level comparison runs
    #[arg(long, default_value = "1000")]
    pub threshold: i64,

    /// Skip the lag-driven grace wait (the lag is still probed and reported)
    #[arg(long)]
    pub no_wait: bool,

    /// Print the verdict as JSON instead of the human-readable summary
    #[arg(long)]
    pub json: bool,
}

impl VerifyArgs {
    pub fn primary_config(&self) -> ConnectionConfig {
        self.config_for(&self.primary_host)
    }

    pub fn replica_config(&self) -> ConnectionConfig {
        self.config_for(&self.replica_host)
    }

    fn config_for(&self, host: &str) -> ConnectionConfig {
        ConnectionConfig {
            host: host.to_string(),
            user: self.user.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            sslmode: self.sslmode.clone(),
            table_schema: self.table_schema.clone(),
        }
    }
}
