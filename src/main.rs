//! Command-line shell for replica verification.
//!
//! # Usage
//!
//! ```bash
//! replica-verify \
//!   --primary-host primary.example.internal \
//!   --replica-host replica.example.internal \
//!   --user admin --password secret --database appdb
//!
//! # Environment-driven (flags fall back to env vars)
//! PRIMARY_SERVER_FQDN=primary.example.internal \
//! REPLICA_SERVER_FQDN=replica.example.internal \
//! POSTGRES_ADMIN_USERNAME=admin \
//! POSTGRES_ADMIN_PASSWORD=secret \
//! DATABASE_NAME=appdb \
//! replica-verify --json
//! ```
//!
//! Exit code 0 when the replica is consistent with the primary, 1 otherwise.

use anyhow::Context;
use clap::Parser;
use replica_verify::{acquire_store, ReplicaVerifier, StoreRole, VerifyArgs, VerifyConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "replica-verify")]
#[command(about = "Verify that a PostgreSQL replica is consistent with its primary")]
struct Cli {
    #[command(flatten)]
    args: VerifyArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "replica_verify=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    info!("PostgreSQL Replication Verification");

    let primary = acquire_store(&cli.args.primary_config(), StoreRole::Primary)
        .await
        .context("acquiring primary store")?;
    let replica = acquire_store(&cli.args.replica_config(), StoreRole::Replica)
        .await
        .context("acquiring replica store")?;

    let config = VerifyConfig {
        threshold: cli.args.threshold,
        wait_for_lag: !cli.args.no_wait,
    };

    let verifier = ReplicaVerifier::new(&primary, &replica, config);
    let verdict = verifier.verify().await.context("running verification")?;

    if cli.args.json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        print!("{}", verdict.render());
    }

    if !verdict.tables_match() {
        std::process::exit(1);
    }
    Ok(())
}
