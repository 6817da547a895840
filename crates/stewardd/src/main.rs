//! stewardd — the steward daemon.
//!
//! Single binary that assembles:
//! - Postgres lease store (schema bootstrapped on start)
//! - Leader election
//! - Job scheduler with SQL maintenance jobs
//! - REST API (schedule trigger, status)
//!
//! # Usage
//!
//! ```text
//! stewardd serve --database-url postgres://... --config steward.toml
//! stewardd lease-status --database-url postgres://...
//! ```

mod config;
mod jobs;
mod signal;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use steward_election::{ElectionRunner, Identity, LeaderCallbacks, StoreLock, SystemClock};
use steward_lease::{LeaseStore, PgLeaseStore};
use steward_scheduler::Scheduler;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{DaemonConfig, Overrides};

const DEFAULT_LOG_FILTER: &str = "info,stewardd=debug,steward_lease=debug,\
    steward_election=debug,steward_scheduler=debug,steward_api=debug";

#[derive(Parser)]
#[command(name = "stewardd", about = "Steward daemon")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run leader election, the job scheduler, and the HTTP API.
    Serve {
        /// Port to listen on.
        #[arg(long, env = "STEWARD_PORT", default_value = "8080")]
        port: u16,

        /// Postgres connection string.
        #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
        database_url: String,

        /// TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: OverrideArgs,
    },
    /// Print the current lease row as JSON.
    LeaseStatus {
        /// Postgres connection string.
        #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
        database_url: String,

        /// Lease to inspect.
        #[arg(long, env = "STEWARD_LEASE_NAME", default_value = "default")]
        lease_name: String,
    },
}

#[derive(Args)]
struct OverrideArgs {
    /// Fixed replica identity instead of a random one.
    #[arg(long, env = "STEWARD_IDENTITY")]
    identity: Option<String>,

    /// Lease name shared by all replicas.
    #[arg(long, env = "STEWARD_LEASE_NAME")]
    lease_name: Option<String>,

    /// Disable the internal timer; run jobs only via POST /api/system/schedule.
    /// Only the exact value `true` enables it.
    #[arg(long, env = "APP_SCHEDULER_DISABLE_USE_ENDPOINT", value_parser = parse_flag)]
    endpoint_trigger: Option<bool>,

    /// Shared secret required by the schedule endpoint.
    #[arg(long, env = "APP_SCHEDULER_ENDPOINT_SECRET", hide_env_values = true)]
    endpoint_secret: Option<String>,

    /// Require the lease before running endpoint-triggered work.
    #[arg(long)]
    trigger_lease_guard: Option<bool>,

    /// Seconds between leader ticks.
    #[arg(long)]
    tick_interval_secs: Option<u64>,
}

fn parse_flag(value: &str) -> Result<bool, Infallible> {
    Ok(value == "true")
}

impl From<OverrideArgs> for Overrides {
    fn from(args: OverrideArgs) -> Self {
        Self {
            identity: args.identity,
            lease_name: args.lease_name,
            endpoint_trigger: args.endpoint_trigger,
            endpoint_secret: args.endpoint_secret,
            trigger_lease_guard: args.trigger_lease_guard,
            tick_interval_secs: args.tick_interval_secs,
        }
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Serve {
            port,
            database_url,
            config,
            overrides,
        } => {
            let config = DaemonConfig::load(config.as_deref())?.with_overrides(overrides.into());
            config.validate()?;
            run_serve(port, &database_url, config).await
        }
        Command::LeaseStatus {
            database_url,
            lease_name,
        } => lease_status(&database_url, &lease_name).await,
    }
}

async fn run_serve(port: u16, database_url: &str, config: DaemonConfig) -> anyhow::Result<()> {
    info!("steward daemon starting");

    // ── Initialize subsystems ──────────────────────────────────

    let store = PgLeaseStore::connect(database_url).await?;
    store.ensure_schema().await?;
    info!("lease store ready");

    let identity = config
        .identity
        .clone()
        .map(Identity::new)
        .unwrap_or_else(Identity::random);
    info!(%identity, lease = %config.election.lease_name, "replica identity chosen");

    let lock = StoreLock::new(
        config.election.lease_name.clone(),
        identity,
        Arc::new(store.clone()),
    );
    let callbacks = LeaderCallbacks::new()
        .on_started_leading(|| info!("this replica is now the leader"))
        .on_stopped_leading(|| info!("no longer the leader, staying inactive"))
        .on_new_leader(|leader| info!(%leader, "new leader elected"));
    let election = Arc::new(ElectionRunner::new(
        config.election.clone(),
        Arc::new(lock),
        Arc::new(SystemClock),
        callbacks,
    )?);

    let registry = jobs::build_registry(store.pool(), &config.jobs)?;
    info!(jobs = registry.len(), "jobs registered");
    let scheduler = Arc::new(Scheduler::new(registry, election, config.scheduler.clone())?);
    info!(
        endpoint_trigger = scheduler.is_endpoint_trigger_enabled(),
        lease_guard = scheduler.trigger_lease_guard(),
        "scheduler initialized"
    );

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start background tasks ─────────────────────────────────

    let scheduler_handle = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run(shutdown_rx).await })
    };

    // ── API server ─────────────────────────────────────────────

    let router = steward_api::build_router(scheduler);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            signal::shutdown_signal().await;
            info!("shutting down");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    if let Err(e) = scheduler_handle.await {
        warn!(error = %e, "scheduler task ended abnormally");
    }
    info!("steward daemon stopped");
    Ok(())
}

async fn lease_status(database_url: &str, lease_name: &str) -> anyhow::Result<()> {
    let store = PgLeaseStore::connect(database_url).await?;
    match store.get(lease_name).await? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => anyhow::bail!("lease {lease_name:?} not found"),
    }
    Ok(())
}
