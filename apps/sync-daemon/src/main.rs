//! # InfoPlus Sync Daemon
//!
//! Runs the sync agent in the background, or executes a single sync
//! command and prints its report as JSON.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. tracing (RUST_LOG or info,infoplus=debug,sqlx=warn)                 │
//! │  2. SyncConfig: defaults → TOML → INFOPLUS_* env → validate             │
//! │  3. SQLite database (migrations on connect)                             │
//! │  4. HttpClient (rate limited, retrying) → SyncEngine                    │
//! │  5. command                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use infoplus_core::{OrderSyncRecord, SyncKind, SyncRun};
use infoplus_db::{Database, DbConfig};
use infoplus_sync::{HttpClient, SyncAgent, SyncConfig, SyncEngine};

#[derive(Parser)]
#[command(name = "sync-daemon")]
#[command(about = "InfoPlus WMS sync engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the platform config dir)
    #[arg(short, long, env = "INFOPLUS_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent until Ctrl+C
    Run,
    /// Run one sync kind, or `all` for a full sync
    Sync {
        /// categories, customers, products, orders, inventory, order_status or all
        target: String,
    },
    /// Reconcile order status once
    Reconcile,
    /// Show recent runs and orders awaiting shipment
    Status {
        /// Number of runs to show
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },
}

#[derive(Serialize)]
struct StatusReport {
    recent_runs: Vec<SyncRun>,
    pending_shipments: Vec<OrderSyncRecord>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    info!("Starting InfoPlus sync daemon v{}", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(SyncConfig::load(cli.config).context("Failed to load configuration")?);
    let db = open_database(&config).await?;

    let api = Arc::new(HttpClient::new(&config)?);
    info!(base_url = %api.base_url(), lob_id = config.lob_id(), "InfoPlus client ready");
    let engine = SyncEngine::new(db.clone(), api, config);

    let result = run_command(cli.command, engine).await;
    db.close().await;
    result
}

async fn run_command(command: Commands, engine: SyncEngine) -> Result<()> {
    match command {
        Commands::Run => {
            let agent = SyncAgent::new(engine).start();
            info!("Sync agent running. Press Ctrl+C to stop.");
            shutdown_signal().await;
            agent.shutdown().await?;
            print_json(&agent.status().await)?;
        }
        Commands::Sync { target } => {
            if target.eq_ignore_ascii_case("all") {
                let report = engine.full_sync().await;
                print_json(&report)?;
                if report.failure_count() > 0 {
                    warn!(failures = report.failure_count(), "Full sync finished with failures");
                }
            } else {
                let kind: SyncKind = target
                    .parse()
                    .with_context(|| format!("Unknown sync kind '{target}'"))?;
                let outcome = engine.run(kind).await;
                print_json(&outcome)?;
                if outcome.is_error() {
                    bail!("{kind} sync did not run");
                }
            }
        }
        Commands::Reconcile => {
            let outcome = engine.run(SyncKind::OrderStatus).await;
            print_json(&outcome)?;
        }
        Commands::Status { limit } => {
            let db = engine.db();
            let report = StatusReport {
                recent_runs: db.sync_runs().recent(limit).await?,
                pending_shipments: db.order_sync().get_pending_shipment_orders().await?,
            };
            print_json(&report)?;
        }
    }
    Ok(())
}

async fn open_database(config: &SyncConfig) -> Result<Database> {
    let Some(path) = config.database_path() else {
        bail!("No database path configured and no platform data directory available");
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let db = Database::new(DbConfig::new(path.clone()))
        .await
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    info!(path = %path.display(), "Database ready");
    Ok(db)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,infoplus=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
