//! celld — the cellplane control plane daemon.
//!
//! Serves the provisioning API: developers declare what they need
//! (cell, tier, environment, ha, product parameters) and the control
//! plane decides provider, region, runtime cluster, and network,
//! emitting declarative Claims for an external orchestrator.
//!
//! # Usage
//!
//! ```text
//! celld --port 8080 --config config/policy.toml
//! celld --standalone            # no orchestrator: claims are returned, not applied
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use cellplane_api::AppContext;
use cellplane_claims::{ClaimStore, MemoryClaimStore, StandaloneStore};
use cellplane_policy::PolicyConfig;
use cellplane_products::ProductRegistry;

#[derive(Parser)]
#[command(name = "celld", about = "cellplane control plane daemon")]
struct Cli {
    /// Listen address.
    #[arg(long, env = "IDP_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Listen port.
    #[arg(long, env = "IDP_PORT", default_value = "8080")]
    port: u16,

    /// Path to policy.toml (tiers and cell candidate pools).
    /// Builtin defaults are used when omitted.
    #[arg(long, env = "IDP_POLICY_PATH")]
    config: Option<PathBuf>,

    /// Run without an orchestrator: claims are built and returned but
    /// not applied, and sticky lookups find nothing.
    #[arg(long)]
    standalone: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,celld=debug,cellplane=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    // ── Policy tables ────────────────────────────────────────────
    let config = match &cli.config {
        Some(path) => {
            info!(path = ?path, "loading policy config");
            PolicyConfig::from_file(path)?
        }
        None => {
            info!("no policy config given, using builtin tiers and cells");
            PolicyConfig::default()
        }
    };
    let (tiers, cells) = config.into_tables()?;

    // ── Claim store ──────────────────────────────────────────────
    let store: Arc<dyn ClaimStore> = if cli.standalone {
        info!("standalone mode: claims are returned but not applied");
        Arc::new(StandaloneStore::new())
    } else {
        info!("in-memory claim store initialized");
        Arc::new(MemoryClaimStore::new())
    };

    // ── Context + API server ─────────────────────────────────────
    let ctx = AppContext::new(tiers, cells, ProductRegistry::builtin(), store);
    let router = cellplane_api::build_router(ctx);

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    info!(%addr, "API server starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C handler");
            info!("shutdown signal received");
        })
        .await?;

    info!("cellplane daemon stopped");
    Ok(())
}
