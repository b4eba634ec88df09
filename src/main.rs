//! Wallet Proxy Router service.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────────────┐
//!                    │                WALLET PROXY ROUTER                 │
//!                    │                                                    │
//!  Admin request     │  ┌─────────┐   ┌──────────┐   ┌───────────────┐   │
//!  ──────────────────┼─▶│  http   │──▶│  admin   │──▶│ ConfigService │   │
//!                    │  │ server  │   │ handlers │   │  (ownership,  │   │
//!                    │  └─────────┘   └────┬─────┘   │   mutations)  │   │
//!                    │                     │         └───────┬───────┘   │
//!                    │                     │                 ▼           │
//!                    │                     │         ┌───────────────┐   │   ip-config.json
//!                    │                     │         │  RouteStore   │◀──┼──────────────────
//!                    │                     │         └───────┬───────┘   │
//!                    │                     ▼                 │           │
//!                    │               ┌───────────┐           │           │
//!                    │               │RelayBridge│◀──────────┘           │
//!                    │               └─────┬─────┘                       │
//!                    │                     ▼                             │
//!                    │            ┌─────────────────┐                    │
//!  Upstream          │            │ ProxyDispatcher │ direct / HTTP /    │
//!  ◀─────────────────┼────────────│                 │ SOCKS transport    │
//!                    │            └─────────────────┘                    │
//!                    └────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use wallet_proxy_router::config::{load_or_default, validation::validate_config, ConfigError};
use wallet_proxy_router::http::HttpServer;
use wallet_proxy_router::lifecycle::{build_state, signals, startup};
use wallet_proxy_router::observability::logging;

#[derive(Parser)]
#[command(name = "wallet-proxy-router")]
#[command(about = "Per-wallet outbound proxy routing service", long_about = None)]
struct Args {
    /// Service settings (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Routing document path, overriding `[store] path`.
    #[arg(short, long)]
    store: Option<String>,

    /// Bind address, overriding `[listener] bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_or_default(args.config.as_deref())?;
    if let Some(store) = args.store {
        config.store.path = store;
    }
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability);
    tracing::info!("wallet-proxy-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        store = %config.store.path,
        relayer = %config.relayer.url,
        "Configuration loaded"
    );

    startup::start_metrics(&config);

    let bind_address = config.listener.bind_address.clone();
    let state = build_state(config)?;
    let shutdown = state.shutdown.clone();
    signals::spawn_signal_handler(shutdown.clone());

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(state);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
