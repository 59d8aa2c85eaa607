//! PromptHash marketplace server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ users / prompts ──▶ store (DashMap + snapshot)
//!                          │
//!                          ├────────▶ improve-proxy ──▶ improvement gateway
//!                          │
//!                          └────────▶ chat ──▶ LLM (SSE) ──▶ data stream to client
//!
//!     Cross-cutting: config, observability (tracing + Prometheus), lifecycle
//! ```
//!
//! The on-chain listing workflow runs from `prompthash-cli`, not the server.
//!
//! Configuration is read from the path given as the first argument or in
//! `PROMPTHASH_CONFIG`; without either, defaults are used.

use std::path::PathBuf;

use tokio::net::TcpListener;

use prompthash::config::{load_or_default, MarketConfig};
use prompthash::lifecycle::{wait_for_signal, Shutdown};
use prompthash::observability::{logging, metrics};
use prompthash::{HttpServer, MarketStore};

/// Environment variable naming the config file.
const CONFIG_ENV_VAR: &str = "PROMPTHASH_CONFIG";

fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
}

fn open_store(config: &MarketConfig) -> Result<MarketStore, Box<dyn std::error::Error>> {
    match &config.store.persistence_path {
        Some(path) => Ok(MarketStore::load_from_file(path)?),
        None => Ok(MarketStore::new(None)),
    }
}

fn report_server_exit(result: Result<std::io::Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server failed"),
        Err(e) => tracing::error!(error = %e, "HTTP server task panicked"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_or_default(config_path().as_deref())?;
    logging::init_logging(&config.observability);

    tracing::info!("prompthash v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        rpc_url = %config.blockchain.rpc_url,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let store = open_store(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, store.clone())?;
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        _ = wait_for_signal() => {
            shutdown.trigger();
            report_server_exit(server_task.await);
        }
        result = &mut server_task => report_server_exit(result),
    }

    if let Err(e) = store.save_to_file() {
        tracing::error!(error = %e, "Failed to save store snapshot");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
