//! Mesh Cache - A caching facade over a replicated key/value graph store
//!
//! # Startup Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Load configuration from environment variables
//! 3. Discover replication peers (non-fatal when discovery fails)
//! 4. Open the store with the peer list and local persistence target
//! 5. Start the replication listener on the well-known port
//! 6. Register the RPC method table and build the router
//! 7. Bind the RPC listener with mutual TLS
//! 8. Handle graceful shutdown on SIGINT/SIGTERM
//!
//! Any startup failure is fatal: logged, then the process exits non-zero.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mesh_cache::config::Config;
use mesh_cache::discovery::discover_peers;
use mesh_cache::rpc::{method_table, ServiceContext};
use mesh_cache::store::replication::{serve_replication, REPLICATION_PORT};
use mesh_cache::store::{EnvelopeStore, MeshStore};
use mesh_cache::tls::build_server_config;

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mesh_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = provision().await {
        error!("Failed to start server: {:#}", err);
        std::process::exit(1);
    }
}

/// Wires the service together at startup.
async fn provision() -> Result<()> {
    info!("Starting mesh cache service");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        "Configuration loaded: port={}, discovery_name={}, default_ttl={}s, database_file={}",
        config.server_port,
        config.discovery_name,
        config.default_ttl,
        config.database_file.display()
    );

    let peers = discover_peers(&config.discovery_name).await;
    info!("Peer discovery yielded {} peer(s)", peers.len());

    let store = MeshStore::open(&peers, Some(config.database_file.clone()))
        .context("failed to open store")?;

    let replication_addr = SocketAddr::from(([0, 0, 0, 0], REPLICATION_PORT));
    let replication_listener = TcpListener::bind(replication_addr)
        .await
        .with_context(|| format!("failed to bind replication listener on {}", replication_addr))?;
    info!("Replication listener on {}", replication_addr);
    tokio::spawn(serve_replication(Arc::clone(&store), replication_listener));

    let ctx = Arc::new(ServiceContext {
        store: EnvelopeStore::new(store),
        default_ttl: config.default_ttl,
    });
    let table = method_table();
    info!("Registered RPC methods: {:?}", table.method_names());
    let app = table.into_router(ctx);

    let tls_config = build_server_config(&config.tls).context("failed to build TLS config")?;
    let rustls_config =
        axum_server::tls_rustls::RustlsConfig::from_config(Arc::new(tls_config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("Server listening on https://{}", addr);

    let handle = axum_server::Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    axum_server::bind_rustls(addr, rustls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .context("RPC server failed")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM), then drains the
/// server gracefully.
async fn shutdown_signal(handle: axum_server::Handle) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    handle.graceful_shutdown(Some(Duration::from_secs(5)));
}
