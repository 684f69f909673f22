//! # Parcel Delivery API Server
//!
//! Binary entry point. Wires configuration, the PostgreSQL pool, the mail
//! consumer, and the axum router together, then serves until a shutdown
//! signal arrives.
//!
//! ## Key Design Principles:
//! - **Fail fast at startup:** the database is pinged before the listener
//!   binds; a misconfigured deployment dies immediately instead of serving
//!   errors.
//! - **Degrade at runtime:** optional providers (geo, payments, mail) that
//!   are not configured disable their features with a startup warning
//!   rather than refusing to boot.
//! - **Graceful shutdown:** in-flight requests drain on SIGINT/SIGTERM.

use std::net::SocketAddr;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod parcel_logic;

use parcel_logic::config::AppConfig;
use parcel_logic::routes;
use parcel_logic::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::parse();
    let state = AppState::new(&config).await?;
    let app = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Parcel API server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        // Failure to install the handler leaves no way to stop cleanly.
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
