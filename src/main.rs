//! Perf Layer diagnostics server
//!
//! Serves cache, preload, chunk, query and metrics diagnostics over HTTP.

use std::net::SocketAddr;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use perf_layer::api::create_router;
use perf_layer::{spawn_sweep_task, AppState, PerfConfig};

/// Main entry point for the diagnostics server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Construct the shared component instances
/// 4. Start the expired-entry sweep if configured
/// 5. Serve the diagnostics router until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "perf_layer=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Perf Layer diagnostics server");

    let config = PerfConfig::from_env();
    info!(
        "Configuration loaded: cache_max_items={}, cache_default_ttl_ms={}, sweep_interval_ms={}, max_metrics={}, port={}",
        config.cache_max_items,
        config.cache_default_ttl_ms,
        config.cache_sweep_interval_ms,
        config.max_metrics,
        config.server_port
    );

    let state = AppState::from_config(&config);
    info!("Performance components initialized");

    let sweep_handle = spawn_sweep_task(state.cache.clone(), config.cache_sweep_interval_ms);
    match &sweep_handle {
        Some(_) => info!("Cache sweep task started"),
        None => info!("Cache sweep disabled, expired entries are dropped on read"),
    }

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sweep_handle {
        handle.abort();
        info!("Cache sweep task stopped");
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
}
