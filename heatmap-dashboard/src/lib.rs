//! heatmap-dashboard - local web dashboard for the concentration heatmap
//!
//! The heatmap is loaded once at startup and shared read-only; each request
//! renders a fresh view for its own threshold and recipe selection.

use anyhow::{Context, Result};
use axum::Router;
use heatmap_core::{Heatmap, Threshold};
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Ordered heatmap, immutable for the server's lifetime
    pub heatmap: Arc<Heatmap>,
    /// Threshold used when a request does not name one
    pub default_threshold: Threshold,
}

impl AppState {
    pub fn new(heatmap: Heatmap, default_threshold: Threshold) -> Self {
        Self {
            heatmap: Arc::new(heatmap),
            default_threshold,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/", get(api::serve_index))
        .route("/api/grid", get(api::get_grid))
        .route("/api/heatmap", get(api::get_heatmap))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `host:port` and serve until Ctrl+C or SIGTERM
pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to bind to {}:{}", host, port))?;
    let addr = listener.local_addr().context("failed to read bound address")?;

    info!("Starting HTTP server on http://{}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                warn!("failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
