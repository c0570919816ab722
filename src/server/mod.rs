//! HTTP surface: router, shared state, and the serve entrypoint.

mod handlers;
mod headers;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;

use crate::config::GatewayConfig;
use crate::worker::Worker;

/// Per-process state shared by all handlers. Nothing in here is mutated
/// by requests.
#[derive(Clone)]
pub struct AppState {
    pub worker: Arc<dyn Worker>,
    pub started: Instant,
}

impl AppState {
    pub fn new(worker: Arc<dyn Worker>) -> Self {
        Self {
            worker,
            started: Instant::now(),
        }
    }
}

/// Build the router. Unknown paths and wrong methods on known paths both
/// answer `404 NOT_FOUND`.
pub fn router(config: &GatewayConfig, worker: Arc<dyn Worker>) -> Result<Router> {
    let origin = config.allowed_origin_header()?;

    Ok(Router::new()
        .route("/", get(handlers::index).fallback(handlers::not_found))
        .route(
            "/api/health",
            get(handlers::health).fallback(handlers::not_found),
        )
        .route(
            "/api/process",
            post(handlers::process).fallback(handlers::not_found),
        )
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(middleware::from_fn_with_state(origin, headers::cors))
        .layer(middleware::from_fn(headers::security))
        .with_state(AppState::new(worker)))
}

/// Handle returned by [`serve`]: the bound address and a shutdown trigger.
pub struct ServeHandle {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: Option<tokio::task::JoinHandle<Result<(), std::io::Error>>>,
}

impl ServeHandle {
    /// Trigger graceful shutdown and wait for the server to stop.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            join.await??;
        }
        Ok(())
    }
}

/// Bind and start serving in a background task.
pub async fn serve(config: &GatewayConfig, worker: Arc<dyn Worker>) -> Result<ServeHandle> {
    let app = router(config, worker)?;
    let bind = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    let addr = listener.local_addr()?;
    tracing::info!("gateway listening on {addr}");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("received shutdown signal");
            })
            .await
    });

    Ok(ServeHandle {
        addr,
        shutdown_tx: Some(shutdown_tx),
        join: Some(join),
    })
}
