mod error;
mod extractors;
pub mod flash;
mod handlers;
mod routes;
pub mod security;
mod state;

pub use extractors::ADMIN_CODE_HEADER;
pub use state::AppState;

use crate::services::catalog::PhotoCatalog;
use crate::Config;
use anyhow::Result;
use axum::middleware;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

/// Builds the full application router around an existing state.
pub fn router(state: Arc<AppState>) -> Router {
    let max_request_bytes = state.config.upload.max_request_bytes();

    Router::new()
        .merge(routes::public_routes(max_request_bytes))
        .merge(routes::api_routes())
        .merge(routes::admin_routes())
        .layer(middleware::from_fn(security::apply_security_headers))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config, catalog: Arc<dyn PhotoCatalog>, addr: &str) -> Result<()> {
    let state = AppState::new(config, catalog)?;
    state.store.paths().ensure()?;
    let app = router(Arc::new(state));

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
