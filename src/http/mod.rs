//! # HTTP Exposition
//!
//! Serves the scrape results over HTTP. Every request to the telemetry path
//! runs a fresh scrape through the [`Orchestrator`](crate::collectors::Orchestrator).

pub mod error;
pub mod exposition;
pub mod router;

use crate::collectors::Orchestrator;
use eyre::Context as _;
use minecraft_exporter_config::WebConfig;
pub use router::create_router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Binds the listen address and serves until Ctrl+C.
pub async fn serve(web: &WebConfig, orchestrator: Arc<Orchestrator>) -> eyre::Result<()> {
    let app = create_router(orchestrator, &web.telemetry_path);
    let listener = TcpListener::bind(web.listen_address)
        .await
        .wrap_err_with(|| format!("Failed to bind {}", web.listen_address))?;

    info!(address = %web.listen_address, path = %web.telemetry_path, "Listening");
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        futures::future::pending::<()>().await;
    }
    info!("Shutting down");
}
