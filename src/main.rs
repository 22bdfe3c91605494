mod api;
mod config;
mod engine;
mod error;
mod events;
mod external;
mod models;
mod observability;
mod state;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::external::geocoder::HttpGeocoder;
use crate::external::optimizer::HttpRouteSolver;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let geocoder = Arc::new(HttpGeocoder::new(
        config.geocoder_url.clone(),
        config.geocoder_api_key.clone(),
        Duration::from_millis(config.geocoder_min_interval_ms),
    ));
    let solver = Arc::new(HttpRouteSolver::new(
        config.optimizer_url.clone(),
        config.optimizer_api_key.clone(),
        Duration::from_secs(config.optimizer_timeout_secs),
    ));

    let shared_state = Arc::new(state::AppState::new(
        config.event_buffer_size,
        geocoder,
        solver,
    ));

    let app = api::rest::router(shared_state);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
