//! REVU API Server Entry Point
//!
//! Bootstraps configuration, opens the record store and starts the Axum
//! HTTP server.

use axum::Router;
use revu_api::telemetry::{init_tracer, TelemetryConfig};
use revu_api::{create_api_router, open_store, ApiConfig, ApiError, ApiResult, AppState};
use revu_core::AllocationConfig;

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracer(&TelemetryConfig::default())?;

    let api_config = ApiConfig::from_env()?;
    let allocation_config = AllocationConfig::from_env()
        .map_err(|e| ApiError::validation(format!("Invalid allocation config: {}", e)))?;

    let store = open_store(&api_config).await?;
    let state = AppState::from_store(store, &allocation_config);

    let app: Router = create_api_router(state, &api_config);

    let addr = api_config.bind_addr()?;
    tracing::info!(
        %addr,
        store = ?api_config.store,
        serialize_pull_requests = allocation_config.serialize_pull_requests,
        "Starting REVU API server"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
