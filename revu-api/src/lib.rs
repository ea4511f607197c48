//! REVU API - REST Layer
//!
//! Exposes the reviewer allocation engine over HTTP with Axum. The record
//! store is either PostgreSQL (deadpool-postgres) or the in-memory store.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod telemetry;

use std::sync::Arc;

use revu_storage::{InMemoryStore, RecordStore};

pub use config::{ApiConfig, StoreKind};
pub use db::{DbConfig, PgStore};
pub use error::{ApiError, ApiResult, ErrorBody, ErrorCode};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::AppState;

/// Open the record store selected by `config`.
///
/// PostgreSQL is pinged once so a bad connection string fails at startup.
pub async fn open_store(config: &ApiConfig) -> ApiResult<Arc<dyn RecordStore>> {
    match config.store {
        StoreKind::Memory => {
            tracing::warn!("Using in-memory record store; data is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StoreKind::Postgres => {
            let db_config = DbConfig::from_env();
            let store = PgStore::from_config(&db_config)?;
            store.ping().await?;
            tracing::info!(pool_size = db_config.max_size, "Connected to PostgreSQL");
            Ok(Arc::new(store))
        }
    }
}
