//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::FromRef;
use revu_core::AllocationConfig;
use revu_engine::AllocationEngine;
use revu_storage::RecordStore;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AllocationEngine>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(engine: AllocationEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            start_time: Instant::now(),
        }
    }

    /// Build the engine over `store` using `config`.
    pub fn from_store(store: Arc<dyn RecordStore>, config: &AllocationConfig) -> Self {
        Self::new(AllocationEngine::from_config(store, config))
    }
}

impl FromRef<AppState> for Arc<AllocationEngine> {
    fn from_ref(state: &AppState) -> Self {
        state.engine.clone()
    }
}
