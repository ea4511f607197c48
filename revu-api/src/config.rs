//! API Configuration Module
//!
//! Server binding, CORS and record store selection. Configuration is loaded
//! from environment variables with defaults suitable for development.

use std::net::SocketAddr;

use crate::error::{ApiError, ApiResult};

// ============================================================================
// STORE SELECTION
// ============================================================================

/// Which record store backs the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Process-local store; contents are lost on restart.
    Memory,
    /// PostgreSQL through a deadpool connection pool.
    Postgres,
}

impl StoreKind {
    fn parse(raw: &str) -> ApiResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StoreKind::Memory),
            "postgres" | "postgresql" | "pg" => Ok(StoreKind::Postgres),
            other => Err(ApiError::validation(format!(
                "Invalid REVU_STORE value: {}",
                other
            ))),
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for binding, CORS and storage.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to bind.
    pub bind_host: String,

    /// TCP port.
    pub port: u16,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    pub store: StoreKind,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
            cors_max_age_secs: 86400, // 24 hours
            store: StoreKind::Memory,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// - `REVU_API_BIND`: interface (default `0.0.0.0`)
    /// - `PORT` or `REVU_API_PORT`: port (default `8080`)
    /// - `REVU_CORS_ORIGINS`: comma-separated origins (default: any)
    /// - `REVU_CORS_MAX_AGE_SECS`: preflight cache (default `86400`)
    /// - `REVU_STORE`: `memory` or `postgres`. When unset, PostgreSQL is
    ///   used if `DATABASE_URL` or `DB_HOST` is present.
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> ApiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_host = lookup("REVU_API_BIND").unwrap_or(defaults.bind_host);

        let port = match lookup("PORT").or_else(|| lookup("REVU_API_PORT")) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ApiError::validation(format!("Invalid port value: {}", raw)))?,
            None => defaults.port,
        };

        let cors_origins = lookup("REVU_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_max_age_secs = lookup("REVU_CORS_MAX_AGE_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let store = match lookup("REVU_STORE") {
            Some(raw) => StoreKind::parse(&raw)?,
            None if lookup("DATABASE_URL").is_some() || lookup("DB_HOST").is_some() => {
                StoreKind::Postgres
            }
            None => StoreKind::Memory,
        };

        Ok(Self {
            bind_host,
            port,
            cors_origins,
            cors_max_age_secs,
            store,
        })
    }

    /// Socket address to listen on.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>().map_err(|e| {
            ApiError::validation(format!("Invalid bind address {}: {}", addr, e))
        })
    }
}
