//! Configuration types

use crate::ConfigError;
use serde::{Deserialize, Serialize};

/// Allocation engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AllocationConfig {
    /// Serialize mutating flows that target the same pull request.
    pub serialize_pull_requests: bool,
    /// Fixed seed for candidate selection. `None` uses fresh randomness.
    pub selector_seed: Option<u64>,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            serialize_pull_requests: true,
            selector_seed: None,
        }
    }
}

impl AllocationConfig {
    /// Load from environment variables.
    ///
    /// - `REVU_SERIALIZE_PULL_REQUESTS`: `true`/`false` (default `true`)
    /// - `REVU_SELECTOR_SEED`: unsigned integer (default unset)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("REVU_SERIALIZE_PULL_REQUESTS") {
            config.serialize_pull_requests = parse_bool("REVU_SERIALIZE_PULL_REQUESTS", &raw)?;
        }

        if let Some(raw) = lookup("REVU_SELECTOR_SEED") {
            let seed = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidValue {
                    field: "REVU_SELECTOR_SEED".to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
            config.selector_seed = Some(seed);
        }

        Ok(config)
    }
}

fn parse_bool(field: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
