//! Centralized configuration (environment variables + defaults).

use crate::domain::syncer::ReferencePolicy;
use crate::infra::logging::LogFormat;
use anyhow::Context;
use std::time::Duration;

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Database URL must be provided (no default) for safety.
pub fn database_url() -> anyhow::Result<String> {
    var("DATABASE_URL").context("DATABASE_URL must be set")
}

/// Address the API server binds to.
pub fn bind_addr() -> String {
    var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string())
}

pub fn database_max_connections() -> anyhow::Result<u32> {
    match var("DATABASE_MAX_CONNECTIONS") {
        Some(v) => Ok(v
            .trim()
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?
            .max(1)),
        None => Ok(5),
    }
}

/// Per-request timeout for export fetches. Unset means no timeout.
pub fn sync_http_timeout() -> anyhow::Result<Option<Duration>> {
    var("SYNC_HTTP_TIMEOUT_SECS")
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .context("SYNC_HTTP_TIMEOUT_SECS must be a whole number of seconds")
        })
        .transpose()
}

pub fn reference_policy() -> anyhow::Result<ReferencePolicy> {
    match var("SYNC_REFERENCE_POLICY") {
        Some(v) => v.parse().map_err(anyhow::Error::msg),
        None => Ok(ReferencePolicy::default()),
    }
}

pub fn log_format() -> anyhow::Result<LogFormat> {
    match var("LOG_FORMAT") {
        Some(v) => v.parse().map_err(anyhow::Error::msg),
        None => Ok(LogFormat::default()),
    }
}
