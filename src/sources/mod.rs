//! Source adapters for the three upstream data providers.
//!
//! The adapters speak JSON over HTTP and hand the core the record shapes it
//! consumes; page mechanics stay on the provider side. Failures are split so
//! the orchestrator can apply different policies: `Transient` units are
//! skipped this run and retried on the next invocation, `Structural` payloads
//! are skipped with a warning since retrying won't help until the source
//! changes shape again.

pub mod lineups;
pub mod official;
pub mod standings;
pub mod third_party;

use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::config::{FETCH_TIMEOUT_SECS, RATE_LIMIT_RETRY_SECS};

#[derive(Debug, Error)]
pub enum SourceError {
    /// Network failure, timeout, or rate limiting that survived its one retry.
    #[error("transient fetch error: {0}")]
    Transient(String),

    /// Response arrived but its shape is not the one this adapter understands.
    #[error("structural parse failure: {0}")]
    Structural(String),
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// HTTP client shared by a fetch phase. Every request inherits the timeout.
pub fn build_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
        .build()
}

/// GET a JSON document. An HTTP 429 triggers exactly one delayed retry;
/// anything else that fails is reported after a single attempt.
pub async fn get_json(client: &reqwest::Client, url: &str) -> SourceResult<serde_json::Value> {
    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SourceError::Transient(format!("{url}: {e}")))?;

    if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        warn!("rate limited on {url}, retrying once in {RATE_LIMIT_RETRY_SECS}s");
        tokio::time::sleep(Duration::from_secs(RATE_LIMIT_RETRY_SECS)).await;
        response = client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Transient(format!("{url}: {e}")))?;
    }

    if !response.status().is_success() {
        return Err(SourceError::Transient(format!(
            "{url}: HTTP {}",
            response.status()
        )));
    }

    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| SourceError::Structural(format!("{url}: {e}")))
}

/// Reads a field that may arrive as a JSON number or a numeric string.
pub(crate) fn value_as_i64(v: &serde_json::Value) -> Option<i64> {
    v.as_i64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

pub(crate) fn value_as_f64(v: &serde_json::Value) -> Option<f64> {
    v.as_f64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

pub(crate) fn string_field(v: &serde_json::Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(|s| s.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
