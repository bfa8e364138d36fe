//! Generation provider boundary
//!
//! `GenerationBackend` is the explicit client handle the executor talks to.
//! It is built once at process start and shared by reference, so tests can
//! swap in a scripted backend.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::prompt::GenerationRequest;
use super::retry::IsRetryable;
use super::strategy::ProviderStrategy;

/// A single provider call for one strategy
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Issue one generation request and return the raw response text
    async fn generate(
        &self,
        strategy: &ProviderStrategy,
        request: &GenerationRequest,
    ) -> Result<String, ProviderError>;
}

/// Failure classes reported by a provider call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("model not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected response shape: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Classify a non-success HTTP status
    ///
    /// `body` is the raw error body; the provider's `error.message` is used as
    /// the reason when present.
    pub fn from_status(status: u16, body: &str, retry_after: Option<Duration>) -> Self {
        let message = error_message(body);
        match status {
            429 => ProviderError::RateLimited { retry_after },
            404 => ProviderError::NotFound(message),
            500..=599 => ProviderError::Server { status, message },
            _ => ProviderError::BadRequest(format!("HTTP {}: {}", status, message)),
        }
    }
}

impl IsRetryable for ProviderError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. }
                | ProviderError::Server { .. }
                | ProviderError::Network(_)
                | ProviderError::Timeout
        )
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }
}

/// Pull `error.message` out of a Google-style error body, falling back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
