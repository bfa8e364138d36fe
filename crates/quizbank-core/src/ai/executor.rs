//! Request executor
//!
//! Issues one generation request for one strategy, retries transient failures
//! in place, and reduces the result to an `AttemptOutcome`.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::backend::{GenerationBackend, ProviderError};
use super::prompt::GenerationRequest;
use super::retry::{with_retry, RetryConfig};
use super::strategy::ProviderStrategy;

/// Result of one strategy attempt, after local retries
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(String),
    RateLimited,
    NotFound,
    BadRequest(String),
    TransientError,
    ParseFailure,
}

/// Phrases providers use when rejecting JSON output mode
const STRUCTURED_OUTPUT_MARKERS: &[&str] = &[
    "responsemimetype",
    "response_mime_type",
    "json mode",
    "structured output",
];

impl AttemptOutcome {
    /// A 400 caused by the structured-output option rather than the request itself
    pub fn rejects_structured_output(&self) -> bool {
        match self {
            AttemptOutcome::BadRequest(reason) => {
                let reason = reason.to_lowercase();
                STRUCTURED_OUTPUT_MARKERS
                    .iter()
                    .any(|marker| reason.contains(marker))
            }
            _ => false,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success(_))
    }
}

impl From<ProviderError> for AttemptOutcome {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::RateLimited { .. } => AttemptOutcome::RateLimited,
            ProviderError::NotFound(_) => AttemptOutcome::NotFound,
            ProviderError::BadRequest(reason) => AttemptOutcome::BadRequest(reason),
            ProviderError::Server { .. } | ProviderError::Network(_) | ProviderError::Timeout => {
                AttemptOutcome::TransientError
            }
            ProviderError::Malformed(_) => AttemptOutcome::ParseFailure,
        }
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Success(text) => write!(f, "success ({} chars)", text.len()),
            AttemptOutcome::RateLimited => write!(f, "rate limited"),
            AttemptOutcome::NotFound => write!(f, "not found"),
            AttemptOutcome::BadRequest(reason) => write!(f, "bad request: {}", reason),
            AttemptOutcome::TransientError => write!(f, "transient error"),
            AttemptOutcome::ParseFailure => write!(f, "unusable response"),
        }
    }
}

/// Runs single-strategy requests against a shared backend
pub struct RequestExecutor {
    backend: Arc<dyn GenerationBackend>,
    retry: RetryConfig,
}

impl RequestExecutor {
    pub fn new(backend: Arc<dyn GenerationBackend>, retry: RetryConfig) -> Self {
        Self { backend, retry }
    }

    /// Execute one request for `strategy`
    ///
    /// Only transient failures consume the retry budget. A success with an
    /// empty payload is a `ParseFailure`.
    pub async fn execute(
        &self,
        strategy: &ProviderStrategy,
        request: &GenerationRequest,
    ) -> AttemptOutcome {
        let result = with_retry(&self.retry, || self.backend.generate(strategy, request)).await;

        let outcome = match result {
            Ok(text) if text.trim().is_empty() => AttemptOutcome::ParseFailure,
            Ok(text) => AttemptOutcome::Success(text),
            Err(e) => e.into(),
        };
        debug!(strategy = %strategy, outcome = %outcome, "attempt finished");
        outcome
    }
}
