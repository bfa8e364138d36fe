//! Exponential backoff with jitter
//!
//! Implements in-place retry for transient provider errors, including the
//! extended cooldown that per-minute quotas need after a 429.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::constants;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first request
    pub max_retries: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum exponential delay between retries
    pub max_delay: Duration,
    /// Minimum wait after a rate-limited response when the provider gives no Retry-After
    pub rate_limit_cooldown: Duration,
    /// Whether to add random jitter to delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: constants::retry::MAX_RETRIES,
            initial_delay: constants::retry::INITIAL_DELAY,
            max_delay: constants::retry::MAX_DELAY,
            rate_limit_cooldown: constants::retry::RATE_LIMIT_COOLDOWN,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Base wait before retry number `attempt` (zero-based), without jitter
    ///
    /// Doubles from `initial_delay` up to `max_delay`. Rate-limited errors wait at
    /// least the provider's Retry-After, or `rate_limit_cooldown` when absent.
    pub fn delay_for<E: IsRetryable>(&self, attempt: u32, error: &E) -> Duration {
        let exponential = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);

        if error.is_rate_limited() {
            let floor = error.retry_after().unwrap_or(self.rate_limit_cooldown);
            exponential.max(floor)
        } else {
            exponential
        }
    }
}

/// Trait for errors that may be retryable
pub trait IsRetryable {
    /// Check if this error is retryable
    fn is_retryable(&self) -> bool;

    /// Get the retry-after duration if specified by the server
    fn retry_after(&self) -> Option<Duration>;

    /// Whether this error is a rate-limit rejection
    fn is_rate_limited(&self) -> bool {
        false
    }
}

/// Execute an async operation with retry logic
///
/// Uses exponential backoff with optional jitter. Respects Retry-After values
/// carried by the error. The applied wait never shrinks from one retry to the
/// next within a single call.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut previous_wait = Duration::ZERO;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                let wait = config.delay_for(attempt, &e);

                // Add jitter to prevent thundering herd
                let jittered = if config.jitter {
                    let jitter_ms = rand::thread_rng().gen_range(0..1000);
                    wait + Duration::from_millis(jitter_ms)
                } else {
                    wait
                };
                let applied = jittered.max(previous_wait);

                warn!(
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = applied.as_millis() as u64,
                    "Retrying after error: {}",
                    e
                );

                tokio::time::sleep(applied).await;
                previous_wait = applied;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Parse Retry-After header value
///
/// The header can be either:
/// - A number of seconds (e.g., "120")
/// - An HTTP date (e.g., "Wed, 21 Oct 2015 07:28:00 GMT")
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    if let Ok(seconds) = header_value.trim().parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    if let Ok(date) = httpdate::parse_http_date(header_value.trim()) {
        let now = std::time::SystemTime::now();
        if let Ok(duration) = date.duration_since(now) {
            return Some(duration);
        }
    }

    None
}
