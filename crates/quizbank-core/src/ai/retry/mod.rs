//! Retry policy for provider requests

mod backoff;

pub use backoff::{parse_retry_after, with_retry, IsRetryable, RetryConfig};
