//! Content generation layer
//!
//! Talks to the text-generation provider. Strategies are walked in order by
//! the chain; each strategy attempt goes through the executor, which owns
//! local retries and outcome classification.

pub mod backend;
pub mod chain;
pub mod executor;
pub mod gemini;
pub mod prompt;
pub mod retry;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{GenerationBackend, ProviderError};
pub use chain::{ChainOutcome, ProviderChain, StrategyFailure};
pub use executor::{AttemptOutcome, RequestExecutor};
pub use gemini::GeminiClient;
pub use prompt::GenerationRequest;
pub use retry::RetryConfig;
pub use strategy::{default_strategies, ProviderStrategy};
