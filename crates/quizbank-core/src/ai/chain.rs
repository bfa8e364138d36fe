//! Provider chain walker
//!
//! Tries each strategy in order until one produces text. Local retries live in
//! the executor; moving on to the next strategy is decided here.

use tracing::{info, warn};

use super::executor::{AttemptOutcome, RequestExecutor};
use super::prompt::GenerationRequest;
use super::strategy::ProviderStrategy;

/// A strategy that was abandoned, and why
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyFailure {
    pub strategy: ProviderStrategy,
    pub outcome: AttemptOutcome,
}

/// Result of walking the whole chain for one request
#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutcome {
    /// Raw provider text from the first strategy that succeeded
    Generated {
        text: String,
        strategy: ProviderStrategy,
    },
    /// Every strategy failed; a soft failure for this category this run
    Exhausted { failures: Vec<StrategyFailure> },
}

impl ChainOutcome {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, ChainOutcome::Exhausted { .. })
    }
}

/// Ordered fallback across provider strategies
pub struct ProviderChain {
    executor: RequestExecutor,
    strategies: Vec<ProviderStrategy>,
}

impl ProviderChain {
    pub fn new(executor: RequestExecutor, strategies: Vec<ProviderStrategy>) -> Self {
        Self {
            executor,
            strategies,
        }
    }

    /// Walk the strategies in order and return the first generated text
    pub async fn walk(&self, request: &GenerationRequest) -> ChainOutcome {
        let mut failures = Vec::new();

        for strategy in &self.strategies {
            let mut attempted = strategy.clone();
            let mut outcome = self.executor.execute(&attempted, request).await;

            // Some endpoints reject JSON mode outright; the same model in plain
            // text mode is still worth one try.
            if attempted.structured_output && outcome.rejects_structured_output() {
                info!(
                    strategy = %attempted,
                    "structured output unsupported, retrying in plain-text mode"
                );
                attempted = attempted.without_structured_output();
                outcome = self.executor.execute(&attempted, request).await;
            }

            match outcome {
                AttemptOutcome::Success(text) => {
                    info!(
                        strategy = %attempted,
                        category = %request.category,
                        abandoned = failures.len(),
                        "generation succeeded"
                    );
                    return ChainOutcome::Generated {
                        text,
                        strategy: attempted,
                    };
                }
                outcome => {
                    warn!(
                        strategy = %attempted,
                        category = %request.category,
                        "abandoning strategy: {}",
                        outcome
                    );
                    failures.push(StrategyFailure {
                        strategy: attempted,
                        outcome,
                    });
                }
            }
        }

        warn!(
            category = %request.category,
            strategies = self.strategies.len(),
            "all provider strategies exhausted"
        );
        ChainOutcome::Exhausted { failures }
    }
}
