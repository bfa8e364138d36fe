//! Bank dispenser
//!
//! Hands out one bank entry per call. An empty bank triggers a single refill
//! through the provider chain; if the bank is still empty afterwards the
//! category is unavailable for this run.

use std::fmt;

use anyhow::Result;
use tracing::{info, warn};

use super::sanitize::sanitize;
use crate::ai::{ChainOutcome, GenerationRequest, ProviderChain, StrategyFailure};
use crate::constants;
use crate::storage::{BankEntry, BankStore};

/// Why a category has nothing to hand out this run
#[derive(Debug, Clone, PartialEq)]
pub enum UnavailableReason {
    /// Every provider strategy failed
    ProvidersExhausted { failures: Vec<StrategyFailure> },
    /// A provider answered but the batch did not sanitize
    MalformedContent(String),
    /// The fresh batch was claimed by concurrent runs before this one
    Drained,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::ProvidersExhausted { failures } => {
                write!(f, "all {} provider strategies failed", failures.len())
            }
            UnavailableReason::MalformedContent(reason) => {
                write!(f, "generated content rejected: {}", reason)
            }
            UnavailableReason::Drained => write!(f, "refilled batch drained by another run"),
        }
    }
}

/// Result of one dispense call
#[derive(Debug, Clone, PartialEq)]
pub enum Dispensed {
    Item(BankEntry),
    Unavailable(UnavailableReason),
}

/// Result of one refill attempt
#[derive(Debug, Clone, PartialEq)]
pub enum RefillOutcome {
    Refilled { batch_id: String, count: usize },
    Failed(UnavailableReason),
}

/// Public entry point to the bank
pub struct BankDispenser<'a> {
    store: BankStore<'a>,
    chain: &'a ProviderChain,
    refill_size: usize,
    temperature: f32,
}

impl<'a> BankDispenser<'a> {
    pub fn new(store: BankStore<'a>, chain: &'a ProviderChain, refill_size: usize) -> Self {
        Self {
            store,
            chain,
            refill_size,
            temperature: constants::generation::TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn store(&self) -> &BankStore<'a> {
        &self.store
    }

    /// Return one unconsumed entry for `category`, refilling at most once
    ///
    /// Errors are storage failures only; provider and content failures come
    /// back as `Dispensed::Unavailable`.
    pub async fn dispense(&self, category: &str) -> Result<Dispensed> {
        if let Some(entry) = self.store.claim(category)? {
            return Ok(Dispensed::Item(entry));
        }

        info!(category, "bank empty, refilling");
        if let RefillOutcome::Failed(reason) = self.refill(category).await? {
            return Ok(Dispensed::Unavailable(reason));
        }

        match self.store.claim(category)? {
            Some(entry) => Ok(Dispensed::Item(entry)),
            None => {
                // Another run drained the fresh batch between our insert and claim
                warn!(category, "bank still empty after refill");
                Ok(Dispensed::Unavailable(UnavailableReason::Drained))
            }
        }
    }

    /// Generate one batch for `category` and append it to the bank
    pub async fn refill(&self, category: &str) -> Result<RefillOutcome> {
        let request =
            GenerationRequest::new(category, self.refill_size).with_temperature(self.temperature);

        let text = match self.chain.walk(&request).await {
            ChainOutcome::Generated { text, .. } => text,
            ChainOutcome::Exhausted { failures } => {
                warn!(category, "refill failed: providers exhausted");
                return Ok(RefillOutcome::Failed(
                    UnavailableReason::ProvidersExhausted { failures },
                ));
            }
        };

        let items = match sanitize(&text) {
            Ok(items) => items,
            Err(e) => {
                warn!(category, "refill discarded: {}", e);
                return Ok(RefillOutcome::Failed(UnavailableReason::MalformedContent(
                    e.to_string(),
                )));
            }
        };

        let batch_id = self.store.insert_batch(category, &items)?;
        Ok(RefillOutcome::Refilled {
            batch_id,
            count: items.len(),
        })
    }
}
