//! Quizbank Core - content acquisition and question bank
//!
//! This crate provides the pieces behind a daily quiz run:
//! - Ordered fallback across generation provider strategies
//! - Retry with backoff for transient provider failures
//! - Sanitizing noisy provider text into validated questions
//! - A persistent SQLite bank that dispenses each question at most once

pub mod ai;
pub mod bank;
pub mod config;
pub mod constants;
pub mod paths;
pub mod run;
pub mod storage;

// Re-exports for convenience
pub use ai::{GeminiClient, GenerationBackend, ProviderChain, ProviderStrategy, RequestExecutor};
pub use bank::{BankDispenser, Dispensed, GeneratedItem, UnavailableReason};
pub use config::QuizbankConfig;
pub use run::{run_batch, Delivery, RunReport};
pub use storage::{BankEntry, BankStore, Database};
