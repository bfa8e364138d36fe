//! Tests for the bank dispenser
//!
//! These tests verify that:
//! - An empty bank is refilled once and the first fresh item is handed out
//! - Later calls are served from the bank without touching the provider
//! - A failing chain yields `Unavailable` after exactly one refill attempt
//! - Malformed batches never reach the bank

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use super::dispenser::{BankDispenser, Dispensed, RefillOutcome, UnavailableReason};
use crate::ai::testing::{fenced_batch, ScriptedBackend};
use crate::ai::{ProviderChain, ProviderError, ProviderStrategy, RequestExecutor, RetryConfig};
use crate::storage::{BankStore, Database};

/// Helper to create a temporary database for testing
fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let db = Database::new(&db_path).expect("Failed to create database");
    (db, temp_dir)
}

fn chain(backend: Arc<ScriptedBackend>, models: &[&str]) -> ProviderChain {
    let retry = RetryConfig {
        max_retries: 1,
        initial_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(4),
        rate_limit_cooldown: Duration::from_secs(60),
        jitter: false,
    };
    let strategies = models
        .iter()
        .map(|m| ProviderStrategy::new("v1beta", m, true))
        .collect();
    ProviderChain::new(RequestExecutor::new(backend, retry), strategies)
}

fn expect_item(dispensed: Dispensed) -> crate::storage::BankEntry {
    match dispensed {
        Dispensed::Item(entry) => entry,
        Dispensed::Unavailable(reason) => panic!("expected an item, got {}", reason),
    }
}

#[tokio::test(start_paused = true)]
async fn test_empty_bank_refills_then_serves_from_cache() {
    let (db, _temp) = create_test_db();
    let backend = Arc::new(ScriptedBackend::new());
    backend.push("flash", Ok(fenced_batch(10)));
    let chain = chain(backend.clone(), &["flash"]);
    let dispenser = BankDispenser::new(BankStore::new(&db), &chain, 10);

    let first = expect_item(dispenser.dispense("X").await.expect("dispense"));
    assert_eq!(first.item.text(), "Question 1?");
    assert_eq!(first.category, "X");
    assert_eq!(dispenser.store().count_unconsumed("X").expect("count"), 9);

    let second = expect_item(dispenser.dispense("X").await.expect("dispense"));
    assert_ne!(second.id, first.id);
    assert_ne!(second.item, first.item);
    assert_eq!(backend.call_count(), 1, "second dispense must not call the provider");
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_chain_is_unavailable_after_one_refill() {
    let (db, _temp) = create_test_db();
    let backend = Arc::new(ScriptedBackend::new());
    backend.set_fallback("a", ProviderError::NotFound("a".into()));
    backend.set_fallback("b", ProviderError::NotFound("b".into()));
    let chain = chain(backend.clone(), &["a", "b"]);
    let dispenser = BankDispenser::new(BankStore::new(&db), &chain, 10);

    let dispensed = dispenser.dispense("X").await.expect("dispense");

    match dispensed {
        Dispensed::Unavailable(UnavailableReason::ProvidersExhausted { failures }) => {
            assert_eq!(failures.len(), 2);
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
    // One walk of the chain: each strategy tried once
    assert_eq!(backend.models_called(), vec!["a", "b"]);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_batch_is_not_cached() {
    let (db, _temp) = create_test_db();
    let backend = Arc::new(ScriptedBackend::new());
    backend.push(
        "flash",
        Ok(r#"```json
[{"question": "Q?", "options": ["a", "b"], "correctIndex": 0}]
```"#
            .into()),
    );
    let chain = chain(backend.clone(), &["flash"]);
    let dispenser = BankDispenser::new(BankStore::new(&db), &chain, 10);

    let dispensed = dispenser.dispense("X").await.expect("dispense");

    assert!(matches!(
        dispensed,
        Dispensed::Unavailable(UnavailableReason::MalformedContent(_))
    ));
    assert_eq!(dispenser.store().count_unconsumed("X").expect("count"), 0);
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_refill_grows_bank_by_batch_size() {
    let (db, _temp) = create_test_db();
    let backend = Arc::new(ScriptedBackend::new());
    backend.push("flash", Ok(fenced_batch(10)));
    backend.push("flash", Ok(fenced_batch(10)));
    let chain = chain(backend, &["flash"]);
    let dispenser = BankDispenser::new(BankStore::new(&db), &chain, 10);

    for expected in [10, 20] {
        match dispenser.refill("X").await.expect("refill") {
            RefillOutcome::Refilled { count, .. } => assert_eq!(count, 10),
            other => panic!("expected refill, got {:?}", other),
        }
        // Identical batches are kept, not deduplicated
        assert_eq!(dispenser.store().count_unconsumed("X").expect("count"), expected);
    }
}

#[tokio::test(start_paused = true)]
async fn test_categories_do_not_share_stock() {
    let (db, _temp) = create_test_db();
    let backend = Arc::new(ScriptedBackend::new());
    backend.push("flash", Ok(fenced_batch(3)));
    backend.push("flash", Ok(fenced_batch(3)));
    let chain = chain(backend.clone(), &["flash"]);
    let dispenser = BankDispenser::new(BankStore::new(&db), &chain, 3);

    expect_item(dispenser.dispense("X").await.expect("dispense"));
    expect_item(dispenser.dispense("Y").await.expect("dispense"));

    assert_eq!(backend.call_count(), 2);
    assert_eq!(dispenser.store().count_unconsumed("X").expect("count"), 2);
    assert_eq!(dispenser.store().count_unconsumed("Y").expect("count"), 2);
}
