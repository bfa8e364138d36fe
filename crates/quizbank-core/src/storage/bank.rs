//! Question bank storage
//!
//! Append-only store of generated questions with a consumed flag. `claim` is
//! the only way an entry leaves the bank and it is a single conditional
//! update, so concurrent runs never receive the same entry.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Transaction, TransactionBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use super::database::Database;
use crate::bank::GeneratedItem;

/// A stored question and its consumption state
#[derive(Debug, Clone, PartialEq)]
pub struct BankEntry {
    pub id: i64,
    pub category: String,
    pub item: GeneratedItem,
    pub batch_id: String,
    pub consumed: bool,
    pub created_at: String,
    pub consumed_at: Option<String>,
}

/// Per-category bank counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryStock {
    pub category: String,
    pub unconsumed: u64,
    pub consumed: u64,
}

/// Bank store over a database handle
pub struct BankStore<'a> {
    db: &'a Database,
}

impl<'a> BankStore<'a> {
    /// Create a new bank store with database reference
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Atomically take one unconsumed entry for `category`
    ///
    /// The select and the flag flip are one statement guarded by
    /// `consumed = 0`, run under an IMMEDIATE transaction so a second process
    /// waits on the write lock rather than racing on a stale snapshot.
    pub fn claim(&self, category: &str) -> Result<Option<BankEntry>> {
        let now = Utc::now().to_rfc3339();
        let tx = Transaction::new_unchecked(self.db.conn(), TransactionBehavior::Immediate)?;

        let row = tx
            .query_row(
                "UPDATE bank_entries SET consumed = 1, consumed_at = ?2
                 WHERE id = (
                     SELECT id FROM bank_entries
                     WHERE category = ?1 AND consumed = 0
                     ORDER BY id LIMIT 1
                 )
                 AND consumed = 0
                 RETURNING id, category, item, batch_id, created_at, consumed_at",
                params![category, now],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                },
            )
            .optional()?;
        tx.commit()?;

        let Some((id, category, item_json, batch_id, created_at, consumed_at)) = row else {
            debug!(category, "bank empty");
            return Ok(None);
        };

        let item: GeneratedItem = serde_json::from_str(&item_json)
            .with_context(|| format!("bank entry {} holds an invalid item", id))?;

        Ok(Some(BankEntry {
            id,
            category,
            item,
            batch_id,
            consumed: true,
            created_at,
            consumed_at,
        }))
    }

    /// Append a refill batch as unconsumed entries
    ///
    /// Never deduplicates against existing entries. Returns the batch id.
    pub fn insert_batch(&self, category: &str, items: &[GeneratedItem]) -> Result<String> {
        let batch_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let tx = Transaction::new_unchecked(self.db.conn(), TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO bank_entries (category, item, batch_id, consumed, created_at)
                 VALUES (?1, ?2, ?3, 0, ?4)",
            )?;
            for item in items {
                let item_json = serde_json::to_string(item)?;
                stmt.execute(params![category, item_json, batch_id, now])?;
            }
        }
        tx.commit()?;

        info!(category, batch_id = %batch_id, count = items.len(), "bank refilled");
        Ok(batch_id)
    }

    /// Number of entries still available for `category`
    pub fn count_unconsumed(&self, category: &str) -> Result<u64> {
        let count: i64 = self.db.conn().query_row(
            "SELECT COUNT(*) FROM bank_entries WHERE category = ?1 AND consumed = 0",
            [category],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Counts for every category that has ever been refilled
    pub fn stock(&self) -> Result<Vec<CategoryStock>> {
        let mut stmt = self.db.conn().prepare(
            "SELECT category,
                    SUM(CASE WHEN consumed = 0 THEN 1 ELSE 0 END),
                    SUM(CASE WHEN consumed = 1 THEN 1 ELSE 0 END)
             FROM bank_entries
             GROUP BY category
             ORDER BY category",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(CategoryStock {
                category: row.get(0)?,
                unconsumed: row.get::<_, i64>(1)? as u64,
                consumed: row.get::<_, i64>(2)? as u64,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::{Arc, Barrier};

    use tempfile::TempDir;

    use super::*;

    /// Helper to create a temporary database for testing
    fn create_test_db() -> (Database, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let db = Database::new(&db_path).expect("Failed to create database");
        (db, temp_dir)
    }

    fn item(n: usize) -> GeneratedItem {
        GeneratedItem::new(
            format!("Question {}?", n),
            ["a", "b", "c", "d"].map(String::from),
            n % 4,
            String::new(),
            "General".into(),
        )
        .expect("valid item")
    }

    fn items(count: usize) -> Vec<GeneratedItem> {
        (0..count).map(item).collect()
    }

    #[test]
    fn test_claim_on_empty_bank() {
        let (db, _temp) = create_test_db();
        let store = BankStore::new(&db);
        assert!(store.claim("CKA").expect("claim").is_none());
    }

    #[test]
    fn test_claim_marks_consumed_in_insertion_order() {
        let (db, _temp) = create_test_db();
        let store = BankStore::new(&db);
        store.insert_batch("CKA", &items(3)).expect("insert");

        let first = store.claim("CKA").expect("claim").expect("entry");
        assert!(first.consumed);
        assert!(first.consumed_at.is_some());
        assert_eq!(first.item.text(), "Question 0?");
        assert_eq!(store.count_unconsumed("CKA").expect("count"), 2);

        let second = store.claim("CKA").expect("claim").expect("entry");
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_claim_respects_category() {
        let (db, _temp) = create_test_db();
        let store = BankStore::new(&db);
        store.insert_batch("CKA", &items(1)).expect("insert");

        assert!(store.claim("AZ-900").expect("claim").is_none());
        assert!(store.claim("CKA").expect("claim").is_some());
        assert!(store.claim("CKA").expect("claim").is_none());
    }

    #[test]
    fn test_insert_batch_never_deduplicates() {
        let (db, _temp) = create_test_db();
        let store = BankStore::new(&db);

        let first = store.insert_batch("CKA", &items(4)).expect("insert");
        let before = store.count_unconsumed("CKA").expect("count");
        let second = store.insert_batch("CKA", &items(4)).expect("insert");

        assert_ne!(first, second);
        assert_eq!(store.count_unconsumed("CKA").expect("count"), before + 4);
    }

    #[test]
    fn test_stock_reports_both_states() {
        let (db, _temp) = create_test_db();
        let store = BankStore::new(&db);
        store.insert_batch("CKA", &items(3)).expect("insert");
        store.insert_batch("AZ-900", &items(2)).expect("insert");
        store.claim("CKA").expect("claim");

        let stock = store.stock().expect("stock");
        assert_eq!(
            stock,
            vec![
                CategoryStock {
                    category: "AZ-900".into(),
                    unconsumed: 2,
                    consumed: 0
                },
                CategoryStock {
                    category: "CKA".into(),
                    unconsumed: 2,
                    consumed: 1
                },
            ]
        );
    }

    #[test]
    fn test_sequential_claims_never_exceed_stock() {
        let (db, _temp) = create_test_db();
        let store = BankStore::new(&db);
        store.insert_batch("CKA", &items(5)).expect("insert");

        let claimed: Vec<i64> = (0..8)
            .filter_map(|_| store.claim("CKA").expect("claim"))
            .map(|e| e.id)
            .collect();

        assert_eq!(claimed.len(), 5);
        assert_eq!(claimed.iter().collect::<HashSet<_>>().len(), 5);
    }

    #[test]
    fn test_concurrent_claims_are_at_most_once() {
        const STOCK: usize = 40;
        const WORKERS: usize = 4;
        const CLAIMS_PER_WORKER: usize = 15;

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("shared.db");
        {
            let db = Database::new(&db_path).expect("Failed to create database");
            BankStore::new(&db)
                .insert_batch("CKA", &items(STOCK))
                .expect("insert");
        }

        let barrier = Arc::new(Barrier::new(WORKERS));
        let handles: Vec<_> = (0..WORKERS)
            .map(|_| {
                let path = db_path.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    // Separate connection per worker, like separate processes
                    let db = Database::new(&path).expect("Failed to open database");
                    let store = BankStore::new(&db);
                    barrier.wait();
                    (0..CLAIMS_PER_WORKER)
                        .filter_map(|_| store.claim("CKA").expect("claim"))
                        .map(|e| e.id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let all: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("worker panicked"))
            .collect();
        let unique: HashSet<i64> = all.iter().copied().collect();

        assert_eq!(all.len(), STOCK);
        assert_eq!(unique.len(), STOCK);
    }
}
