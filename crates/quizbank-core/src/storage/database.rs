//! SQLite database wrapper with versioned migrations

use anyhow::Result;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use tracing::info;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// SQLite database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at the given path
    pub fn new(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Wait for the write lock instead of failing immediately
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        // Overlapping scheduled runs share this file; WAL lets readers proceed
        // while a claim holds the write lock.
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Get the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Get the current schema version from database
    pub(crate) fn get_schema_version(&self) -> i32 {
        if let Err(e) = self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        ) {
            tracing::warn!("Failed to create schema_version table: {}", e);
            return 0;
        }

        self.conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0)
    }

    /// Set schema version after successful migration
    fn set_schema_version(&self, version: i32) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
        Ok(())
    }

    /// Run database migrations incrementally
    ///
    /// Runs under an IMMEDIATE transaction so processes opening the same file
    /// at once apply each migration exactly once; the version is read after
    /// the write lock is held.
    pub(crate) fn run_migrations(&self) -> Result<()> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;

        let current_version = self.get_schema_version();
        info!(
            "Bank schema version: {} (target: {})",
            current_version, SCHEMA_VERSION
        );

        if current_version >= SCHEMA_VERSION {
            tx.commit()?;
            return Ok(());
        }

        // Migration 1: Question bank
        if current_version < 1 {
            info!("Running migration 1: bank_entries table");
            tx.execute_batch(
                r#"
                -- One row per generated question. Rows are appended by refills,
                -- flipped to consumed exactly once by a claim, never deleted.
                CREATE TABLE IF NOT EXISTS bank_entries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    category TEXT NOT NULL,
                    item TEXT NOT NULL,
                    batch_id TEXT NOT NULL,
                    consumed INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    consumed_at TEXT
                );

                -- Claim lookups filter on (category, consumed)
                CREATE INDEX IF NOT EXISTS idx_bank_entries_available
                    ON bank_entries(category, consumed);

                CREATE INDEX IF NOT EXISTS idx_bank_entries_batch
                    ON bank_entries(batch_id);
                "#,
            )?;
            self.set_schema_version(1)?;
        }

        tx.commit()?;
        info!("Migrations complete");
        Ok(())
    }
}
