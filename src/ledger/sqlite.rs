//! SQLite-backed event ledger.
//!
//! One table, keyed by the event id:
//!
//! ```sql
//! CREATE TABLE messages (
//!     message_id  TEXT PRIMARY KEY,
//!     recorded_at TEXT NOT NULL
//! )
//! ```
//!
//! The primary key is what makes `record` first-writer-wins: a second insert
//! of the same id fails with a constraint violation, surfaced as
//! [`LedgerError::Duplicate`].

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use super::{EventLedger, LedgerError};

/// SQLite implementation of [`EventLedger`].
#[derive(Debug)]
pub struct SqliteEventLedger {
    /// Path to the SQLite database file (`:memory:` for in-memory databases).
    pub db_path: PathBuf,
    /// Connection guarded by a mutex for thread safety.
    conn: Mutex<Connection>,
}

impl SqliteEventLedger {
    /// Open (or create) the ledger at `db_path`.
    ///
    /// Creates missing parent directories and the schema.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    log::warn!(
                        "Failed to create ledger directory {}: {}",
                        parent.display(),
                        e
                    );
                }
            }
        }

        let conn = Connection::open(&db_path)?;
        let ledger = Self {
            db_path,
            conn: Mutex::new(conn),
        };
        ledger.init_db()?;
        Ok(ledger)
    }

    /// A private in-memory database, mainly for tests.
    pub fn in_memory() -> Result<Self, LedgerError> {
        let ledger = Self {
            db_path: PathBuf::from(":memory:"),
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        ledger.init_db()?;
        Ok(ledger)
    }

    fn init_db(&self) -> Result<(), LedgerError> {
        let conn = self.lock()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                message_id TEXT PRIMARY KEY,
                recorded_at TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_messages_recorded_at
             ON messages(recorded_at)",
            [],
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, LedgerError> {
        self.conn
            .lock()
            .map_err(|e| LedgerError::Lock(e.to_string()))
    }

    fn record_at(&self, event_id: &str, at: DateTime<Utc>) -> Result<(), LedgerError> {
        let conn = self.lock()?;
        match conn.execute(
            "INSERT INTO messages (message_id, recorded_at) VALUES (?1, ?2)",
            params![event_id, timestamp(at)],
        ) {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(LedgerError::Duplicate {
                    event_id: event_id.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Fixed-width RFC 3339 so lexicographic order matches chronological order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl EventLedger for SqliteEventLedger {
    fn exists(&self, event_id: &str) -> Result<bool, LedgerError> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM messages WHERE message_id = ?1",
                params![event_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn record(&self, event_id: &str) -> Result<(), LedgerError> {
        self.record_at(event_id, Utc::now())
    }

    fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize, LedgerError> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM messages WHERE recorded_at < ?1",
            params![timestamp(cutoff)],
        )?;
        Ok(removed)
    }

    fn len(&self) -> Result<usize, LedgerError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
