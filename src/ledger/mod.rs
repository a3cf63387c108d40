//! Event ledger: the durable set of already-handled inbound event ids.
//!
//! The chat transport delivers at least once; the dispatcher records each
//! event id before any side effect so a redelivered event is dropped instead
//! of invoking a capability twice.
//!
//! Provides the `EventLedger` trait plus two backends:
//! - [`SqliteEventLedger`]: durable, keyed by a primary-key column
//! - [`InMemoryEventLedger`]: process-local, for tests and ephemeral runs

pub mod memory;
pub mod sqlite;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use memory::InMemoryEventLedger;
pub use sqlite::SqliteEventLedger;

/// Errors raised by a ledger backend.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The event id is already recorded. First writer wins.
    #[error("event '{event_id}' is already recorded")]
    Duplicate { event_id: String },

    /// Underlying SQLite failure.
    #[error("ledger storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection lock poisoned.
    #[error("failed to acquire ledger lock: {0}")]
    Lock(String),
}

/// Persistent set of handled event ids.
///
/// `record` must be atomic with respect to concurrent callers: of any number
/// of racing `record` calls for one id exactly one succeeds and the rest get
/// [`LedgerError::Duplicate`].
pub trait EventLedger: Send + Sync + std::fmt::Debug {
    /// Whether `event_id` has been recorded.
    fn exists(&self, event_id: &str) -> Result<bool, LedgerError>;

    /// Record `event_id` as handled.
    fn record(&self, event_id: &str) -> Result<(), LedgerError>;

    /// Delete records older than `cutoff`, returning how many were removed.
    fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize, LedgerError>;

    /// Number of recorded events.
    fn len(&self) -> Result<usize, LedgerError>;

    fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }
}

/// Drop every record older than `retention`, on the blocking pool.
pub async fn prune_expired(
    ledger: Arc<dyn EventLedger>,
    retention: chrono::Duration,
) -> Result<usize, LedgerError> {
    let cutoff = Utc::now() - retention;
    match tokio::task::spawn_blocking(move || ledger.prune_before(cutoff)).await {
        Ok(result) => result,
        Err(e) => Err(LedgerError::Lock(format!("prune task failed: {}", e))),
    }
}

/// Prune on a fixed period until the task is aborted.
pub async fn run_retention(
    ledger: Arc<dyn EventLedger>,
    retention: chrono::Duration,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        match prune_expired(Arc::clone(&ledger), retention).await {
            Ok(0) => {}
            Ok(removed) => log::info!("Pruned {} expired ledger records", removed),
            Err(e) => log::warn!("Ledger pruning failed: {}", e),
        }
    }
}
