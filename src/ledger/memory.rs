//! In-memory event ledger backed by a `DashMap`.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{EventLedger, LedgerError};

/// Process-local [`EventLedger`]. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryEventLedger {
    records: DashMap<String, DateTime<Utc>>,
}

impl InMemoryEventLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventLedger for InMemoryEventLedger {
    fn exists(&self, event_id: &str) -> Result<bool, LedgerError> {
        Ok(self.records.contains_key(event_id))
    }

    fn record(&self, event_id: &str) -> Result<(), LedgerError> {
        match self.records.entry(event_id.to_string()) {
            Entry::Occupied(_) => Err(LedgerError::Duplicate {
                event_id: event_id.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Utc::now());
                Ok(())
            }
        }
    }

    fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize, LedgerError> {
        let before = self.records.len();
        self.records.retain(|_, recorded_at| *recorded_at >= cutoff);
        Ok(before.saturating_sub(self.records.len()))
    }

    fn len(&self) -> Result<usize, LedgerError> {
        Ok(self.records.len())
    }
}
