use std::sync::RwLock;

use chrono::Utc;
use lodestar_protocol::HistoryEntry;
use thiserror::Error;
use tracing::warn;

/// Returned when the store is unusable because a writer panicked while
/// holding the lock.
#[derive(Debug, Error)]
#[error("History is unavailable")]
pub struct HistoryUnavailable;

/// In-memory record of completed research operations, newest first.
///
/// History lives only as long as the process; there is deliberately no
/// persistent storage behind it.
#[derive(Debug, Default)]
pub struct HistoryStore {
    entries: RwLock<Vec<HistoryEntry>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed research operation
    pub fn record(&self, query: &str, report: &str) {
        let entry = HistoryEntry {
            query: query.to_string(),
            report: report.to_string(),
            timestamp: Utc::now(),
        };

        match self.entries.write() {
            Ok(mut entries) => entries.insert(0, entry),
            Err(_) => warn!("history lock poisoned, entry dropped"),
        }
    }

    /// Snapshot of all entries, newest first
    pub fn entries(&self) -> Result<Vec<HistoryEntry>, HistoryUnavailable> {
        self.entries
            .read()
            .map(|entries| entries.clone())
            .map_err(|_| HistoryUnavailable)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
