//! Tracking of message ids that already produced a CRM deal.

use std::collections::HashSet;

use log::{debug, error, info};

use crate::store::{ProcessedStore, StoreError};

use super::parser::canonical_message_id;

/// Remembers which message ids have been turned into deals.
///
/// The durable store is read once when the tracker is opened; afterwards the
/// in-memory set answers every query and new ids are appended to the store.
/// Ids are compared in their bracketed form, so `abc@x` and `<abc@x>` are
/// the same message.
pub struct MessageTracker {
    processed: HashSet<String>,
    store: Box<dyn ProcessedStore>,
}

impl MessageTracker {
    /// Loads the store into memory.
    pub fn open(mut store: Box<dyn ProcessedStore>) -> Result<Self, StoreError> {
        let processed: HashSet<String> = store
            .load()?
            .iter()
            .map(|id| canonical_message_id(id))
            .collect();
        info!(
            "Loaded {} processed message ids from {}",
            processed.len(),
            store.location()
        );
        Ok(Self { processed, store })
    }

    /// Checks if a message id has been processed.
    pub fn has(&self, message_id: &str) -> bool {
        self.processed.contains(&canonical_message_id(message_id))
    }

    /// Records a message id as processed.
    ///
    /// Idempotent. A failed durable write is logged and otherwise ignored: the
    /// in-memory entry still blocks duplicates for the rest of this run.
    pub fn mark_processed(&mut self, message_id: &str) {
        let message_id = canonical_message_id(message_id);
        if !self.processed.insert(message_id.clone()) {
            debug!("Message {} already marked as processed", message_id);
            return;
        }

        match self.store.append(&message_id) {
            Ok(()) => debug!("Marked message {} as processed", message_id),
            Err(e) => error!(
                "Failed to persist processed message {} to {}: {}",
                message_id,
                self.store.location(),
                e
            ),
        }
    }

    /// Number of ids known to this run.
    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }

    /// Gets statistics for this tracker.
    pub fn stats(&self) -> TrackerStats {
        let persisted = match self.store.persisted_count() {
            Ok(count) => Some(count),
            Err(e) => {
                error!("Failed to count processed messages: {}", e);
                None
            }
        };

        TrackerStats {
            location: self.store.location(),
            known: self.processed.len(),
            persisted,
        }
    }
}

/// Statistics about processed messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerStats {
    /// Where the durable store lives.
    pub location: String,
    /// Ids held in memory.
    pub known: usize,
    /// Ids in the durable store, if it could be counted.
    pub persisted: Option<u64>,
}
