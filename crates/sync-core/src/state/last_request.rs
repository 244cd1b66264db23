use crate::{
    clock::Clock,
    error::StateStoreError,
    state::{SyncStateStore, is_older_than},
};
use chrono::{DateTime, Utc};
use model::core::identifiers::CollectionKey;
use std::{sync::Arc, time::Duration};
use tracing::warn;

/// Tracks when page 0 of a collection was last fetched from the remote.
#[derive(Clone)]
pub struct LastRequestTracker {
    store: Arc<dyn SyncStateStore>,
    collection: CollectionKey,
    clock: Arc<dyn Clock>,
}

impl LastRequestTracker {
    pub fn new(
        store: Arc<dyn SyncStateStore>,
        collection: CollectionKey,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            collection,
            clock,
        }
    }

    pub fn last_refresh(&self) -> Result<Option<DateTime<Utc>>, StateStoreError> {
        self.store.last_refresh(&self.collection)
    }

    /// True if no refresh was ever recorded or the last one is older than `max_age`.
    /// An unreadable timestamp counts as expired.
    pub fn is_expired(&self, max_age: Duration) -> bool {
        match self.last_refresh() {
            Ok(at) => is_older_than(at, self.clock.now(), max_age),
            Err(err) => {
                warn!(collection = %self.collection, error = %err, "Could not read last refresh time, treating as expired");
                true
            }
        }
    }

    pub fn record_success(&self, now: DateTime<Utc>) -> Result<(), StateStoreError> {
        self.store.record_refresh(&self.collection, now)
    }
}
