use crate::error::StateStoreError;
use chrono::{DateTime, Utc};
use model::{
    core::identifiers::{CollectionKey, ItemId},
    pagination::page::PageIndex,
};

pub mod cursor;
pub mod last_request;
pub mod memory;
pub mod models;
pub mod sled_store;

pub use cursor::PageCursor;
pub use last_request::LastRequestTracker;
pub use models::CursorRecord;

/// Durable, process-wide paging state shared by every sync invocation.
///
/// Reads are local lookups and stay synchronous so they can run inside the
/// staleness predicate. Writers go through [`SyncStateStore::commit_page`],
/// which moves the cursor and the refresh timestamp together.
pub trait SyncStateStore: Send + Sync {
    fn load_cursor(&self, collection: &CollectionKey)
    -> Result<Option<CursorRecord>, StateStoreError>;

    /// Records a successful remote page fetch. `refreshed_at` is `Some` only
    /// for a page-0 fetch; otherwise the previous timestamp is kept.
    fn commit_page(
        &self,
        collection: &CollectionKey,
        page: PageIndex,
        refreshed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StateStoreError>;

    /// Overwrites only the refresh timestamp of a collection.
    fn record_refresh(
        &self,
        collection: &CollectionKey,
        at: DateTime<Utc>,
    ) -> Result<(), StateStoreError>;

    fn entity_refreshed_at(
        &self,
        namespace: &str,
        id: ItemId,
    ) -> Result<Option<DateTime<Utc>>, StateStoreError>;

    fn record_entity_refresh(
        &self,
        namespace: &str,
        id: ItemId,
        at: DateTime<Utc>,
    ) -> Result<(), StateStoreError>;

    fn last_page(&self, collection: &CollectionKey) -> Result<Option<PageIndex>, StateStoreError> {
        Ok(self
            .load_cursor(collection)?
            .and_then(|record| record.last_page))
    }

    fn last_refresh(
        &self,
        collection: &CollectionKey,
    ) -> Result<Option<DateTime<Utc>>, StateStoreError> {
        Ok(self
            .load_cursor(collection)?
            .and_then(|record| record.last_refresh))
    }
}

/// True when `at` is missing or strictly older than `max_age` relative to `now`.
pub fn is_older_than(
    at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    max_age: std::time::Duration,
) -> bool {
    match at {
        None => true,
        Some(at) => {
            let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
            now.signed_duration_since(at) > max_age
        }
    }
}
