use crate::error::StateStoreError;
use model::{
    core::identifiers::{CollectionKey, ItemId},
    pagination::page::{CollectionPage, PageIndex},
};

pub mod memory;
pub mod sled_cache;

pub use memory::{MemoryPageCache, MemoryRecordCache};
pub use sled_cache::SledCache;

/// Local cache of collection pages.
pub trait PageCache: Send + Sync {
    fn page(
        &self,
        collection: &CollectionKey,
        index: PageIndex,
    ) -> Result<Option<CollectionPage>, StateStoreError>;

    /// Stores a freshly fetched page. Storing page 0 drops every other cached
    /// page of the collection, since a head refresh restarts paging.
    fn store_page(
        &self,
        collection: &CollectionKey,
        page: &CollectionPage,
    ) -> Result<(), StateStoreError>;

    fn page_count(&self, collection: &CollectionKey) -> Result<usize, StateStoreError>;
}

/// Local cache of secondary records (details, images, ...) keyed by namespace and item.
pub trait RecordCache: Send + Sync {
    fn get(
        &self,
        namespace: &str,
        id: ItemId,
    ) -> Result<Option<serde_json::Value>, StateStoreError>;

    fn put(
        &self,
        namespace: &str,
        id: ItemId,
        value: &serde_json::Value,
    ) -> Result<(), StateStoreError>;
}
