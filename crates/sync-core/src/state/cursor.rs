use crate::{error::StateStoreError, state::SyncStateStore};
use model::{core::identifiers::CollectionKey, pagination::page::PageIndex};
use std::sync::Arc;

/// Read view of the last successfully fetched page of one collection.
/// Only the collection store moves it, through [`SyncStateStore::commit_page`].
#[derive(Clone)]
pub struct PageCursor {
    store: Arc<dyn SyncStateStore>,
    collection: CollectionKey,
}

impl PageCursor {
    pub fn new(store: Arc<dyn SyncStateStore>, collection: CollectionKey) -> Self {
        Self { store, collection }
    }

    pub fn collection(&self) -> &CollectionKey {
        &self.collection
    }

    /// `None` until the first page has been fetched.
    pub fn get_last_page(&self) -> Result<Option<PageIndex>, StateStoreError> {
        self.store.last_page(&self.collection)
    }
}
