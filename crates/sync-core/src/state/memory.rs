use crate::{
    error::StateStoreError,
    state::{SyncStateStore, models::CursorRecord},
};
use chrono::{DateTime, Utc};
use model::{
    core::identifiers::{CollectionKey, ItemId},
    pagination::page::PageIndex,
};
use std::{collections::HashMap, sync::RwLock};

/// In-process state store. Cursor and timestamp live in one record behind one
/// lock, so a commit is observed all at once.
#[derive(Debug, Default)]
pub struct MemorySyncState {
    cursors: RwLock<HashMap<CollectionKey, CursorRecord>>,
    entities: RwLock<HashMap<(String, ItemId), DateTime<Utc>>>,
}

impl MemorySyncState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a collection's state, e.g. to simulate an earlier run.
    pub fn seed(
        &self,
        collection: impl Into<CollectionKey>,
        last_page: Option<PageIndex>,
        last_refresh: Option<DateTime<Utc>>,
    ) -> Result<(), StateStoreError> {
        let mut cursors = self.cursors.write().map_err(|_| StateStoreError::Poisoned)?;
        cursors.insert(
            collection.into(),
            CursorRecord {
                last_page,
                last_refresh,
            },
        );
        Ok(())
    }
}

impl SyncStateStore for MemorySyncState {
    fn load_cursor(
        &self,
        collection: &CollectionKey,
    ) -> Result<Option<CursorRecord>, StateStoreError> {
        let cursors = self.cursors.read().map_err(|_| StateStoreError::Poisoned)?;
        Ok(cursors.get(collection).cloned())
    }

    fn commit_page(
        &self,
        collection: &CollectionKey,
        page: PageIndex,
        refreshed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StateStoreError> {
        let mut cursors = self.cursors.write().map_err(|_| StateStoreError::Poisoned)?;
        let previous = cursors.remove(collection);
        cursors.insert(
            collection.clone(),
            CursorRecord::committed(previous, page, refreshed_at),
        );
        Ok(())
    }

    fn record_refresh(
        &self,
        collection: &CollectionKey,
        at: DateTime<Utc>,
    ) -> Result<(), StateStoreError> {
        let mut cursors = self.cursors.write().map_err(|_| StateStoreError::Poisoned)?;
        cursors.entry(collection.clone()).or_default().last_refresh = Some(at);
        Ok(())
    }

    fn entity_refreshed_at(
        &self,
        namespace: &str,
        id: ItemId,
    ) -> Result<Option<DateTime<Utc>>, StateStoreError> {
        let entities = self.entities.read().map_err(|_| StateStoreError::Poisoned)?;
        Ok(entities.get(&(namespace.to_string(), id)).copied())
    }

    fn record_entity_refresh(
        &self,
        namespace: &str,
        id: ItemId,
        at: DateTime<Utc>,
    ) -> Result<(), StateStoreError> {
        let mut entities = self.entities.write().map_err(|_| StateStoreError::Poisoned)?;
        entities.insert((namespace.to_string(), id), at);
        Ok(())
    }
}
