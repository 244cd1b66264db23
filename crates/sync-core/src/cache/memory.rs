use crate::{
    cache::{PageCache, RecordCache},
    error::StateStoreError,
};
use model::{
    core::identifiers::{CollectionKey, ItemId},
    pagination::page::{CollectionPage, PageIndex},
};
use std::{
    collections::{BTreeMap, HashMap},
    sync::RwLock,
};

#[derive(Debug, Default)]
pub struct MemoryPageCache {
    pages: RwLock<HashMap<CollectionKey, BTreeMap<PageIndex, CollectionPage>>>,
}

impl MemoryPageCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PageCache for MemoryPageCache {
    fn page(
        &self,
        collection: &CollectionKey,
        index: PageIndex,
    ) -> Result<Option<CollectionPage>, StateStoreError> {
        let pages = self.pages.read().map_err(|_| StateStoreError::Poisoned)?;
        Ok(pages
            .get(collection)
            .and_then(|by_index| by_index.get(&index))
            .cloned())
    }

    fn store_page(
        &self,
        collection: &CollectionKey,
        page: &CollectionPage,
    ) -> Result<(), StateStoreError> {
        let mut pages = self.pages.write().map_err(|_| StateStoreError::Poisoned)?;
        let by_index = pages.entry(collection.clone()).or_default();
        if page.is_first() {
            by_index.clear();
        }
        by_index.insert(page.index, page.clone());
        Ok(())
    }

    fn page_count(&self, collection: &CollectionKey) -> Result<usize, StateStoreError> {
        let pages = self.pages.read().map_err(|_| StateStoreError::Poisoned)?;
        Ok(pages.get(collection).map(BTreeMap::len).unwrap_or(0))
    }
}

#[derive(Debug, Default)]
pub struct MemoryRecordCache {
    records: RwLock<HashMap<(String, ItemId), serde_json::Value>>,
}

impl MemoryRecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordCache for MemoryRecordCache {
    fn get(
        &self,
        namespace: &str,
        id: ItemId,
    ) -> Result<Option<serde_json::Value>, StateStoreError> {
        let records = self.records.read().map_err(|_| StateStoreError::Poisoned)?;
        Ok(records.get(&(namespace.to_string(), id)).cloned())
    }

    fn put(
        &self,
        namespace: &str,
        id: ItemId,
        value: &serde_json::Value,
    ) -> Result<(), StateStoreError> {
        let mut records = self.records.write().map_err(|_| StateStoreError::Poisoned)?;
        records.insert((namespace.to_string(), id), value.clone());
        Ok(())
    }
}
