use crate::{
    cache::{PageCache, RecordCache},
    error::StateStoreError,
};
use model::{
    core::identifiers::{CollectionKey, ItemId},
    pagination::page::{CollectionPage, PageIndex},
};

/// Sled-backed page and record cache, one tree each.
#[derive(Clone)]
pub struct SledCache {
    pages: sled::Tree,
    records: sled::Tree,
}

impl SledCache {
    pub fn new(db: &sled::Db) -> Result<Self, StateStoreError> {
        Ok(Self {
            pages: db.open_tree("pages")?,
            records: db.open_tree("records")?,
        })
    }

    #[inline]
    fn page_prefix(collection: &CollectionKey) -> String {
        format!("{}\0", collection)
    }

    #[inline]
    fn page_key(collection: &CollectionKey, index: PageIndex) -> String {
        // Zero padded so keys sort by page index.
        format!("{}{:010}", Self::page_prefix(collection), index)
    }

    #[inline]
    fn record_key(namespace: &str, id: ItemId) -> String {
        format!("{}\0{}", namespace, id)
    }
}

impl PageCache for SledCache {
    fn page(
        &self,
        collection: &CollectionKey,
        index: PageIndex,
    ) -> Result<Option<CollectionPage>, StateStoreError> {
        match self.pages.get(Self::page_key(collection, index))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn store_page(
        &self,
        collection: &CollectionKey,
        page: &CollectionPage,
    ) -> Result<(), StateStoreError> {
        let mut batch = sled::Batch::default();

        if page.is_first() {
            for entry in self.pages.scan_prefix(Self::page_prefix(collection)) {
                let (key, _) = entry?;
                batch.remove(key);
            }
        }

        batch.insert(
            Self::page_key(collection, page.index).as_bytes(),
            bincode::serialize(page)?,
        );
        self.pages.apply_batch(batch)?;
        Ok(())
    }

    fn page_count(&self, collection: &CollectionKey) -> Result<usize, StateStoreError> {
        let mut count = 0;
        for entry in self.pages.scan_prefix(Self::page_prefix(collection)) {
            entry?;
            count += 1;
        }
        Ok(count)
    }
}

impl RecordCache for SledCache {
    fn get(
        &self,
        namespace: &str,
        id: ItemId,
    ) -> Result<Option<serde_json::Value>, StateStoreError> {
        // JSON rather than bincode: `Value` needs a self-describing format.
        match self.records.get(Self::record_key(namespace, id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put(
        &self,
        namespace: &str,
        id: ItemId,
        value: &serde_json::Value,
    ) -> Result<(), StateStoreError> {
        let bytes = serde_json::to_vec(value)?;
        self.records.insert(Self::record_key(namespace, id), bytes)?;
        Ok(())
    }
}
