use crate::{
    error::StateStoreError,
    state::{SyncStateStore, models::CursorRecord},
};
use chrono::{DateTime, Utc};
use model::{
    core::identifiers::{CollectionKey, ItemId},
    pagination::page::PageIndex,
};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::path::Path;

/// Sled-backed state store. Each collection's cursor and refresh timestamp
/// are one record, rewritten inside a transaction.
#[derive(Clone)]
pub struct SledSyncState {
    db: sled::Db,
}

impl SledSyncState {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StateStoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Shares an already opened database, e.g. with the sled caches.
    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }

    #[inline]
    fn cursor_key(collection: &CollectionKey) -> String {
        format!("cur:{}", collection)
    }

    #[inline]
    fn entity_key(namespace: &str, id: ItemId) -> String {
        format!("ent:{}:{}", namespace, id)
    }

    fn update_cursor<F>(&self, collection: &CollectionKey, apply: F) -> Result<(), StateStoreError>
    where
        F: Fn(Option<CursorRecord>) -> CursorRecord,
    {
        let key = Self::cursor_key(collection);

        let result = self.db.transaction::<_, _, StateStoreError>(|tx_db| {
            let previous = match tx_db.get(key.as_bytes())? {
                Some(bytes) => Some(
                    bincode::deserialize::<CursorRecord>(&bytes)
                        .map_err(|e| ConflictableTransactionError::Abort(e.into()))?,
                ),
                None => None,
            };

            let next = apply(previous);
            let bytes = bincode::serialize(&next)
                .map_err(|e| ConflictableTransactionError::Abort(e.into()))?;
            tx_db.insert(key.as_bytes(), bytes)?;
            Ok(())
        });

        match result {
            Ok(()) => Ok(()),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(StateStoreError::Sled(e)),
        }
    }
}

impl SyncStateStore for SledSyncState {
    fn load_cursor(
        &self,
        collection: &CollectionKey,
    ) -> Result<Option<CursorRecord>, StateStoreError> {
        match self.db.get(Self::cursor_key(collection))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn commit_page(
        &self,
        collection: &CollectionKey,
        page: PageIndex,
        refreshed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StateStoreError> {
        self.update_cursor(collection, |previous| {
            CursorRecord::committed(previous, page, refreshed_at)
        })?;
        self.db.flush()?;
        Ok(())
    }

    fn record_refresh(
        &self,
        collection: &CollectionKey,
        at: DateTime<Utc>,
    ) -> Result<(), StateStoreError> {
        self.update_cursor(collection, |previous| CursorRecord {
            last_refresh: Some(at),
            ..previous.unwrap_or_default()
        })
    }

    fn entity_refreshed_at(
        &self,
        namespace: &str,
        id: ItemId,
    ) -> Result<Option<DateTime<Utc>>, StateStoreError> {
        match self.db.get(Self::entity_key(namespace, id))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn record_entity_refresh(
        &self,
        namespace: &str,
        id: ItemId,
        at: DateTime<Utc>,
    ) -> Result<(), StateStoreError> {
        let bytes = bincode::serialize(&at)?;
        self.db.insert(Self::entity_key(namespace, id), bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn commit_survives_reopen() {
        let dir = tempdir().unwrap();
        let key = CollectionKey::from("popular");
        let at = Utc::now();

        {
            let store = SledSyncState::open(dir.path()).unwrap();
            store.commit_page(&key, 0, Some(at)).unwrap();
            store.commit_page(&key, 1, None).unwrap();
        }

        let store = SledSyncState::open(dir.path()).unwrap();
        assert_eq!(store.last_page(&key).unwrap(), Some(1));
        assert_eq!(store.last_refresh(&key).unwrap(), Some(at));
    }

    #[test]
    fn unknown_collection_has_no_state() {
        let dir = tempdir().unwrap();
        let store = SledSyncState::open(dir.path()).unwrap();
        assert_eq!(store.load_cursor(&"nope".into()).unwrap(), None);
    }

    #[test]
    fn entity_refresh_round_trip() {
        let dir = tempdir().unwrap();
        let store = SledSyncState::open(dir.path()).unwrap();
        let at = Utc::now();

        store
            .record_entity_refresh("images", ItemId::new(12), at)
            .unwrap();
        assert_eq!(
            store.entity_refreshed_at("images", ItemId::new(12)).unwrap(),
            Some(at)
        );
        assert_eq!(
            store.entity_refreshed_at("details", ItemId::new(12)).unwrap(),
            None
        );
    }
}
