use model::{
    core::identifiers::{CollectionKey, ItemId},
    pagination::page::PageIndex,
};
use std::fmt;
use sync_core::error::{FetchError, StateStoreError};
use thiserror::Error;

/// Failure of one `synchronize` invocation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Remote or storage failure while resolving the target page.
    /// Cursor and refresh timestamp are unchanged.
    #[error("Failed to fetch page {page} of '{collection}': {source}")]
    PageFetch {
        collection: CollectionKey,
        page: PageIndex,
        #[source]
        source: FetchError,
    },

    /// The paging state could not be read before the fetch.
    #[error("Failed to read paging state: {0}")]
    State(#[from] StateStoreError),

    /// Remote or storage failure while enriching one item.
    #[error("Failed to enrich item {item_id} with '{enricher}': {source}")]
    Enrichment {
        item_id: ItemId,
        enricher: String,
        #[source]
        source: FetchError,
    },

    /// The invocation was cancelled by its caller.
    #[error("Sync cancelled")]
    Cancelled,

    /// An enrichment task panicked.
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("No tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    PageFetch,
    Enrichment,
    Cancelled,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStage::PageFetch => f.write_str("page fetch"),
            SyncStage::Enrichment => f.write_str("enrichment"),
            SyncStage::Cancelled => f.write_str("cancelled"),
        }
    }
}

impl SyncError {
    /// Which part of the invocation failed.
    pub fn stage(&self) -> SyncStage {
        match self {
            SyncError::PageFetch { .. } | SyncError::State(_) | SyncError::NoRuntime(_) => {
                SyncStage::PageFetch
            }
            SyncError::Enrichment { .. } | SyncError::TaskJoin(_) => SyncStage::Enrichment,
            SyncError::Cancelled => SyncStage::Cancelled,
        }
    }

    /// The item whose enrichment failed, if any.
    pub fn item_id(&self) -> Option<ItemId> {
        match self {
            SyncError::Enrichment { item_id, .. } => Some(*item_id),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SyncError::Cancelled)
    }
}
