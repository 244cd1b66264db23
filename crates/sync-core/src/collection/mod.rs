use crate::error::FetchError;
use async_trait::async_trait;
use model::{
    core::identifiers::{CollectionKey, ItemId},
    pagination::page::{CollectionPage, PageIndex},
};
use serde::Serialize;
use std::fmt;

pub mod cached;

pub use cached::CachedCollectionStore;

/// Lazily evaluated "is the cached copy too old" check, supplied by the caller.
pub type StalenessCheck<'a> = &'a (dyn Fn() -> bool + Send + Sync);

/// Remote side of a paginated collection: returns item ids of one page in server order.
#[async_trait]
pub trait CollectionSource: Send + Sync {
    async fn fetch_page(
        &self,
        collection: &CollectionKey,
        page: PageIndex,
    ) -> Result<Vec<ItemId>, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOrigin {
    Cache,
    Remote,
}

impl fmt::Display for FetchOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOrigin::Cache => f.write_str("cache"),
            FetchOrigin::Remote => f.write_str("remote"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageFetch {
    pub page: CollectionPage,
    pub origin: FetchOrigin,
}

/// A cache-backed source for one page of a collection.
///
/// Contract:
/// * serve the cached page iff it exists, `force_refresh` is false and
///   `is_stale()` returns false; a cached page past the cursor moves the
///   cursor up to it (timestamp untouched), so paging never stalls on a page
///   whose commit was lost;
/// * otherwise fetch remotely, persist the page, move the cursor to `page`
///   and, for page 0, record the refresh time;
/// * a failed fetch leaves cursor and timestamp untouched;
/// * repeated cache hits are idempotent.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    fn collection(&self) -> &CollectionKey;

    async fn fetch_page(
        &self,
        page: PageIndex,
        force_refresh: bool,
        is_stale: StalenessCheck<'_>,
    ) -> Result<PageFetch, FetchError>;
}
