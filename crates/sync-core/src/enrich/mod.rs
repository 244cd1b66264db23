use crate::error::FetchError;
use async_trait::async_trait;
use model::core::identifiers::ItemId;

pub mod cached;

pub use cached::CachedEnricher;

/// Makes sure the secondary record of one item is present and fresh in the
/// local cache, fetching it remotely when needed.
///
/// Calls for distinct ids are independent and may run concurrently.
/// Concurrent calls for the same id are allowed to duplicate work.
#[async_trait]
pub trait EntityEnricher: Send + Sync {
    /// Short label used in logs and errors, e.g. `details` or `images`.
    fn name(&self) -> &str;

    async fn ensure_fresh(&self, id: ItemId) -> Result<(), FetchError>;
}

/// Remote side of an enricher: loads the secondary record of one item.
#[async_trait]
pub trait EntityFetcher: Send + Sync {
    async fn fetch(&self, id: ItemId) -> Result<serde_json::Value, FetchError>;
}
