use crate::{
    cache::PageCache,
    clock::{Clock, SystemClock},
    collection::{CollectionSource, CollectionStore, FetchOrigin, PageFetch, StalenessCheck},
    error::{FetchError, StateStoreError},
    retry::RetryPolicy,
    state::SyncStateStore,
};
use async_trait::async_trait;
use model::{
    core::identifiers::CollectionKey,
    pagination::page::{CollectionPage, PageIndex},
};
use std::sync::Arc;
use tracing::{debug, info};

/// [`CollectionStore`] over a remote [`CollectionSource`], a [`PageCache`] and
/// the durable paging state.
pub struct CachedCollectionStore {
    collection: CollectionKey,
    source: Arc<dyn CollectionSource>,
    cache: Arc<dyn PageCache>,
    state: Arc<dyn SyncStateStore>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl CachedCollectionStore {
    pub fn new(
        collection: impl Into<CollectionKey>,
        source: Arc<dyn CollectionSource>,
        cache: Arc<dyn PageCache>,
        state: Arc<dyn SyncStateStore>,
    ) -> Self {
        Self {
            collection: collection.into(),
            source,
            cache,
            state,
            clock: Arc::new(SystemClock),
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_remote(&self, page: PageIndex) -> Result<CollectionPage, FetchError> {
        let ids = self
            .retry
            .run(|| self.source.fetch_page(&self.collection, page))
            .await?;
        let fetched = CollectionPage::from_ids(page, ids);

        // Page contents first, cursor last: nothing below awaits, so a
        // cancelled fetch never gets this far.
        self.cache.store_page(&self.collection, &fetched)?;
        let refreshed_at = fetched.is_first().then(|| self.clock.now());
        self.state
            .commit_page(&self.collection, page, refreshed_at)?;

        Ok(fetched)
    }

    /// Moves the cursor forward to a page that is already cached.
    fn catch_up_cursor(&self, page: PageIndex) -> Result<(), StateStoreError> {
        let last_page = self.state.last_page(&self.collection)?;
        if last_page.is_none_or(|last| page > last) {
            debug!(collection = %self.collection, page, ?last_page, "Cursor behind cache, advancing");
            self.state.commit_page(&self.collection, page, None)?;
        }
        Ok(())
    }
}

#[async_trait]
impl CollectionStore for CachedCollectionStore {
    fn collection(&self) -> &CollectionKey {
        &self.collection
    }

    async fn fetch_page(
        &self,
        page: PageIndex,
        force_refresh: bool,
        is_stale: StalenessCheck<'_>,
    ) -> Result<PageFetch, FetchError> {
        if !force_refresh
            && let Some(cached) = self.cache.page(&self.collection, page)?
        {
            if !is_stale() {
                debug!(collection = %self.collection, page, items = cached.len(), "Serving page from cache");
                self.catch_up_cursor(page)?;
                return Ok(PageFetch {
                    page: cached,
                    origin: FetchOrigin::Cache,
                });
            }
            debug!(collection = %self.collection, page, "Cached page is stale");
        }

        let fetched = self.fetch_remote(page).await?;
        info!(
            collection = %self.collection,
            page,
            items = fetched.len(),
            forced = force_refresh,
            "Fetched page from remote"
        );

        Ok(PageFetch {
            page: fetched,
            origin: FetchOrigin::Remote,
        })
    }
}
