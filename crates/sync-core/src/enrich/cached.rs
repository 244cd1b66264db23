use crate::{
    cache::RecordCache,
    clock::{Clock, SystemClock},
    enrich::{EntityEnricher, EntityFetcher},
    error::FetchError,
    retry::RetryPolicy,
    state::{SyncStateStore, is_older_than},
};
use async_trait::async_trait;
use model::core::identifiers::ItemId;
use std::{sync::Arc, time::Duration};
use tracing::debug;

/// [`EntityEnricher`] that keeps one namespace of records (`details`,
/// `images`, ...) fresh. A record older than `max_age` is fetched again.
pub struct CachedEnricher {
    namespace: String,
    fetcher: Arc<dyn EntityFetcher>,
    records: Arc<dyn RecordCache>,
    state: Arc<dyn SyncStateStore>,
    clock: Arc<dyn Clock>,
    max_age: Duration,
    retry: RetryPolicy,
}

impl CachedEnricher {
    pub fn new(
        namespace: impl Into<String>,
        fetcher: Arc<dyn EntityFetcher>,
        records: Arc<dyn RecordCache>,
        state: Arc<dyn SyncStateStore>,
        max_age: Duration,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            fetcher,
            records,
            state,
            clock: Arc::new(SystemClock),
            max_age,
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

    fn is_fresh(&self, id: ItemId) -> Result<bool, FetchError> {
        if self.records.get(&self.namespace, id)?.is_none() {
            return Ok(false);
        }
        let refreshed_at = self.state.entity_refreshed_at(&self.namespace, id)?;
        Ok(!is_older_than(refreshed_at, self.clock.now(), self.max_age))
    }
}

#[async_trait]
impl EntityEnricher for CachedEnricher {
    fn name(&self) -> &str {
        &self.namespace
    }

    async fn ensure_fresh(&self, id: ItemId) -> Result<(), FetchError> {
        if self.is_fresh(id)? {
            debug!(enricher = %self.namespace, item_id = %id, "Record is fresh");
            return Ok(());
        }

        let value = self.retry.run(|| self.fetcher.fetch(id)).await?;
        self.records.put(&self.namespace, id, &value)?;
        self.state
            .record_entity_refresh(&self.namespace, id, self.clock.now())?;

        debug!(enricher = %self.namespace, item_id = %id, "Record refreshed");
        Ok(())
    }
}
