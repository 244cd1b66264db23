use crate::{config::SyncSettings, context::SyncContext, orchestrator::SyncOrchestrator};
use model::core::identifiers::CollectionKey;
use std::{sync::Arc, time::Duration};
use sync_core::{
    cache::{PageCache, RecordCache},
    clock::{Clock, SystemClock},
    collection::{CachedCollectionStore, CollectionSource},
    enrich::{CachedEnricher, EntityEnricher, EntityFetcher},
    metrics::SyncMetrics,
    retry::RetryPolicy,
    state::{LastRequestTracker, PageCursor, SyncStateStore},
};

pub const DETAILS: &str = "details";
pub const IMAGES: &str = "images";

/// Remote loaders for the two secondary record kinds.
#[derive(Clone)]
pub struct Fetchers {
    pub details: Arc<dyn EntityFetcher>,
    pub images: Arc<dyn EntityFetcher>,
}

/// Wires a [`SyncOrchestrator`] for one collection out of the local stores.
pub struct SyncBuilder {
    collection: CollectionKey,
    state: Arc<dyn SyncStateStore>,
    pages: Arc<dyn PageCache>,
    records: Arc<dyn RecordCache>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    settings: SyncSettings,
    metrics: SyncMetrics,
}

impl SyncBuilder {
    pub fn new(
        collection: impl Into<CollectionKey>,
        state: Arc<dyn SyncStateStore>,
        pages: Arc<dyn PageCache>,
        records: Arc<dyn RecordCache>,
    ) -> Self {
        Self {
            collection: collection.into(),
            state,
            pages,
            records,
            clock: Arc::new(SystemClock),
            retry: RetryPolicy::none(),
            settings: SyncSettings::default(),
            metrics: SyncMetrics::new(),
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

    pub fn with_settings(mut self, settings: SyncSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_metrics(mut self, metrics: SyncMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn build(
        self,
        source: Arc<dyn CollectionSource>,
        fetchers: Fetchers,
        context: SyncContext,
    ) -> SyncOrchestrator {
        let store = CachedCollectionStore::new(
            self.collection.clone(),
            source,
            self.pages,
            self.state.clone(),
        )
        .with_clock(self.clock.clone())
        .with_retry(self.retry.clone());

        let enricher = |namespace: &str, fetcher: Arc<dyn EntityFetcher>, max_age: Duration| {
            let enricher = CachedEnricher::new(
                namespace,
                fetcher,
                self.records.clone(),
                self.state.clone(),
                max_age,
            )
            .with_clock(self.clock.clone())
            .with_retry(self.retry.clone());
            Arc::new(enricher) as Arc<dyn EntityEnricher>
        };
        let enrichers = vec![
            enricher(DETAILS, fetchers.details, self.settings.details.max_age),
            enricher(IMAGES, fetchers.images, self.settings.images.max_age),
        ];

        SyncOrchestrator::new(
            Arc::new(store),
            PageCursor::new(self.state.clone(), self.collection.clone()),
            LastRequestTracker::new(self.state.clone(), self.collection, self.clock),
            enrichers,
            context,
        )
        .with_settings(self.settings)
        .with_metrics(self.metrics)
    }
}
