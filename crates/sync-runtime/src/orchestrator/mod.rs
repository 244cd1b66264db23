use crate::{
    config::SyncSettings,
    context::SyncContext,
    error::SyncError,
    orchestrator::fanout::FanOut,
};
use model::{
    core::identifiers::{CollectionKey, ItemId},
    pagination::page::PageIndex,
    request::SyncRequest,
};
use std::sync::Arc;
use sync_core::{
    collection::{CollectionStore, FetchOrigin},
    enrich::EntityEnricher,
    metrics::SyncMetrics,
    state::{LastRequestTracker, PageCursor},
};
use tracing::info;

mod fanout;
pub mod page;

pub use fanout::EnrichmentFailure;
pub use page::{resolve_target_page, staleness_check};

/// Result of a successful invocation.
#[derive(Debug)]
pub struct SyncOutcome {
    pub collection: CollectionKey,
    pub page: PageIndex,
    pub origin: FetchOrigin,
    /// Item ids of the page, in server order.
    pub items: Vec<ItemId>,
    /// Enrichment calls that completed successfully.
    pub enriched: usize,
    /// Always empty under fail-fast.
    pub failures: Vec<EnrichmentFailure>,
}

impl SyncOutcome {
    pub fn served_from_cache(&self) -> bool {
        self.origin == FetchOrigin::Cache
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Decides which page of a collection to load, loads it through the
/// collection store, then enriches every item of that page concurrently.
pub struct SyncOrchestrator {
    store: Arc<dyn CollectionStore>,
    cursor: PageCursor,
    tracker: LastRequestTracker,
    enrichers: Vec<Arc<dyn EntityEnricher>>,
    context: SyncContext,
    settings: SyncSettings,
    metrics: SyncMetrics,
}

impl SyncOrchestrator {
    pub fn new(
        store: Arc<dyn CollectionStore>,
        cursor: PageCursor,
        tracker: LastRequestTracker,
        enrichers: Vec<Arc<dyn EntityEnricher>>,
        context: SyncContext,
    ) -> Self {
        Self {
            store,
            cursor,
            tracker,
            enrichers,
            context,
            settings: SyncSettings::default(),
            metrics: SyncMetrics::new(),
        }
    }

    pub fn with_settings(mut self, settings: SyncSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_metrics(mut self, metrics: SyncMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }

    pub fn context(&self) -> &SyncContext {
        &self.context
    }

    pub async fn synchronize(&self, request: SyncRequest) -> Result<SyncOutcome, SyncError> {
        let cancel = self.context.invocation_token();
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let collection = self.store.collection().clone();
        let last_page = self.cursor.get_last_page()?;
        let page = resolve_target_page(last_page, request.mode);
        info!(
            collection = %collection,
            mode = %request.mode,
            force = request.force_refresh,
            ?last_page,
            page,
            "Starting sync"
        );

        let is_stale = staleness_check(page, &self.tracker, self.settings.refresh_max_age);
        let fetch = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SyncError::Cancelled),
            fetched = self.store.fetch_page(page, request.force_refresh, &is_stale) => {
                fetched.map_err(|source| SyncError::PageFetch {
                    collection: collection.clone(),
                    page,
                    source,
                })?
            }
        };
        self.metrics
            .record_page(fetch.origin == FetchOrigin::Cache);

        let items = fetch.page.item_ids();
        let report = FanOut {
            context: &self.context,
            cancel: &cancel,
            enrichers: &self.enrichers,
            policy: self.settings.enrichment_policy,
            max_concurrent: self.settings.max_concurrent_enrichments,
            metrics: &self.metrics,
        }
        .run(&items)
        .await?;

        info!(
            collection = %collection,
            page,
            origin = %fetch.origin,
            items = items.len(),
            enriched = report.enriched,
            failed = report.failures.len(),
            "Sync finished"
        );

        Ok(SyncOutcome {
            collection,
            page,
            origin: fetch.origin,
            items,
            enriched: report.enriched,
            failures: report.failures,
        })
    }
}
