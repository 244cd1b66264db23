use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::{
    core::identifiers::{CollectionKey, ItemId},
    pagination::page::{CollectionPage, PageIndex},
};
use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};
use sync_core::{
    cache::{MemoryPageCache, PageCache},
    clock::{Clock, ManualClock},
    collection::{CachedCollectionStore, CollectionSource},
    enrich::EntityEnricher,
    error::{FetchError, StateStoreError},
    state::{
        CursorRecord, LastRequestTracker, PageCursor, SyncStateStore, memory::MemorySyncState,
    },
};
use tokio::sync::Notify;

use crate::{SyncContext, SyncOrchestrator, SyncSettings};

pub const COLLECTION: &str = "popular";

pub fn ids(raw: &[u64]) -> Vec<ItemId> {
    raw.iter().copied().map(ItemId::new).collect()
}

/// Remote collection answering from a fixed page table.
#[derive(Default)]
pub struct ScriptedSource {
    pages: HashMap<PageIndex, Vec<ItemId>>,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    pub block: AtomicBool,
    pub started: Notify,
}

impl ScriptedSource {
    pub fn with_pages(pages: impl IntoIterator<Item = (PageIndex, Vec<ItemId>)>) -> Self {
        Self {
            pages: pages.into_iter().collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl CollectionSource for ScriptedSource {
    async fn fetch_page(
        &self,
        _collection: &CollectionKey,
        page: PageIndex,
    ) -> Result<Vec<ItemId>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.block.load(Ordering::SeqCst) {
            self.started.notify_one();
            std::future::pending::<()>().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(FetchError::network("502 bad gateway"));
        }
        Ok(self.pages.get(&page).cloned().unwrap_or_default())
    }
}

/// Enricher that records calls, fails for chosen ids and hangs for others.
pub struct RecordingEnricher {
    name: String,
    failing: HashSet<ItemId>,
    hanging: HashSet<ItemId>,
    pub fail_all: AtomicBool,
    pub seen: Mutex<Vec<ItemId>>,
    pub started: Notify,
}

impl RecordingEnricher {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            failing: HashSet::new(),
            hanging: HashSet::new(),
            fail_all: AtomicBool::new(false),
            seen: Mutex::new(Vec::new()),
            started: Notify::new(),
        }
    }

    pub fn failing_on(mut self, raw: &[u64]) -> Self {
        self.failing.extend(ids(raw));
        self
    }

    pub fn hanging_on(mut self, raw: &[u64]) -> Self {
        self.hanging.extend(ids(raw));
        self
    }

    pub fn seen(&self) -> Vec<ItemId> {
        let mut seen = self.seen.lock().unwrap().clone();
        seen.sort();
        seen
    }
}

#[async_trait]
impl EntityEnricher for RecordingEnricher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ensure_fresh(&self, id: ItemId) -> Result<(), FetchError> {
        self.seen.lock().unwrap().push(id);
        if self.hanging.contains(&id) {
            self.started.notify_one();
            std::future::pending::<()>().await;
        }
        if self.fail_all.load(Ordering::SeqCst) || self.failing.contains(&id) {
            return Err(FetchError::network(format!("{} unavailable for {id}", self.name)));
        }
        Ok(())
    }
}

/// Memory state whose next `failing_commits` page commits error out.
pub struct FlakyState {
    inner: Arc<MemorySyncState>,
    failing_commits: Arc<AtomicUsize>,
}

impl SyncStateStore for FlakyState {
    fn load_cursor(
        &self,
        collection: &CollectionKey,
    ) -> Result<Option<CursorRecord>, StateStoreError> {
        self.inner.load_cursor(collection)
    }

    fn commit_page(
        &self,
        collection: &CollectionKey,
        page: PageIndex,
        refreshed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StateStoreError> {
        let pending = self.failing_commits.load(Ordering::SeqCst);
        if pending > 0 {
            self.failing_commits.store(pending - 1, Ordering::SeqCst);
            return Err(StateStoreError::Codec("disk full".into()));
        }
        self.inner.commit_page(collection, page, refreshed_at)
    }

    fn record_refresh(
        &self,
        collection: &CollectionKey,
        at: DateTime<Utc>,
    ) -> Result<(), StateStoreError> {
        self.inner.record_refresh(collection, at)
    }

    fn entity_refreshed_at(
        &self,
        namespace: &str,
        id: ItemId,
    ) -> Result<Option<DateTime<Utc>>, StateStoreError> {
        self.inner.entity_refreshed_at(namespace, id)
    }

    fn record_entity_refresh(
        &self,
        namespace: &str,
        id: ItemId,
        at: DateTime<Utc>,
    ) -> Result<(), StateStoreError> {
        self.inner.record_entity_refresh(namespace, id, at)
    }
}

pub struct Harness {
    pub source: Arc<ScriptedSource>,
    pub cache: Arc<MemoryPageCache>,
    pub state: Arc<MemorySyncState>,
    pub failing_commits: Arc<AtomicUsize>,
    pub clock: ManualClock,
    pub details: Arc<RecordingEnricher>,
    pub images: Arc<RecordingEnricher>,
    pub context: SyncContext,
}

impl Harness {
    pub fn new(source: ScriptedSource) -> Self {
        Self::with_enrichers(
            source,
            RecordingEnricher::new("details"),
            RecordingEnricher::new("images"),
        )
    }

    pub fn with_enrichers(
        source: ScriptedSource,
        details: RecordingEnricher,
        images: RecordingEnricher,
    ) -> Self {
        Self {
            source: Arc::new(source),
            cache: Arc::new(MemoryPageCache::new()),
            state: Arc::new(MemorySyncState::new()),
            failing_commits: Arc::new(AtomicUsize::new(0)),
            clock: ManualClock::new(Utc::now()),
            details: Arc::new(details),
            images: Arc::new(images),
            context: SyncContext::current().unwrap(),
        }
    }

    /// Pretends an earlier run fetched pages `0..=last_page`, page 0 `age` ago.
    pub fn seed(&self, last_page: PageIndex, age: chrono::Duration) {
        let key = CollectionKey::from(COLLECTION);
        for index in 0..=last_page {
            let base = 100 * (index as u64 + 1);
            self.cache
                .store_page(&key, &CollectionPage::from_ids(index, ids(&[base, base + 1])))
                .unwrap();
        }
        self.state
            .seed(COLLECTION, Some(last_page), Some(self.clock.now() - age))
            .unwrap();
    }

    pub fn last_page(&self) -> Option<PageIndex> {
        self.state.last_page(&COLLECTION.into()).unwrap()
    }

    pub fn last_refresh(&self) -> Option<chrono::DateTime<Utc>> {
        self.state.last_refresh(&COLLECTION.into()).unwrap()
    }

    pub fn orchestrator(&self, settings: SyncSettings) -> SyncOrchestrator {
        let state: Arc<dyn SyncStateStore> = Arc::new(FlakyState {
            inner: self.state.clone(),
            failing_commits: self.failing_commits.clone(),
        });
        let clock: Arc<dyn Clock> = Arc::new(self.clock.clone());
        let store = CachedCollectionStore::new(
            COLLECTION,
            self.source.clone(),
            self.cache.clone(),
            state.clone(),
        )
        .with_clock(clock.clone());
        let enrichers: Vec<Arc<dyn EntityEnricher>> = vec![self.details.clone(), self.images.clone()];

        SyncOrchestrator::new(
            Arc::new(store),
            PageCursor::new(state.clone(), COLLECTION.into()),
            LastRequestTracker::new(state, COLLECTION.into(), clock),
            enrichers,
            self.context.clone(),
        )
        .with_settings(settings)
    }
}
