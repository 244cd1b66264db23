use async_trait::async_trait;
use chrono::Utc;
use model::{
    core::identifiers::{CollectionKey, ItemId},
    pagination::page::PageIndex,
};
use serde_json::json;
use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use sync_core::{
    cache::sled_cache::SledCache,
    clock::ManualClock,
    collection::CollectionSource,
    enrich::EntityFetcher,
    error::FetchError,
    retry::RetryPolicy,
    state::{SyncStateStore, sled_store::SledSyncState},
};
use sync_runtime::{Fetchers, SyncBuilder, SyncContext, SyncOrchestrator, SyncSettings};
use tempfile::TempDir;

pub const POPULAR: &str = "popular";

pub fn ids(raw: &[u64]) -> Vec<ItemId> {
    raw.iter().copied().map(ItemId::new).collect()
}

/// Remote collection serving `pages[n]` for page `n`, anything past the end is empty.
pub struct PagedSource {
    pages: Vec<Vec<ItemId>>,
    requested: Mutex<Vec<PageIndex>>,
    /// Number of upcoming calls that fail with a retryable error.
    transient_failures: AtomicUsize,
}

impl PagedSource {
    pub fn new(pages: &[&[u64]]) -> Self {
        Self {
            pages: pages.iter().map(|page| ids(page)).collect(),
            requested: Mutex::new(Vec::new()),
            transient_failures: AtomicUsize::new(0),
        }
    }

    pub fn fail_next(&self, times: usize) {
        self.transient_failures.store(times, Ordering::SeqCst);
    }

    pub fn requested(&self) -> Vec<PageIndex> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl CollectionSource for PagedSource {
    async fn fetch_page(
        &self,
        _collection: &CollectionKey,
        page: PageIndex,
    ) -> Result<Vec<ItemId>, FetchError> {
        self.requested.lock().unwrap().push(page);
        let pending = self.transient_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.transient_failures.store(pending - 1, Ordering::SeqCst);
            return Err(FetchError::network("connection reset"));
        }
        Ok(self.pages.get(page as usize).cloned().unwrap_or_default())
    }
}

/// Fetcher returning a small JSON record per id and counting calls per id.
#[derive(Default)]
pub struct CountingFetcher {
    calls: Mutex<HashMap<ItemId, usize>>,
    missing: HashSet<ItemId>,
}

impl CountingFetcher {
    pub fn missing(raw: &[u64]) -> Self {
        Self {
            missing: ids(raw).into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn calls_for(&self, id: u64) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&ItemId::new(id))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl EntityFetcher for CountingFetcher {
    async fn fetch(&self, id: ItemId) -> Result<serde_json::Value, FetchError> {
        *self.calls.lock().unwrap().entry(id).or_default() += 1;
        if self.missing.contains(&id) {
            return Err(FetchError::NotFound(id.to_string()));
        }
        Ok(json!({ "id": id.get(), "fetched": true }))
    }
}

/// Sled-backed sync state in a temp dir plus a hand-driven clock.
pub struct TestEnv {
    dir: TempDir,
    pub db: sled::Db,
    pub state: Arc<SledSyncState>,
    pub cache: Arc<SledCache>,
    pub clock: ManualClock,
    pub source: Arc<PagedSource>,
    pub details: Arc<CountingFetcher>,
    pub images: Arc<CountingFetcher>,
}

impl TestEnv {
    pub fn new(source: PagedSource) -> Self {
        Self::with_fetchers(source, CountingFetcher::default(), CountingFetcher::default())
    }

    pub fn with_fetchers(
        source: PagedSource,
        details: CountingFetcher,
        images: CountingFetcher,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let (db, state, cache) = open_stores(&dir);
        Self {
            dir,
            db,
            state,
            cache,
            clock: ManualClock::new(Utc::now()),
            source: Arc::new(source),
            details: Arc::new(details),
            images: Arc::new(images),
        }
    }

    /// Closes the database and opens it again from disk, like a process restart.
    pub fn restart(self) -> Self {
        let TestEnv {
            dir,
            db,
            state,
            cache,
            clock,
            source,
            details,
            images,
        } = self;
        db.flush().unwrap();
        drop((db, state, cache));

        let (db, state, cache) = open_stores(&dir);
        Self {
            dir,
            db,
            state,
            cache,
            clock,
            source,
            details,
            images,
        }
    }

    pub fn orchestrator(&self, settings: SyncSettings) -> SyncOrchestrator {
        SyncBuilder::new(POPULAR, self.state.clone(), self.cache.clone(), self.cache.clone())
            .with_clock(Arc::new(self.clock.clone()))
            .with_retry(RetryPolicy::new(
                3,
                Duration::from_millis(1),
                Duration::from_millis(5),
            ))
            .with_settings(settings)
            .build(
                self.source.clone(),
                Fetchers {
                    details: self.details.clone(),
                    images: self.images.clone(),
                },
                SyncContext::current().unwrap(),
            )
    }

    pub fn last_page(&self) -> Option<PageIndex> {
        self.state.last_page(&POPULAR.into()).unwrap()
    }

    pub fn last_refresh(&self) -> Option<chrono::DateTime<Utc>> {
        self.state.last_refresh(&POPULAR.into()).unwrap()
    }
}

fn open_stores(dir: &TempDir) -> (sled::Db, Arc<SledSyncState>, Arc<SledCache>) {
    let db = sled::open(dir.path().join("sync")).unwrap();
    let state = Arc::new(SledSyncState::from_db(db.clone()));
    let cache = Arc::new(SledCache::new(&db).unwrap());
    (db, state, cache)
}
