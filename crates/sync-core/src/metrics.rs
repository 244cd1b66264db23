use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    pages_fetched: AtomicU64,
    pages_from_cache: AtomicU64,
    enrichments_ok: AtomicU64,
    enrichments_failed: AtomicU64,
    enrichments_cancelled: AtomicU64,
}

/// Process-wide counters for sync activity. Clones share the same counters.
#[derive(Debug, Clone)]
pub struct SyncMetrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncMetricsSnapshot {
    pub pages_fetched: u64,
    pub pages_from_cache: u64,
    pub enrichments_ok: u64,
    pub enrichments_failed: u64,
    pub enrichments_cancelled: u64,
}

impl SyncMetrics {
    pub fn new() -> Self {
        SyncMetrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn record_page(&self, from_cache: bool) {
        let counter = if from_cache {
            &self.inner.pages_from_cache
        } else {
            &self.inner.pages_fetched
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_enriched(&self, count: u64) {
        self.inner.enrichments_ok.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_failures(&self, count: u64) {
        self.inner
            .enrichments_failed
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_cancelled(&self, count: u64) {
        self.inner
            .enrichments_cancelled
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SyncMetricsSnapshot {
        SyncMetricsSnapshot {
            pages_fetched: self.inner.pages_fetched.load(Ordering::Relaxed),
            pages_from_cache: self.inner.pages_from_cache.load(Ordering::Relaxed),
            enrichments_ok: self.inner.enrichments_ok.load(Ordering::Relaxed),
            enrichments_failed: self.inner.enrichments_failed.load(Ordering::Relaxed),
            enrichments_cancelled: self.inner.enrichments_cancelled.load(Ordering::Relaxed),
        }
    }
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let metrics = SyncMetrics::new();
        let other = metrics.clone();

        metrics.record_page(true);
        other.record_page(false);
        other.increment_enriched(4);
        metrics.increment_failures(1);
        metrics.increment_cancelled(2);

        let snap = metrics.snapshot();
        assert_eq!(snap.pages_from_cache, 1);
        assert_eq!(snap.pages_fetched, 1);
        assert_eq!(snap.enrichments_ok, 4);
        assert_eq!(snap.enrichments_failed, 1);
        assert_eq!(snap.enrichments_cancelled, 2);
    }
}
