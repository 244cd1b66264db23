use crate::{config::EnrichmentPolicy, context::SyncContext, error::SyncError};
use model::core::identifiers::ItemId;
use std::sync::Arc;
use sync_core::{enrich::EntityEnricher, error::FetchError, metrics::SyncMetrics};
use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// One enrichment that failed under [`EnrichmentPolicy::BestEffort`].
#[derive(Debug)]
pub struct EnrichmentFailure {
    pub item_id: ItemId,
    pub enricher: String,
    pub error: FetchError,
}

#[derive(Debug, Default)]
pub(crate) struct FanOutReport {
    pub enriched: usize,
    pub failures: Vec<EnrichmentFailure>,
}

enum TaskOutcome {
    Done,
    Failed(FetchError),
    Cancelled,
}

pub(crate) struct FanOut<'a> {
    pub context: &'a SyncContext,
    pub cancel: &'a CancellationToken,
    pub enrichers: &'a [Arc<dyn EntityEnricher>],
    pub policy: EnrichmentPolicy,
    pub max_concurrent: usize,
    pub metrics: &'a SyncMetrics,
}

impl FanOut<'_> {
    /// Runs every enricher for every item as its own task and waits for all of them.
    ///
    /// Under fail-fast the first failing task cancels the invocation scope
    /// before it releases its permit, so no further call starts; the rest are
    /// aborted and only that first failure is returned.
    pub(crate) async fn run(&self, items: &[ItemId]) -> Result<FanOutReport, SyncError> {
        let limit = match self.max_concurrent {
            0 => Semaphore::MAX_PERMITS,
            n => n,
        };
        let semaphore = Arc::new(Semaphore::new(limit));
        let fail_fast = self.policy == EnrichmentPolicy::FailFast;
        let mut tasks: JoinSet<(ItemId, String, TaskOutcome)> = JoinSet::new();

        for &item_id in items {
            for enricher in self.enrichers {
                let enricher = Arc::clone(enricher);
                let semaphore = Arc::clone(&semaphore);
                let cancel = self.cancel.clone();

                tasks.spawn_on(
                    async move {
                        let name = enricher.name().to_string();
                        let outcome = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => TaskOutcome::Cancelled,
                            outcome = enrich_one(&*enricher, item_id, &semaphore, &cancel, fail_fast) => outcome,
                        };
                        (item_id, name, outcome)
                    },
                    self.context.handle(),
                );
            }
        }

        let mut report = FanOutReport::default();
        let mut first_error: Option<SyncError> = None;
        let mut cancelled = 0u64;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((item_id, _, TaskOutcome::Done)) => {
                    debug!(item_id = %item_id, "Enrichment finished");
                    report.enriched += 1;
                }
                Ok((item_id, enricher, TaskOutcome::Failed(source))) => {
                    self.metrics.increment_failures(1);
                    if !fail_fast {
                        warn!(item_id = %item_id, enricher = %enricher, error = %source, "Enrichment failed, continuing");
                        report.failures.push(EnrichmentFailure {
                            item_id,
                            enricher,
                            error: source,
                        });
                    } else if first_error.is_none() {
                        error!(item_id = %item_id, enricher = %enricher, error = %source, "Enrichment failed, cancelling remaining tasks");
                        self.cancel.cancel();
                        tasks.abort_all();
                        first_error = Some(SyncError::Enrichment {
                            item_id,
                            enricher,
                            source,
                        });
                    }
                }
                Ok((_, _, TaskOutcome::Cancelled)) => cancelled += 1,
                Err(err) if err.is_cancelled() => cancelled += 1,
                Err(err) => {
                    error!(error = %err, "Enrichment task panicked, cancelling remaining tasks");
                    self.cancel.cancel();
                    tasks.abort_all();
                    if first_error.is_none() {
                        first_error = Some(SyncError::TaskJoin(err));
                    }
                }
            }
        }

        self.metrics.increment_enriched(report.enriched as u64);
        self.metrics.increment_cancelled(cancelled);

        if let Some(err) = first_error {
            return Err(err);
        }
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        Ok(report)
    }
}

async fn enrich_one(
    enricher: &dyn EntityEnricher,
    item_id: ItemId,
    semaphore: &Semaphore,
    cancel: &CancellationToken,
    fail_fast: bool,
) -> TaskOutcome {
    let Ok(_permit) = semaphore.acquire().await else {
        return TaskOutcome::Cancelled;
    };
    // The permit may have been handed over by a task that just failed.
    if cancel.is_cancelled() {
        return TaskOutcome::Cancelled;
    }

    match enricher.ensure_fresh(item_id).await {
        Ok(()) => TaskOutcome::Done,
        Err(err) => {
            if fail_fast {
                cancel.cancel();
            }
            TaskOutcome::Failed(err)
        }
    }
}
