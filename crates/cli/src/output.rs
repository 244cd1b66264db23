use crate::error::CliError;
use chrono::{DateTime, Utc};
use model::{core::identifiers::ItemId, pagination::page::PageIndex};
use serde::Serialize;
use sync_core::{collection::FetchOrigin, metrics::SyncMetricsSnapshot};
use sync_runtime::SyncOutcome;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub collection: String,
    pub last_page: Option<PageIndex>,
    pub last_refresh: Option<DateTime<Utc>>,
    pub refresh_expired: bool,
    pub cached_pages: usize,
}

#[derive(Debug, Serialize)]
pub struct FailureReport {
    pub item_id: ItemId,
    pub enricher: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct SyncReport {
    pub collection: String,
    pub page: PageIndex,
    pub origin: FetchOrigin,
    pub items: Vec<ItemId>,
    pub enriched: usize,
    pub failures: Vec<FailureReport>,
    pub metrics: SyncMetricsSnapshot,
}

impl SyncReport {
    pub fn new(outcome: SyncOutcome, metrics: SyncMetricsSnapshot) -> Self {
        Self {
            collection: outcome.collection.to_string(),
            page: outcome.page,
            origin: outcome.origin,
            items: outcome.items,
            enriched: outcome.enriched,
            failures: outcome
                .failures
                .into_iter()
                .map(|failure| FailureReport {
                    item_id: failure.item_id,
                    enricher: failure.enricher,
                    error: failure.error.to_string(),
                })
                .collect(),
            metrics,
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

pub fn print_status_table(status: &StatusReport) {
    println!("Sync state for collection '{}':", status.collection);
    println!("-----------------------------");
    let last_page = status
        .last_page
        .map(|page| page.to_string())
        .unwrap_or_else(|| "none".to_string());
    println!("{:<16} {}", "Last page", last_page);
    let refreshed = status
        .last_refresh
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    println!("{:<16} {}", "Last refresh", refreshed);
    println!("{:<16} {}", "Refresh due", status.refresh_expired);
    println!("{:<16} {}", "Cached pages", status.cached_pages);
}

pub fn print_sync_table(report: &SyncReport) {
    println!(
        "Synced page {} of '{}' from {}: {} items, {} enrichments",
        report.page,
        report.collection,
        report.origin,
        report.items.len(),
        report.enriched
    );
    for failure in &report.failures {
        println!(
            "  failed: item {} ({}): {}",
            failure.item_id, failure.enricher, failure.error
        );
    }
}
