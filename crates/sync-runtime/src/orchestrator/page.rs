use model::{
    pagination::page::{FIRST_PAGE, PageIndex},
    request::PageMode,
};
use std::time::Duration;
use sync_core::state::LastRequestTracker;

/// Page an invocation targets: the page after the cursor for `NextPage`,
/// page 0 for `Refresh` or when nothing has been fetched yet.
pub fn resolve_target_page(last_page: Option<PageIndex>, mode: PageMode) -> PageIndex {
    match (last_page, mode) {
        (Some(last), PageMode::NextPage) => last.saturating_add(1),
        _ => FIRST_PAGE,
    }
}

/// Builds the predicate handed to the collection store. Only page 0 can go
/// stale by age; every other page is refetched only when forced.
pub fn staleness_check(
    page: PageIndex,
    tracker: &LastRequestTracker,
    max_age: Duration,
) -> impl Fn() -> bool + Send + Sync + '_ {
    move || page == FIRST_PAGE && tracker.is_expired(max_age)
}
