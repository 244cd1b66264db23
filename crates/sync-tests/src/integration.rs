#[cfg(test)]
mod tests {
    use crate::utils::{CountingFetcher, POPULAR, PagedSource, TestEnv, ids};
    use chrono::Duration;
    use model::request::SyncRequest;
    use sync_core::{
        cache::{PageCache, RecordCache},
        clock::Clock,
        collection::FetchOrigin,
    };
    use sync_runtime::{EnrichmentPolicy, SyncError, SyncSettings, SyncStage};
    use tracing_test::traced_test;

    // Scenario: nothing has been synced yet.
    // Expected Outcome: page 0 is fetched, cached and committed, and every
    // item gets both records.
    #[traced_test]
    #[tokio::test]
    async fn first_run_loads_head_page() {
        let env = TestEnv::new(PagedSource::new(&[&[1, 2, 3]]));

        let outcome = env
            .orchestrator(SyncSettings::default())
            .synchronize(SyncRequest::next_page())
            .await
            .unwrap();

        assert_eq!(outcome.page, 0);
        assert_eq!(outcome.origin, FetchOrigin::Remote);
        assert_eq!(outcome.enriched, 6);
        assert_eq!(env.last_page(), Some(0));
        assert_eq!(env.last_refresh(), Some(env.clock.now()));

        for id in ids(&[1, 2, 3]) {
            assert!(env.cache.get("details", id).unwrap().is_some());
            assert!(env.cache.get("images", id).unwrap().is_some());
        }
    }

    // Scenario: repeated NEXT_PAGE requests.
    // Expected Outcome: the cursor walks forward one page per run and the
    // refresh timestamp stays the one taken for page 0.
    #[traced_test]
    #[tokio::test]
    async fn next_page_walks_forward() {
        let env = TestEnv::new(PagedSource::new(&[&[1, 2], &[3, 4], &[5]]));
        let orchestrator = env.orchestrator(SyncSettings::default());

        orchestrator.synchronize(SyncRequest::next_page()).await.unwrap();
        let refreshed = env.last_refresh();
        env.clock.advance(Duration::hours(1));

        let second = orchestrator.synchronize(SyncRequest::next_page()).await.unwrap();
        let third = orchestrator.synchronize(SyncRequest::next_page()).await.unwrap();

        assert_eq!(second.items, ids(&[3, 4]));
        assert_eq!(third.items, ids(&[5]));
        assert_eq!(env.source.requested(), vec![0, 1, 2]);
        assert_eq!(env.last_page(), Some(2));
        assert_eq!(env.last_refresh(), refreshed);
        assert_eq!(env.cache.page_count(&POPULAR.into()).unwrap(), 3);
    }

    // Scenario: the process restarts between two runs.
    // Expected Outcome: paging continues from the persisted cursor.
    #[traced_test]
    #[tokio::test]
    async fn cursor_survives_restart() {
        let env = TestEnv::new(PagedSource::new(&[&[1], &[2]]));
        {
            let orchestrator = env.orchestrator(SyncSettings::default());
            orchestrator.synchronize(SyncRequest::next_page()).await.unwrap();
        }

        let env = env.restart();
        assert_eq!(env.last_page(), Some(0));

        let outcome = env
            .orchestrator(SyncSettings::default())
            .synchronize(SyncRequest::next_page())
            .await
            .unwrap();
        assert_eq!(outcome.page, 1);
        assert_eq!(outcome.items, ids(&[2]));
    }

    // Scenario: REFRESH inside and then outside the 7 day window.
    // Expected Outcome: the first is served from cache without remote calls,
    // the second refetches page 0 and resets paging.
    #[traced_test]
    #[tokio::test]
    async fn refresh_respects_the_window() {
        let env = TestEnv::new(PagedSource::new(&[&[1, 2], &[3]]));
        let orchestrator = env.orchestrator(SyncSettings::default());
        orchestrator.synchronize(SyncRequest::next_page()).await.unwrap();
        orchestrator.synchronize(SyncRequest::next_page()).await.unwrap();

        env.clock.advance(Duration::days(3));
        let cached = orchestrator.synchronize(SyncRequest::refresh()).await.unwrap();
        assert!(cached.served_from_cache());
        assert_eq!(cached.items, ids(&[1, 2]));
        assert_eq!(env.source.requested(), vec![0, 1]);
        assert_eq!(env.last_page(), Some(1));

        env.clock.advance(Duration::days(5));
        let fresh = orchestrator.synchronize(SyncRequest::refresh()).await.unwrap();
        assert_eq!(fresh.origin, FetchOrigin::Remote);
        assert_eq!(env.source.requested(), vec![0, 1, 0]);
        assert_eq!(env.last_page(), Some(0));
        assert_eq!(env.last_refresh(), Some(env.clock.now()));
        assert_eq!(env.cache.page_count(&POPULAR.into()).unwrap(), 1);
    }

    // Scenario: an expired window while paging past page 0.
    // Expected Outcome: the window only guards page 0, so the next page is
    // still fetched normally and the timestamp is left alone.
    #[traced_test]
    #[tokio::test]
    async fn expired_window_only_guards_first_page() {
        let env = TestEnv::new(PagedSource::new(&[&[1], &[2]]));
        let orchestrator = env.orchestrator(SyncSettings::default());
        orchestrator.synchronize(SyncRequest::next_page()).await.unwrap();
        let refreshed = env.last_refresh();

        env.clock.advance(Duration::days(10));
        let outcome = orchestrator.synchronize(SyncRequest::next_page()).await.unwrap();

        assert_eq!(outcome.page, 1);
        assert_eq!(env.last_refresh(), refreshed);
    }

    // Scenario: a forced REFRESH right after a successful one.
    // Expected Outcome: page 0 is fetched again.
    #[traced_test]
    #[tokio::test]
    async fn forced_refresh_bypasses_cache() {
        let env = TestEnv::new(PagedSource::new(&[&[1]]));
        let orchestrator = env.orchestrator(SyncSettings::default());
        orchestrator.synchronize(SyncRequest::refresh()).await.unwrap();

        let outcome = orchestrator
            .synchronize(SyncRequest::refresh().forced())
            .await
            .unwrap();

        assert_eq!(outcome.origin, FetchOrigin::Remote);
        assert_eq!(env.source.requested(), vec![0, 0]);
    }

    // Scenario: the same page is synced again as time passes.
    // Expected Outcome: records are refetched only once their own max age
    // (14 days for details, 28 for images) has passed.
    #[traced_test]
    #[tokio::test]
    async fn enrichment_records_expire_independently() {
        let env = TestEnv::new(PagedSource::new(&[&[7]]));
        let orchestrator = env.orchestrator(SyncSettings::default());
        orchestrator.synchronize(SyncRequest::refresh()).await.unwrap();

        orchestrator.synchronize(SyncRequest::refresh()).await.unwrap();
        assert_eq!(env.details.calls_for(7), 1);
        assert_eq!(env.images.calls_for(7), 1);

        env.clock.advance(Duration::days(15));
        orchestrator.synchronize(SyncRequest::refresh()).await.unwrap();
        assert_eq!(env.details.calls_for(7), 2);
        assert_eq!(env.images.calls_for(7), 1);
    }

    // Scenario: details for one item cannot be found, default policy.
    // Expected Outcome: the run fails at the enrichment stage naming the
    // item, but the page itself stays committed.
    #[traced_test]
    #[tokio::test]
    async fn missing_record_fails_the_run() {
        let env = TestEnv::with_fetchers(
            PagedSource::new(&[&[1, 2, 3]]),
            CountingFetcher::missing(&[2]),
            CountingFetcher::default(),
        );

        let err = env
            .orchestrator(SyncSettings::default().with_max_concurrent_enrichments(1))
            .synchronize(SyncRequest::refresh())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), SyncStage::Enrichment);
        assert_eq!(err.item_id().map(|id| id.get()), Some(2));
        assert!(matches!(err, SyncError::Enrichment { ref enricher, .. } if enricher == "details"));
        assert_eq!(env.last_page(), Some(0));
    }

    // Scenario: same missing record under the best-effort policy.
    // Expected Outcome: the run succeeds, lists the failure and enriches the rest.
    #[traced_test]
    #[tokio::test]
    async fn best_effort_keeps_going() {
        let env = TestEnv::with_fetchers(
            PagedSource::new(&[&[1, 2, 3]]),
            CountingFetcher::missing(&[2]),
            CountingFetcher::default(),
        );
        let settings = SyncSettings::default().with_policy(EnrichmentPolicy::BestEffort);

        let outcome = env
            .orchestrator(settings)
            .synchronize(SyncRequest::refresh())
            .await
            .unwrap();

        assert_eq!(outcome.enriched, 5);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].item_id.get(), 2);
        assert_eq!(env.images.total_calls(), 3);
    }

    // Scenario: the remote drops the first two page requests.
    // Expected Outcome: the retry policy absorbs them and the run succeeds.
    #[traced_test]
    #[tokio::test]
    async fn transient_page_errors_are_retried() {
        let env = TestEnv::new(PagedSource::new(&[&[1]]));
        env.source.fail_next(2);

        let outcome = env
            .orchestrator(SyncSettings::default())
            .synchronize(SyncRequest::next_page())
            .await
            .unwrap();

        assert_eq!(outcome.items, ids(&[1]));
        assert_eq!(env.source.requested(), vec![0, 0, 0]);
    }

    // Scenario: the remote keeps failing past the retry budget.
    // Expected Outcome: a page fetch error, nothing committed.
    #[traced_test]
    #[tokio::test]
    async fn persistent_page_errors_surface() {
        let env = TestEnv::new(PagedSource::new(&[&[1]]));
        env.source.fail_next(10);

        let err = env
            .orchestrator(SyncSettings::default())
            .synchronize(SyncRequest::next_page())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), SyncStage::PageFetch);
        assert_eq!(env.last_page(), None);
        assert_eq!(env.last_refresh(), None);
    }
}
