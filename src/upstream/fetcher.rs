//! Fetcher
//!
//! Applies the fallback policy on top of a [`BlockSource`]: tracked counters
//! degrade to their last-known-good constants, the leaderboard degrades to the
//! static list, and missing handles are resolved one at a time through the
//! throttle.

use serde::Serialize;
use std::sync::Arc;

use super::error::FetchError;
use super::fallback;
use super::throttle::Throttle;
use super::BlockSource;
use crate::config::{TrackingConfig, UpstreamConfig};
use crate::model::{AccountSnapshot, RankedList};

/// Where a counter value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterSource {
    Live,
    Fallback,
}

/// A tracked counter after the fallback policy was applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterReading {
    pub did: String,
    pub count: u64,
    pub source: CounterSource,
    /// Upstream error that forced the fallback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CounterReading {
    pub fn live(did: impl Into<String>, count: u64) -> Self {
        Self {
            did: did.into(),
            count,
            source: CounterSource::Live,
            error: None,
        }
    }

    pub fn fallback(did: impl Into<String>, count: u64, error: &FetchError) -> Self {
        Self {
            did: did.into(),
            count,
            source: CounterSource::Fallback,
            error: Some(error.to_string()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == CounterSource::Fallback
    }
}

/// Fallback-aware front end to the statistics API
pub struct Fetcher {
    source: Arc<dyn BlockSource>,
    tracking: TrackingConfig,
    throttle: Throttle,
    default_limit: usize,
}

impl Fetcher {
    pub fn new(source: Arc<dyn BlockSource>, tracking: TrackingConfig, upstream: &UpstreamConfig) -> Self {
        Self {
            source,
            tracking,
            throttle: Throttle::new(upstream.handle_resolve_interval()),
            default_limit: upstream.ranked_list_limit,
        }
    }

    pub fn tracking(&self) -> &TrackingConfig {
        &self.tracking
    }

    /// Configured leaderboard length
    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Blocker count for one account, no fallback
    pub async fn fetch_counter(&self, did: &str) -> Result<u64, FetchError> {
        if did.trim().is_empty() {
            return Err(FetchError::InvalidId);
        }
        self.source.blocker_count(did).await
    }

    /// Blocker count with the tracked-account policy applied.
    ///
    /// Tracked accounts with a configured fallback never fail; every other
    /// identifier propagates the upstream error.
    pub async fn counter_with_fallback(&self, did: &str) -> Result<CounterReading, FetchError> {
        match self.fetch_counter(did).await {
            Ok(count) => Ok(CounterReading::live(did, count)),
            Err(e) => match self.tracking.fallback_for(did) {
                Some(count) => {
                    tracing::warn!(
                        did = %did,
                        kind = e.kind(),
                        error = %e,
                        fallback = count,
                        "Counter fetch failed, using fallback"
                    );
                    Ok(CounterReading::fallback(did, count, &e))
                }
                None => Err(e),
            },
        }
    }

    /// Both tracked counters, fetched concurrently
    pub async fn tracked_counters(
        &self,
    ) -> (
        Result<CounterReading, FetchError>,
        Result<CounterReading, FetchError>,
    ) {
        tokio::join!(
            self.counter_with_fallback(&self.tracking.incumbent.did),
            self.counter_with_fallback(&self.tracking.challenger.did),
        )
    }

    /// Top `limit` most-blocked accounts, sorted descending by count.
    ///
    /// Never fails: if the leaderboard endpoint is unusable the static list is
    /// returned, refreshed with freshly fetched tracked counters.
    pub async fn fetch_ranked_list(&self, limit: usize) -> RankedList {
        match self.live_ranked_list(limit).await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(kind = e.kind(), error = %e, "Leaderboard fetch failed, using fallback list");
                let (incumbent, challenger) = self.tracked_counters().await;
                let readings: Vec<CounterReading> = [incumbent, challenger].into_iter().flatten().collect();
                self.fallback_ranked_list(limit, &readings)
            }
        }
    }

    /// Like [`fetch_ranked_list`](Self::fetch_ranked_list), but the fallback
    /// list is refreshed from readings the caller already holds, so a poll
    /// cycle commits one consistent set of counts.
    pub async fn ranked_list_with(&self, limit: usize, readings: &[CounterReading]) -> RankedList {
        match self.live_ranked_list(limit).await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(kind = e.kind(), error = %e, "Leaderboard fetch failed, using fallback list");
                self.fallback_ranked_list(limit, readings)
            }
        }
    }

    async fn live_ranked_list(&self, limit: usize) -> Result<RankedList, FetchError> {
        let entries = self.source.top_blocked().await?;

        let mut snapshots = Vec::with_capacity(limit.min(entries.len()));
        for entry in entries.into_iter().take(limit) {
            let handle = match entry.handle {
                Some(handle) => handle,
                None => self.resolve_handle(&entry.did).await,
            };
            snapshots.push(AccountSnapshot::new(entry.did, handle, entry.count));
        }

        tracing::debug!(entries = snapshots.len(), "Fetched leaderboard");
        Ok(RankedList::from_unsorted(snapshots))
    }

    /// Display handle for a DID. Known handles skip the network; lookups are
    /// spaced by the throttle; unresolvable DIDs get a truncated placeholder.
    pub async fn resolve_handle(&self, did: &str) -> String {
        if let Some(handle) = self.known_handle(did) {
            return handle.to_string();
        }

        self.throttle.acquire().await;
        match self.source.lookup_handle(did).await {
            Some(handle) => handle,
            None => {
                tracing::debug!(did = %did, "Handle unresolved, using truncated DID");
                fallback::truncated_did(did)
            }
        }
    }

    fn known_handle(&self, did: &str) -> Option<&str> {
        self.tracking
            .account(did)
            .map(|account| account.handle.as_str())
            .or_else(|| fallback::known_handle(did))
    }

    fn fallback_ranked_list(&self, limit: usize, readings: &[CounterReading]) -> RankedList {
        let mut entries = fallback::mock_blocked_accounts();

        for reading in readings {
            if let Some(entry) = entries.iter_mut().find(|e| e.did == reading.did) {
                entry.blocker_count = reading.count;
            }
        }

        let mut list = RankedList::from_unsorted(entries);
        list.truncate(limit);
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CHALLENGER_DID, INCUMBENT_DID};
    use crate::upstream::testing::FakeSource;
    use std::time::{Duration, Instant};

    fn fetcher(source: FakeSource) -> (Fetcher, Arc<FakeSource>) {
        let source = Arc::new(source);
        let upstream = UpstreamConfig {
            handle_resolve_interval_ms: 200,
            ..Default::default()
        };
        let fetcher = Fetcher::new(source.clone(), TrackingConfig::default(), &upstream);
        (fetcher, source)
    }

    #[tokio::test]
    async fn test_live_counter() {
        let (fetcher, _) = fetcher(FakeSource::new().with_count(INCUMBENT_DID, 7000));

        let reading = fetcher.counter_with_fallback(INCUMBENT_DID).await.unwrap();
        assert_eq!(reading.count, 7000);
        assert_eq!(reading.source, CounterSource::Live);
        assert!(reading.error.is_none());
    }

    #[tokio::test]
    async fn test_tracked_counters_fall_back() {
        let (fetcher, _) = fetcher(FakeSource::new());

        let (incumbent, challenger) = fetcher.tracked_counters().await;
        let incumbent = incumbent.unwrap();
        let challenger = challenger.unwrap();

        assert_eq!(incumbent.count, 6821);
        assert_eq!(challenger.count, 6550);
        assert!(incumbent.is_fallback());
        assert!(challenger.error.as_deref().unwrap().contains("Unexpected response shape"));
    }

    #[tokio::test]
    async fn test_untracked_counter_propagates() {
        let (fetcher, _) = fetcher(FakeSource::new());

        let err = fetcher.counter_with_fallback("did:plc:stranger").await.unwrap_err();
        assert!(matches!(err, FetchError::Schema { .. }));
    }

    #[tokio::test]
    async fn test_empty_id_rejected() {
        let (fetcher, source) = fetcher(FakeSource::new());

        let err = fetcher.fetch_counter("  ").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidId));
        assert_eq!(source.count_calls(), 0);
    }

    #[tokio::test]
    async fn test_ranked_list_sorted_and_limited() {
        let (fetcher, _) = fetcher(
            FakeSource::new()
                .with_entry("did:plc:a", 10, Some("a.test"))
                .with_entry("did:plc:b", 50, Some("b.test"))
                .with_entry("did:plc:c", 30, Some("c.test"))
                .with_entry("did:plc:d", 90, Some("d.test")),
        );

        let list = fetcher.fetch_ranked_list(3).await;
        let handles: Vec<_> = list.entries().iter().map(|e| e.handle.as_str()).collect();
        assert_eq!(handles, vec!["b.test", "c.test", "a.test"]);
    }

    #[tokio::test]
    async fn test_missing_handles_resolved_in_sequence() {
        let (fetcher, source) = fetcher(
            FakeSource::new()
                .with_entry(CHALLENGER_DID, 9000, None)
                .with_entry("did:plc:first", 8000, None)
                .with_entry("did:plc:second", 7000, None)
                .with_entry("did:plc:third", 6000, Some("given.test"))
                .with_handle("did:plc:first", "first.test"),
        );

        let start = Instant::now();
        let list = fetcher.fetch_ranked_list(20).await;

        assert_eq!(list.get(CHALLENGER_DID).unwrap().handle, "gemini.is-a.bot");
        assert_eq!(list.get("did:plc:first").unwrap().handle, "first.test");
        assert_eq!(list.get("did:plc:second").unwrap().handle, "did:plc:second...");
        assert_eq!(list.get("did:plc:third").unwrap().handle, "given.test");

        // two upstream lookups, one throttle gap between them
        assert_eq!(source.handle_calls(), 2);
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_fallback_list_uses_live_counts() {
        let (fetcher, _) = fetcher(
            FakeSource::new()
                .failing_leaderboard()
                .with_count(CHALLENGER_DID, 7200),
        );

        let list = fetcher.fetch_ranked_list(5).await;
        assert_eq!(list.len(), 5);
        assert_eq!(list.rank_of(CHALLENGER_DID), Some(1));
        assert_eq!(list.get(CHALLENGER_DID).unwrap().blocker_count, 7200);
        assert_eq!(list.get(INCUMBENT_DID).unwrap().blocker_count, 6821);
    }

    #[tokio::test]
    async fn test_fallback_list_placeholder_counts() {
        let (fetcher, _) = fetcher(FakeSource::new().failing_leaderboard());

        let list = fetcher.fetch_ranked_list(20).await;
        assert_eq!(list.len(), 10);
        assert_eq!(list.rank_of(INCUMBENT_DID), Some(1));
        assert_eq!(list.rank_of(CHALLENGER_DID), Some(2));
    }

    #[tokio::test]
    async fn test_fallback_list_reuses_cycle_readings() {
        let (fetcher, source) = fetcher(
            FakeSource::new()
                .failing_leaderboard()
                .with_count(INCUMBENT_DID, 9999),
        );
        let readings = [
            CounterReading::live(INCUMBENT_DID, 7000),
            CounterReading::live(CHALLENGER_DID, 7100),
        ];

        let list = fetcher.ranked_list_with(20, &readings).await;
        assert_eq!(source.count_calls(), 0);
        assert_eq!(list.get(INCUMBENT_DID).unwrap().blocker_count, 7000);
        assert_eq!(list.get(CHALLENGER_DID).unwrap().blocker_count, 7100);
        assert_eq!(list.rank_of(CHALLENGER_DID), Some(1));
    }
}
