//! Poll State
//!
//! Everything a poll cycle produces, committed as one unit. Readers (the API,
//! the metrics deriver) only ever see fully committed cycles.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use super::history::History;
use crate::metrics::{self, Comparison};
use crate::model::{CounterPair, RankedList};
use crate::rank::{RankObservation, RankTracker};
use crate::upstream::CounterReading;

/// Raw results of one successful fetch round
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub incumbent: CounterReading,
    pub challenger: CounterReading,
    pub ranked_list: RankedList,
    pub fetched_at: DateTime<Utc>,
}

/// Summary of a committed cycle, handed to the dashboard and WebSocket clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    /// Monotonic cycle number, starting at 1
    pub cycle: u64,
    pub committed_at: DateTime<Utc>,
    pub counters: CounterPair,
    pub previous: Option<CounterPair>,
    pub comparison: Comparison,
    pub incumbent_rank: Option<u32>,
    pub challenger: RankObservation,
    pub incumbent_fallback: bool,
    pub challenger_fallback: bool,
}

impl CycleReport {
    /// Challenger gained blockers since the previous committed cycle
    pub fn challenger_increased(&self) -> bool {
        self.previous
            .is_some_and(|previous| self.counters.challenger > previous.challenger)
    }

    pub fn incumbent_increased(&self) -> bool {
        self.previous
            .is_some_and(|previous| self.counters.incumbent > previous.incumbent)
    }
}

/// State shared between the poll loop and readers
#[derive(Debug, Clone)]
pub struct PollState {
    counters: History<CounterPair>,
    readings: Option<(CounterReading, CounterReading)>,
    ranked_list: RankedList,
    challenger_rank: RankTracker,
    incumbent_rank: Option<u32>,
    cycle: u64,
    last_committed_at: Option<DateTime<Utc>>,
    last_report: Option<CycleReport>,
}

impl PollState {
    pub fn new(challenger_did: impl Into<String>) -> Self {
        Self {
            counters: History::new(),
            readings: None,
            ranked_list: RankedList::default(),
            challenger_rank: RankTracker::new(challenger_did),
            incumbent_rank: None,
            cycle: 0,
            last_committed_at: None,
            last_report: None,
        }
    }

    /// Fold a successful fetch round into the state.
    ///
    /// All fields change together; `previous` becomes the counters of the
    /// cycle committed just before this one.
    pub fn commit(&mut self, outcome: CycleOutcome, interval: Duration, incumbent_did: &str) -> CycleReport {
        let counters = CounterPair::new(outcome.incumbent.count, outcome.challenger.count);
        self.counters.push(counters);
        let previous = self.counters.previous().copied();

        let challenger = self.challenger_rank.observe(&outcome.ranked_list);
        self.incumbent_rank = outcome.ranked_list.rank_of(incumbent_did);

        self.cycle += 1;
        self.last_committed_at = Some(outcome.fetched_at);

        let report = CycleReport {
            cycle: self.cycle,
            committed_at: outcome.fetched_at,
            counters,
            previous,
            comparison: metrics::compare(counters, previous, interval),
            incumbent_rank: self.incumbent_rank,
            challenger,
            incumbent_fallback: outcome.incumbent.is_fallback(),
            challenger_fallback: outcome.challenger.is_fallback(),
        };

        self.ranked_list = outcome.ranked_list;
        self.readings = Some((outcome.incumbent, outcome.challenger));
        self.last_report = Some(report.clone());

        report
    }

    pub fn counters(&self) -> &History<CounterPair> {
        &self.counters
    }

    /// Latest `(incumbent, challenger)` readings, with fallback markers
    pub fn readings(&self) -> Option<&(CounterReading, CounterReading)> {
        self.readings.as_ref()
    }

    pub fn ranked_list(&self) -> &RankedList {
        &self.ranked_list
    }

    pub fn challenger_rank(&self) -> Option<u32> {
        self.challenger_rank.recorded()
    }

    pub fn incumbent_rank(&self) -> Option<u32> {
        self.incumbent_rank
    }

    /// Number of committed cycles
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn last_committed_at(&self) -> Option<DateTime<Utc>> {
        self.last_committed_at
    }

    pub fn last_report(&self) -> Option<&CycleReport> {
        self.last_report.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccountSnapshot;
    use crate::rank::RankTransition;

    const MINUTE: Duration = Duration::from_secs(60);

    fn outcome(incumbent: u64, challenger: u64) -> CycleOutcome {
        CycleOutcome {
            incumbent: CounterReading::live("nyt", incumbent),
            challenger: CounterReading::live("gem", challenger),
            ranked_list: RankedList::from_unsorted(vec![
                AccountSnapshot::new("nyt", "nytimes.com", incumbent),
                AccountSnapshot::new("gem", "gemini.is-a.bot", challenger),
                AccountSnapshot::new("other", "other.test", 6000),
            ]),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_first_commit() {
        let mut state = PollState::new("gem");
        let report = state.commit(outcome(6821, 6550), MINUTE, "nyt");

        assert_eq!(report.cycle, 1);
        assert_eq!(report.previous, None);
        assert_eq!(report.comparison.gap, 271);
        assert!(report.comparison.rate.is_none());
        assert_eq!(report.incumbent_rank, Some(1));
        assert_eq!(report.challenger.current, Some(2));
        assert!(!report.challenger_increased());
    }

    #[test]
    fn test_previous_tracks_last_commit() {
        let mut state = PollState::new("gem");
        state.commit(outcome(100, 90), MINUTE, "nyt");
        state.commit(outcome(101, 95), MINUTE, "nyt");
        let report = state.commit(outcome(102, 99), MINUTE, "nyt");

        assert_eq!(report.previous, Some(CounterPair::new(101, 95)));
        assert_eq!(state.counters().current(), Some(&CounterPair::new(102, 99)));
        assert!(report.challenger_increased());
        assert!(report.comparison.rate.is_some());
    }

    #[test]
    fn test_overtake_is_reported_once() {
        let mut state = PollState::new("gem");
        state.commit(outcome(6821, 6550), MINUTE, "nyt");

        let report = state.commit(outcome(6821, 6900), MINUTE, "nyt");
        assert_eq!(report.challenger.transition, Some(RankTransition::ReachedFirst));
        assert!(report.counters.challenger_leads());

        let report = state.commit(outcome(6821, 6900), MINUTE, "nyt");
        assert_eq!(report.challenger.transition, None);
        assert_eq!(state.challenger_rank(), Some(1));
        assert_eq!(state.incumbent_rank(), Some(2));
    }
}
