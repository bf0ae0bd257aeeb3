//! Poll Engine
//!
//! Runs fetch rounds on a fixed period and commits them into [`PollState`].
//! Counter fetches run concurrently; the leaderboard fetch follows once both
//! counters are in. Cycles never overlap: an early poll waits for the one in
//! flight to finish.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::simulate::{simulate_list, SimulationError, SimulationMode};
use super::state::{CycleOutcome, CycleReport, PollState};
use crate::config::PollConfig;
use crate::upstream::{FetchError, Fetcher};

/// Capacity of the poll event channel
const EVENT_CAPACITY: usize = 64;

/// Published after every cycle
#[derive(Debug, Clone)]
pub enum PollEvent {
    Committed(CycleReport),
    Failed { message: String },
}

/// Errors that abort a cycle without committing it
#[derive(Debug, Error)]
pub enum PollError {
    #[error("No value for tracked account {did}: {source}")]
    CounterUnavailable {
        did: String,
        #[source]
        source: FetchError,
    },
}

/// Drives the poll cycle
pub struct Poller {
    fetcher: Arc<Fetcher>,
    state: Arc<RwLock<PollState>>,
    interval: Duration,
    cycle_lock: Mutex<()>,
    events: broadcast::Sender<PollEvent>,
}

impl Poller {
    pub fn new(fetcher: Arc<Fetcher>, config: &PollConfig) -> Self {
        let state = PollState::new(fetcher.tracking().challenger.did.clone());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            fetcher,
            state: Arc::new(RwLock::new(state)),
            interval: config.interval(),
            cycle_lock: Mutex::new(()),
            events,
        }
    }

    pub fn state(&self) -> Arc<RwLock<PollState>> {
        Arc::clone(&self.state)
    }

    pub fn fetcher(&self) -> &Arc<Fetcher> {
        &self.fetcher
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PollEvent> {
        self.events.subscribe()
    }

    /// Fetch everything and commit it as one cycle.
    ///
    /// On error the state is left untouched and a `Failed` event is published.
    pub async fn run_cycle(&self) -> Result<CycleReport, PollError> {
        let _guard = self.cycle_lock.lock().await;
        let started = std::time::Instant::now();

        let outcome = match self.fetch_outcome().await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Poll cycle failed, state not committed");
                let _ = self.events.send(PollEvent::Failed {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        let report = {
            let incumbent_did = &self.fetcher.tracking().incumbent.did;
            let mut state = self.state.write().await;
            state.commit(outcome, self.interval, incumbent_did)
        };

        tracing::info!(
            cycle = report.cycle,
            incumbent = report.counters.incumbent,
            challenger = report.counters.challenger,
            gap = report.comparison.gap,
            challenger_rank = ?report.challenger.current,
            duration_ms = started.elapsed().as_millis() as u64,
            "Poll cycle committed"
        );

        let _ = self.events.send(PollEvent::Committed(report.clone()));
        Ok(report)
    }

    async fn fetch_outcome(&self) -> Result<CycleOutcome, PollError> {
        let tracking = self.fetcher.tracking();
        let (incumbent, challenger) = self.fetcher.tracked_counters().await;

        let incumbent = incumbent.map_err(|source| PollError::CounterUnavailable {
            did: tracking.incumbent.did.clone(),
            source,
        })?;
        let challenger = challenger.map_err(|source| PollError::CounterUnavailable {
            did: tracking.challenger.did.clone(),
            source,
        })?;

        let readings = [incumbent, challenger];
        let ranked_list = self
            .fetcher
            .ranked_list_with(self.fetcher.default_limit(), &readings)
            .await;
        let [incumbent, challenger] = readings;

        Ok(CycleOutcome {
            incumbent,
            challenger,
            ranked_list,
            fetched_at: Utc::now(),
        })
    }

    /// Commit a cycle built from the last committed one, with the leaderboard
    /// rearranged by `mode`. Counters are carried over unchanged.
    pub async fn simulate(&self, mode: SimulationMode) -> Result<CycleReport, SimulationError> {
        let _guard = self.cycle_lock.lock().await;
        let tracking = self.fetcher.tracking();

        let report = {
            let mut state = self.state.write().await;
            let Some((incumbent, challenger)) = state.readings().cloned() else {
                return Err(SimulationError::NoCycle);
            };
            let ranked_list = simulate_list(state.ranked_list(), &tracking.challenger, mode)?;

            let outcome = CycleOutcome {
                incumbent,
                challenger,
                ranked_list,
                fetched_at: Utc::now(),
            };
            state.commit(outcome, self.interval, &tracking.incumbent.did)
        };

        tracing::warn!(
            ?mode,
            cycle = report.cycle,
            challenger_rank = ?report.challenger.current,
            "Simulated leaderboard committed"
        );

        let _ = self.events.send(PollEvent::Committed(report.clone()));
        Ok(report)
    }

    /// Start the poll loop. The first cycle runs immediately.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tracing::info!(interval_secs = self.interval.as_secs(), "Starting poll loop");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                // failures are logged and published by run_cycle
                let _ = self.run_cycle().await;
            }
        })
    }
}
