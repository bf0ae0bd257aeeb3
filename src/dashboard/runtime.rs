//! Dashboard Runtime
//!
//! Owns the [`DashboardState`], feeds it actions from a channel and executes
//! the returned timer effects as abortable tokio tasks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;

use super::celebration::ActiveCelebration;
use super::state::{Action, DashboardState, Effect, Notice, TimerId};

const EVENT_CAPACITY: usize = 64;

/// Visible changes, published after each action
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    CelebrationStarted(ActiveCelebration),
    CelebrationEnded { id: u64 },
    NoticeRaised(Notice),
    ErrorChanged(Option<String>),
}

pub struct DashboardRuntime {
    state: Arc<RwLock<DashboardState>>,
    actions: mpsc::UnboundedSender<Action>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<Action>>>,
    events: broadcast::Sender<DashboardEvent>,
}

impl DashboardRuntime {
    pub fn new(initial: DashboardState) -> Self {
        let (actions, receiver) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            state: Arc::new(RwLock::new(initial)),
            actions,
            receiver: Mutex::new(Some(receiver)),
            events,
        }
    }

    pub fn state(&self) -> Arc<RwLock<DashboardState>> {
        Arc::clone(&self.state)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    /// Queue an action; applied in order by the driver task
    pub fn dispatch(&self, action: Action) {
        if self.actions.send(action).is_err() {
            tracing::warn!("Dashboard driver is gone, action dropped");
        }
    }

    /// Spawn the driver and the one-second countdown ticker
    pub fn start(self: Arc<Self>) -> Vec<JoinHandle<()>> {
        let driver = tokio::spawn(Arc::clone(&self).drive());

        let ticker = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.dispatch(Action::Tick);
            }
        });

        vec![driver, ticker]
    }

    async fn drive(self: Arc<Self>) {
        let Some(mut receiver) = self.receiver.lock().await.take() else {
            tracing::warn!("Dashboard runtime already started");
            return;
        };
        let mut timers: HashMap<TimerId, JoinHandle<()>> = HashMap::new();

        while let Some(action) = receiver.recv().await {
            let (effects, events) = {
                let mut state = self.state.write().await;
                let before = Snapshot::of(&state);
                let effects = state.apply(action);
                (effects, before.diff(&Snapshot::of(&state)))
            };

            for effect in effects {
                match effect {
                    Effect::Schedule { timer, after } => {
                        let actions = self.actions.clone();
                        let handle = tokio::spawn(async move {
                            tokio::time::sleep(after).await;
                            let _ = actions.send(Action::Expire(timer));
                        });
                        if let Some(previous) = timers.insert(timer, handle) {
                            previous.abort();
                        }
                    }
                    Effect::Cancel(timer) => {
                        if let Some(handle) = timers.remove(&timer) {
                            handle.abort();
                        }
                    }
                }
            }
            timers.retain(|_, handle| !handle.is_finished());

            for event in events {
                let _ = self.events.send(event);
            }
        }
    }
}

/// Fields compared before and after an action
struct Snapshot {
    active: Option<ActiveCelebration>,
    notice: Option<Notice>,
    error: Option<String>,
}

impl Snapshot {
    fn of(state: &DashboardState) -> Self {
        Self {
            active: state.active().copied(),
            notice: state.notice().cloned(),
            error: state.error().map(str::to_string),
        }
    }

    fn diff(self, after: &Snapshot) -> Vec<DashboardEvent> {
        let mut events = Vec::new();

        if self.active.map(|a| a.id) != after.active.map(|a| a.id) {
            if let Some(ended) = self.active {
                events.push(DashboardEvent::CelebrationEnded { id: ended.id });
            }
            if let Some(started) = after.active {
                events.push(DashboardEvent::CelebrationStarted(started));
            }
        }
        if let Some(notice) = &after.notice {
            if self.notice.as_ref().map(|n| n.id) != Some(notice.id) {
                events.push(DashboardEvent::NoticeRaised(notice.clone()));
            }
        }
        if self.error != after.error {
            events.push(DashboardEvent::ErrorChanged(after.error.clone()));
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::dashboard::Celebration;
    use crate::metrics;
    use crate::model::CounterPair;
    use crate::poll::CycleReport;
    use crate::rank::{RankObservation, RankTransition};
    use chrono::Utc;

    fn runtime(celebration_timeout_secs: u64) -> Arc<DashboardRuntime> {
        let timing = DashboardConfig {
            celebration_timeout_secs,
            ..Default::default()
        };
        Arc::new(DashboardRuntime::new(DashboardState::new(
            timing,
            Duration::from_secs(60),
        )))
    }

    fn rank_up(cycle: u64, rank: u32) -> Action {
        let counters = CounterPair::new(100, 90);
        Action::CycleCommitted(Box::new(CycleReport {
            cycle,
            committed_at: Utc::now(),
            counters,
            previous: None,
            comparison: metrics::compare(counters, None, Duration::from_secs(60)),
            incumbent_rank: Some(1),
            challenger: RankObservation {
                previous: Some(rank + 1),
                current: Some(rank),
                transition: Some(RankTransition::RankedUp { rank }),
            },
            incumbent_fallback: false,
            challenger_fallback: false,
        }))
    }

    async fn next_event(events: &mut broadcast::Receiver<DashboardEvent>) -> DashboardEvent {
        tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("no dashboard event")
            .unwrap()
    }

    #[tokio::test]
    async fn test_celebration_expires() {
        let runtime = runtime(1);
        let mut events = runtime.subscribe();
        let handles = Arc::clone(&runtime).start();

        runtime.dispatch(rank_up(1, 3));
        let started = match next_event(&mut events).await {
            DashboardEvent::CelebrationStarted(active) => active,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(started.celebration, Celebration::RankedUp { rank: 3 });

        assert_eq!(
            next_event(&mut events).await,
            DashboardEvent::CelebrationEnded { id: started.id }
        );
        assert!(runtime.state().read().await.active().is_none());

        for handle in handles {
            handle.abort();
        }
    }

    #[tokio::test]
    async fn test_dismiss_cancels_timer() {
        let runtime = runtime(1);
        let mut events = runtime.subscribe();
        let handles = Arc::clone(&runtime).start();

        runtime.dispatch(rank_up(1, 3));
        let first = match next_event(&mut events).await {
            DashboardEvent::CelebrationStarted(active) => active,
            other => panic!("unexpected {:?}", other),
        };
        runtime.dispatch(Action::Dismiss(first.id));
        assert!(matches!(
            next_event(&mut events).await,
            DashboardEvent::CelebrationEnded { .. }
        ));

        runtime.dispatch(rank_up(2, 2));
        let second = match next_event(&mut events).await {
            DashboardEvent::CelebrationStarted(active) => active,
            other => panic!("unexpected {:?}", other),
        };

        // the dismissed timer must not close the new celebration early
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(
            runtime.state().read().await.active().map(|a| a.id),
            Some(second.id)
        );

        for handle in handles {
            handle.abort();
        }
    }

    #[tokio::test]
    async fn test_start_twice_is_harmless() {
        let runtime = runtime(12);
        let first = Arc::clone(&runtime).start();
        let second = Arc::clone(&runtime).start();

        runtime.dispatch(Action::CycleFailed);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(runtime.state().read().await.error().is_some());

        for handle in first.into_iter().chain(second) {
            handle.abort();
        }
    }
}
