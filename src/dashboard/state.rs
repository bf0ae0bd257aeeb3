//! Dashboard Reducer
//!
//! UI state changes only through [`DashboardState::apply`]. Timers are not
//! owned here: the reducer returns [`Effect`]s and the runtime turns them into
//! tasks that report back with [`Action::Expire`].

use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

use super::celebration::{ActiveCelebration, Celebration};
use super::countdown::Countdown;
use crate::config::DashboardConfig;
use crate::poll::CycleReport;

/// Shown after a failed cycle until the next successful one
pub const GENERIC_ERROR: &str = "Failed to fetch data. Please try again later.";

pub const COUNT_INCREASED: &str = "Count increased!";

/// Timer identity; ids are never reused, so a stale expiry is a no-op
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "timer", content = "id", rename_all = "snake_case")]
pub enum TimerId {
    Celebration(u64),
    Notice(u64),
}

#[derive(Debug, Clone)]
pub enum Action {
    CycleCommitted(Box<CycleReport>),
    CycleFailed,
    /// One-second countdown tick
    Tick,
    /// User closed the celebration with this id
    Dismiss(u64),
    Expire(TimerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Schedule { timer: TimerId, after: Duration },
    Cancel(TimerId),
}

/// Transient message, auto-cleared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    timing: DashboardConfig,
    active: Option<ActiveCelebration>,
    queued: VecDeque<(Celebration, u64)>,
    notice: Option<Notice>,
    countdown: Countdown,
    error: Option<String>,
    last_cycle: u64,
    overtake_armed: bool,
    next_id: u64,
}

impl DashboardState {
    pub fn new(timing: DashboardConfig, poll_interval: Duration) -> Self {
        Self {
            timing,
            active: None,
            queued: VecDeque::new(),
            notice: None,
            countdown: Countdown::new(poll_interval.as_secs()),
            error: None,
            last_cycle: 0,
            overtake_armed: true,
            next_id: 1,
        }
    }

    pub fn apply(&mut self, action: Action) -> Vec<Effect> {
        let mut effects = Vec::new();

        match action {
            Action::CycleCommitted(report) => self.on_cycle(&report, &mut effects),
            Action::CycleFailed => {
                self.error = Some(GENERIC_ERROR.to_string());
            }
            Action::Tick => {
                self.countdown.tick();
            }
            Action::Dismiss(id) => {
                if self.active.is_some_and(|active| active.id == id) {
                    self.active = None;
                    effects.push(Effect::Cancel(TimerId::Celebration(id)));
                    self.advance(&mut effects);
                }
            }
            Action::Expire(TimerId::Celebration(id)) => {
                if self.active.is_some_and(|active| active.id == id) {
                    self.active = None;
                    self.advance(&mut effects);
                }
            }
            Action::Expire(TimerId::Notice(id)) => {
                if self.notice.as_ref().is_some_and(|notice| notice.id == id) {
                    self.notice = None;
                }
            }
        }

        effects
    }

    fn on_cycle(&mut self, report: &CycleReport, effects: &mut Vec<Effect>) {
        // a report is applied at most once
        if report.cycle <= self.last_cycle {
            return;
        }
        self.last_cycle = report.cycle;
        self.error = None;
        self.countdown.reset();

        if let Some(transition) = report.challenger.transition {
            self.raise(transition.into(), report.cycle, effects);
        }

        if report.counters.challenger_leads() {
            if self.overtake_armed {
                self.overtake_armed = false;
                self.raise(Celebration::Overtaken, report.cycle, effects);
            }
        } else {
            self.overtake_armed = true;
        }

        if report.challenger_increased() {
            if let Some(old) = self.notice.take() {
                effects.push(Effect::Cancel(TimerId::Notice(old.id)));
            }
            let id = self.allocate_id();
            self.notice = Some(Notice {
                id,
                message: COUNT_INCREASED.to_string(),
            });
            effects.push(Effect::Schedule {
                timer: TimerId::Notice(id),
                after: Duration::from_secs(self.timing.notice_timeout_secs),
            });
        }
    }

    /// Show or queue a celebration.
    ///
    /// ReachedFirst replaces whatever is showing and drops pending rank-ups;
    /// an interrupted Overtaken goes back to the front of the queue. A newer
    /// rank-up replaces an older one, whether showing or queued.
    fn raise(&mut self, celebration: Celebration, cycle: u64, effects: &mut Vec<Effect>) {
        let Some(active) = self.active else {
            self.activate(celebration, cycle, effects);
            return;
        };

        match (celebration, active.celebration) {
            (Celebration::ReachedFirst, Celebration::ReachedFirst) => {}
            (Celebration::ReachedFirst, current) => {
                effects.push(Effect::Cancel(TimerId::Celebration(active.id)));
                self.active = None;
                self.queued
                    .retain(|(queued, _)| !matches!(queued, Celebration::RankedUp { .. }));
                if current == Celebration::Overtaken {
                    self.queued.push_front((current, active.cycle));
                }
                self.activate(celebration, cycle, effects);
            }
            (Celebration::RankedUp { .. }, Celebration::ReachedFirst) => {
                tracing::debug!(?celebration, "Rank-up superseded by #1 celebration");
            }
            (Celebration::RankedUp { .. }, Celebration::RankedUp { .. }) => {
                effects.push(Effect::Cancel(TimerId::Celebration(active.id)));
                self.active = None;
                self.activate(celebration, cycle, effects);
            }
            (Celebration::RankedUp { .. }, _) => {
                self.queued
                    .retain(|(queued, _)| !matches!(queued, Celebration::RankedUp { .. }));
                self.queued.push_back((celebration, cycle));
            }
            _ => self.queued.push_back((celebration, cycle)),
        }
    }

    fn activate(&mut self, celebration: Celebration, cycle: u64, effects: &mut Vec<Effect>) {
        let id = self.allocate_id();
        let timeout = if celebration.is_blocking() {
            self.timing.reached_first_timeout_secs
        } else {
            self.timing.celebration_timeout_secs
        };

        if celebration.is_blocking() {
            self.countdown.suspend();
        } else {
            self.countdown.resume();
        }

        tracing::info!(id, ?celebration, cycle, "Celebration started");
        self.active = Some(ActiveCelebration {
            id,
            celebration,
            cycle,
        });
        effects.push(Effect::Schedule {
            timer: TimerId::Celebration(id),
            after: Duration::from_secs(timeout),
        });
    }

    /// Show the next queued celebration, or resume the countdown
    fn advance(&mut self, effects: &mut Vec<Effect>) {
        match self.queued.pop_front() {
            Some((celebration, cycle)) => self.activate(celebration, cycle, effects),
            None => self.countdown.resume(),
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn active(&self) -> Option<&ActiveCelebration> {
        self.active.as_ref()
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Last cycle applied
    pub fn last_cycle(&self) -> u64 {
        self.last_cycle
    }
}
