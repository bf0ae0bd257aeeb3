//! Data Transfer Objects
//!
//! Response bodies for the API endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TrackingConfig;
use crate::dashboard::{ActiveCelebration, DashboardState, Notice};
use crate::format::{format_number, gap_headline};
use crate::metrics::Comparison;
use crate::model::{RankedList, TrackedAccount};
use crate::poll::{CycleReport, PollState, SimulationMode};
use crate::upstream::CounterReading;

// ============================================
// DASHBOARD DTOs
// ============================================

/// One tracked counter as the dashboard shows it
#[derive(Debug, Serialize)]
pub struct CounterView {
    pub did: String,
    pub handle: String,
    /// `None` until the first cycle commits
    pub value: Option<u64>,
    pub display: String,
    pub rank: Option<u32>,
    /// Value rose since the previous cycle
    pub increased: bool,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CounterView {
    fn build(
        account: &TrackedAccount,
        reading: Option<&CounterReading>,
        previous: Option<u64>,
        rank: Option<u32>,
    ) -> Self {
        let value = reading.map(|r| r.count);
        Self {
            did: account.did.clone(),
            handle: account.handle.clone(),
            value,
            display: format_number(value),
            rank,
            increased: matches!((value, previous), (Some(v), Some(p)) if v > p),
            fallback: reading.is_some_and(CounterReading::is_fallback),
            error: reading.and_then(|r| r.error.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CelebrationView {
    #[serde(flatten)]
    pub active: ActiveCelebration,
    pub title: String,
    pub message: String,
    pub blocking: bool,
}

#[derive(Debug, Serialize)]
pub struct CountdownView {
    pub seconds: u64,
    pub suspended: bool,
}

/// GET /api/v1/dashboard
#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub incumbent: CounterView,
    pub challenger: CounterView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
    pub ranked_list: Vec<RankedEntry>,
    pub celebration: Option<CelebrationView>,
    pub notice: Option<Notice>,
    pub countdown: CountdownView,
    pub error: Option<String>,
    pub cycle: u64,
    pub last_poll: Option<DateTime<Utc>>,
}

impl DashboardView {
    pub fn build(poll: &PollState, dashboard: &DashboardState, tracking: &TrackingConfig) -> Self {
        let readings = poll.readings();
        let previous = poll.counters().previous();
        let report = poll.last_report();

        let incumbent = CounterView::build(
            &tracking.incumbent,
            readings.map(|(incumbent, _)| incumbent),
            previous.map(|p| p.incumbent),
            poll.incumbent_rank(),
        );
        let challenger = CounterView::build(
            &tracking.challenger,
            readings.map(|(_, challenger)| challenger),
            previous.map(|p| p.challenger),
            poll.challenger_rank(),
        );

        let celebration = dashboard.active().map(|active| CelebrationView {
            title: active.celebration.title().to_string(),
            message: active
                .celebration
                .message(&tracking.challenger.handle, &tracking.incumbent.handle),
            blocking: active.celebration.is_blocking(),
            active: *active,
        });

        Self {
            headline: report.map(|r| {
                gap_headline(r.comparison.gap, &tracking.incumbent.handle, &tracking.challenger.handle)
            }),
            comparison: report.map(|r| r.comparison),
            ranked_list: RankedEntry::from_list(poll.ranked_list(), tracking),
            celebration,
            notice: dashboard.notice().cloned(),
            countdown: CountdownView {
                seconds: dashboard.countdown().remaining(),
                suspended: dashboard.countdown().is_suspended(),
            },
            error: dashboard.error().map(str::to_string),
            cycle: poll.cycle(),
            last_poll: poll.last_committed_at(),
            incumbent,
            challenger,
        }
    }
}

// ============================================
// LEADERBOARD DTOs
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrackedRole {
    Incumbent,
    Challenger,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: u32,
    pub did: String,
    pub handle: String,
    pub blocker_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracked: Option<TrackedRole>,
}

impl RankedEntry {
    pub fn from_list(list: &RankedList, tracking: &TrackingConfig) -> Vec<Self> {
        list.iter_ranked()
            .map(|(rank, snapshot)| RankedEntry {
                rank,
                did: snapshot.did.clone(),
                handle: snapshot.handle.clone(),
                blocker_count: snapshot.blocker_count,
                tracked: if snapshot.did == tracking.incumbent.did {
                    Some(TrackedRole::Incumbent)
                } else if snapshot.did == tracking.challenger.did {
                    Some(TrackedRole::Challenger)
                } else {
                    None
                },
            })
            .collect()
    }
}

/// GET /api/v1/leaderboard
#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub entries: Vec<RankedEntry>,
    pub total: usize,
    pub cycle: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    #[serde(default)]
    pub limit: Option<usize>,
}

// ============================================
// ACTION DTOs
// ============================================

/// POST /api/v1/poll
#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub status: String,
    pub report: CycleReport,
}

/// POST /api/v1/debug/simulate
#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub mode: SimulationMode,
}

/// POST /api/v1/celebrations/dismiss
#[derive(Debug, Serialize)]
pub struct DismissResponse {
    pub dismissed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

// ============================================
// HEALTH DTOs
// ============================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy", "degraded" or "starting"
    pub status: String,
    pub cycles: u64,
    pub last_poll: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub ws_connections: usize,
    pub uptime_seconds: u64,
    pub version: String,
}
