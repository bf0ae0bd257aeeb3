//! Comparative Metrics
//!
//! Pure functions over the two most recent counter snapshots: the gap between
//! the tracked accounts, how close the challenger is to overtaking, and the
//! hourly rate at which the gap is changing.

use serde::Serialize;
use std::time::Duration;

use crate::model::CounterPair;

/// Which tracked account currently has more blockers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Leader {
    Incumbent,
    Challenger,
    Tied,
}

/// Change in the gap between two consecutive polls, scaled to one hour
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "trend", rename_all = "snake_case")]
pub enum RateOfChange {
    /// The challenger gained more blockers than the incumbent
    Closing {
        blocks_per_hour: f64,
        /// Only projected while the incumbent is still ahead
        #[serde(skip_serializing_if = "Option::is_none")]
        hours_to_overtake: Option<u64>,
    },
    /// The incumbent gained more blockers than the challenger
    PullingAhead { blocks_per_hour: f64 },
}

impl RateOfChange {
    pub fn blocks_per_hour(&self) -> f64 {
        match self {
            RateOfChange::Closing { blocks_per_hour, .. } => *blocks_per_hour,
            RateOfChange::PullingAhead { blocks_per_hour } => *blocks_per_hour,
        }
    }
}

/// Everything derived from one poll
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    pub gap: i64,
    pub leader: Leader,
    pub percent_to_overtake: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<RateOfChange>,
}

/// `incumbent - challenger`; positive while the incumbent leads
pub fn gap(incumbent: u64, challenger: u64) -> i64 {
    incumbent as i64 - challenger as i64
}

pub fn leader(gap: i64) -> Leader {
    match gap {
        g if g > 0 => Leader::Incumbent,
        g if g < 0 => Leader::Challenger,
        _ => Leader::Tied,
    }
}

/// Challenger's count as a rounded percentage of the incumbent's while the
/// incumbent leads; 100 once tied or overtaken.
pub fn percent_to_overtake(incumbent: u64, challenger: u64) -> u32 {
    if gap(incumbent, challenger) > 0 {
        (challenger as f64 / incumbent as f64 * 100.0).round() as u32
    } else {
        100
    }
}

/// Hourly gap trend between two consecutive polls taken `interval` apart.
///
/// Returns `None` when either snapshot is missing or both accounts grew by
/// the same amount.
pub fn rate_of_change(
    current: Option<CounterPair>,
    previous: Option<CounterPair>,
    interval: Duration,
) -> Option<RateOfChange> {
    let (current, previous) = (current?, previous?);
    let interval_minutes = interval.as_secs_f64() / 60.0;
    if interval_minutes <= 0.0 {
        return None;
    }
    let per_hour = 60.0 / interval_minutes;

    let delta_challenger = current.challenger as i64 - previous.challenger as i64;
    let delta_incumbent = current.incumbent as i64 - previous.incumbent as i64;

    if delta_challenger > delta_incumbent {
        let blocks_per_hour = (delta_challenger - delta_incumbent) as f64 * per_hour;
        let remaining = gap(current.incumbent, current.challenger);
        let hours_to_overtake = (remaining > 0)
            .then(|| (remaining as f64 / blocks_per_hour).ceil().max(0.0) as u64);

        Some(RateOfChange::Closing {
            blocks_per_hour,
            hours_to_overtake,
        })
    } else if delta_incumbent > delta_challenger {
        Some(RateOfChange::PullingAhead {
            blocks_per_hour: (delta_incumbent - delta_challenger) as f64 * per_hour,
        })
    } else {
        None
    }
}

/// Recompute all metrics from the current and previous snapshots
pub fn compare(current: CounterPair, previous: Option<CounterPair>, interval: Duration) -> Comparison {
    let gap = gap(current.incumbent, current.challenger);

    Comparison {
        gap,
        leader: leader(gap),
        percent_to_overtake: percent_to_overtake(current.incumbent, current.challenger),
        rate: rate_of_change(Some(current), previous, interval),
    }
}
