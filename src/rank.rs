//! Rank Transition Detection
//!
//! Compares the tracked account's rank on the latest leaderboard with the rank
//! recorded on the previous poll and classifies the move.

use serde::Serialize;

use crate::model::RankedList;

/// A rank change worth celebrating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RankTransition {
    /// Newly at the top of the leaderboard
    ReachedFirst,
    /// Moved up to a better rank other than #1
    RankedUp { rank: u32 },
}

/// Classify a move from `previous` to `current` rank.
///
/// Reaching #1 takes priority over an ordinary rank-up. Dropping, holding,
/// entering the list from nowhere below #1, and leaving it produce nothing.
pub fn classify(previous: Option<u32>, current: Option<u32>) -> Option<RankTransition> {
    match (previous, current) {
        (previous, Some(1)) if previous != Some(1) => Some(RankTransition::ReachedFirst),
        (Some(previous), Some(current)) if current < previous && current != 1 => {
            Some(RankTransition::RankedUp { rank: current })
        }
        _ => None,
    }
}

/// Result of observing one leaderboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankObservation {
    pub previous: Option<u32>,
    pub current: Option<u32>,
    pub transition: Option<RankTransition>,
}

/// Remembers the tracked account's rank between polls.
///
/// The recorded rank is replaced on every observation, so each transition is
/// reported exactly once relative to the immediately preceding leaderboard.
#[derive(Debug, Clone)]
pub struct RankTracker {
    did: String,
    previous: Option<u32>,
}

impl RankTracker {
    pub fn new(did: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            previous: None,
        }
    }

    pub fn did(&self) -> &str {
        &self.did
    }

    /// Rank recorded on the last observation
    pub fn recorded(&self) -> Option<u32> {
        self.previous
    }

    pub fn observe(&mut self, list: &RankedList) -> RankObservation {
        let current = list.rank_of(&self.did);
        let previous = std::mem::replace(&mut self.previous, current);
        let transition = classify(previous, current);

        if let Some(transition) = transition {
            tracing::info!(
                did = %self.did,
                ?previous,
                ?current,
                ?transition,
                "Rank transition detected"
            );
        }

        RankObservation {
            previous,
            current,
            transition,
        }
    }
}
