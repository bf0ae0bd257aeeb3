//! Simulated Leaderboard Moves
//!
//! Rearranges the last committed leaderboard so the celebration pipeline can
//! be exercised without any upstream movement. Only reachable through the
//! debug endpoint.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AccountSnapshot, RankedList, TrackedAccount};

/// Lead given to the challenger over the account directly above it
const RANK_UP_MARGIN: u64 = 10;

/// Lead given to the challenger over the current #1
const RANK_FIRST_MARGIN: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationMode {
    /// Challenger passes its upper neighbour
    #[serde(rename = "rank-up")]
    RankUp,
    /// Challenger jumps to the top
    #[serde(rename = "rank-1")]
    RankFirst,
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("No committed cycle to simulate from")]
    NoCycle,

    #[error("Challenger {did} is not on the leaderboard")]
    NotListed { did: String },

    #[error("Challenger is already #1")]
    AlreadyFirst,
}

/// Build the leaderboard the simulated move would produce
pub fn simulate_list(
    list: &RankedList,
    challenger: &TrackedAccount,
    mode: SimulationMode,
) -> Result<RankedList, SimulationError> {
    let mut entries = list.entries().to_vec();

    match mode {
        SimulationMode::RankUp => {
            let index = entries
                .iter()
                .position(|entry| entry.did == challenger.did)
                .ok_or_else(|| SimulationError::NotListed {
                    did: challenger.did.clone(),
                })?;
            if index == 0 {
                return Err(SimulationError::AlreadyFirst);
            }
            entries[index].blocker_count = entries[index - 1].blocker_count + RANK_UP_MARGIN;
        }
        SimulationMode::RankFirst => {
            entries.retain(|entry| entry.did != challenger.did);
            let top = entries.first().map_or(0, |entry| entry.blocker_count);
            entries.insert(
                0,
                AccountSnapshot::new(
                    challenger.did.clone(),
                    challenger.handle.clone(),
                    top + RANK_FIRST_MARGIN,
                ),
            );
        }
    }

    Ok(RankedList::from_unsorted(entries))
}
