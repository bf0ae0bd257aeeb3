//! Celebration overlays raised by poll cycles.

use serde::Serialize;

use crate::rank::RankTransition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Celebration {
    /// Challenger's count passed the incumbent's
    Overtaken,
    RankedUp { rank: u32 },
    ReachedFirst,
}

impl Celebration {
    /// Blocking overlays suspend the countdown until they close
    pub fn is_blocking(&self) -> bool {
        matches!(self, Celebration::ReachedFirst)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Celebration::Overtaken => "YES!",
            Celebration::RankedUp { .. } => "Ranking Up!",
            Celebration::ReachedFirst => "#1 Most Blocked!",
        }
    }

    pub fn message(&self, challenger: &str, incumbent: &str) -> String {
        match self {
            Celebration::Overtaken => {
                format!("{} has passed {} in blocks!", challenger, incumbent)
            }
            Celebration::RankedUp { rank } => {
                format!("{} is now #{} on the most-blocked list!", challenger, rank)
            }
            Celebration::ReachedFirst => {
                format!("{} is now the most blocked account on Bluesky!", challenger)
            }
        }
    }
}

impl From<RankTransition> for Celebration {
    fn from(transition: RankTransition) -> Self {
        match transition {
            RankTransition::ReachedFirst => Celebration::ReachedFirst,
            RankTransition::RankedUp { rank } => Celebration::RankedUp { rank },
        }
    }
}

/// The overlay currently on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActiveCelebration {
    pub id: u64,
    #[serde(flatten)]
    pub celebration: Celebration,
    /// Cycle that raised it
    pub cycle: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_reached_first_blocks() {
        assert!(Celebration::ReachedFirst.is_blocking());
        assert!(!Celebration::RankedUp { rank: 2 }.is_blocking());
        assert!(!Celebration::Overtaken.is_blocking());
    }

    #[test]
    fn test_from_transition() {
        assert_eq!(
            Celebration::from(RankTransition::RankedUp { rank: 4 }),
            Celebration::RankedUp { rank: 4 }
        );
        assert_eq!(Celebration::from(RankTransition::ReachedFirst), Celebration::ReachedFirst);
    }

    #[test]
    fn test_serialize_active() {
        let active = ActiveCelebration {
            id: 3,
            celebration: Celebration::RankedUp { rank: 2 },
            cycle: 9,
        };
        let json = serde_json::to_value(active).unwrap();
        assert_eq!(json["kind"], "ranked_up");
        assert_eq!(json["rank"], 2);
        assert_eq!(json["id"], 3);
    }
}
