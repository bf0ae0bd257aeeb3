//! Core Data Types
//!
//! Account snapshots, the ranked leaderboard and the tracked-account
//! descriptors shared by the fetcher, the metrics deriver and the poll engine.

use serde::{Deserialize, Serialize};

/// DID of the account the challenger is chasing
pub const INCUMBENT_DID: &str = "did:plc:eclio37ymobqex2ncko63h4r";

/// DID of the account expected to overtake the incumbent
pub const CHALLENGER_DID: &str = "did:plc:57na4nqoqohad5wk47jlu4rk";

/// One account's blocker count as seen by a single poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSnapshot {
    /// Stable decentralized identifier
    pub did: String,
    /// Human-readable handle (may change upstream)
    pub handle: String,
    /// Number of distinct accounts blocking this one
    pub blocker_count: u64,
}

impl AccountSnapshot {
    pub fn new(did: impl Into<String>, handle: impl Into<String>, blocker_count: u64) -> Self {
        Self {
            did: did.into(),
            handle: handle.into(),
            blocker_count,
        }
    }
}

/// Leaderboard of the most-blocked accounts, descending by blocker count.
///
/// Rank is the 1-based position in the list. The list is rebuilt wholesale on
/// every poll; sorting is stable so equal counts keep their upstream order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RankedList {
    entries: Vec<AccountSnapshot>,
}

impl RankedList {
    /// Build a ranked list, sorting the entries descending by blocker count
    pub fn from_unsorted(mut entries: Vec<AccountSnapshot>) -> Self {
        entries.sort_by(|a, b| b.blocker_count.cmp(&a.blocker_count));
        Self { entries }
    }

    pub fn entries(&self) -> &[AccountSnapshot] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 1-based rank of the account, or `None` if it is not on the list
    pub fn rank_of(&self, did: &str) -> Option<u32> {
        self.entries
            .iter()
            .position(|entry| entry.did == did)
            .map(|index| index as u32 + 1)
    }

    pub fn get(&self, did: &str) -> Option<&AccountSnapshot> {
        self.entries.iter().find(|entry| entry.did == did)
    }

    /// Keep only the first `limit` entries
    pub fn truncate(&mut self, limit: usize) {
        self.entries.truncate(limit);
    }

    /// Iterate over `(rank, entry)` pairs
    pub fn iter_ranked(&self) -> impl Iterator<Item = (u32, &AccountSnapshot)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (index as u32 + 1, entry))
    }
}

/// An account whose counter is fetched individually every poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedAccount {
    pub did: String,
    pub handle: String,
    /// Last-known-good count substituted when the upstream fetch fails.
    /// `None` means a failure surfaces as a poll error.
    #[serde(default)]
    pub fallback_count: Option<u64>,
}

impl TrackedAccount {
    pub fn new(did: impl Into<String>, handle: impl Into<String>, fallback_count: Option<u64>) -> Self {
        Self {
            did: did.into(),
            handle: handle.into(),
            fallback_count,
        }
    }

    pub fn incumbent() -> Self {
        Self::new(INCUMBENT_DID, "nytimes.com", Some(6821))
    }

    pub fn challenger() -> Self {
        Self::new(CHALLENGER_DID, "gemini.is-a.bot", Some(6550))
    }
}

/// Counters of the two tracked accounts from one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterPair {
    pub incumbent: u64,
    pub challenger: u64,
}

impl CounterPair {
    pub fn new(incumbent: u64, challenger: u64) -> Self {
        Self {
            incumbent,
            challenger,
        }
    }

    /// True when the challenger has strictly more blockers
    pub fn challenger_leads(&self) -> bool {
        self.challenger > self.incumbent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(did: &str, count: u64) -> AccountSnapshot {
        AccountSnapshot::new(did, format!("{}.test", did), count)
    }

    #[test]
    fn test_sorted_descending() {
        let list = RankedList::from_unsorted(vec![
            account("a", 10),
            account("b", 30),
            account("c", 20),
        ]);

        let dids: Vec<_> = list.entries().iter().map(|e| e.did.as_str()).collect();
        assert_eq!(dids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_rank_of() {
        let list = RankedList::from_unsorted(vec![account("a", 3), account("b", 2), account("c", 1)]);

        assert_eq!(list.rank_of("a"), Some(1));
        assert_eq!(list.rank_of("c"), Some(3));
        assert_eq!(list.rank_of("missing"), None);
    }

    #[test]
    fn test_ties_keep_upstream_order() {
        let list = RankedList::from_unsorted(vec![account("x", 5), account("y", 5), account("z", 9)]);

        assert_eq!(list.rank_of("z"), Some(1));
        assert_eq!(list.rank_of("x"), Some(2));
        assert_eq!(list.rank_of("y"), Some(3));
    }

    #[test]
    fn test_rank_consistent_with_counts() {
        let counts = [412, 7, 9_001, 55, 55, 3_000, 0, 128];
        let list = RankedList::from_unsorted(
            counts
                .iter()
                .enumerate()
                .map(|(i, c)| account(&format!("did:{}", i), *c))
                .collect(),
        );

        for (rank, entry) in list.iter_ranked() {
            let found = list.rank_of(&entry.did).unwrap();
            assert_eq!(found, rank);

            let idx = (found - 1) as usize;
            for above in &list.entries()[..idx] {
                assert!(entry.blocker_count <= above.blocker_count);
            }
            for below in &list.entries()[idx + 1..] {
                assert!(entry.blocker_count >= below.blocker_count);
            }
        }
    }

    #[test]
    fn test_truncate() {
        let mut list = RankedList::from_unsorted(vec![account("a", 1), account("b", 2), account("c", 3)]);
        list.truncate(2);

        assert_eq!(list.len(), 2);
        assert_eq!(list.rank_of("a"), None);
    }

    #[test]
    fn test_default_tracked_accounts() {
        assert_eq!(TrackedAccount::incumbent().fallback_count, Some(6821));
        assert_eq!(TrackedAccount::challenger().fallback_count, Some(6550));
        assert_eq!(TrackedAccount::challenger().handle, "gemini.is-a.bot");
    }
}
