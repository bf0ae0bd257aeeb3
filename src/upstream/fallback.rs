//! Fallback Data
//!
//! Static leaderboard used when the ranked-list endpoint is unavailable, and
//! the known-handle table consulted before any handle lookup goes upstream.

use crate::model::AccountSnapshot;

/// Last-known leaderboard: `(did, handle, blocker_count)`
const MOCK_BLOCKED_ACCOUNTS: &[(&str, &str, u64)] = &[
    ("did:plc:eclio37ymobqex2ncko63h4r", "nytimes.com", 6821),
    ("did:plc:57na4nqoqohad5wk47jlu4rk", "gemini.is-a.bot", 6550),
    ("did:plc:z72jcamph6wkjlnfxcecwood", "app.bsky.bot", 5984),
    ("did:plc:sxsltapbhdi7lxxgarsj7azo", "nypost.com", 5112),
    ("did:plc:v5i6qva2psb5o4g2aepbp5n5", "meta.com", 4823),
    ("did:plc:fpkqkpwk5jdwcwtatrqiwvmr", "foxnews.com", 4619),
    ("did:plc:thfcfygetxlhonk5q6zps7sm", "reuters.com", 4511),
    ("did:plc:v4iqdgqjl3kfk7wlkyn4ljil", "washingtonpost.com", 4120),
    ("did:plc:6a6dcpcj6ck4652ojm4rq4ru", "theguardian.com", 3918),
    ("did:plc:kkf4m37losbom6mmfvmpxrrh", "nbcnews.com", 3672),
];

/// Length of the DID prefix shown when no handle can be found
const TRUNCATED_DID_LEN: usize = 15;

/// Fresh copy of the static leaderboard
pub fn mock_blocked_accounts() -> Vec<AccountSnapshot> {
    MOCK_BLOCKED_ACCOUNTS
        .iter()
        .map(|(did, handle, count)| AccountSnapshot::new(*did, *handle, *count))
        .collect()
}

/// Handle for a DID we already know about
pub fn known_handle(did: &str) -> Option<&'static str> {
    MOCK_BLOCKED_ACCOUNTS
        .iter()
        .find(|(known, _, _)| *known == did)
        .map(|(_, handle, _)| *handle)
}

/// Placeholder display name for an unresolvable DID
pub fn truncated_did(did: &str) -> String {
    let prefix: String = did.chars().take(TRUNCATED_DID_LEN).collect();
    format!("{}...", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_list_is_sorted() {
        let accounts = mock_blocked_accounts();
        assert_eq!(accounts.len(), 10);
        assert!(accounts
            .windows(2)
            .all(|pair| pair[0].blocker_count >= pair[1].blocker_count));
    }

    #[test]
    fn test_known_handle() {
        assert_eq!(known_handle("did:plc:sxsltapbhdi7lxxgarsj7azo"), Some("nypost.com"));
        assert_eq!(known_handle("did:plc:unknown"), None);
    }

    #[test]
    fn test_truncated_did() {
        assert_eq!(truncated_did("did:plc:abcdefghijklmnop"), "did:plc:abcdefg...");
        assert_eq!(truncated_did("did:x"), "did:x...");
    }
}
