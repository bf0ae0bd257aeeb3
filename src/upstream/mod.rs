//! Upstream Statistics API
//!
//! Everything that talks to the block-statistics service.
//!
//! ## Architecture
//!
//! - **ClearskyClient**: raw HTTP access to the Clearsky endpoints
//! - **Fetcher**: fallback policy, leaderboard assembly, handle resolution
//! - **Throttle**: minimum spacing between sequential handle lookups
//!
//! ## Endpoints
//!
//! - `GET {base}/single-blocklist/total/{did}` → `{data:{count}}`
//! - `GET {base}/lists/fun-facts` → `{data:{blocked:[{did,count,handle?}]}}`
//! - `GET {base}/get-handle/{did}` → `{data:{handle_identifier}}`

mod client;
mod error;
mod fallback;
mod fetcher;
mod throttle;

pub use client::{parse_blocked, parse_count, ClearskyClient};
pub use error::FetchError;
pub use fallback::{known_handle, mock_blocked_accounts, truncated_did};
pub use fetcher::{CounterReading, CounterSource, Fetcher};
pub use throttle::Throttle;

use async_trait::async_trait;

/// One row of the upstream leaderboard, before handle resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedEntry {
    pub did: String,
    pub count: u64,
    pub handle: Option<String>,
}

/// Source of raw block statistics
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Number of accounts blocking `did`
    async fn blocker_count(&self, did: &str) -> Result<u64, FetchError>;

    /// Most-blocked accounts in upstream order
    async fn top_blocked(&self) -> Result<Vec<BlockedEntry>, FetchError>;

    /// Best-effort handle lookup; `None` when no source knows the DID
    async fn lookup_handle(&self, did: &str) -> Option<String>;
}
