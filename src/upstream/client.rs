//! Clearsky REST API Client
//!
//! HTTP client for the anonymous Clearsky statistics API, with the ATProto
//! `describeRepo` endpoint as a second source for handle lookups.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::error::FetchError;
use super::{BlockSource, BlockedEntry};
use crate::config::UpstreamConfig;

/// Identifier used in errors for the ranked-list endpoint
const FUN_FACTS_ID: &str = "lists/fun-facts";

/// Clearsky REST API client
pub struct ClearskyClient {
    client: Client,
    config: UpstreamConfig,
}

impl ClearskyClient {
    /// Create a new client with the given configuration
    pub fn new(config: UpstreamConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("blockwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    fn clearsky_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// GET a URL and decode the body as JSON
    async fn get_json(&self, id: &str, url: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Network {
                id: id.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                id: id.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                FetchError::schema(id, e.to_string())
            } else {
                FetchError::Network {
                    id: id.to_string(),
                    source: e,
                }
            }
        })
    }

    /// Handle via Clearsky's `get-handle` endpoint
    async fn clearsky_handle(&self, did: &str) -> Result<String, FetchError> {
        let url = self.clearsky_url(&format!("get-handle/{}", did));
        let body = self.get_json(did, &url).await?;

        body.pointer("/data/handle_identifier")
            .and_then(Value::as_str)
            .filter(|handle| !handle.is_empty())
            .map(str::to_string)
            .ok_or_else(|| FetchError::schema(did, "missing data.handle_identifier"))
    }

    /// Handle via ATProto `com.atproto.repo.describeRepo`
    async fn describe_repo_handle(&self, did: &str) -> Result<String, FetchError> {
        let url = format!(
            "{}/com.atproto.repo.describeRepo?repo={}",
            self.config.identity_url.trim_end_matches('/'),
            urlencoding::encode(did)
        );
        let body = self.get_json(did, &url).await?;

        body.get("handle")
            .and_then(Value::as_str)
            .filter(|handle| !handle.is_empty())
            .map(str::to_string)
            .ok_or_else(|| FetchError::schema(did, "missing handle"))
    }
}

#[async_trait]
impl BlockSource for ClearskyClient {
    async fn blocker_count(&self, did: &str) -> Result<u64, FetchError> {
        let url = self.clearsky_url(&format!("single-blocklist/total/{}", did));
        let body = self.get_json(did, &url).await?;
        parse_count(did, &body)
    }

    async fn top_blocked(&self) -> Result<Vec<BlockedEntry>, FetchError> {
        let url = self.clearsky_url("lists/fun-facts");
        let body = self.get_json(FUN_FACTS_ID, &url).await?;
        parse_blocked(&body)
    }

    async fn lookup_handle(&self, did: &str) -> Option<String> {
        match self.clearsky_handle(did).await {
            Ok(handle) => return Some(handle),
            Err(e) => tracing::debug!(did = %did, error = %e, "Clearsky handle lookup failed"),
        }

        match self.describe_repo_handle(did).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::debug!(did = %did, error = %e, "describeRepo handle lookup failed");
                None
            }
        }
    }
}

// ============================================
// Response parsing
// ============================================

/// Interpret a JSON number as a blocker count.
///
/// Accepts non-negative integers, including integral floats such as `6821.0`.
fn as_count(value: &Value) -> Option<u64> {
    if let Some(count) = value.as_u64() {
        return Some(count);
    }
    value
        .as_f64()
        .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
        .map(|f| f as u64)
}

/// Extract `data.count` from a `single-blocklist/total` body
pub fn parse_count(id: &str, body: &Value) -> Result<u64, FetchError> {
    let count = body
        .pointer("/data/count")
        .ok_or_else(|| FetchError::schema(id, "missing data.count"))?;

    as_count(count).ok_or_else(|| FetchError::schema(id, format!("data.count is not a count: {}", count)))
}

/// Extract `data.blocked` from a `lists/fun-facts` body.
///
/// Entries without a usable `did` or `count` are skipped.
pub fn parse_blocked(body: &Value) -> Result<Vec<BlockedEntry>, FetchError> {
    let blocked = body
        .pointer("/data/blocked")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::schema(FUN_FACTS_ID, "missing data.blocked array"))?;

    let mut entries = Vec::with_capacity(blocked.len());
    for raw in blocked {
        let did = raw.get("did").and_then(Value::as_str).filter(|d| !d.is_empty());
        let count = raw.get("count").and_then(as_count);

        match (did, count) {
            (Some(did), Some(count)) => entries.push(BlockedEntry {
                did: did.to_string(),
                count,
                handle: raw
                    .get("handle")
                    .and_then(Value::as_str)
                    .filter(|h| !h.is_empty())
                    .map(str::to_string),
            }),
            _ => tracing::warn!(entry = %raw, "Skipping malformed blocked entry"),
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("a", &json!({"data": {"count": 6821}})).unwrap(), 6821);
        assert_eq!(parse_count("a", &json!({"data": {"count": 0}})).unwrap(), 0);
        assert_eq!(parse_count("a", &json!({"data": {"count": 12.0}})).unwrap(), 12);
    }

    #[test]
    fn test_parse_count_rejects_bad_shapes() {
        let bad = [
            json!({}),
            json!({"data": {}}),
            json!({"data": {"count": "6821"}}),
            json!({"data": {"count": -4}}),
            json!({"data": {"count": 1.5}}),
            json!({"data": null}),
        ];

        for body in bad {
            let err = parse_count("did:plc:x", &body).unwrap_err();
            assert!(matches!(err, FetchError::Schema { .. }), "accepted {}", body);
        }
    }

    #[test]
    fn test_parse_blocked() {
        let body = json!({
            "data": {
                "blocked": [
                    {"did": "did:plc:a", "count": 10, "handle": "a.test"},
                    {"did": "did:plc:b", "count": 7},
                    {"did": "", "count": 3},
                    {"count": 2},
                    {"did": "did:plc:c", "count": "many"}
                ]
            }
        });

        let entries = parse_blocked(&body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].handle.as_deref(), Some("a.test"));
        assert_eq!(entries[1].did, "did:plc:b");
        assert_eq!(entries[1].handle, None);
    }

    #[test]
    fn test_parse_blocked_missing_array() {
        let err = parse_blocked(&json!({"data": {"blocked": "nope"}})).unwrap_err();
        assert!(matches!(err, FetchError::Schema { .. }));
    }

    #[test]
    fn test_clearsky_url_trims_slash() {
        let client = ClearskyClient::new(UpstreamConfig {
            base_url: "http://localhost:9000/api/".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            client.clearsky_url("lists/fun-facts"),
            "http://localhost:9000/api/lists/fun-facts"
        );
    }
}
