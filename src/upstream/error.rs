//! Fetch Error Types

use thiserror::Error;

/// Errors that can occur when talking to the statistics API
#[derive(Error, Debug)]
pub enum FetchError {
    /// Upstream answered with a non-2xx status
    #[error("HTTP error {status} for {id}")]
    Http { id: String, status: u16 },

    /// Upstream answered with a body of unexpected shape
    #[error("Unexpected response shape for {id}: {detail}")]
    Schema { id: String, detail: String },

    /// The request could not complete
    #[error("Request for {id} failed: {source}")]
    Network {
        id: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Account identifier must not be empty")]
    InvalidId,
}

impl FetchError {
    /// Short machine-readable kind, used in logs and API payloads
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Http { .. } => "http_error",
            FetchError::Schema { .. } => "schema_error",
            FetchError::Network { .. } => "network_error",
            FetchError::InvalidId => "invalid_id",
        }
    }

    pub fn schema(id: impl Into<String>, detail: impl Into<String>) -> Self {
        FetchError::Schema {
            id: id.into(),
            detail: detail.into(),
        }
    }
}
