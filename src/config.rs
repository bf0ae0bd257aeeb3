//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::TrackedAccount;

/// Handle lookups are never spaced closer than this
const MIN_HANDLE_RESOLVE_INTERVAL_MS: u64 = 200;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub tracking: TrackingConfig,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream statistics API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// ATProto XRPC base used as a second source for handle resolution
    #[serde(default = "default_identity_url")]
    pub identity_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_handle_resolve_interval")]
    pub handle_resolve_interval_ms: u64,

    #[serde(default = "default_ranked_list_limit")]
    pub ranked_list_limit: usize,
}

fn default_base_url() -> String {
    "https://api.clearsky.services/api/v1/anon".to_string()
}

fn default_identity_url() -> String {
    "https://bsky.social/xrpc".to_string()
}

fn default_request_timeout() -> u64 {
    10_000
}

fn default_handle_resolve_interval() -> u64 {
    250
}

fn default_ranked_list_limit() -> usize {
    20
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            identity_url: default_identity_url(),
            request_timeout_ms: default_request_timeout(),
            handle_resolve_interval_ms: default_handle_resolve_interval(),
            ranked_list_limit: default_ranked_list_limit(),
        }
    }
}

impl UpstreamConfig {
    /// Spacing between sequential handle lookups, floored at 200ms
    pub fn handle_resolve_interval(&self) -> Duration {
        Duration::from_millis(
            self.handle_resolve_interval_ms
                .max(MIN_HANDLE_RESOLVE_INTERVAL_MS),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// The two accounts compared on the dashboard
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "TrackedAccount::incumbent")]
    pub incumbent: TrackedAccount,

    #[serde(default = "TrackedAccount::challenger")]
    pub challenger: TrackedAccount,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            incumbent: TrackedAccount::incumbent(),
            challenger: TrackedAccount::challenger(),
        }
    }
}

impl TrackingConfig {
    /// Look up a tracked account by DID
    pub fn account(&self, did: &str) -> Option<&TrackedAccount> {
        [&self.incumbent, &self.challenger]
            .into_iter()
            .find(|account| account.did == did)
    }

    /// Fallback count for a tracked DID, `None` for anything else
    pub fn fallback_for(&self, did: &str) -> Option<u64> {
        self.account(did).and_then(|account| account.fallback_count)
    }
}

/// Poll loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    60
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Celebration and notice timing
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_celebration_timeout")]
    pub celebration_timeout_secs: u64,

    #[serde(default = "default_reached_first_timeout")]
    pub reached_first_timeout_secs: u64,

    #[serde(default = "default_notice_timeout")]
    pub notice_timeout_secs: u64,
}

fn default_celebration_timeout() -> u64 {
    12
}

fn default_reached_first_timeout() -> u64 {
    30
}

fn default_notice_timeout() -> u64 {
    3
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            celebration_timeout_secs: default_celebration_timeout(),
            reached_first_timeout_secs: default_reached_first_timeout(),
            notice_timeout_secs: default_notice_timeout(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Mount `POST /api/v1/debug/simulate`
    #[serde(default)]
    pub debug_endpoints: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4173
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            debug_endpoints: false,
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("blockwatch").join("config.toml")),
            Some(PathBuf::from("/etc/blockwatch/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Reject settings the poll loop cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll.interval_secs must be at least 1".to_string(),
            ));
        }
        if self.upstream.ranked_list_limit == 0 {
            return Err(ConfigError::Invalid(
                "upstream.ranked_list_limit must be at least 1".to_string(),
            ));
        }
        if self.tracking.incumbent.did.is_empty() || self.tracking.challenger.did.is_empty() {
            return Err(ConfigError::Invalid(
                "tracked accounts need a non-empty did".to_string(),
            ));
        }
        if self.tracking.incumbent.did == self.tracking.challenger.did {
            return Err(ConfigError::Invalid(
                "incumbent and challenger must be different accounts".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("BLOCKWATCH_UPSTREAM_URL") {
            self.upstream.base_url = url;
        }
        if let Ok(secs) = std::env::var("BLOCKWATCH_POLL_INTERVAL_SECS") {
            if let Ok(s) = secs.parse() {
                self.poll.interval_secs = s;
            }
        }

        if let Ok(host) = std::env::var("BLOCKWATCH_API_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = std::env::var("BLOCKWATCH_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        if let Ok(debug) = std::env::var("BLOCKWATCH_API_DEBUG") {
            self.api.debug_endpoints = matches!(debug.as_str(), "1" | "true");
        }

        if let Ok(level) = std::env::var("BLOCKWATCH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("BLOCKWATCH_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Blockwatch Configuration
#
# Environment variables override these settings:
# - BLOCKWATCH_UPSTREAM_URL
# - BLOCKWATCH_POLL_INTERVAL_SECS
# - BLOCKWATCH_API_HOST
# - BLOCKWATCH_API_PORT
# - BLOCKWATCH_API_DEBUG
# - BLOCKWATCH_LOG_LEVEL
# - BLOCKWATCH_LOG_FORMAT

[upstream]
# Clearsky anonymous API
base_url = "https://api.clearsky.services/api/v1/anon"

# ATProto XRPC endpoint, second source for handle lookups
identity_url = "https://bsky.social/xrpc"

# Per-request timeout (ms)
request_timeout_ms = 10000

# Spacing between sequential handle lookups (ms, never below 200)
handle_resolve_interval_ms = 250

# Number of leaderboard entries to keep
ranked_list_limit = 20

[tracking.incumbent]
did = "did:plc:eclio37ymobqex2ncko63h4r"
handle = "nytimes.com"
# Shown when the counter cannot be fetched; remove to surface an error instead
fallback_count = 6821

[tracking.challenger]
did = "did:plc:57na4nqoqohad5wk47jlu4rk"
handle = "gemini.is-a.bot"
fallback_count = 6550

[poll]
# Seconds between polls
interval_secs = 60

[dashboard]
# Auto-dismiss for standard celebrations (seconds)
celebration_timeout_secs = 12

# Auto-dismiss for the reached-#1 celebration (seconds)
reached_first_timeout_secs = 30

# How long the count-increased notice stays up (seconds)
notice_timeout_secs = 3

[api]
host = "0.0.0.0"
port = 4173

# Allowed CORS origins (empty = allow any origin)
cors_origins = []

# Expose POST /api/v1/debug/simulate (rank-up / rank-1) for testing celebrations
debug_endpoints = false

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.poll.interval_secs, 60);
        assert_eq!(config.upstream.ranked_list_limit, 20);
        assert_eq!(config.tracking.incumbent.fallback_count, Some(6821));
        assert_eq!(config.dashboard.reached_first_timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.tracking.challenger.handle, "gemini.is-a.bot");
        assert_eq!(config.upstream.handle_resolve_interval_ms, 250);
        assert_eq!(config.api.port, 4173);
        assert!(!config.api.debug_endpoints);
    }

    #[test]
    fn test_debug_endpoints_opt_in() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]
debug_endpoints = true").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert!(config.api.debug_endpoints);
        assert_eq!(config.api.port, 4173);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[poll]\ninterval_secs = 30\n\n[tracking.challenger]\ndid = \"did:plc:other\"\nhandle = \"other.test\"\n"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.poll.interval_secs, 30);
        assert_eq!(config.tracking.challenger.did, "did:plc:other");
        assert_eq!(config.tracking.challenger.fallback_count, None);
        assert_eq!(config.tracking.incumbent.handle, "nytimes.com");
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[poll]\ninterval_secs = 0").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/blockwatch.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_resolve_interval_floor() {
        let upstream = UpstreamConfig {
            handle_resolve_interval_ms: 50,
            ..Default::default()
        };
        assert_eq!(upstream.handle_resolve_interval(), Duration::from_millis(200));
    }

    #[test]
    fn test_fallback_lookup() {
        let tracking = TrackingConfig::default();
        assert_eq!(tracking.fallback_for(crate::model::INCUMBENT_DID), Some(6821));
        assert_eq!(tracking.fallback_for(crate::model::CHALLENGER_DID), Some(6550));
        assert_eq!(tracking.fallback_for("did:plc:someone-else"), None);
    }
}
