//! # Blockwatch
//!
//! Polls the Clearsky block-statistics API, tracks how many accounts block an
//! incumbent and a challenger account, ranks the most-blocked accounts and
//! raises celebrations when the challenger climbs the leaderboard.
//!
//! ## Modules
//!
//! - [`upstream`]: Clearsky client, fallback policy and handle resolution
//! - [`metrics`]: gap, percent-to-overtake and rate of change
//! - [`rank`]: rank transition detection
//! - [`poll`]: the poll cycle and its committed state
//! - [`dashboard`]: celebration, notice and countdown state
//! - [`api`] / [`websocket`]: the served surface
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blockwatch::{Config, Service};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let mut service = Service::from_config(config)?;
//!     service.start();
//!
//!     let poller = std::sync::Arc::clone(&service.state().poller);
//!     let report = poller.run_cycle().await?;
//!     println!("gap: {}", report.comparison.gap);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod dashboard;
pub mod format;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod poll;
pub mod rank;
pub mod service;
pub mod upstream;
pub mod websocket;

pub use api::{build_router, serve, ApiError, AppState};
pub use config::{generate_default_config, Config, ConfigError};
pub use dashboard::{Celebration, DashboardRuntime, DashboardState};
pub use metrics::{Comparison, Leader, RateOfChange};
pub use model::{AccountSnapshot, CounterPair, RankedList, TrackedAccount};
pub use poll::{CycleReport, PollError, PollEvent, PollState, Poller};
pub use rank::{RankTracker, RankTransition};
pub use service::{Service, ServiceError};
pub use upstream::{BlockSource, ClearskyClient, FetchError, Fetcher};
