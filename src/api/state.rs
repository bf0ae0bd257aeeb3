//! Application State
//!
//! Shared state accessible by all API handlers.

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::dashboard::DashboardRuntime;
use crate::poll::Poller;
use crate::websocket::ConnectionHub;

#[derive(Clone)]
pub struct AppState {
    pub poller: Arc<Poller>,
    pub dashboard: Arc<DashboardRuntime>,
    pub hub: Arc<ConnectionHub>,
    pub config: Arc<Config>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        poller: Arc<Poller>,
        dashboard: Arc<DashboardRuntime>,
        hub: Arc<ConnectionHub>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            poller,
            dashboard,
            hub,
            config,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
