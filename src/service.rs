//! Service Wiring
//!
//! Builds the poller, dashboard runtime and WebSocket hub from a [`Config`]
//! and connects them: committed cycles feed the dashboard reducer, and both
//! poll and dashboard events are pushed to WebSocket subscribers.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::api::AppState;
use crate::config::{Config, ConfigError};
use crate::dashboard::{Action, DashboardRuntime, DashboardState, GENERIC_ERROR};
use crate::poll::{PollEvent, Poller};
use crate::upstream::{BlockSource, ClearskyClient, Fetcher};
use crate::websocket::{ConnectionHub, HubConfig, WsEvent};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub struct Service {
    state: AppState,
    tasks: Vec<JoinHandle<()>>,
}

impl Service {
    /// Service backed by the live Clearsky API
    pub fn from_config(config: Config) -> Result<Self, ServiceError> {
        config.validate()?;
        let client = ClearskyClient::new(config.upstream.clone())?;
        Ok(Self::with_source(config, Arc::new(client)))
    }

    pub fn with_source(config: Config, source: Arc<dyn BlockSource>) -> Self {
        let config = Arc::new(config);
        let fetcher = Arc::new(Fetcher::new(source, config.tracking.clone(), &config.upstream));
        let poller = Arc::new(Poller::new(fetcher, &config.poll));
        let dashboard = Arc::new(DashboardRuntime::new(DashboardState::new(
            config.dashboard.clone(),
            config.poll.interval(),
        )));
        let hub = Arc::new(ConnectionHub::new(HubConfig::default()));

        Self {
            state: AppState::new(poller, dashboard, hub, config),
            tasks: Vec::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Spawn the background tasks. The first poll runs immediately.
    pub fn start(&mut self) {
        // subscribe before the poller can publish its first cycle
        self.tasks.push(self.forward_poll_events());
        self.tasks.push(self.forward_dashboard_events());
        self.tasks.extend(Arc::clone(&self.state.dashboard).start());
        self.tasks.push(Arc::clone(&self.state.poller).start());

        tracing::info!(tasks = self.tasks.len(), "Background tasks started");
    }

    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        tracing::info!("Background tasks stopped");
    }

    fn forward_poll_events(&self) -> JoinHandle<()> {
        let mut events = self.state.poller.subscribe();
        let dashboard = Arc::clone(&self.state.dashboard);
        let hub = Arc::clone(&self.state.hub);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(PollEvent::Committed(report)) => {
                        hub.publish(&WsEvent::cycle_completed(report.clone())).await;
                        dashboard.dispatch(Action::CycleCommitted(Box::new(report)));
                    }
                    Ok(PollEvent::Failed { message }) => {
                        tracing::debug!(error = %message, "Forwarding poll failure");
                        dashboard.dispatch(Action::CycleFailed);
                        hub.publish(&WsEvent::poll_failed(GENERIC_ERROR)).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Poll event forwarder lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn forward_dashboard_events(&self) -> JoinHandle<()> {
        let mut events = self.state.dashboard.subscribe();
        let hub = Arc::clone(&self.state.hub);
        let tracking = self.state.config.tracking.clone();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let pushed = WsEvent::from_dashboard(
                            event,
                            &tracking.challenger.handle,
                            &tracking.incumbent.handle,
                        );
                        if let Some(pushed) = pushed {
                            hub.publish(&pushed).await;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Dashboard event forwarder lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Drop for Service {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::Celebration;
    use crate::model::{CHALLENGER_DID, INCUMBENT_DID};
    use crate::upstream::testing::FakeSource;
    use crate::websocket::ServerMessage;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_first_cycle_reaches_dashboard_and_subscribers() {
        let source = FakeSource::new()
            .with_count(INCUMBENT_DID, 100)
            .with_count(CHALLENGER_DID, 120);
        source.set_entries(&[(CHALLENGER_DID, 120), (INCUMBENT_DID, 100)]);

        let mut service = Service::with_source(Config::default(), Arc::new(source));
        let hub = Arc::clone(&service.state().hub);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();
        hub.subscribe(&id, vec!["dashboard".to_string(), "celebrations".to_string()])
            .await
            .unwrap();

        service.start();

        let mut saw_cycle = false;
        let mut celebrations = Vec::new();
        while !(saw_cycle && !celebrations.is_empty()) {
            let message = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("no push within timeout")
                .unwrap();
            match message {
                ServerMessage::CycleCompleted { report } => {
                    assert_eq!(report.cycle, 1);
                    saw_cycle = true;
                }
                ServerMessage::CelebrationStarted { celebration, .. } => {
                    celebrations.push(celebration.celebration)
                }
                _ => {}
            }
        }

        // #1 shows first, the overtake waits behind it
        assert_eq!(celebrations, vec![Celebration::ReachedFirst]);
        let dashboard = service.state().dashboard.state();
        let dashboard = dashboard.read().await;
        assert_eq!(dashboard.last_cycle(), 1);
        assert_eq!(dashboard.queued_len(), 1);
        drop(dashboard);

        service.shutdown();
    }
}
