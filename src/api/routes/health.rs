//! Health Routes
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (one cycle committed)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Ready once the dashboard has data to show
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.poller.state().read().await.cycle() > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (cycles, last_poll) = {
        let poll = state.poller.state();
        let poll = poll.read().await;
        (poll.cycle(), poll.last_committed_at())
    };
    let last_error = state
        .dashboard
        .state()
        .read()
        .await
        .error()
        .map(str::to_string);

    let status = match (cycles, &last_error) {
        (0, _) => "starting",
        (_, Some(_)) => "degraded",
        (_, None) => "healthy",
    };

    Json(HealthResponse {
        status: status.to_string(),
        cycles,
        last_poll,
        last_error,
        ws_connections: state.hub.connection_count().await,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        assert_eq!(liveness().await, StatusCode::OK);
    }
}
