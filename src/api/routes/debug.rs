//! POST /api/v1/debug/simulate - fake a leaderboard move to test celebrations
//!
//! Mounted only when `[api] debug_endpoints = true`.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{PollResponse, SimulateRequest};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

pub async fn simulate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SimulateRequest>,
) -> ApiResult<Json<PollResponse>> {
    tracing::info!(mode = ?request.mode, "Simulation requested");
    let report = state.poller.simulate(request.mode).await?;

    Ok(Json(PollResponse {
        status: "simulated".to_string(),
        report,
    }))
}
