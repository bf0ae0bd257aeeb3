//! POST /api/v1/poll - run a cycle now instead of waiting for the timer

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::PollResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;

pub async fn trigger_poll(State(state): State<Arc<AppState>>) -> ApiResult<Json<PollResponse>> {
    tracing::info!("Manual poll requested");
    let report = state.poller.run_cycle().await?;

    Ok(Json(PollResponse {
        status: "committed".to_string(),
        report,
    }))
}
