//! Dashboard Routes
//!
//! - GET /api/v1/dashboard - Full dashboard view
//! - GET /api/v1/leaderboard - Ranked list only

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{DashboardView, LeaderboardParams, LeaderboardResponse, RankedEntry};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardView> {
    let poll = state.poller.state();
    let poll = poll.read().await;
    let dashboard = state.dashboard.state();
    let dashboard = dashboard.read().await;

    Json(DashboardView::build(&poll, &dashboard, &state.config.tracking))
}

pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeaderboardParams>,
) -> ApiResult<Json<LeaderboardResponse>> {
    if params.limit == Some(0) {
        return Err(ApiError::Validation("limit must be at least 1".to_string()));
    }

    let poll = state.poller.state();
    let poll = poll.read().await;

    let mut entries = RankedEntry::from_list(poll.ranked_list(), &state.config.tracking);
    if let Some(limit) = params.limit {
        entries.truncate(limit);
    }

    Ok(Json(LeaderboardResponse {
        total: poll.ranked_list().len(),
        entries,
        cycle: poll.cycle(),
        updated_at: poll.last_committed_at(),
    }))
}
