//! POST /api/v1/celebrations/dismiss

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::DismissResponse;
use crate::api::state::AppState;
use crate::dashboard::Action;

/// Close the celebration that is showing now. The action carries its id, so
/// a celebration that replaced it in the meantime stays up.
pub async fn dismiss(State(state): State<Arc<AppState>>) -> Json<DismissResponse> {
    let active = state
        .dashboard
        .state()
        .read()
        .await
        .active()
        .map(|active| active.id);

    if let Some(id) = active {
        state.dashboard.dispatch(Action::Dismiss(id));
    }

    Json(DismissResponse {
        dismissed: active.is_some(),
        id: active,
    })
}
