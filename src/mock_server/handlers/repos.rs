//! Repository endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::{not_found, SharedState};
use crate::mock_server::state::full_name;
use crate::Repository;

/// GET /repos/{owner}/{repo}
pub async fn get_repository(
    State(state): State<SharedState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Response {
    let state = state.read().await;
    match state.get_repository(&owner, &repo) {
        Some(repository) => (StatusCode::OK, Json(repository.clone())).into_response(),
        None => not_found(),
    }
}

/// PATCH /repos/{owner}/{repo}
pub async fn edit_repository(
    State(state): State<SharedState>,
    Path((owner, repo)): Path<(String, String)>,
    Json(changes): Json<Repository>,
) -> Response {
    let mut state = state.write().await;
    match state.edit_repository(&owner, &repo, changes) {
        Some(repository) => (StatusCode::OK, Json(repository.clone())).into_response(),
        None => not_found(),
    }
}

/// DELETE /repos/{owner}/{repo}
pub async fn delete_repository(
    State(state): State<SharedState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Response {
    let mut state = state.write().await;
    match state.delete_repository(&owner, &repo) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(),
    }
}

/// GET /repos/{owner}/{repo}/vulnerability-alerts
///
/// 204 when enabled, 404 when disabled.
pub async fn get_vulnerability_alerts(
    State(state): State<SharedState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Response {
    let state = state.read().await;
    if state.vulnerability_alerts.contains(&full_name(&owner, &repo)) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found()
    }
}

/// PUT /repos/{owner}/{repo}/vulnerability-alerts
pub async fn enable_vulnerability_alerts(
    State(state): State<SharedState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Response {
    let mut state = state.write().await;
    if state.get_repository(&owner, &repo).is_none() {
        return not_found();
    }
    state.vulnerability_alerts.insert(full_name(&owner, &repo));
    StatusCode::NO_CONTENT.into_response()
}

/// DELETE /repos/{owner}/{repo}/vulnerability-alerts
pub async fn disable_vulnerability_alerts(
    State(state): State<SharedState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Response {
    let mut state = state.write().await;
    if state.get_repository(&owner, &repo).is_none() {
        return not_found();
    }
    state.vulnerability_alerts.remove(&full_name(&owner, &repo));
    StatusCode::NO_CONTENT.into_response()
}

/// Fallback for unknown routes.
pub async fn unknown_route() -> impl IntoResponse {
    not_found()
}
