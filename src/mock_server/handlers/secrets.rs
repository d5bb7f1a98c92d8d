//! Actions secret endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::{not_found, validation_failed, SharedState};
use crate::mock_server::state::full_name;
use crate::{Secret, Secrets};

/// Body of a secret upload.
#[derive(Debug, Deserialize)]
pub struct PutSecretBody {
    pub key_id: Option<String>,
    pub encrypted_value: Option<String>,
}

/// GET /repos/{owner}/{repo}/actions/secrets/public-key
///
/// The key id is sent as a JSON number, as some GitHub deployments do.
pub async fn get_repo_public_key(
    State(state): State<SharedState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Response {
    let state = state.read().await;
    if state.get_repository(&owner, &repo).is_none() {
        return not_found();
    }
    Json(json!({
        "key_id": state.public_key_id,
        "key": state.public_key
    }))
    .into_response()
}

/// GET /repos/{owner}/{repo}/actions/secrets
pub async fn list_repo_secrets(
    State(state): State<SharedState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Response {
    let state = state.read().await;
    if state.get_repository(&owner, &repo).is_none() {
        return not_found();
    }
    let secrets: Vec<Secret> = state
        .secrets
        .get(&full_name(&owner, &repo))
        .map(|secrets| secrets.values().cloned().collect())
        .unwrap_or_default();

    Json(Secrets {
        total_count: secrets.len() as u64,
        secrets,
    })
    .into_response()
}

/// GET /repos/{owner}/{repo}/actions/secrets/{name}
pub async fn get_repo_secret(
    State(state): State<SharedState>,
    Path((owner, repo, name)): Path<(String, String, String)>,
) -> Response {
    let state = state.read().await;
    match state
        .secrets
        .get(&full_name(&owner, &repo))
        .and_then(|secrets| secrets.get(&name))
    {
        Some(secret) => Json(secret.clone()).into_response(),
        None => not_found(),
    }
}

/// PUT /repos/{owner}/{repo}/actions/secrets/{name}
///
/// 201 when created, 204 when updated.
pub async fn put_repo_secret(
    State(state): State<SharedState>,
    Path((owner, repo, name)): Path<(String, String, String)>,
    Json(body): Json<PutSecretBody>,
) -> Response {
    let mut state = state.write().await;
    if state.get_repository(&owner, &repo).is_none() {
        return not_found();
    }

    let expected_key = state.public_key_id.to_string();
    match body.key_id.as_deref() {
        None => return validation_failed(&["key_id is missing"]),
        Some(key_id) if key_id != expected_key => {
            return validation_failed(&["key_id does not match the repository public key"])
        }
        Some(_) => {}
    }
    if body.encrypted_value.as_deref().map_or(true, str::is_empty) {
        return validation_failed(&["encrypted_value is missing"]);
    }

    let now = Utc::now();
    let secrets = state.secrets.entry(full_name(&owner, &repo)).or_default();
    match secrets.get_mut(&name) {
        Some(secret) => {
            secret.updated_at = Some(now);
            StatusCode::NO_CONTENT.into_response()
        }
        None => {
            secrets.insert(
                name.clone(),
                Secret {
                    name,
                    created_at: Some(now),
                    updated_at: Some(now),
                    ..Secret::default()
                },
            );
            (StatusCode::CREATED, Json(json!({}))).into_response()
        }
    }
}

/// DELETE /repos/{owner}/{repo}/actions/secrets/{name}
pub async fn delete_repo_secret(
    State(state): State<SharedState>,
    Path((owner, repo, name)): Path<(String, String, String)>,
) -> Response {
    let mut state = state.write().await;
    let removed = state
        .secrets
        .get_mut(&full_name(&owner, &repo))
        .and_then(|secrets| secrets.remove(&name));
    match removed {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(),
    }
}
