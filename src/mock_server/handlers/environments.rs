//! Deployment environment endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::Value;

use super::{not_found, validation_failed, SharedState};
use crate::mock_server::state::full_name;
use crate::{BranchPolicy, EnvResponse, Environment, ProtectionRule};

/// Fields a plan without protection rules refuses, whatever their value.
const PROTECTION_FIELDS: [&str; 3] = ["wait_timer", "reviewers", "can_admins_bypass"];

/// GET /repos/{owner}/{repo}/environments
pub async fn list_environments(
    State(state): State<SharedState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Response {
    let state = state.read().await;
    if state.get_repository(&owner, &repo).is_none() {
        return not_found();
    }
    let environments: Vec<Environment> = state
        .environments
        .get(&full_name(&owner, &repo))
        .map(|envs| envs.values().cloned().collect())
        .unwrap_or_default();

    Json(EnvResponse {
        total_count: environments.len() as u64,
        environments,
    })
    .into_response()
}

/// GET /repos/{owner}/{repo}/environments/{name}
pub async fn get_environment(
    State(state): State<SharedState>,
    Path((owner, repo, name)): Path<(String, String, String)>,
) -> Response {
    let state = state.read().await;
    match state
        .environments
        .get(&full_name(&owner, &repo))
        .and_then(|envs| envs.get(&name))
    {
        Some(environment) => Json(environment.clone()).into_response(),
        None => not_found(),
    }
}

/// PUT /repos/{owner}/{repo}/environments/{name}
pub async fn put_environment(
    State(state): State<SharedState>,
    Path((owner, repo, name)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.write().await;
    if state.get_repository(&owner, &repo).is_none() {
        return not_found();
    }

    if !state.protection_rules_supported
        && PROTECTION_FIELDS.iter().any(|field| body.get(field).is_some())
    {
        return validation_failed(&[
            "Protection rules are not available for this repository's plan",
        ]);
    }

    let next_id = state
        .environments
        .values()
        .flat_map(|envs| envs.values())
        .filter_map(|env| env.id)
        .max()
        .unwrap_or(0)
        + 1;

    let now = Utc::now();
    let environment = state
        .environments
        .entry(full_name(&owner, &repo))
        .or_default()
        .entry(name.clone())
        .or_insert_with(|| Environment {
            id: Some(next_id),
            name: Some(name),
            created_at: Some(now),
            ..Environment::default()
        });
    environment.updated_at = Some(now);

    if let Some(bypass) = body.get("can_admins_bypass").and_then(Value::as_bool) {
        environment.can_admins_bypass = Some(bypass);
    }
    environment.deployment_branch_policy = body
        .get("deployment_branch_policy")
        .filter(|policy| !policy.is_null())
        .and_then(|policy| serde_json::from_value::<BranchPolicy>(policy.clone()).ok());

    match body.get("wait_timer").and_then(Value::as_u64) {
        Some(wait) if wait > 0 => {
            environment.protection_rules = vec![ProtectionRule {
                rule_type: Some("wait_timer".to_string()),
                wait_timer: u32::try_from(wait).ok(),
                ..ProtectionRule::default()
            }];
        }
        _ => environment.protection_rules.clear(),
    }

    (StatusCode::OK, Json(environment.clone())).into_response()
}

/// DELETE /repos/{owner}/{repo}/environments/{name}
pub async fn delete_environment(
    State(state): State<SharedState>,
    Path((owner, repo, name)): Path<(String, String, String)>,
) -> Response {
    let mut state = state.write().await;
    let removed = state
        .environments
        .get_mut(&full_name(&owner, &repo))
        .and_then(|envs| envs.remove(&name));
    match removed {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(),
    }
}
