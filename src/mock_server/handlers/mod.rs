//! HTTP request handlers for the mock server.

pub mod actions;
pub mod environments;
pub mod repos;
pub mod secrets;

pub use actions::*;
pub use environments::*;
pub use repos::*;
pub use secrets::*;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tokio::sync::RwLock;

use crate::mock_server::state::MockState;

pub(crate) type SharedState = Arc<RwLock<MockState>>;

/// GitHub's 404 body.
pub(crate) fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest"
        })),
    )
        .into_response()
}

/// GitHub's 422 body.
pub(crate) fn validation_failed(errors: &[&str]) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "message": "Validation Failed",
            "errors": errors,
            "documentation_url": "https://docs.github.com/rest"
        })),
    )
        .into_response()
}

/// GET /rate_limit
pub async fn get_rate_limit(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;
    let core = json!({
        "limit": state.rate_limit,
        "remaining": state.rate_remaining,
        "used": state.rate_limit - state.rate_remaining,
        "reset": state.rate_reset.timestamp(),
        "resource": "core"
    });
    Json(json!({
        "resources": { "core": core.clone() },
        "rate": core
    }))
}
