//! Mock GitHub API server.
//!
//! Provides an axum-based HTTP server that simulates the GitHub REST API.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::{DefaultScenario, Fixtures};
use super::handlers::{self, SharedState};
use super::state::MockState;

/// A mock GitHub API server for testing.
///
/// The server runs in the background and can be used to test the client
/// against a realistic API implementation. Every response carries
/// `X-RateLimit-*` headers, and requests are refused with a 403 once the
/// configured quota runs out.
pub struct MockServer {
    /// The URL where the server is listening.
    url: String,
    /// Handle to the server task.
    handle: JoinHandle<()>,
    /// Shared state that can be modified during tests.
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a new mock server with default fixtures.
    ///
    /// The server listens on a random available port and returns immediately.
    /// Use `url()` to get the server's base URL.
    pub async fn start() -> Self {
        Self::with_state(Self::default_state()).await
    }

    /// Start a mock server with empty state.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    /// Start a mock server with custom state.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn with_state(state: MockState) -> Self {
        let shared_state = state.shared();
        let app = Self::create_router(shared_state.clone());

        // Bind to a random available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            url: format!("http://{}/", addr),
            handle,
            state: shared_state,
        }
    }

    /// Get the base URL of the mock server, with a trailing slash.
    ///
    /// Use this URL as the client's base URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get access to the server's shared state.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// Shutdown the server.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }

    /// Create the default state with common test fixtures.
    fn default_state() -> MockState {
        Self::state_from_scenario(Fixtures::default_scenario())
    }

    /// Create state from a scenario.
    fn state_from_scenario(scenario: DefaultScenario) -> MockState {
        let mut state = MockState::new();

        for repository in scenario.repositories {
            state = state.with_repository(repository);
        }

        for (full_name, secret) in scenario.secrets {
            state = state.with_secret(&full_name, secret);
        }

        for (full_name, environment) in scenario.environments {
            state = state.with_environment(&full_name, environment);
        }

        for (run_id, jobs) in scenario.workflow_runs {
            state = state.with_workflow_jobs(run_id, jobs);
        }

        state
            .vulnerability_alerts
            .extend(scenario.vulnerability_alerts);

        state
    }

    /// Create the axum router with all routes.
    fn create_router(state: SharedState) -> Router {
        Router::new()
            // Repository routes
            .route(
                "/repos/:owner/:repo",
                get(handlers::get_repository)
                    .patch(handlers::edit_repository)
                    .delete(handlers::delete_repository),
            )
            .route(
                "/repos/:owner/:repo/vulnerability-alerts",
                get(handlers::get_vulnerability_alerts)
                    .put(handlers::enable_vulnerability_alerts)
                    .delete(handlers::disable_vulnerability_alerts),
            )
            // Secret routes
            .route(
                "/repos/:owner/:repo/actions/secrets/public-key",
                get(handlers::get_repo_public_key),
            )
            .route(
                "/repos/:owner/:repo/actions/secrets",
                get(handlers::list_repo_secrets),
            )
            .route(
                "/repos/:owner/:repo/actions/secrets/:name",
                get(handlers::get_repo_secret)
                    .put(handlers::put_repo_secret)
                    .delete(handlers::delete_repo_secret),
            )
            // Workflow routes
            .route(
                "/repos/:owner/:repo/actions/runs/:run_id/jobs",
                get(handlers::list_workflow_jobs),
            )
            .route(
                "/repos/:owner/:repo/actions/jobs/:job_id/logs",
                get(handlers::get_workflow_job_logs),
            )
            .route(
                "/repos/:owner/:repo/actions/runs/:run_id/logs",
                get(handlers::get_workflow_run_logs),
            )
            .route(
                "/repositories/:id/actions/runs/:run_id/logs",
                get(handlers::get_workflow_run_logs_by_id),
            )
            // Environment routes
            .route(
                "/repos/:owner/:repo/environments",
                get(handlers::list_environments),
            )
            .route(
                "/repos/:owner/:repo/environments/:name",
                get(handlers::get_environment)
                    .put(handlers::put_environment)
                    .delete(handlers::delete_environment),
            )
            .route("/rate_limit", get(handlers::get_rate_limit))
            // Health check
            .route("/health", get(health_check))
            .fallback(handlers::unknown_route)
            .layer(middleware::from_fn_with_state(
                state.clone(),
                github_headers,
            ))
            .with_state(state)
    }
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}

/// Enforce the bearer token and the core quota, and stamp rate headers on
/// every response.
async fn github_headers(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    let admitted = {
        let mut state = state.write().await;
        let authorized = match &state.required_token {
            Some(token) => request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .is_some_and(|h| h == format!("Bearer {token}")),
            None => true,
        };
        if !authorized {
            Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "message": "Bad credentials",
                    "documentation_url": "https://docs.github.com/rest"
                })),
            )
                .into_response())
        } else if !state.consume_rate() {
            Err((
                StatusCode::FORBIDDEN,
                Json(json!({
                    "message": "API rate limit exceeded for user ID 1.",
                    "documentation_url": "https://docs.github.com/rest/overview/resources-in-the-rest-api#rate-limiting"
                })),
            )
                .into_response())
        } else {
            Ok(())
        }
    };

    let mut response = match admitted {
        Ok(()) => next.run(request).await,
        Err(rejection) => rejection,
    };

    let state = state.read().await;
    stamp_rate_headers(response.headers_mut(), &state);
    response
}

fn stamp_rate_headers(headers: &mut HeaderMap, state: &MockState) {
    let values = [
        ("x-ratelimit-limit", state.rate_limit.to_string()),
        ("x-ratelimit-remaining", state.rate_remaining.to_string()),
        (
            "x-ratelimit-used",
            (state.rate_limit - state.rate_remaining).to_string(),
        ),
        ("x-ratelimit-reset", state.rate_reset.timestamp().to_string()),
        ("x-ratelimit-resource", "core".to_string()),
    ];
    for (name, value) in values {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GitHubClient;
    use tokio_util::sync::CancellationToken;

    fn client(server: &MockServer) -> GitHubClient {
        GitHubClient::builder()
            .base_url(server.url())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_server_starts_and_responds() {
        let server = MockServer::start().await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}health", server.url()))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());
        assert!(response.headers().contains_key("x-ratelimit-remaining"));
        assert_eq!(response.text().await.unwrap(), "ok");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_get_repository_with_client() {
        let server = MockServer::start().await;
        let client = client(&server);
        let cancel = CancellationToken::new();

        let (repo, response) = client
            .repositories()
            .get(&cancel, "octocat", "Hello-World")
            .await
            .expect("Failed to get repository");

        assert_eq!(repo.description.as_deref(), Some("My first repo"));
        assert_eq!(response.rate.limit, 5000);
        assert!(response.rate.remaining < 5000);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_empty_server() {
        let server = MockServer::start_empty().await;
        let client = client(&server);
        let cancel = CancellationToken::new();

        let err = client
            .repositories()
            .get(&cancel, "octocat", "Hello-World")
            .await
            .unwrap_err();

        assert!(err.is_not_found());

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_required_token() {
        let state = MockState::new()
            .with_repository(Fixtures::minimal_repository(1, "octo", "hello"))
            .with_required_token("s3cret");
        let server = MockServer::with_state(state).await;
        let cancel = CancellationToken::new();

        let anonymous = client(&server);
        let err = anonymous
            .repositories()
            .get(&cancel, "octo", "hello")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));

        let authed = anonymous
            .with_auth_token(&secrecy::SecretString::from("s3cret".to_string()))
            .unwrap();
        let (repo, _) = authed
            .repositories()
            .get(&cancel, "octo", "hello")
            .await
            .unwrap();
        assert_eq!(repo.id, Some(1));

        server.shutdown().await;
    }
}
