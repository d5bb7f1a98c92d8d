//! Mock GitHub API server for E2E testing.
//!
//! This module provides an in-memory mock server that simulates a slice of
//! the GitHub REST API for integration and end-to-end testing. Unlike
//! wiremock, which mocks at the HTTP level per-test, this server maintains
//! state across requests, enabling realistic workflow testing: a deleted
//! resource stays deleted, quotas drain, and plan restrictions apply.
//!
//! # Example
//!
//! ```ignore
//! use ghrest::mock_server::MockServer;
//! use ghrest::GitHubClient;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let client = GitHubClient::builder().base_url(server.url()).build().unwrap();
//!     let cancel = CancellationToken::new();
//!
//!     // Server comes with default fixtures
//!     let (repo, _) = client
//!         .repositories()
//!         .get(&cancel, "octocat", "Hello-World")
//!         .await
//!         .unwrap();
//!     assert_eq!(repo.description.as_deref(), Some("My first repo"));
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::{DefaultScenario, Fixtures};
pub use server::MockServer;
pub use state::MockState;
