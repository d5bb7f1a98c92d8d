//! GitHub REST API client library.
//!
//! A typed client for the GitHub v3 REST API. Every endpoint builds a
//! request from a relative path and an options struct, sends it through a
//! pluggable [`Transport`], classifies the status into a typed [`Error`],
//! and decodes the JSON body into a model. Every call also returns the
//! [`Response`] metadata: pagination cursors, the rate-limit snapshot and
//! token expiry.
//!
//! # Quick Start
//!
//! ```no_run
//! use ghrest::{GitHubClient, ListOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> ghrest::Result<()> {
//!     // Token and base URL from GITHUB_TOKEN / GITHUB_API_URL
//!     let client = GitHubClient::from_env()?;
//!     let cancel = CancellationToken::new();
//!
//!     let (repo, response) = client
//!         .repositories()
//!         .get(&cancel, "octocat", "Hello-World")
//!         .await?;
//!     println!("{:?} ({} requests left)", repo.full_name, response.rate.remaining);
//!
//!     let mut options = ListOptions::for_page(1, 50);
//!     loop {
//!         let (stargazers, response) = client
//!             .activity()
//!             .list_stargazers(&cancel, "octocat", "Hello-World", Some(&options))
//!             .await?;
//!         println!("{} stargazers", stargazers.len());
//!         if !response.pagination.has_next() {
//!             break;
//!         }
//!         options.page = response.pagination.next_page;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Errors
//!
//! Non-2xx responses map to dedicated [`Error`] variants: rate limits,
//! secondary rate limits, abuse detection, two-factor challenges,
//! validation failures, redirects and generic API errors. A 202 is
//! [`Error::Accepted`] (the server is still computing the result) and
//! carries the raw body.
//!
//! # Configuration
//!
//! [`GitHubClient::from_env`] reads:
//!
//! - `GITHUB_TOKEN` (required) - Bearer token; [`Error::ConfigMissing`] when unset
//! - `GITHUB_API_URL` (optional) - Base URL (defaults to `https://api.github.com/`)

mod auth;
mod client;
mod error;
mod models;
mod pagination;
mod query;
mod redirect;
mod request;
mod response;
mod services;
mod transport;

#[cfg(feature = "test-server")]
pub mod mock_server;

// Re-export core types
pub use auth::{Anonymous, Authenticate, TokenAuth};
pub use client::{ClientBuilder, GitHubClient};
pub use error::{
    check_response, parse_bool_response, ApiError, Error, ErrorBlock, ErrorBody, FieldError,
    RateLimitError, Result, SecondaryRateLimitError, TransportError,
};
pub use pagination::{ListCursorOptions, ListOptions, Pagination};
pub use query::{add_options, encode as encode_query};
pub use request::{
    escape, Request, DEFAULT_API_VERSION, DEFAULT_BASE_URL, MEDIA_TYPE_RAW, MEDIA_TYPE_V3,
};
pub use response::{Rate, Response};
pub use transport::{RedirectPolicy, ReqwestTransport, Transport};

// Re-export services
pub use services::{
    ActionsService, ActivityService, DependabotService, OrganizationsService,
    PullRequestsService, RateLimitService, RepositoriesService, UsersService,
};

// Re-export models
pub use models::{
    // Shared records
    Branch,
    BranchCommit,
    BranchListOptions,
    Organization,
    Repository,
    RepositoryListOptions,
    Team,
    Topics,
    User,
    UserListOptions,
    // Actions
    ListWorkflowJobsOptions,
    TaskStep,
    WorkflowJob,
    WorkflowJobs,
    // Secrets
    EncryptedSecret,
    KeyId,
    PublicKey,
    Secret,
    Secrets,
    SelectedRepoIds,
    SelectedReposList,
    // Environments
    BranchPolicy,
    CreateUpdateEnvironment,
    EnvResponse,
    EnvReviewers,
    Environment,
    ProtectionRule,
    RequiredReviewer,
    // Pull requests
    PullRequest,
    PullRequestBranch,
    PullRequestListOptions,
    Reviewers,
    ReviewersRequest,
    // Custom properties
    CustomPropertyValue,
    PropertyValue,
    RepoCustomPropertyValue,
    // Packages
    PackageListOptions,
    PackageVersion,
    PackageVersionBody,
    PackageVersionDetails,
    PackageVersionInfo,
    // Tokens
    ListFineGrainedPatOptions,
    PersonalAccessToken,
    PersonalAccessTokenPermissions,
    ReviewPersonalAccessTokenRequest,
    // Rate limits
    RateLimits,
};
