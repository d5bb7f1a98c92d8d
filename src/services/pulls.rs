//! Pull requests and review requests.

use reqwest::Method;
use tokio_util::sync::CancellationToken;

use super::repo_path;
use crate::client::GitHubClient;
use crate::error::Result;
use crate::models::{PullRequest, PullRequestListOptions, Reviewers, ReviewersRequest};
use crate::pagination::ListOptions;
use crate::query::add_options;
use crate::response::Response;

#[derive(Debug, Clone, Copy)]
pub struct PullRequestsService<'c> {
    pub(crate) client: &'c GitHubClient,
}

impl PullRequestsService<'_> {
    pub async fn get(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<(PullRequest, Response)> {
        let path = format!("{}/pulls/{number}", repo_path(owner, repo)?);
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    pub async fn list(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        options: Option<&PullRequestListOptions>,
    ) -> Result<(Vec<PullRequest>, Response)> {
        let path = add_options(&format!("{}/pulls", repo_path(owner, repo)?), options)?;
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    /// Users and teams whose review is pending.
    pub async fn list_reviewers(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        number: u64,
        options: Option<&ListOptions>,
    ) -> Result<(Reviewers, Response)> {
        let path = reviewers_path(owner, repo, number)?;
        let path = add_options(&path, options)?;
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    pub async fn request_reviewers(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        number: u64,
        reviewers: &ReviewersRequest,
    ) -> Result<(PullRequest, Response)> {
        let request = self.client.request_json(
            Method::POST,
            &reviewers_path(owner, repo, number)?,
            reviewers,
        )?;
        self.client.send(cancel, request).await
    }

    /// Withdraw review requests. The body rides on a DELETE.
    pub async fn remove_reviewers(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        number: u64,
        reviewers: &ReviewersRequest,
    ) -> Result<Response> {
        let request = self.client.request_json(
            Method::DELETE,
            &reviewers_path(owner, repo, number)?,
            reviewers,
        )?;
        self.client.send_empty(cancel, request).await
    }
}

fn reviewers_path(owner: &str, repo: &str, number: u64) -> Result<String> {
    Ok(format!("{}/pulls/{number}/requested_reviewers", repo_path(owner, repo)?))
}
