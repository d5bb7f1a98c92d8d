//! Starring.

use reqwest::Method;
use tokio_util::sync::CancellationToken;

use super::repo_path;
use crate::client::GitHubClient;
use crate::error::{parse_bool_response, Result};
use crate::models::User;
use crate::pagination::ListOptions;
use crate::query::add_options;
use crate::request::escape;
use crate::response::Response;

#[derive(Debug, Clone, Copy)]
pub struct ActivityService<'c> {
    pub(crate) client: &'c GitHubClient,
}

impl ActivityService<'_> {
    /// Whether the authenticated user has starred the repository.
    pub async fn is_starred(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
    ) -> Result<(bool, Response)> {
        let request = self.client.request(Method::GET, &starred_path(owner, repo)?)?;
        parse_bool_response(self.client.send_empty(cancel, request).await)
    }

    pub async fn star(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
    ) -> Result<Response> {
        let request = self.client.request(Method::PUT, &starred_path(owner, repo)?)?;
        self.client.send_empty(cancel, request).await
    }

    pub async fn unstar(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
    ) -> Result<Response> {
        let request = self
            .client
            .request(Method::DELETE, &starred_path(owner, repo)?)?;
        self.client.send_empty(cancel, request).await
    }

    pub async fn list_stargazers(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        options: Option<&ListOptions>,
    ) -> Result<(Vec<User>, Response)> {
        let path = add_options(&format!("{}/stargazers", repo_path(owner, repo)?), options)?;
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }
}

fn starred_path(owner: &str, repo: &str) -> Result<String> {
    Ok(format!("user/starred/{}/{}", escape(owner)?, escape(repo)?))
}
