//! Repositories and the resources hanging off them.

use reqwest::Method;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::repo_path;
use crate::client::{decode_body, GitHubClient};
use crate::error::{parse_bool_response, Error, Result};
use crate::models::{
    Branch, BranchListOptions, CreateUpdateEnvironment, CustomPropertyValue,
    CustomPropertyValues, EnvResponse, Environment, Repository, RepositoryListOptions, Topics,
};
use crate::pagination::ListOptions;
use crate::query::add_options;
use crate::request::escape;
use crate::response::Response;

#[derive(Debug, Clone, Copy)]
pub struct RepositoriesService<'c> {
    pub(crate) client: &'c GitHubClient,
}

impl RepositoriesService<'_> {
    pub async fn get(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
    ) -> Result<(Repository, Response)> {
        let request = self.client.request(Method::GET, &repo_path(owner, repo)?)?;
        self.client.send(cancel, request).await
    }

    /// Public repositories of `user`.
    pub async fn list_by_user(
        &self,
        cancel: &CancellationToken,
        user: &str,
        options: Option<&RepositoryListOptions>,
    ) -> Result<(Vec<Repository>, Response)> {
        let path = add_options(&format!("users/{}/repos", escape(user)?), options)?;
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    pub async fn list_by_org(
        &self,
        cancel: &CancellationToken,
        org: &str,
        options: Option<&RepositoryListOptions>,
    ) -> Result<(Vec<Repository>, Response)> {
        let path = add_options(&format!("orgs/{}/repos", escape(org)?), options)?;
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    /// Update the fields set in `changes`; unset fields are left alone.
    pub async fn edit(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        changes: &Repository,
    ) -> Result<(Repository, Response)> {
        let request = self
            .client
            .request_json(Method::PATCH, &repo_path(owner, repo)?, changes)?;
        self.client.send(cancel, request).await
    }

    pub async fn delete(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
    ) -> Result<Response> {
        let request = self.client.request(Method::DELETE, &repo_path(owner, repo)?)?;
        self.client.send_empty(cancel, request).await
    }

    /// Whether Dependabot alerts are enabled. A 404 means disabled.
    pub async fn get_vulnerability_alerts(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
    ) -> Result<(bool, Response)> {
        let path = format!("{}/vulnerability-alerts", repo_path(owner, repo)?);
        let request = self.client.request(Method::GET, &path)?;
        parse_bool_response(self.client.send_empty(cancel, request).await)
    }

    pub async fn enable_vulnerability_alerts(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
    ) -> Result<Response> {
        let path = format!("{}/vulnerability-alerts", repo_path(owner, repo)?);
        let request = self.client.request(Method::PUT, &path)?;
        self.client.send_empty(cancel, request).await
    }

    pub async fn disable_vulnerability_alerts(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
    ) -> Result<Response> {
        let path = format!("{}/vulnerability-alerts", repo_path(owner, repo)?);
        let request = self.client.request(Method::DELETE, &path)?;
        self.client.send_empty(cancel, request).await
    }

    pub async fn list_all_topics(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
    ) -> Result<(Vec<String>, Response)> {
        let path = format!("{}/topics", repo_path(owner, repo)?);
        let request = self.client.request(Method::GET, &path)?;
        let (topics, response): (Topics, _) = self.client.send(cancel, request).await?;
        Ok((topics.names, response))
    }

    /// Replace every topic. An empty slice removes them all.
    pub async fn replace_all_topics(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        topics: &[String],
    ) -> Result<(Vec<String>, Response)> {
        let path = format!("{}/topics", repo_path(owner, repo)?);
        let body = Topics {
            names: topics.to_vec(),
        };
        let request = self.client.request_json(Method::PUT, &path, &body)?;
        let (topics, response): (Topics, _) = self.client.send(cancel, request).await?;
        Ok((topics.names, response))
    }

    pub async fn list_branches(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        options: Option<&BranchListOptions>,
    ) -> Result<(Vec<Branch>, Response)> {
        let path = add_options(&format!("{}/branches", repo_path(owner, repo)?), options)?;
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    /// Fetch a branch, following up to `max_redirects` renames.
    ///
    /// # Errors
    ///
    /// [`Error::TooManyRedirects`] if the branch is still reported as moved
    /// after `max_redirects` hops.
    pub async fn get_branch(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        branch: &str,
        max_redirects: u32,
    ) -> Result<(Branch, Response)> {
        let path = format!("{}/branches/{}", repo_path(owner, repo)?, escape(branch)?);
        let (body, response) = self
            .client
            .get_following_moved(cancel, &path, max_redirects)
            .await?;
        decode_body(&body, response)
    }

    pub async fn list_environments(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        options: Option<&ListOptions>,
    ) -> Result<(EnvResponse, Response)> {
        let path = add_options(&format!("{}/environments", repo_path(owner, repo)?), options)?;
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    pub async fn get_environment(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        name: &str,
    ) -> Result<(Environment, Response)> {
        let request = self
            .client
            .request(Method::GET, &environment_path(owner, repo, name)?)?;
        self.client.send(cancel, request).await
    }

    /// Create an environment or update its protection rules.
    ///
    /// Plans without protection rules reject `wait_timer`, `reviewers` and
    /// `can_admins_bypass` with a 422, even when they carry default values.
    /// If the caller did not actually ask for reviewers or a wait timer, the
    /// request is retried once with only the branch policy.
    pub async fn create_update_environment(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        name: &str,
        environment: &CreateUpdateEnvironment,
    ) -> Result<(Environment, Response)> {
        let path = environment_path(owner, repo, name)?;
        let request = self.client.request_json(Method::PUT, &path, environment)?;

        match self.client.send(cancel, request).await {
            Err(Error::Validation(err)) if !environment.requests_protection_rules() => {
                warn!(
                    environment = name,
                    message = %err.body.message,
                    "protection rules rejected, retrying with branch policy only"
                );
                let request = self.client.request_json(
                    Method::PUT,
                    &path,
                    &environment.branch_policy_only(),
                )?;
                self.client.send(cancel, request).await
            }
            result => result,
        }
    }

    pub async fn delete_environment(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        name: &str,
    ) -> Result<Response> {
        let request = self
            .client
            .request(Method::DELETE, &environment_path(owner, repo, name)?)?;
        self.client.send_empty(cancel, request).await
    }

    pub async fn get_custom_property_values(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
    ) -> Result<(Vec<CustomPropertyValue>, Response)> {
        let path = format!("{}/properties/values", repo_path(owner, repo)?);
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    /// Set or unset (with a `None` value) custom properties.
    pub async fn create_or_update_custom_property_values(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        properties: &[CustomPropertyValue],
    ) -> Result<Response> {
        let path = format!("{}/properties/values", repo_path(owner, repo)?);
        let body = CustomPropertyValues { properties };
        let request = self.client.request_json(Method::PATCH, &path, &body)?;
        self.client.send_empty(cancel, request).await
    }
}

fn environment_path(owner: &str, repo: &str, name: &str) -> Result<String> {
    Ok(format!("{}/environments/{}", repo_path(owner, repo)?, escape(name)?))
}
