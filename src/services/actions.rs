//! GitHub Actions: workflow jobs, run logs and encrypted secrets.

use reqwest::Method;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::repo_path;
use crate::client::GitHubClient;
use crate::error::Result;
use crate::models::{
    EncryptedSecret, ListWorkflowJobsOptions, PublicKey, Secret, Secrets, SelectedRepoIds,
    SelectedReposList, WorkflowJob, WorkflowJobs,
};
use crate::pagination::ListOptions;
use crate::query::add_options;
use crate::request::escape;
use crate::response::Response;

#[derive(Debug, Clone, Copy)]
pub struct ActionsService<'c> {
    pub(crate) client: &'c GitHubClient,
}

impl ActionsService<'_> {
    /// List the jobs of a workflow run.
    pub async fn list_workflow_jobs(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        run_id: u64,
        options: Option<&ListWorkflowJobsOptions>,
    ) -> Result<(WorkflowJobs, Response)> {
        let path = format!("{}/actions/runs/{run_id}/jobs", repo_path(owner, repo)?);
        let path = add_options(&path, options)?;
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    pub async fn get_workflow_job(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        job_id: u64,
    ) -> Result<(WorkflowJob, Response)> {
        let path = format!("{}/actions/jobs/{job_id}", repo_path(owner, repo)?);
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    /// Resolve the short-lived download URL of a job's plain-text log.
    ///
    /// See [`GitHubClient::resolve_download_url`] for redirect handling.
    pub async fn get_workflow_job_logs(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        job_id: u64,
        max_redirects: u32,
    ) -> Result<(Url, Response)> {
        let path = format!("{}/actions/jobs/{job_id}/logs", repo_path(owner, repo)?);
        self.client
            .resolve_download_url(cancel, &path, max_redirects)
            .await
    }

    /// Resolve the download URL of a run's zipped logs.
    pub async fn get_workflow_run_logs(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        run_id: u64,
        max_redirects: u32,
    ) -> Result<(Url, Response)> {
        let path = format!("{}/actions/runs/{run_id}/logs", repo_path(owner, repo)?);
        self.client
            .resolve_download_url(cancel, &path, max_redirects)
            .await
    }

    /// The key used to seal repository secrets.
    pub async fn get_repo_public_key(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
    ) -> Result<(PublicKey, Response)> {
        let path = format!("{}/actions/secrets/public-key", repo_path(owner, repo)?);
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    pub async fn get_org_public_key(
        &self,
        cancel: &CancellationToken,
        org: &str,
    ) -> Result<(PublicKey, Response)> {
        let path = format!("orgs/{}/actions/secrets/public-key", escape(org)?);
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    pub async fn list_repo_secrets(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        options: Option<&ListOptions>,
    ) -> Result<(Secrets, Response)> {
        let path = format!("{}/actions/secrets", repo_path(owner, repo)?);
        let path = add_options(&path, options)?;
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    pub async fn get_repo_secret(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        name: &str,
    ) -> Result<(Secret, Response)> {
        let path = format!("{}/actions/secrets/{}", repo_path(owner, repo)?, escape(name)?);
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    /// Create or replace a repository secret named `secret.name`.
    pub async fn create_or_update_repo_secret(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        secret: &EncryptedSecret,
    ) -> Result<Response> {
        let path = format!(
            "{}/actions/secrets/{}",
            repo_path(owner, repo)?,
            escape(&secret.name)?
        );
        let request = self.client.request_json(Method::PUT, &path, secret)?;
        self.client.send_empty(cancel, request).await
    }

    pub async fn delete_repo_secret(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        name: &str,
    ) -> Result<Response> {
        let path = format!("{}/actions/secrets/{}", repo_path(owner, repo)?, escape(name)?);
        let request = self.client.request(Method::DELETE, &path)?;
        self.client.send_empty(cancel, request).await
    }

    /// Create or replace an organization secret named `secret.name`.
    pub async fn create_or_update_org_secret(
        &self,
        cancel: &CancellationToken,
        org: &str,
        secret: &EncryptedSecret,
    ) -> Result<Response> {
        let path = format!(
            "orgs/{}/actions/secrets/{}",
            escape(org)?,
            escape(&secret.name)?
        );
        let request = self.client.request_json(Method::PUT, &path, secret)?;
        self.client.send_empty(cancel, request).await
    }

    pub async fn list_selected_repos_for_org_secret(
        &self,
        cancel: &CancellationToken,
        org: &str,
        name: &str,
        options: Option<&ListOptions>,
    ) -> Result<(SelectedReposList, Response)> {
        let path = org_secret_repos_path(org, name)?;
        let path = add_options(&path, options)?;
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    /// Replace the repositories allowed to read a `selected` secret.
    /// An empty slice clears the selection.
    pub async fn set_selected_repos_for_org_secret(
        &self,
        cancel: &CancellationToken,
        org: &str,
        name: &str,
        repository_ids: &[u64],
    ) -> Result<Response> {
        let body = SelectedRepoIds {
            selected_repository_ids: repository_ids.to_vec(),
        };
        let request =
            self.client
                .request_json(Method::PUT, &org_secret_repos_path(org, name)?, &body)?;
        self.client.send_empty(cancel, request).await
    }

    pub async fn add_selected_repo_to_org_secret(
        &self,
        cancel: &CancellationToken,
        org: &str,
        name: &str,
        repository_id: u64,
    ) -> Result<Response> {
        let path = format!("{}/{repository_id}", org_secret_repos_path(org, name)?);
        let request = self.client.request(Method::PUT, &path)?;
        self.client.send_empty(cancel, request).await
    }

    pub async fn remove_selected_repo_from_org_secret(
        &self,
        cancel: &CancellationToken,
        org: &str,
        name: &str,
        repository_id: u64,
    ) -> Result<Response> {
        let path = format!("{}/{repository_id}", org_secret_repos_path(org, name)?);
        let request = self.client.request(Method::DELETE, &path)?;
        self.client.send_empty(cancel, request).await
    }
}

fn org_secret_repos_path(org: &str, name: &str) -> Result<String> {
    Ok(format!(
        "orgs/{}/actions/secrets/{}/repositories",
        escape(org)?,
        escape(name)?
    ))
}
