//! Dependabot secrets.
//!
//! Same shapes as the Actions secrets, except the organization endpoints
//! take repository ids as strings.

use reqwest::Method;
use serde::Serialize;
use serde_with::{serde_as, DisplayFromStr};
use tokio_util::sync::CancellationToken;

use super::repo_path;
use crate::client::GitHubClient;
use crate::error::Result;
use crate::models::{DependabotSecretBody, EncryptedSecret, PublicKey};
use crate::request::escape;
use crate::response::Response;

#[derive(Debug, Clone, Copy)]
pub struct DependabotService<'c> {
    pub(crate) client: &'c GitHubClient,
}

#[serde_as]
#[derive(Serialize)]
struct SelectedRepoIdStrings {
    #[serde_as(as = "Vec<DisplayFromStr>")]
    selected_repository_ids: Vec<u64>,
}

impl DependabotService<'_> {
    pub async fn get_repo_public_key(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
    ) -> Result<(PublicKey, Response)> {
        let path = format!("{}/dependabot/secrets/public-key", repo_path(owner, repo)?);
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    pub async fn get_org_public_key(
        &self,
        cancel: &CancellationToken,
        org: &str,
    ) -> Result<(PublicKey, Response)> {
        let path = format!("orgs/{}/dependabot/secrets/public-key", escape(org)?);
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    pub async fn create_or_update_repo_secret(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        secret: &EncryptedSecret,
    ) -> Result<Response> {
        let path = format!(
            "{}/dependabot/secrets/{}",
            repo_path(owner, repo)?,
            escape(&secret.name)?
        );
        let body = DependabotSecretBody::from(secret);
        let request = self.client.request_json(Method::PUT, &path, &body)?;
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
            "orgs/{}/dependabot/secrets/{}",
            escape(org)?,
            escape(&secret.name)?
        );
        let body = DependabotSecretBody::from(secret);
        let request = self.client.request_json(Method::PUT, &path, &body)?;
        self.client.send_empty(cancel, request).await
    }

    pub async fn set_selected_repos_for_org_secret(
        &self,
        cancel: &CancellationToken,
        org: &str,
        name: &str,
        repository_ids: &[u64],
    ) -> Result<Response> {
        let path = format!(
            "orgs/{}/dependabot/secrets/{}/repositories",
            escape(org)?,
            escape(name)?
        );
        let body = SelectedRepoIdStrings {
            selected_repository_ids: repository_ids.to_vec(),
        };
        let request = self.client.request_json(Method::PUT, &path, &body)?;
        self.client.send_empty(cancel, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_ids_are_strings() {
        let body = SelectedRepoIdStrings {
            selected_repository_ids: vec![64780797, 1],
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"selected_repository_ids":["64780797","1"]}"#
        );
    }
}
