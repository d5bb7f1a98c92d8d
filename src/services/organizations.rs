//! Organizations, their fine-grained tokens, custom properties and packages.

use reqwest::Method;
use tokio_util::sync::CancellationToken;

use crate::client::GitHubClient;
use crate::error::Result;
use crate::models::{
    ListFineGrainedPatOptions, Organization, PackageListOptions, PackageVersion,
    PersonalAccessToken, RepoCustomPropertyValue, ReviewPersonalAccessTokenRequest,
};
use crate::pagination::ListOptions;
use crate::query::add_options;
use crate::request::escape;
use crate::response::Response;

#[derive(Debug, Clone, Copy)]
pub struct OrganizationsService<'c> {
    pub(crate) client: &'c GitHubClient,
}

impl OrganizationsService<'_> {
    pub async fn get(
        &self,
        cancel: &CancellationToken,
        org: &str,
    ) -> Result<(Organization, Response)> {
        let request = self
            .client
            .request(Method::GET, &format!("orgs/{}", escape(org)?))?;
        self.client.send(cancel, request).await
    }

    /// Fine-grained tokens with access to the organization's resources.
    pub async fn list_fine_grained_personal_access_tokens(
        &self,
        cancel: &CancellationToken,
        org: &str,
        options: Option<&ListFineGrainedPatOptions>,
    ) -> Result<(Vec<PersonalAccessToken>, Response)> {
        let path = format!("orgs/{}/personal-access-tokens", escape(org)?);
        let path = add_options(&path, options)?;
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    /// Approve or deny a pending token request.
    pub async fn review_personal_access_token(
        &self,
        cancel: &CancellationToken,
        org: &str,
        pat_id: u64,
        review: &ReviewPersonalAccessTokenRequest,
    ) -> Result<Response> {
        let path = format!("orgs/{}/personal-access-tokens/{pat_id}", escape(org)?);
        let request = self.client.request_json(Method::POST, &path, review)?;
        self.client.send_empty(cancel, request).await
    }

    /// Custom property values of every repository in the organization.
    pub async fn get_all_custom_property_values(
        &self,
        cancel: &CancellationToken,
        org: &str,
        options: Option<&ListOptions>,
    ) -> Result<(Vec<RepoCustomPropertyValue>, Response)> {
        let path = format!("orgs/{}/properties/values", escape(org)?);
        let path = add_options(&path, options)?;
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    pub async fn get_package_version(
        &self,
        cancel: &CancellationToken,
        org: &str,
        package_type: &str,
        package_name: &str,
        version_id: u64,
    ) -> Result<(PackageVersion, Response)> {
        let path = format!(
            "{}/versions/{version_id}",
            package_path(org, package_type, package_name)?
        );
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    pub async fn list_package_versions(
        &self,
        cancel: &CancellationToken,
        org: &str,
        package_type: &str,
        package_name: &str,
        options: Option<&PackageListOptions>,
    ) -> Result<(Vec<PackageVersion>, Response)> {
        let path = format!("{}/versions", package_path(org, package_type, package_name)?);
        let path = add_options(&path, options)?;
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }
}

/// Package names may contain `/` (container images), which must stay inside
/// a single segment.
fn package_path(org: &str, package_type: &str, package_name: &str) -> Result<String> {
    Ok(format!(
        "orgs/{}/packages/{}/{}",
        escape(org)?,
        escape(package_type)?,
        escape(package_name)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name_stays_one_segment() {
        assert_eq!(
            package_path("octo", "container", "hello/world").unwrap(),
            "orgs/octo/packages/container/hello%2Fworld"
        );
    }
}
