//! Quota status.

use reqwest::Method;
use tokio_util::sync::CancellationToken;

use crate::client::GitHubClient;
use crate::error::Result;
use crate::models::{RateLimits, RateLimitsEnvelope};
use crate::response::Response;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitService<'c> {
    pub(crate) client: &'c GitHubClient,
}

impl RateLimitService<'_> {
    /// Current quotas for every resource class.
    pub async fn get(&self, cancel: &CancellationToken) -> Result<(RateLimits, Response)> {
        let request = self.client.request(Method::GET, "rate_limit")?;
        let (envelope, response): (RateLimitsEnvelope, _) =
            self.client.send(cancel, request).await?;
        Ok((envelope.resources, response))
    }
}
