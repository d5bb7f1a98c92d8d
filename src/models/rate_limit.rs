//! Rate-limit status per resource class.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::response::Rate;

/// Quotas reported by the `rate_limit` endpoint.
///
/// Checking the status does not count against the core quota.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    #[serde(default)]
    pub core: Option<Rate>,
    #[serde(default)]
    pub search: Option<Rate>,
    #[serde(default)]
    pub graphql: Option<Rate>,
    #[serde(default)]
    pub integration_manifest: Option<Rate>,
    #[serde(default)]
    pub source_import: Option<Rate>,
    #[serde(default)]
    pub code_scanning_upload: Option<Rate>,
    #[serde(default)]
    pub actions_runner_registration: Option<Rate>,
    #[serde(default)]
    pub scim: Option<Rate>,
    #[serde(default)]
    pub dependency_snapshots: Option<Rate>,
    #[serde(default)]
    pub code_search: Option<Rate>,
    #[serde(default)]
    pub audit_log: Option<Rate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RateLimitsEnvelope {
    #[serde(default)]
    pub resources: RateLimits,
}
