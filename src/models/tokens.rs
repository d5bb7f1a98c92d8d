//! Fine-grained personal access tokens granted to an organization.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::User;
use crate::pagination::ListOptions;

/// A fine-grained personal access token with access to an organization.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalAccessToken {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub owner: Option<User>,
    /// `none`, `all` or `subset`.
    #[serde(default)]
    pub repository_selection: Option<String>,
    #[serde(default)]
    pub repositories_url: Option<String>,
    #[serde(default)]
    pub permissions: Option<PersonalAccessTokenPermissions>,
    #[serde(default)]
    pub access_granted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub token_expired: Option<bool>,
    #[serde(default)]
    pub token_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub token_last_used_at: Option<DateTime<Utc>>,
}

/// Permissions granted to a token, keyed by permission name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalAccessTokenPermissions {
    #[serde(default)]
    pub organization: HashMap<String, String>,
    #[serde(default)]
    pub repository: HashMap<String, String>,
    #[serde(default)]
    pub other: HashMap<String, String>,
}

/// Options for listing fine-grained tokens.
///
/// `owner` encodes as repeated `owner[]=` pairs rather than a
/// comma-joined list.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFineGrainedPatOptions {
    /// `created_at`.
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    /// Only tokens owned by these logins (at most 10).
    #[serde(rename = "owner[]", default, skip_serializing_if = "Vec::is_empty")]
    pub owner: Vec<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default)]
    pub last_used_before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_used_after: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub list: ListOptions,
}

/// Approve or deny a pending token request.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPersonalAccessTokenRequest {
    /// `approve` or `deny`.
    pub action: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_owner_filter_repeats_key() {
        let options = ListFineGrainedPatOptions {
            owner: vec!["alice".into(), "bob@x".into()],
            list: ListOptions::for_page(1, 50),
            ..ListFineGrainedPatOptions::default()
        };
        let query = crate::query::encode(&options).unwrap();

        assert!(query.contains("owner[]=alice&owner[]=bob%40x"), "{query}");
        assert!(query.contains("per_page=50"));
    }

    #[test]
    fn test_timestamps_encode_rfc3339() {
        let options = ListFineGrainedPatOptions {
            last_used_before: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            ..ListFineGrainedPatOptions::default()
        };
        let query = crate::query::encode(&options).unwrap();
        assert_eq!(query, "last_used_before=2024-01-02T03%3A04%3A05Z");
    }
}
