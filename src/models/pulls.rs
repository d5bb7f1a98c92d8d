//! Pull requests and review requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::{Repository, Team, User};
use crate::pagination::ListOptions;

/// A pull request.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub number: Option<u64>,
    /// `open` or `closed`.
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub draft: Option<bool>,
    #[serde(default)]
    pub merged: Option<bool>,
    #[serde(default)]
    pub mergeable: Option<bool>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub head: Option<PullRequestBranch>,
    #[serde(default)]
    pub base: Option<PullRequestBranch>,
    #[serde(default)]
    pub requested_reviewers: Vec<User>,
    #[serde(default)]
    pub requested_teams: Vec<Team>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
}

/// One side (head or base) of a pull request.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullRequestBranch {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "ref", default)]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub repo: Option<Repository>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Options for listing pull requests.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestListOptions {
    /// `open`, `closed` or `all`.
    #[serde(default)]
    pub state: Option<String>,
    /// `user:ref-name` filter on the head branch.
    #[serde(default)]
    pub head: Option<String>,
    #[serde(default)]
    pub base: Option<String>,
    /// `created`, `updated`, `popularity` or `long-running`.
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(flatten)]
    pub list: ListOptions,
}

/// Users and teams to request (or stop requesting) a review from.
///
/// `reviewers` is always serialized; removing only teams still sends
/// `"reviewers": []`, which the endpoint requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewersRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default)]
    pub reviewers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub team_reviewers: Vec<String>,
}

/// Currently requested reviewers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewers {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub teams: Vec<Team>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reviewers_request_keeps_empty_reviewers() {
        let request = ReviewersRequest {
            team_reviewers: vec!["justice-league".into()],
            ..ReviewersRequest::default()
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"reviewers": [], "team_reviewers": ["justice-league"]})
        );
    }

    #[test]
    fn test_pull_request_decodes_ref() {
        let pr: PullRequest = serde_json::from_value(json!({
            "number": 1347,
            "state": "open",
            "head": {"ref": "new-topic", "sha": "6dcb09b"},
            "requested_reviewers": [{"login": "other_user"}]
        }))
        .unwrap();
        assert_eq!(pr.head.unwrap().git_ref.as_deref(), Some("new-topic"));
        assert_eq!(pr.requested_reviewers.len(), 1);
    }
}
