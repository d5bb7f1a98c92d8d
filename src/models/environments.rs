//! Deployment environments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_with::skip_serializing_none;

use super::{Team, User};

/// A deployment environment.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub can_admins_bypass: Option<bool>,
    #[serde(default)]
    pub protection_rules: Vec<ProtectionRule>,
    #[serde(default)]
    pub deployment_branch_policy: Option<BranchPolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub environments: Vec<Environment>,
}

/// A protection rule attached to an environment.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionRule {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub node_id: Option<String>,
    /// `required_reviewers`, `wait_timer` or `branch_policy`.
    #[serde(rename = "type", default)]
    pub rule_type: Option<String>,
    #[serde(default)]
    pub wait_timer: Option<u32>,
    #[serde(default)]
    pub prevent_self_review: Option<bool>,
    #[serde(default)]
    pub reviewers: Vec<RequiredReviewer>,
}

/// A reviewer required before deploying to an environment.
///
/// The wire form is `{"type": "User" | "Team", "reviewer": {...}}`; the
/// shape of `reviewer` follows `type`. Any other discriminator fails to
/// decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "reviewer")]
pub enum RequiredReviewer {
    User(User),
    Team(Team),
}

/// Reviewer reference sent when creating or updating an environment.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvReviewers {
    /// `User` or `Team`.
    #[serde(rename = "type", default)]
    pub reviewer_type: Option<String>,
    #[serde(default)]
    pub id: Option<u64>,
}

/// Which branches may deploy to an environment.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchPolicy {
    #[serde(default)]
    pub protected_branches: Option<bool>,
    #[serde(default)]
    pub custom_branch_policies: Option<bool>,
}

/// Body for creating or updating an environment.
///
/// Serializes `wait_timer` as `0` and `reviewers` as `[]` when unset, and
/// sends `can_admins_bypass` and `deployment_branch_policy` as `null` rather
/// than omitting them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreateUpdateEnvironment {
    #[serde(default)]
    pub wait_timer: Option<u32>,
    #[serde(default)]
    pub reviewers: Option<Vec<EnvReviewers>>,
    #[serde(default)]
    pub can_admins_bypass: Option<bool>,
    #[serde(default)]
    pub deployment_branch_policy: Option<BranchPolicy>,
    #[serde(default)]
    pub prevent_self_review: Option<bool>,
}

impl CreateUpdateEnvironment {
    /// Whether the payload asks for reviewers or a wait timer, which some
    /// plans do not support.
    pub fn requests_protection_rules(&self) -> bool {
        self.wait_timer.unwrap_or(0) != 0 || self.reviewers.as_ref().is_some_and(|r| !r.is_empty())
    }

    /// Reduced payload carrying only the branch policy.
    pub(crate) fn branch_policy_only(&self) -> BranchPolicyOnly<'_> {
        BranchPolicyOnly {
            deployment_branch_policy: self.deployment_branch_policy.as_ref(),
        }
    }
}

impl Serialize for CreateUpdateEnvironment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            wait_timer: u32,
            reviewers: &'a [EnvReviewers],
            can_admins_bypass: Option<bool>,
            deployment_branch_policy: Option<&'a BranchPolicy>,
            #[serde(skip_serializing_if = "Option::is_none")]
            prevent_self_review: Option<bool>,
        }

        Wire {
            wait_timer: self.wait_timer.unwrap_or(0),
            reviewers: self.reviewers.as_deref().unwrap_or_default(),
            can_admins_bypass: self.can_admins_bypass,
            deployment_branch_policy: self.deployment_branch_policy.as_ref(),
            prevent_self_review: self.prevent_self_review,
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct BranchPolicyOnly<'a> {
    deployment_branch_policy: Option<&'a BranchPolicy>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_reviewer_dispatches_on_type() {
        let rule: ProtectionRule = serde_json::from_value(json!({
            "id": 3755,
            "type": "required_reviewers",
            "reviewers": [
                {"type": "User", "reviewer": {"login": "octocat", "id": 1}},
                {"type": "Team", "reviewer": {"slug": "justice-league", "id": 1}}
            ]
        }))
        .unwrap();

        assert_eq!(rule.reviewers.len(), 2);
        match &rule.reviewers[0] {
            RequiredReviewer::User(user) => assert_eq!(user.login.as_deref(), Some("octocat")),
            other => panic!("expected user, got {other:?}"),
        }
        match &rule.reviewers[1] {
            RequiredReviewer::Team(team) => assert_eq!(team.slug.as_deref(), Some("justice-league")),
            other => panic!("expected team, got {other:?}"),
        }
    }

    #[test]
    fn test_required_reviewer_unknown_type() {
        let value = json!({"reviewers": [{"type": "Bot", "reviewer": {"id": 1}}]});
        let err = serde_path_to_error::deserialize::<_, ProtectionRule>(value).unwrap_err();
        assert!(err.path().to_string().starts_with("reviewers[0]"));
        assert!(err.to_string().contains("Bot"));
    }

    #[test]
    fn test_create_update_defaults() {
        let body = serde_json::to_value(CreateUpdateEnvironment::default()).unwrap();
        assert_eq!(
            body,
            json!({
                "wait_timer": 0,
                "reviewers": [],
                "can_admins_bypass": null,
                "deployment_branch_policy": null
            })
        );
    }

    #[test]
    fn test_create_update_full() {
        let env = CreateUpdateEnvironment {
            wait_timer: Some(30),
            reviewers: Some(vec![EnvReviewers {
                reviewer_type: Some("User".into()),
                id: Some(1),
            }]),
            can_admins_bypass: Some(false),
            deployment_branch_policy: Some(BranchPolicy {
                protected_branches: Some(true),
                custom_branch_policies: Some(false),
            }),
            prevent_self_review: Some(true),
        };
        assert!(env.requests_protection_rules());

        let body = serde_json::to_value(&env).unwrap();
        assert_eq!(body["wait_timer"], 30);
        assert_eq!(body["reviewers"][0]["type"], "User");
        assert_eq!(body["prevent_self_review"], true);
        assert_eq!(body["deployment_branch_policy"]["protected_branches"], true);
    }

    #[test]
    fn test_admin_bypass_alone_is_not_a_protection_rule() {
        let env = CreateUpdateEnvironment {
            wait_timer: Some(0),
            can_admins_bypass: Some(true),
            ..CreateUpdateEnvironment::default()
        };
        assert!(!env.requests_protection_rules());
    }

    #[test]
    fn test_branch_policy_only() {
        let env = CreateUpdateEnvironment {
            reviewers: Some(vec![]),
            deployment_branch_policy: Some(BranchPolicy {
                protected_branches: Some(false),
                custom_branch_policies: Some(true),
            }),
            ..CreateUpdateEnvironment::default()
        };
        assert!(!env.requests_protection_rules());

        let body = serde_json::to_value(env.branch_policy_only()).unwrap();
        assert_eq!(
            body,
            json!({"deployment_branch_policy": {"protected_branches": false, "custom_branch_policies": true}})
        );

        let body = serde_json::to_value(CreateUpdateEnvironment::default().branch_policy_only()).unwrap();
        assert_eq!(body, json!({"deployment_branch_policy": null}));
    }
}
