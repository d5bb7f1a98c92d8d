//! Test data fixtures for the mock server.
//!
//! Provides factory functions for creating realistic test data.

use chrono::{TimeZone, Utc};

use crate::{
    BranchPolicy, Environment, ProtectionRule, Repository, Secret, TaskStep, User, WorkflowJob,
};

/// Collection of fixture factories for test data.
pub struct Fixtures;

impl Fixtures {
    // =========================================================================
    // Repository Fixtures
    // =========================================================================

    /// Create a minimal repository with identity fields only.
    pub fn minimal_repository(id: u64, owner: &str, name: &str) -> Repository {
        Repository {
            id: Some(id),
            owner: Some(User {
                login: Some(owner.to_string()),
                account_type: Some("User".to_string()),
                ..User::default()
            }),
            name: Some(name.to_string()),
            full_name: Some(format!("{owner}/{name}")),
            private: Some(false),
            ..Repository::default()
        }
    }

    /// Create a repository with the fields a real listing carries.
    pub fn public_repository(id: u64, owner: &str, name: &str, description: &str) -> Repository {
        let mut repository = Self::minimal_repository(id, owner, name);
        repository.description = Some(description.to_string());
        repository.default_branch = Some("main".to_string());
        repository.visibility = Some("public".to_string());
        repository.html_url = Some(format!("https://github.com/{owner}/{name}"));
        repository.archived = Some(false);
        repository.topics = Some(vec!["octocat".to_string(), "api".to_string()]);
        repository.created_at = Utc.with_ymd_and_hms(2011, 1, 26, 19, 1, 12).single();
        repository
    }

    // =========================================================================
    // Secret Fixtures
    // =========================================================================

    /// Create a repository secret.
    pub fn secret(name: &str) -> Secret {
        Secret {
            name: name.to_string(),
            created_at: Utc.with_ymd_and_hms(2019, 8, 10, 14, 59, 22).single(),
            updated_at: Utc.with_ymd_and_hms(2020, 1, 10, 14, 59, 22).single(),
            ..Secret::default()
        }
    }

    // =========================================================================
    // Environment Fixtures
    // =========================================================================

    /// Create an environment without protection rules.
    pub fn environment(id: u64, name: &str) -> Environment {
        Environment {
            id: Some(id),
            name: Some(name.to_string()),
            can_admins_bypass: Some(true),
            ..Environment::default()
        }
    }

    /// Create an environment guarded by a wait timer and protected branches.
    pub fn protected_environment(id: u64, name: &str, wait_timer: u32) -> Environment {
        let mut environment = Self::environment(id, name);
        environment.protection_rules = vec![ProtectionRule {
            id: Some(id * 10),
            rule_type: Some("wait_timer".to_string()),
            wait_timer: Some(wait_timer),
            ..ProtectionRule::default()
        }];
        environment.deployment_branch_policy = Some(BranchPolicy {
            protected_branches: Some(true),
            custom_branch_policies: Some(false),
        });
        environment
    }

    // =========================================================================
    // Workflow Fixtures
    // =========================================================================

    /// Create a completed job of a workflow run.
    pub fn workflow_job(id: u64, run_id: u64, name: &str) -> WorkflowJob {
        WorkflowJob {
            id: Some(id),
            run_id: Some(run_id),
            name: Some(name.to_string()),
            status: Some("completed".to_string()),
            conclusion: Some("success".to_string()),
            head_branch: Some("main".to_string()),
            steps: vec![TaskStep {
                name: Some("Set up job".to_string()),
                status: Some("completed".to_string()),
                conclusion: Some("success".to_string()),
                number: Some(1),
                ..TaskStep::default()
            }],
            ..WorkflowJob::default()
        }
    }

    /// Create the default test scenario.
    ///
    /// Contains one repository with a secret, two environments and a
    /// workflow run of three jobs.
    pub fn default_scenario() -> DefaultScenario {
        DefaultScenario {
            repositories: vec![
                Self::public_repository(1296269, "octocat", "Hello-World", "My first repo"),
                Self::minimal_repository(1300192, "octocat", "Spoon-Knife"),
            ],
            secrets: vec![
                ("octocat/Hello-World".to_string(), Self::secret("GH_TOKEN")),
                ("octocat/Hello-World".to_string(), Self::secret("NPM_TOKEN")),
            ],
            environments: vec![
                (
                    "octocat/Hello-World".to_string(),
                    Self::environment(161088068, "staging"),
                ),
                (
                    "octocat/Hello-World".to_string(),
                    Self::protected_environment(161088069, "production", 30),
                ),
            ],
            workflow_runs: vec![(
                29679449,
                vec![
                    Self::workflow_job(399444496, 29679449, "build"),
                    Self::workflow_job(399444497, 29679449, "test"),
                    Self::workflow_job(399444498, 29679449, "deploy"),
                ],
            )],
            vulnerability_alerts: vec!["octocat/Hello-World".to_string()],
        }
    }
}

/// A complete test scenario with related data.
#[derive(Debug)]
pub struct DefaultScenario {
    pub repositories: Vec<Repository>,
    /// `(owner/repo, secret)` pairs.
    pub secrets: Vec<(String, Secret)>,
    /// `(owner/repo, environment)` pairs.
    pub environments: Vec<(String, Environment)>,
    /// `(run id, jobs)` pairs.
    pub workflow_runs: Vec<(u64, Vec<WorkflowJob>)>,
    pub vulnerability_alerts: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_repository_fixture() {
        let repo = Fixtures::public_repository(1, "octo", "hello", "desc");
        assert_eq!(repo.full_name.as_deref(), Some("octo/hello"));
        assert_eq!(repo.owner.unwrap().login.as_deref(), Some("octo"));
        assert_eq!(repo.default_branch.as_deref(), Some("main"));
    }

    #[test]
    fn test_protected_environment_fixture() {
        let env = Fixtures::protected_environment(7, "production", 30);
        assert_eq!(env.protection_rules.len(), 1);
        assert_eq!(env.protection_rules[0].wait_timer, Some(30));
    }

    #[test]
    fn test_default_scenario_is_consistent() {
        let scenario = Fixtures::default_scenario();
        for (full_name, _) in &scenario.secrets {
            assert!(scenario
                .repositories
                .iter()
                .any(|r| r.full_name.as_deref() == Some(full_name.as_str())));
        }
        assert_eq!(scenario.workflow_runs[0].1.len(), 3);
    }
}
