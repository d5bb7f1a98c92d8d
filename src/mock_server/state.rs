//! Mock server state management.
//!
//! Provides the in-memory data store for the mock GitHub API server.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{Environment, Repository, Secret, WorkflowJob};

/// Shared state for the mock server.
///
/// Repository-scoped data is keyed by `owner/repo`.
#[derive(Debug)]
pub struct MockState {
    /// Repositories indexed by full name.
    pub repositories: HashMap<String, Repository>,

    /// Actions secrets per repository, by secret name.
    pub secrets: HashMap<String, BTreeMap<String, Secret>>,

    /// Deployment environments per repository, by environment name.
    pub environments: HashMap<String, BTreeMap<String, Environment>>,

    /// Repositories with vulnerability alerts enabled.
    pub vulnerability_alerts: HashSet<String>,

    /// Workflow jobs indexed by run id.
    pub workflow_jobs: HashMap<u64, Vec<WorkflowJob>>,

    /// Numeric id of the repository public key, sent as a JSON number.
    pub public_key_id: u64,

    /// Base64 public key.
    pub public_key: String,

    /// Whether the plan accepts wait timers, reviewers and admin bypass on
    /// environments. When false those fields are rejected with a 422.
    pub protection_rules_supported: bool,

    /// Core quota advertised in `X-RateLimit-*` headers.
    pub rate_limit: u64,

    /// Requests left before the server starts answering 403.
    pub rate_remaining: u64,

    /// When the quota resets.
    pub rate_reset: DateTime<Utc>,

    /// Optional authentication token. If set, requests must carry it as a
    /// bearer token.
    pub required_token: Option<String>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            repositories: HashMap::new(),
            secrets: HashMap::new(),
            environments: HashMap::new(),
            vulnerability_alerts: HashSet::new(),
            workflow_jobs: HashMap::new(),
            public_key_id: 568250167242549743,
            public_key: "2Sg8iYjAxxmI2LvUXpJjkYrMxURPc8r+dB7TJyvv1234".to_string(),
            protection_rules_supported: true,
            rate_limit: 5000,
            rate_remaining: 5000,
            rate_reset: Utc::now() + chrono::Duration::hours(1),
            required_token: None,
        }
    }
}

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Add a repository. Its `full_name` must be set.
    pub fn with_repository(mut self, repository: Repository) -> Self {
        if let Some(full_name) = repository.full_name.clone() {
            self.repositories.insert(full_name, repository);
        }
        self
    }

    /// Add a secret to a repository.
    pub fn with_secret(mut self, full_name: &str, secret: Secret) -> Self {
        self.secrets
            .entry(full_name.to_string())
            .or_default()
            .insert(secret.name.clone(), secret);
        self
    }

    /// Add an environment to a repository. Its `name` must be set.
    pub fn with_environment(mut self, full_name: &str, environment: Environment) -> Self {
        if let Some(name) = environment.name.clone() {
            self.environments
                .entry(full_name.to_string())
                .or_default()
                .insert(name, environment);
        }
        self
    }

    /// Add the jobs of a workflow run.
    pub fn with_workflow_jobs(mut self, run_id: u64, jobs: Vec<WorkflowJob>) -> Self {
        self.workflow_jobs.insert(run_id, jobs);
        self
    }

    /// Simulate a plan without environment protection rules.
    pub fn without_protection_rules(mut self) -> Self {
        self.protection_rules_supported = false;
        self
    }

    /// Set the remaining core quota.
    pub fn with_rate_remaining(mut self, remaining: u64) -> Self {
        self.rate_remaining = remaining;
        self
    }

    /// Set the required authentication token.
    pub fn with_required_token(mut self, token: &str) -> Self {
        self.required_token = Some(token.to_string());
        self
    }

    /// Get a repository by owner and name.
    pub fn get_repository(&self, owner: &str, repo: &str) -> Option<&Repository> {
        self.repositories.get(&full_name(owner, repo))
    }

    /// Remove a repository and everything attached to it.
    pub fn delete_repository(&mut self, owner: &str, repo: &str) -> Option<Repository> {
        let key = full_name(owner, repo);
        self.secrets.remove(&key);
        self.environments.remove(&key);
        self.vulnerability_alerts.remove(&key);
        self.repositories.remove(&key)
    }

    /// Apply the fields set in `changes` to a repository.
    pub fn edit_repository(
        &mut self,
        owner: &str,
        repo: &str,
        changes: Repository,
    ) -> Option<&Repository> {
        let repository = self.repositories.get_mut(&full_name(owner, repo))?;
        if let Some(description) = changes.description {
            repository.description = Some(description);
        }
        if let Some(homepage) = changes.homepage {
            repository.homepage = Some(homepage);
        }
        if let Some(archived) = changes.archived {
            repository.archived = Some(archived);
        }
        if let Some(private) = changes.private {
            repository.private = Some(private);
        }
        if let Some(default_branch) = changes.default_branch {
            repository.default_branch = Some(default_branch);
        }
        Some(repository)
    }

    /// Count one request against the quota. Returns false once exhausted.
    pub fn consume_rate(&mut self) -> bool {
        if self.rate_remaining == 0 {
            return false;
        }
        self.rate_remaining -= 1;
        true
    }
}

/// `owner/repo` key for repository-scoped maps.
pub fn full_name(owner: &str, repo: &str) -> String {
    format!("{owner}/{repo}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_repository(full: &str) -> Repository {
        let (_, name) = full.split_once('/').unwrap();
        Repository {
            id: Some(1),
            name: Some(name.to_string()),
            full_name: Some(full.to_string()),
            ..Repository::default()
        }
    }

    #[test]
    fn test_state_add_and_get_repository() {
        let state = MockState::new().with_repository(sample_repository("octo/hello"));

        let repo = state.get_repository("octo", "hello");
        assert!(repo.is_some());
        assert_eq!(repo.unwrap().name.as_deref(), Some("hello"));
        assert!(state.get_repository("octo", "missing").is_none());
    }

    #[test]
    fn test_delete_repository_cascades() {
        let mut state = MockState::new()
            .with_repository(sample_repository("octo/hello"))
            .with_secret(
                "octo/hello",
                Secret {
                    name: "TOKEN".into(),
                    ..Secret::default()
                },
            );
        state.vulnerability_alerts.insert("octo/hello".into());

        assert!(state.delete_repository("octo", "hello").is_some());
        assert!(state.secrets.is_empty());
        assert!(state.vulnerability_alerts.is_empty());
        assert!(state.delete_repository("octo", "hello").is_none());
    }

    #[test]
    fn test_edit_repository_is_sparse() {
        let mut state = MockState::new().with_repository(sample_repository("octo/hello"));
        let edited = state
            .edit_repository(
                "octo",
                "hello",
                Repository {
                    description: Some("updated".into()),
                    ..Repository::default()
                },
            )
            .unwrap();

        assert_eq!(edited.description.as_deref(), Some("updated"));
        assert_eq!(edited.name.as_deref(), Some("hello"));
    }

    #[test]
    fn test_consume_rate() {
        let mut state = MockState::new().with_rate_remaining(1);
        assert!(state.consume_rate());
        assert!(!state.consume_rate());
        assert_eq!(state.rate_remaining, 0);
    }
}
