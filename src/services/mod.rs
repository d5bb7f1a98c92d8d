//! Per-area endpoint groups.
//!
//! Each service is a borrowed view of a [`GitHubClient`]; obtain one with
//! the matching accessor, e.g. `client.repositories()`. Services hold no
//! state of their own, so creating one per call is free.

mod actions;
mod activity;
mod dependabot;
mod organizations;
mod pulls;
mod rate_limit;
mod repositories;
mod users;

pub use actions::ActionsService;
pub use activity::ActivityService;
pub use dependabot::DependabotService;
pub use organizations::OrganizationsService;
pub use pulls::PullRequestsService;
pub use rate_limit::RateLimitService;
pub use repositories::RepositoriesService;
pub use users::UsersService;

use crate::client::GitHubClient;

impl GitHubClient {
    /// Workflow jobs, logs and Actions secrets.
    pub fn actions(&self) -> ActionsService<'_> {
        ActionsService { client: self }
    }

    /// Stars.
    pub fn activity(&self) -> ActivityService<'_> {
        ActivityService { client: self }
    }

    /// Dependabot secrets.
    pub fn dependabot(&self) -> DependabotService<'_> {
        DependabotService { client: self }
    }

    pub fn organizations(&self) -> OrganizationsService<'_> {
        OrganizationsService { client: self }
    }

    pub fn pull_requests(&self) -> PullRequestsService<'_> {
        PullRequestsService { client: self }
    }

    pub fn rate_limit(&self) -> RateLimitService<'_> {
        RateLimitService { client: self }
    }

    /// Repositories, branches, environments, topics and custom properties.
    pub fn repositories(&self) -> RepositoriesService<'_> {
        RepositoriesService { client: self }
    }

    pub fn users(&self) -> UsersService<'_> {
        UsersService { client: self }
    }
}

/// `repos/{owner}/{repo}` with both segments escaped.
pub(crate) fn repo_path(owner: &str, repo: &str) -> crate::error::Result<String> {
    use crate::request::escape;
    Ok(format!("repos/{}/{}", escape(owner)?, escape(repo)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_path_escapes_segments() {
        assert_eq!(repo_path("octo", "hello").unwrap(), "repos/octo/hello");
        assert_eq!(repo_path("o/x", "a b").unwrap(), "repos/o%2Fx/a%20b");
        assert!(repo_path("octo", "..").is_err());
        assert!(repo_path("", "hello").is_err());
    }

    #[test]
    fn test_services_borrow_client() {
        let client = GitHubClient::new().unwrap();
        let repos = client.repositories();
        let actions = client.actions();
        assert!(std::ptr::eq(repos.client, actions.client));
    }
}
