//! Users and followers.
//!
//! An empty `user` argument addresses the authenticated user.

use reqwest::Method;
use tokio_util::sync::CancellationToken;

use crate::client::GitHubClient;
use crate::error::{parse_bool_response, Result};
use crate::models::{User, UserListOptions};
use crate::pagination::ListOptions;
use crate::query::add_options;
use crate::request::escape;
use crate::response::Response;

#[derive(Debug, Clone, Copy)]
pub struct UsersService<'c> {
    pub(crate) client: &'c GitHubClient,
}

impl UsersService<'_> {
    pub async fn get(&self, cancel: &CancellationToken, user: &str) -> Result<(User, Response)> {
        let request = self.client.request(Method::GET, &user_path(user)?)?;
        self.client.send(cancel, request).await
    }

    /// Every user, in signup order. Paginate with `since`, not `page`.
    pub async fn list_all(
        &self,
        cancel: &CancellationToken,
        options: Option<&UserListOptions>,
    ) -> Result<(Vec<User>, Response)> {
        let path = add_options("users", options)?;
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    pub async fn list_followers(
        &self,
        cancel: &CancellationToken,
        user: &str,
        options: Option<&ListOptions>,
    ) -> Result<(Vec<User>, Response)> {
        let path = add_options(&format!("{}/followers", user_path(user)?), options)?;
        let request = self.client.request(Method::GET, &path)?;
        self.client.send(cancel, request).await
    }

    /// Whether `user` follows `target`.
    pub async fn is_following(
        &self,
        cancel: &CancellationToken,
        user: &str,
        target: &str,
    ) -> Result<(bool, Response)> {
        let path = format!("{}/following/{}", user_path(user)?, escape(target)?);
        let request = self.client.request(Method::GET, &path)?;
        parse_bool_response(self.client.send_empty(cancel, request).await)
    }
}

fn user_path(user: &str) -> Result<String> {
    if user.is_empty() {
        Ok("user".to_string())
    } else {
        Ok(format!("users/{}", escape(user)?))
    }
}
