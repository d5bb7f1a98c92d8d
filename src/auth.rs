//! Authentication hooks.
//!
//! The client never interprets credentials. It hands every outgoing header
//! map to an [`Authenticate`] implementation, which may add whatever headers
//! it needs (bearer token, installation token, basic auth) or nothing at all.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Result;

/// Mutates the headers of an outgoing request to authenticate it.
///
/// Implemented for any `Fn(&mut HeaderMap)` closure, so ad-hoc schemes do
/// not need a named type:
///
/// ```
/// use ghrest::GitHubClient;
/// use reqwest::header::{HeaderMap, HeaderValue};
///
/// # fn example() -> ghrest::Result<()> {
/// let client = GitHubClient::builder()
///     .auth(|headers: &mut HeaderMap| {
///         headers.insert("authorization", HeaderValue::from_static("token abc"));
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub trait Authenticate: Send + Sync {
    fn authenticate(&self, headers: &mut HeaderMap);
}

impl<F> Authenticate for F
where
    F: Fn(&mut HeaderMap) + Send + Sync,
{
    fn authenticate(&self, headers: &mut HeaderMap) {
        self(headers);
    }
}

/// No authentication; requests are sent anonymously.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl Authenticate for Anonymous {
    fn authenticate(&self, _headers: &mut HeaderMap) {}
}

/// Bearer-token authentication.
#[derive(Clone)]
pub struct TokenAuth {
    header: HeaderValue,
}

impl TokenAuth {
    /// Build the `Authorization` header for `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token contains characters that are not valid
    /// in a header value.
    pub fn new(token: &SecretString) -> Result<Self> {
        let mut header = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
        header.set_sensitive(true);
        Ok(Self { header })
    }
}

impl std::fmt::Debug for TokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuth").finish_non_exhaustive()
    }
}

impl Authenticate for TokenAuth {
    fn authenticate(&self, headers: &mut HeaderMap) {
        headers.insert(AUTHORIZATION, self.header.clone());
    }
}
