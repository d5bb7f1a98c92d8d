//! GitHub API client.
//!
//! Low-level HTTP client that handles configuration, request construction
//! and dispatch. Endpoint operations live on the service facades returned by
//! [`GitHubClient::actions`], [`GitHubClient::repositories`] and friends.

use std::env;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::auth::{Anonymous, Authenticate, TokenAuth};
use crate::error::{check_response, Error, Result, TransportError};
use crate::request::{
    encode_body, Request, DEFAULT_API_VERSION, DEFAULT_BASE_URL, HEADER_API_VERSION,
    MEDIA_TYPE_V3,
};
use crate::response::{sanitize_url, Response};
use crate::transport::{RedirectPolicy, ReqwestTransport, Transport};

const DEFAULT_USER_AGENT: &str = concat!("ghrest/", env!("CARGO_PKG_VERSION"));
const ENTERPRISE_API_PATH: &str = "api/v3/";

/// Low-level GitHub API client.
///
/// Owns the base URL, transport, authentication hook and feature flags.
/// Endpoint operations are grouped into service facades that borrow the
/// client, so a facade can never outlive it.
///
/// This struct is cheaply cloneable; clones share the underlying transport
/// and its connection pool, and may be used from many tasks at once.
///
/// # Example
///
/// ```no_run
/// use ghrest::GitHubClient;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> ghrest::Result<()> {
/// // Authenticate from GITHUB_TOKEN
/// let client = GitHubClient::from_env()?;
///
/// let cancel = CancellationToken::new();
/// let (repo, response) = client.repositories().get(&cancel, "rust-lang", "rust").await?;
/// println!("{} ({} requests left)", repo.full_name.unwrap_or_default(), response.rate.remaining);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn Transport>,
    base_url: Arc<Url>,
    auth: Arc<dyn Authenticate>,
    user_agent: Option<HeaderValue>,
    api_version: HeaderValue,
    rate_limit_redirectional_endpoints: bool,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url.as_str())
            .field("user_agent", &self.user_agent)
            .field(
                "rate_limit_redirectional_endpoints",
                &self.rate_limit_redirectional_endpoints,
            )
            .finish_non_exhaustive()
    }
}

/// Configures and builds a [`GitHubClient`].
#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    user_agent: Option<String>,
    auth: Option<Arc<dyn Authenticate>>,
    token: Option<SecretString>,
    transport: Option<Arc<dyn Transport>>,
    api_version: Option<String>,
    rate_limit_redirectional_endpoints: bool,
}

impl ClientBuilder {
    /// API root. Defaults to `https://api.github.com/`; a trailing `/` is
    /// added if missing.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// `User-Agent` header value. An empty string sends no agent at all.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Authenticate with a bearer token. Replaces any hook set via
    /// [`ClientBuilder::auth`].
    #[must_use]
    pub fn token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self.auth = None;
        self
    }

    /// Custom authentication hook. Replaces any token set via
    /// [`ClientBuilder::token`].
    #[must_use]
    pub fn auth(mut self, auth: impl Authenticate + 'static) -> Self {
        self.auth = Some(Arc::new(auth));
        self.token = None;
        self
    }

    /// Custom transport, e.g. a [`ReqwestTransport`] with a timeout.
    #[must_use]
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Value of the `X-GitHub-Api-Version` header.
    #[must_use]
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Send download-redirect requests through the rate-limited pipeline.
    #[must_use]
    pub fn rate_limit_redirectional_endpoints(mut self, enabled: bool) -> Self {
        self.rate_limit_redirectional_endpoints = enabled;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute http(s) URL, a
    /// header value is invalid, or the default transport cannot be created.
    pub fn build(self) -> Result<GitHubClient> {
        let base_url = normalize_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

        let user_agent = match self.user_agent.as_deref() {
            None => Some(HeaderValue::from_static(DEFAULT_USER_AGENT)),
            Some("") => None,
            Some(agent) => Some(HeaderValue::from_str(agent)?),
        };

        let api_version = HeaderValue::from_str(
            self.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION),
        )?;

        let auth: Arc<dyn Authenticate> = match (self.auth, self.token) {
            (Some(auth), _) => auth,
            (None, Some(token)) => Arc::new(TokenAuth::new(&token)?),
            (None, None) => Arc::new(Anonymous),
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        Ok(GitHubClient {
            transport,
            base_url: Arc::new(base_url),
            auth,
            user_agent,
            api_version,
            rate_limit_redirectional_endpoints: self.rate_limit_redirectional_endpoints,
        })
    }
}

impl GitHubClient {
    /// Anonymous client against the public API.
    ///
    /// # Errors
    ///
    /// Returns an error if the default transport cannot be created.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Start configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client from environment variables.
    ///
    /// Uses `GITHUB_TOKEN` for authentication and optionally `GITHUB_API_URL`
    /// for the base URL (defaults to `https://api.github.com/`).
    ///
    /// # Errors
    ///
    /// Returns an error if `GITHUB_TOKEN` is not set.
    pub fn from_env() -> Result<Self> {
        let token = env::var("GITHUB_TOKEN").map_err(|_| {
            Error::ConfigMissing("GITHUB_TOKEN environment variable not set".to_string())
        })?;

        let base_url = env::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Self::builder()
            .base_url(base_url)
            .token(SecretString::from(token))
            .build()
    }

    /// A copy of this client authenticating with `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value.
    pub fn with_auth_token(&self, token: &SecretString) -> Result<Self> {
        let mut client = self.clone();
        client.auth = Arc::new(TokenAuth::new(token)?);
        Ok(client)
    }

    /// A copy of this client aimed at a GitHub Enterprise Server installation.
    ///
    /// `api/v3/` is appended to the path unless the URL already ends with it
    /// or the host is itself an API host (`api.example.com`,
    /// `github.api.example.com`).
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute http(s) URL.
    pub fn with_enterprise_url(&self, base_url: &str) -> Result<Self> {
        let mut url = normalize_base_url(base_url)?;
        let host = url.host_str().unwrap_or_default();
        let is_api_host = host.starts_with("api.") || host.contains(".api.");

        if !url.path().ends_with("/api/v3/") && !is_api_host {
            let path = format!("{}{ENTERPRISE_API_PATH}", url.path());
            url.set_path(&path);
        }

        let mut client = self.clone();
        client.base_url = Arc::new(url);
        Ok(client)
    }

    /// Toggle rate-limit accounting for download-redirect endpoints.
    ///
    /// Takes `&mut self`, so the flag cannot change under requests already
    /// running on this value; clones made earlier keep their own setting.
    pub fn set_rate_limit_redirectional_endpoints(&mut self, enabled: bool) {
        self.rate_limit_redirectional_endpoints = enabled;
    }

    pub fn rate_limit_redirectional_endpoints(&self) -> bool {
        self.rate_limit_redirectional_endpoints
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a relative endpoint path against the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if the path begins with `/`, carries
    /// its own scheme, or resolves outside of the base URL.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        let invalid = |reason| Error::InvalidPath {
            path: path.to_string(),
            reason,
        };

        if path.starts_with('/') {
            return Err(invalid("relative paths must not begin with '/'"));
        }
        if Url::parse(path).is_ok() {
            return Err(invalid("expected a relative path, found an absolute URL"));
        }

        let url = self.base_url.join(path)?;
        if url.origin() != self.base_url.origin() || !url.path().starts_with(self.base_url.path())
        {
            return Err(invalid("path resolves outside of the base URL"));
        }
        Ok(url)
    }

    /// Build a request without a body.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be resolved.
    pub fn request(&self, method: Method, path: &str) -> Result<Request> {
        let url = self.resolve(path)?;
        Ok(self.prepare(method, url, None))
    }

    /// Build a request carrying `body` as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be resolved or the body cannot be
    /// serialized.
    pub fn request_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Request> {
        let url = self.resolve(path)?;
        let body = encode_body(body)?;
        Ok(self.prepare(method, url, Some(body)))
    }

    fn prepare(&self, method: Method, url: Url, body: Option<Bytes>) -> Request {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE_V3));
        headers.insert(HEADER_API_VERSION, self.api_version.clone());
        if let Some(agent) = &self.user_agent {
            headers.insert(USER_AGENT, agent.clone());
        }
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        self.auth.authenticate(&mut headers);

        Request::new(method, url, headers, body)
    }

    /// Send a request and return the raw exchange without classifying the
    /// status.
    pub(crate) async fn round_trip(
        &self,
        cancel: &CancellationToken,
        request: Request,
        redirects: RedirectPolicy,
    ) -> Result<(Bytes, Response)> {
        let method = request.method().clone();
        debug!(%method, url = %sanitize_url(request.url()), ?redirects, "sending request");

        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(TransportError::Cancelled.into()),
            sent = self.transport.send(request.into_reqwest(), redirects) => sent,
        };
        let raw = sent.map_err(TransportError::Request)?;

        let response = Response::new(
            method,
            raw.url().clone(),
            raw.status(),
            raw.headers().clone(),
        );

        let body = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(TransportError::Cancelled.into()),
            body = raw.bytes() => body.map_err(TransportError::Body)?,
        };

        debug!(
            status = response.status().as_u16(),
            remaining = response.rate.remaining,
            bytes = body.len(),
            "received response"
        );
        Ok((body, response))
    }

    /// Send a request and return the body unparsed.
    ///
    /// # Errors
    ///
    /// Returns a transport error, or the classified error for any status
    /// other than a non-202 2xx.
    #[tracing::instrument(skip(self, cancel, request), fields(method = %request.method(), path = %request.url().path()))]
    pub async fn bare_do(
        &self,
        cancel: &CancellationToken,
        request: Request,
    ) -> Result<(Bytes, Response)> {
        let (body, response) = self
            .round_trip(cancel, request, RedirectPolicy::Follow)
            .await?;
        check_response(body, response)
    }

    /// Send a request and decode the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// As [`GitHubClient::bare_do`], plus [`Error::Decode`] naming the first
    /// offending field when the body does not match `T`.
    pub async fn send<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        request: Request,
    ) -> Result<(T, Response)> {
        let (body, response) = self.bare_do(cancel, request).await?;
        decode_body(&body, response)
    }

    /// Send a request and discard the body.
    ///
    /// # Errors
    ///
    /// As [`GitHubClient::bare_do`].
    pub async fn send_empty(
        &self,
        cancel: &CancellationToken,
        request: Request,
    ) -> Result<Response> {
        let (_, response) = self.bare_do(cancel, request).await?;
        Ok(response)
    }

    /// Send a request and copy the body verbatim into `sink`.
    ///
    /// # Errors
    ///
    /// As [`GitHubClient::bare_do`], plus [`Error::Io`] if writing fails.
    pub async fn send_to_writer<W>(
        &self,
        cancel: &CancellationToken,
        request: Request,
        sink: &mut W,
    ) -> Result<Response>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let (body, response) = self.bare_do(cancel, request).await?;
        sink.write_all(&body).await?;
        sink.flush().await?;
        Ok(response)
    }
}

fn normalize_base_url(base_url: &str) -> Result<Url> {
    let invalid = |reason| Error::InvalidBaseUrl {
        url: base_url.to_string(),
        reason,
    };

    // Ensure base URL ends with /
    let base_url_str = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    };

    let url = Url::parse(&base_url_str)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("URL has no host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("URL must not carry a query or fragment"));
    }
    Ok(url)
}

/// Decode a response body, naming the offending field on failure.
///
/// An empty body decodes as JSON `null`, which succeeds for `Option<T>`,
/// `()` and `serde_json::Value`.
pub(crate) fn decode_body<T: DeserializeOwned>(body: &[u8], response: Response) -> Result<(T, Response)> {
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        body
    };

    let mut deserializer = serde_json::Deserializer::from_slice(body);
    match serde_path_to_error::deserialize(&mut deserializer) {
        Ok(value) => Ok((value, response)),
        Err(err) => Err(Error::Decode {
            path: err.path().to_string(),
            source: err.into_inner(),
            response: Box::new(response),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::AUTHORIZATION;
    use reqwest::StatusCode;
    use serde::Deserialize;

    fn client() -> GitHubClient {
        GitHubClient::builder()
            .token(SecretString::from("test-token".to_string()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_client_debug() {
        let debug = format!("{:?}", client());
        assert!(debug.contains("GitHubClient"));
        assert!(debug.contains("base_url"));
        // Token should not be in debug output
        assert!(!debug.contains("test-token"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client1 = GitHubClient::builder().base_url("https://ghe.local/api/v3").build().unwrap();
        let client2 = GitHubClient::builder().base_url("https://ghe.local/api/v3/").build().unwrap();
        assert_eq!(client1.base_url().as_str(), client2.base_url().as_str());
        assert_eq!(client1.base_url().as_str(), "https://ghe.local/api/v3/");
    }

    #[test]
    fn test_invalid_base_urls() {
        for bad in ["ftp://example.com/", "mailto:x@example.com", "not a url"] {
            assert!(
                GitHubClient::builder().base_url(bad).build().is_err(),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_resolve_rejects_bad_paths() {
        let client = client();
        assert!(matches!(client.resolve("/user"), Err(Error::InvalidPath { .. })));
        assert!(matches!(
            client.resolve("https://evil.example.com/x"),
            Err(Error::InvalidPath { .. })
        ));

        let enterprise = client.with_enterprise_url("https://ghe.local/").unwrap();
        assert!(matches!(
            enterprise.resolve("../../outside"),
            Err(Error::InvalidPath { .. })
        ));
        assert_eq!(
            enterprise.resolve("repos/o/r").unwrap().as_str(),
            "https://ghe.local/api/v3/repos/o/r"
        );
    }

    #[test]
    fn test_enterprise_url_normalisation() {
        let client = client();
        let cases = [
            ("https://ghe.local", "https://ghe.local/api/v3/"),
            ("https://ghe.local/api/v3", "https://ghe.local/api/v3/"),
            ("https://api.ghe.local/", "https://api.ghe.local/"),
            ("https://github.api.ghe.local/", "https://github.api.ghe.local/"),
            ("https://ghe.local/prefix/", "https://ghe.local/prefix/api/v3/"),
        ];
        for (input, expected) in cases {
            let configured = client.with_enterprise_url(input).unwrap();
            assert_eq!(configured.base_url().as_str(), expected, "input {input}");
        }
        // The original keeps its base URL.
        assert_eq!(client.base_url().as_str(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_request_headers() {
        let request = client().request(Method::GET, "user").unwrap();
        let headers = request.headers();

        assert_eq!(request.url().as_str(), "https://api.github.com/user");
        assert_eq!(headers.get(ACCEPT).unwrap(), MEDIA_TYPE_V3);
        assert_eq!(headers.get("x-github-api-version").unwrap(), DEFAULT_API_VERSION);
        assert_eq!(headers.get(USER_AGENT).unwrap(), DEFAULT_USER_AGENT);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer test-token");
        assert!(headers.get(CONTENT_TYPE).is_none());
        assert!(request.body().is_none());
    }

    #[test]
    fn test_request_json_body() {
        let request = client()
            .request_json(Method::POST, "user/repos", &serde_json::json!({"name": "x"}))
            .unwrap();
        assert_eq!(request.headers().get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(request.body().unwrap(), b"{\"name\":\"x\"}\n");
    }

    #[test]
    fn test_anonymous_and_agentless() {
        let client = GitHubClient::builder().user_agent("").build().unwrap();
        let request = client.request(Method::GET, "zen").unwrap();
        assert!(request.headers().get(USER_AGENT).is_none());
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_with_auth_token_copies() {
        let anonymous = GitHubClient::new().unwrap();
        let authed = anonymous
            .with_auth_token(&SecretString::from("other".to_string()))
            .unwrap();

        let request = authed.request(Method::GET, "user").unwrap();
        assert_eq!(request.headers().get(AUTHORIZATION).unwrap(), "Bearer other");
        let request = anonymous.request(Method::GET, "user").unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_redirect_flag() {
        let mut client = client();
        assert!(!client.rate_limit_redirectional_endpoints());
        client.set_rate_limit_redirectional_endpoints(true);
        assert!(client.rate_limit_redirectional_endpoints());
    }

    // Only test that touches these variables.
    #[test]
    fn test_from_env_requires_token() {
        env::set_var("GITHUB_API_URL", "https://ghe.local/api/v3");
        env::remove_var("GITHUB_TOKEN");
        let err = GitHubClient::from_env().unwrap_err();
        assert!(matches!(err, Error::ConfigMissing(_)), "{err:?}");

        env::set_var("GITHUB_TOKEN", "from-env");
        let client = GitHubClient::from_env().unwrap();
        env::remove_var("GITHUB_TOKEN");
        env::remove_var("GITHUB_API_URL");

        assert_eq!(client.base_url().as_str(), "https://ghe.local/api/v3/");
        let request = client.request(Method::GET, "user").unwrap();
        assert_eq!(request.headers().get(AUTHORIZATION).unwrap(), "Bearer from-env");
    }

    #[derive(Debug, Deserialize)]
    struct Jobs {
        #[allow(dead_code)]
        total_count: u64,
        jobs: Vec<Job>,
    }

    #[derive(Debug, Deserialize)]
    struct Job {
        id: u64,
    }

    fn ok_response() -> Response {
        Response::new(
            Method::GET,
            Url::parse("https://api.github.com/x").unwrap(),
            StatusCode::OK,
            HeaderMap::new(),
        )
    }

    #[test]
    fn test_decode_names_offending_field() {
        let err = decode_body::<Jobs>(br#"{"total_count":1,"jobs":[{"id":"nine"}]}"#, ok_response())
            .unwrap_err();
        match err {
            Error::Decode { path, response, .. } => {
                assert_eq!(path, "jobs[0].id");
                assert_eq!(response.status(), StatusCode::OK);
            }
            other => panic!("expected Decode, got {other:?}"),
        }

        let (jobs, _) = decode_body::<Jobs>(br#"{"total_count":1,"jobs":[{"id":9}]}"#, ok_response()).unwrap();
        assert_eq!(jobs.jobs[0].id, 9);
    }

    #[test]
    fn test_decode_empty_body() {
        let (value, _) = decode_body::<Option<Job>>(b"", ok_response()).unwrap();
        assert!(value.is_none());
        assert!(decode_body::<Job>(b"  ", ok_response()).is_err());
    }
}
