//! HTTP transport.
//!
//! The client talks to the network through the [`Transport`] trait so tests
//! and embedders can substitute their own. [`ReqwestTransport`] is the
//! default.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Result, TransportError};

/// Whether the transport should follow HTTP redirects itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectPolicy {
    /// Follow redirects transparently (ordinary endpoints).
    Follow,
    /// Return the first 3xx response as-is (download endpoints).
    Stop,
}

/// Delivers a request and returns the response with its body unread.
///
/// Timeouts and retries are the implementation's business; the client
/// imposes neither.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: reqwest::Request,
        redirects: RedirectPolicy,
    ) -> reqwest::Result<reqwest::Response>;
}

/// [`Transport`] backed by a pair of `reqwest` clients sharing one
/// configuration, one following redirects and one not.
///
/// Cheaply cloneable; clones share connection pools.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    follow: reqwest::Client,
    stop: reqwest::Client,
}

impl ReqwestTransport {
    /// Transport without a request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self> {
        Self::build(None)
    }

    /// Transport that aborts any exchange running longer than `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::build(Some(timeout))
    }

    /// Wrap existing clients. `stop` should be configured with
    /// `reqwest::redirect::Policy::none()`.
    pub fn from_clients(follow: reqwest::Client, stop: reqwest::Client) -> Self {
        Self { follow, stop }
    }

    fn build(timeout: Option<Duration>) -> Result<Self> {
        let builder = || {
            let builder = reqwest::Client::builder()
                .brotli(true)
                .gzip(true)
                .deflate(true);
            match timeout {
                Some(timeout) => builder.timeout(timeout),
                None => builder,
            }
        };

        let follow = builder().build().map_err(TransportError::Build)?;
        let stop = builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(TransportError::Build)?;

        Ok(Self { follow, stop })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: reqwest::Request,
        redirects: RedirectPolicy,
    ) -> reqwest::Result<reqwest::Response> {
        match redirects {
            RedirectPolicy::Follow => self.follow.execute(request).await,
            RedirectPolicy::Stop => self.stop.execute(request).await,
        }
    }
}
