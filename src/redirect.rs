//! Download-redirect resolution.
//!
//! Log and archive endpoints answer with a 302 whose `Location` names a
//! short-lived signed URL. The resolver returns that URL instead of fetching
//! it. Permanent redirects (301, e.g. after a repository rename) are followed
//! up to a caller-supplied number of hops first.

use bytes::Bytes;
use reqwest::{Method, StatusCode};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::GitHubClient;
use crate::error::{check_response, Error, Result};
use crate::request::Request;
use crate::response::{Response, HEADER_LOCATION};
use crate::transport::RedirectPolicy;

impl GitHubClient {
    /// Resolve the download URL behind a redirecting endpoint.
    ///
    /// With rate-limit accounting off (the default) the exchange bypasses
    /// status classification: anything but 301 or 302 is
    /// [`Error::UnexpectedStatus`]. With accounting on, responses go through
    /// the normal error mapping, so rate-limit errors surface as such.
    ///
    /// `max_redirects` bounds the number of 301 hops; 0 means the first
    /// response must be the 302.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TooManyRedirects`] when 301 hops run out,
    /// [`Error::InvalidLocation`] when a redirect has no usable `Location`,
    /// and [`Error::UnexpectedStatus`] for any other status.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn resolve_download_url(
        &self,
        cancel: &CancellationToken,
        path: &str,
        max_redirects: u32,
    ) -> Result<(Url, Response)> {
        let request = self.request(Method::GET, path)?;
        if self.rate_limit_redirectional_endpoints() {
            self.follow_until_found(cancel, request, max_redirects).await
        } else {
            self.round_trip_until_found(cancel, request, max_redirects)
                .await
        }
    }

    async fn round_trip_until_found(
        &self,
        cancel: &CancellationToken,
        mut request: Request,
        max_redirects: u32,
    ) -> Result<(Url, Response)> {
        let mut remaining = max_redirects;
        loop {
            let (_, response) = self
                .round_trip(cancel, request.clone(), RedirectPolicy::Stop)
                .await?;

            let status = response.status();
            if status != StatusCode::MOVED_PERMANENTLY && status != StatusCode::FOUND {
                return Err(Error::UnexpectedStatus {
                    status,
                    response: Box::new(response),
                });
            }

            let Some(location) = self.location(response.header(HEADER_LOCATION)) else {
                return Err(Error::InvalidLocation {
                    response: Box::new(response),
                });
            };

            if status == StatusCode::FOUND {
                return Ok((location, response));
            }
            if remaining == 0 {
                return Err(Error::TooManyRedirects {
                    max_redirects,
                    response: Box::new(response),
                });
            }
            remaining -= 1;
            tracing::debug!(%location, remaining, "following permanent redirect");
            request = request.with_url(location);
        }
    }

    async fn follow_until_found(
        &self,
        cancel: &CancellationToken,
        mut request: Request,
        max_redirects: u32,
    ) -> Result<(Url, Response)> {
        let mut remaining = max_redirects;
        loop {
            let outcome = self
                .round_trip(cancel, request.clone(), RedirectPolicy::Stop)
                .await
                .and_then(|(body, response)| check_response(body, response));

            let (status, location, response) = match outcome {
                Err(Error::Redirect {
                    status,
                    location,
                    response,
                }) => (status, location, response),
                Err(err) => return Err(err),
                Ok((_, response)) => {
                    return Err(Error::UnexpectedStatus {
                        status: response.status(),
                        response: Box::new(response),
                    })
                }
            };

            if status != StatusCode::MOVED_PERMANENTLY && status != StatusCode::FOUND {
                return Err(Error::UnexpectedStatus { status, response });
            }
            let Some(location) = self.location(location.as_deref()) else {
                return Err(Error::InvalidLocation { response });
            };

            if status == StatusCode::FOUND {
                return Ok((location, *response));
            }
            if remaining == 0 {
                return Err(Error::TooManyRedirects {
                    max_redirects,
                    response,
                });
            }
            remaining -= 1;
            tracing::debug!(%location, remaining, "following permanent redirect");
            request = request.with_url(location);
        }
    }

    /// GET a resource, following up to `max_redirects` permanent redirects
    /// (renamed repositories and branches) without letting the transport
    /// chase anything else.
    pub(crate) async fn get_following_moved(
        &self,
        cancel: &CancellationToken,
        path: &str,
        max_redirects: u32,
    ) -> Result<(Bytes, Response)> {
        let mut request = self.request(Method::GET, path)?;
        let mut remaining = max_redirects;
        loop {
            let (body, response) = self
                .round_trip(cancel, request.clone(), RedirectPolicy::Stop)
                .await?;

            if response.status() == StatusCode::MOVED_PERMANENTLY && remaining > 0 {
                let Some(location) = self.location(response.header(HEADER_LOCATION)) else {
                    return Err(Error::InvalidLocation {
                        response: Box::new(response),
                    });
                };
                remaining -= 1;
                tracing::debug!(%location, remaining, "following permanent redirect");
                request = request.with_url(location);
                continue;
            }

            return match check_response(body, response) {
                Err(Error::Redirect {
                    status: StatusCode::MOVED_PERMANENTLY,
                    response,
                    ..
                }) => Err(Error::TooManyRedirects {
                    max_redirects,
                    response,
                }),
                other => other,
            };
        }
    }

    /// Relative locations resolve against the base URL.
    fn location(&self, header: Option<&str>) -> Option<Url> {
        let header = header.map(str::trim).filter(|h| !h.is_empty())?;
        self.base_url().join(header).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_resolution() {
        let client = GitHubClient::new().unwrap();
        assert_eq!(
            client.location(Some("https://cdn.example.com/logs?sig=1")).unwrap().as_str(),
            "https://cdn.example.com/logs?sig=1"
        );
        assert_eq!(
            client.location(Some("repositories/1/actions/jobs/9/logs")).unwrap().as_str(),
            "https://api.github.com/repositories/1/actions/jobs/9/logs"
        );
        assert!(client.location(Some("  ")).is_none());
        assert!(client.location(None).is_none());
    }
}
