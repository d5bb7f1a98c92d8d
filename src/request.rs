//! Request construction.
//!
//! A [`Request`] is built by [`GitHubClient::request`] or
//! [`GitHubClient::request_json`] with the default headers already in place.
//! Endpoints that need a different media type override `Accept` before
//! dispatching.
//!
//! [`GitHubClient::request`]: crate::GitHubClient::request
//! [`GitHubClient::request_json`]: crate::GitHubClient::request_json

use std::borrow::Cow;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Method;
use serde::Serialize;
use url::Url;

use crate::error::{Error, Result};

/// Canonical public API root.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com/";

/// Default `Accept` media type for the v3 API.
pub const MEDIA_TYPE_V3: &str = "application/vnd.github.v3+json";

/// Media type for raw file contents.
pub const MEDIA_TYPE_RAW: &str = "application/vnd.github.v3.raw";

/// REST API version sent with every request.
pub const DEFAULT_API_VERSION: &str = "2022-11-28";

pub(crate) const HEADER_API_VERSION: &str = "x-github-api-version";

/// A request ready for dispatch.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Request {
    pub(crate) fn new(method: Method, url: Url, headers: HeaderMap, body: Option<Bytes>) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access for endpoint-specific headers such as `If-None-Match`.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Encoded JSON body, including its trailing newline.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Replace the `Accept` header.
    #[must_use]
    pub fn with_accept(mut self, media_type: &'static str) -> Self {
        self.headers
            .insert(ACCEPT, HeaderValue::from_static(media_type));
        self
    }

    /// Replace the `X-GitHub-Api-Version` header.
    ///
    /// # Errors
    ///
    /// Returns an error if `version` is not a valid header value.
    pub fn with_api_version(mut self, version: &str) -> Result<Self> {
        self.headers
            .insert(HEADER_API_VERSION, HeaderValue::from_str(version)?);
        Ok(self)
    }

    /// The same request aimed at another URL, for following redirects.
    pub(crate) fn with_url(mut self, url: Url) -> Self {
        self.url = url;
        self
    }

    pub(crate) fn into_reqwest(self) -> reqwest::Request {
        let mut request = reqwest::Request::new(self.method, self.url);
        *request.headers_mut() = self.headers;
        if let Some(body) = self.body {
            *request.body_mut() = Some(body.into());
        }
        request
    }
}

/// Percent-escape a caller-supplied value for use as one path segment.
///
/// Every character outside the unreserved set is escaped, `/` included, so
/// a value can never introduce extra segments. Empty values and dot segments
/// (`.`, `..`) are rejected with [`Error::InvalidPath`].
pub fn escape(segment: &str) -> Result<Cow<'_, str>> {
    let reason = match segment {
        "" => "empty path segment",
        "." | ".." => "dot path segment",
        _ => return Ok(urlencoding::encode(segment)),
    };
    Err(Error::InvalidPath {
        path: segment.to_string(),
        reason,
    })
}

/// JSON-encode a request body, terminated by a newline.
pub(crate) fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<Bytes> {
    let mut buf = serde_json::to_vec(body).map_err(Error::BodyEncode)?;
    buf.push(b'\n');
    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> Request {
        Request::new(
            Method::GET,
            Url::parse("https://api.github.com/user").unwrap(),
            HeaderMap::new(),
            None,
        )
    }

    #[test]
    fn test_escape_path_segment() {
        assert_eq!(escape("octo-cat_1.0~x").unwrap(), "octo-cat_1.0~x");
        assert_eq!(escape("feature/login").unwrap(), "feature%2Flogin");
        assert_eq!(escape("a b?c#d").unwrap(), "a%20b%3Fc%23d");
        assert_eq!(escape("...").unwrap(), "...");
        assert_eq!(escape("../x").unwrap(), "..%2Fx");
    }

    #[test]
    fn test_escape_rejects_dot_and_empty_segments() {
        for segment in ["", ".", ".."] {
            let err = escape(segment).unwrap_err();
            assert!(
                matches!(err, Error::InvalidPath { ref path, .. } if path == segment),
                "{segment:?}: {err:?}"
            );
        }
    }

    #[test]
    fn test_encode_body_trailing_newline() {
        let body = encode_body(&json!({"name": "x"})).unwrap();
        assert_eq!(&body[..], b"{\"name\":\"x\"}\n");
    }

    #[test]
    fn test_header_overrides() {
        let request = request()
            .with_accept(MEDIA_TYPE_RAW)
            .with_api_version("2099-01-01")
            .unwrap();

        assert_eq!(request.headers().get(ACCEPT).unwrap(), MEDIA_TYPE_RAW);
        assert_eq!(
            request.headers().get("x-github-api-version").unwrap(),
            "2099-01-01"
        );
        assert!(request.clone().with_api_version("bad\nvalue").is_err());
    }

    #[test]
    fn test_into_reqwest_carries_body() {
        let mut req = request();
        req.body = Some(Bytes::from_static(b"{}\n"));
        let converted = req.into_reqwest();
        assert_eq!(converted.method(), Method::GET);
        assert_eq!(converted.body().unwrap().as_bytes(), Some(&b"{}\n"[..]));
    }
}
