//! API response metadata.
//!
//! Every dispatched request yields a [`Response`], failed ones included, so
//! rate-limit and pagination state stay observable to the caller.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::pagination::Pagination;

pub(crate) const HEADER_LINK: &str = "link";
pub(crate) const HEADER_LOCATION: &str = "location";
pub(crate) const HEADER_OTP: &str = "x-github-otp";
pub(crate) const HEADER_RATE_LIMIT: &str = "x-ratelimit-limit";
pub(crate) const HEADER_RATE_REMAINING: &str = "x-ratelimit-remaining";
pub(crate) const HEADER_RATE_USED: &str = "x-ratelimit-used";
pub(crate) const HEADER_RATE_RESET: &str = "x-ratelimit-reset";
pub(crate) const HEADER_RATE_RESOURCE: &str = "x-ratelimit-resource";
pub(crate) const HEADER_RETRY_AFTER: &str = "retry-after";
pub(crate) const HEADER_TOKEN_EXPIRATION: &str = "github-authentication-token-expiration";

/// Rate-limit quota for one resource class.
///
/// Parsed from the `X-RateLimit-*` response headers, or decoded from the
/// `rate_limit` endpoint. Every field is zero/empty when the server did not
/// report it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    /// Maximum number of requests permitted in the current window.
    #[serde(default)]
    pub limit: u64,
    /// Requests remaining in the current window.
    #[serde(default)]
    pub remaining: u64,
    /// Requests already made in the current window.
    #[serde(default)]
    pub used: u64,
    /// When the current window resets.
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub reset: Option<DateTime<Utc>>,
    /// Resource class the quota applies to (`core`, `search`, ...).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource: String,
}

impl Rate {
    /// Parse the rate-limit headers of a response.
    ///
    /// Absent or malformed headers leave the corresponding field zeroed.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let number = |name: &str| {
            header_str(headers, name)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(0)
        };

        let reset = header_str(headers, HEADER_RATE_RESET)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|secs| *secs != 0)
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

        Self {
            limit: number(HEADER_RATE_LIMIT),
            remaining: number(HEADER_RATE_REMAINING),
            used: number(HEADER_RATE_USED),
            reset,
            resource: header_str(headers, HEADER_RATE_RESOURCE)
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// A GitHub API response.
///
/// Wraps the status and headers of the HTTP response together with the
/// pagination, rate-limit and token-expiration metadata parsed from them.
/// The body is consumed by the decoding step and is not retained here.
#[derive(Debug, Clone)]
pub struct Response {
    method: Method,
    url: Url,
    status: StatusCode,
    headers: HeaderMap,
    /// Page numbers and cursors parsed from the `Link` header.
    pub pagination: Pagination,
    /// Quota parsed from the `X-RateLimit-*` headers.
    pub rate: Rate,
    /// Expiry of the credential used for the request, when the server
    /// reported one.
    pub token_expiration: Option<DateTime<Utc>>,
}

impl Response {
    pub(crate) fn new(method: Method, url: Url, status: StatusCode, headers: HeaderMap) -> Self {
        let pagination = header_str(&headers, HEADER_LINK)
            .map(Pagination::from_link_header)
            .unwrap_or_default();
        let rate = Rate::from_headers(&headers);
        let token_expiration =
            header_str(&headers, HEADER_TOKEN_EXPIRATION).and_then(parse_token_expiration);

        Self {
            method,
            url,
            status,
            headers,
            pagination,
            rate,
            token_expiration,
        }
    }

    /// HTTP status of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// All response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A single header value, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        header_str(&self.headers, name)
    }

    /// Method of the request that produced this response.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Final URL of the request that produced this response.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Retry advice attached to secondary rate-limit responses.
///
/// `Retry-After` carries seconds to wait; failing that, `X-RateLimit-Reset`
/// carries the epoch second at which requests may resume.
pub(crate) fn parse_secondary_rate(headers: &HeaderMap) -> Option<Duration> {
    if let Some(value) = header_str(headers, HEADER_RETRY_AFTER) {
        return Some(Duration::from_secs(value.trim().parse().unwrap_or(0)));
    }

    header_str(headers, HEADER_RATE_RESET).map(|value| {
        let resume_at: i64 = value.trim().parse().unwrap_or(0);
        let wait = resume_at.saturating_sub(Utc::now().timestamp()).max(0);
        Duration::from_secs(u64::try_from(wait).unwrap_or(0))
    })
}

/// Parse the token-expiration header.
///
/// GitHub sends either `2023-03-16 10:00:00 UTC` or, for some tokens, a
/// numeric offset such as `2023-03-16 10:00:00 -0700`.
pub(crate) fn parse_token_expiration(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S %z") {
        return Some(parsed.with_timezone(&Utc));
    }

    let (timestamp, zone) = value.rsplit_once(' ')?;
    if !matches!(zone, "UTC" | "GMT") {
        return None;
    }
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Redact `client_secret` query values before a URL ends up in an error
/// message or a log line.
pub(crate) fn sanitize_url(url: &Url) -> Url {
    let has_secret = url
        .query_pairs()
        .any(|(key, value)| key == "client_secret" && !value.is_empty());
    if !has_secret {
        return url.clone();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "client_secret" {
                "REDACTED".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    let mut sanitized = url.clone();
    sanitized.query_pairs_mut().clear().extend_pairs(pairs);
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_rate_from_headers() {
        let rate = Rate::from_headers(&headers(&[
            ("x-ratelimit-limit", "5000"),
            ("x-ratelimit-remaining", "4999"),
            ("x-ratelimit-used", "1"),
            ("x-ratelimit-reset", "1372700873"),
            ("x-ratelimit-resource", "core"),
        ]));

        assert_eq!(rate.limit, 5000);
        assert_eq!(rate.remaining, 4999);
        assert_eq!(rate.used, 1);
        assert_eq!(rate.reset.unwrap().timestamp(), 1_372_700_873);
        assert_eq!(rate.resource, "core");
    }

    #[test]
    fn test_rate_absent_headers_are_zero() {
        let rate = Rate::from_headers(&HeaderMap::new());
        assert_eq!(rate, Rate::default());
    }

    #[test]
    fn test_rate_malformed_headers_are_zero() {
        let rate = Rate::from_headers(&headers(&[
            ("x-ratelimit-limit", "lots"),
            ("x-ratelimit-reset", "0"),
        ]));
        assert_eq!(rate.limit, 0);
        assert!(rate.reset.is_none());
    }

    #[test]
    fn test_rate_decodes_from_rate_limit_endpoint() {
        let rate: Rate = serde_json::from_str(
            r#"{"limit":60,"remaining":59,"used":1,"reset":1372700873,"resource":"core"}"#,
        )
        .unwrap();
        assert_eq!(rate.remaining, 59);
        assert_eq!(rate.reset.unwrap().timestamp(), 1_372_700_873);
    }

    #[test]
    fn test_token_expiration_formats() {
        let utc = parse_token_expiration("2023-03-16 10:00:00 UTC").unwrap();
        assert_eq!(utc.to_rfc3339(), "2023-03-16T10:00:00+00:00");

        let offset = parse_token_expiration("2023-03-16 10:00:00 -0700").unwrap();
        assert_eq!(offset.to_rfc3339(), "2023-03-16T17:00:00+00:00");

        assert!(parse_token_expiration("next tuesday").is_none());
    }

    #[test]
    fn test_secondary_rate_prefers_retry_after() {
        let wait = parse_secondary_rate(&headers(&[
            ("retry-after", "123"),
            ("x-ratelimit-reset", "1"),
        ]));
        assert_eq!(wait, Some(Duration::from_secs(123)));
    }

    #[test]
    fn test_secondary_rate_falls_back_to_reset() {
        let resume_at = (Utc::now().timestamp() + 60).to_string();
        let wait = parse_secondary_rate(&headers(&[("x-ratelimit-reset", &resume_at)])).unwrap();
        assert!(wait <= Duration::from_secs(60));
        assert!(wait >= Duration::from_secs(55));

        assert!(parse_secondary_rate(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_response_parses_metadata() {
        let response = Response::new(
            Method::GET,
            Url::parse("https://api.github.com/user").unwrap(),
            StatusCode::OK,
            headers(&[
                ("link", r#"<https://api.github.com/user/repos?page=2>; rel="next""#),
                ("x-ratelimit-remaining", "10"),
                ("github-authentication-token-expiration", "2030-01-01 00:00:00 UTC"),
            ]),
        );

        assert_eq!(response.pagination.next_page, 2);
        assert_eq!(response.rate.remaining, 10);
        assert!(response.token_expiration.is_some());
        assert_eq!(response.header("X-RateLimit-Remaining"), Some("10"));
    }

    #[test]
    fn test_sanitize_url_redacts_client_secret() {
        let url = Url::parse("https://api.github.com/applications?client_id=id&client_secret=shh")
            .unwrap();
        let sanitized = sanitize_url(&url);
        assert!(sanitized.as_str().contains("client_secret=REDACTED"));
        assert!(sanitized.as_str().contains("client_id=id"));
        assert!(!sanitized.as_str().contains("shh"));

        let clean = Url::parse("https://api.github.com/user?page=2").unwrap();
        assert_eq!(sanitize_url(&clean), clean);
    }
}
