//! Error types for GitHub API operations.
//!
//! Non-2xx responses are classified by [`check_response`] into the variants
//! of [`Error`]. Every classified error keeps the [`Response`] it came from,
//! so rate-limit and pagination metadata survive failures.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};
use thiserror::Error;

use crate::response::{
    parse_secondary_rate, sanitize_url, Rate, Response, HEADER_LOCATION, HEADER_OTP,
    HEADER_RATE_REMAINING,
};

const SECONDARY_RATE_LIMIT_MESSAGE: &str = "You have exceeded a secondary rate limit";
const SECONDARY_RATE_LIMIT_DOC_SUFFIX: &str = "secondary-rate-limits";
const ABUSE_RATE_LIMIT_DOC_SUFFIX: &str = "#abuse-rate-limits";

/// Failures below the HTTP status layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// The request could not be sent or no response headers arrived.
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    /// The caller's cancellation token fired before the exchange completed.
    #[error("request cancelled")]
    Cancelled,
}

/// Errors that can occur during GitHub API operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Required configuration is missing.
    #[error("GitHub configuration required: {0}")]
    ConfigMissing(String),

    /// The configured base URL cannot serve as an API root.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: &'static str },

    /// A request path was rejected before anything was sent.
    #[error("invalid request path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A header value (token, user agent, API version) was not valid.
    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    /// An option record could not be encoded as a query string.
    #[error("cannot encode query option '{field}': {message}")]
    QueryEncode { field: String, message: String },

    /// A request body could not be serialized.
    #[error("cannot encode request body: {0}")]
    BodyEncode(#[source] serde_json::Error),

    /// Writing a raw response body to the caller's sink failed.
    #[error("failed to write response body: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level failure or cancellation.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A 2xx body did not match the expected type.
    #[error("failed to decode response at '{path}': {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
        response: Box<Response>,
    },

    /// The server accepted the request and scheduled the work (202).
    ///
    /// `raw` holds the response body unparsed; some endpoints return a
    /// partial result alongside the 202.
    #[error("job scheduled on GitHub side; try again later")]
    Accepted { raw: Bytes, response: Box<Response> },

    /// A conditional request matched the cached representation (304).
    #[error("not modified")]
    NotModified { response: Box<Response> },

    /// Generic API error.
    #[error("{0}")]
    Api(Box<ApiError>),

    /// Request validation failed (422).
    #[error("{0}")]
    Validation(Box<ApiError>),

    /// The account requires a one-time password (401 with `X-GitHub-OTP`).
    #[error("two-factor authentication required: {0}")]
    TwoFactorRequired(Box<ApiError>),

    /// Primary rate limit exhausted.
    #[error("{0}")]
    RateLimited(Box<RateLimitError>),

    /// Secondary rate limit triggered.
    #[error("{0}")]
    SecondaryRateLimited(Box<SecondaryRateLimitError>),

    /// Abuse-detection mechanism triggered.
    #[error("{0}")]
    AbuseDetected(Box<SecondaryRateLimitError>),

    /// The server answered with a redirect that was not followed.
    #[error("redirected with status {status} to {location:?}")]
    Redirect {
        status: StatusCode,
        location: Option<String>,
        response: Box<Response>,
    },

    /// A redirect-resolving call saw a status it does not handle.
    #[error("unexpected status code: {status}")]
    UnexpectedStatus {
        status: StatusCode,
        response: Box<Response>,
    },

    /// A redirect-resolving call ran out of permanent-redirect hops.
    #[error("reached maximum redirections ({max_redirects})")]
    TooManyRedirects {
        max_redirects: u32,
        response: Box<Response>,
    },

    /// A redirect carried a missing or unparseable `Location` header.
    #[error("redirect response has no usable Location header")]
    InvalidLocation { response: Box<Response> },
}

impl Error {
    /// The response this error was classified from, if one arrived.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Decode { response, .. }
            | Self::Accepted { response, .. }
            | Self::NotModified { response }
            | Self::Redirect { response, .. }
            | Self::UnexpectedStatus { response, .. }
            | Self::TooManyRedirects { response, .. }
            | Self::InvalidLocation { response } => Some(&**response),
            Self::Api(err) | Self::Validation(err) | Self::TwoFactorRequired(err) => {
                Some(&err.response)
            }
            Self::RateLimited(err) => Some(&err.response),
            Self::SecondaryRateLimited(err) | Self::AbuseDetected(err) => Some(&err.response),
            _ => None,
        }
    }

    /// HTTP status of the response, if one arrived.
    pub fn status(&self) -> Option<StatusCode> {
        self.response().map(Response::status)
    }

    /// Whether the failure happened below the HTTP status layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Whether the caller's cancellation token aborted the call.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Cancelled))
    }

    /// Whether this is a 404 API error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(err) if err.response.status() == StatusCode::NOT_FOUND)
    }

    /// Whether any rate limit (primary, secondary or abuse) was hit.
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::SecondaryRateLimited(_) | Self::AbuseDetected(_)
        )
    }

    /// How long to wait before retrying, when the server said so.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::SecondaryRateLimited(err) | Self::AbuseDetected(err) => err.retry_after,
            Self::RateLimited(err) => err
                .rate
                .reset
                .map(|reset| (reset - Utc::now()).to_std().unwrap_or(Duration::ZERO)),
            _ => None,
        }
    }
}

/// Result type alias for GitHub operations.
pub type Result<T> = core::result::Result<T, Error>;

/// JSON error body returned by the API.
///
/// Missing and `null` fields decode as empty; a body that is not JSON at all
/// yields [`ErrorBody::default`].
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub message: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub documentation_url: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<ErrorBlock>,
}

/// One entry of the `errors` array in an error body.
///
/// Some endpoints send plain strings instead of objects; those land in
/// `message`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FieldErrorRepr")]
pub struct FieldError {
    pub resource: String,
    pub field: String,
    pub code: String,
    pub message: String,
}

#[serde_as]
#[derive(Deserialize)]
#[serde(untagged)]
enum FieldErrorRepr {
    Detailed {
        #[serde_as(deserialize_as = "DefaultOnNull")]
        #[serde(default)]
        resource: String,
        #[serde_as(deserialize_as = "DefaultOnNull")]
        #[serde(default)]
        field: String,
        #[serde_as(deserialize_as = "DefaultOnNull")]
        #[serde(default)]
        code: String,
        #[serde_as(deserialize_as = "DefaultOnNull")]
        #[serde(default)]
        message: String,
    },
    Message(Option<String>),
}

impl From<FieldErrorRepr> for FieldError {
    fn from(repr: FieldErrorRepr) -> Self {
        match repr {
            FieldErrorRepr::Detailed {
                resource,
                field,
                code,
                message,
            } => Self {
                resource,
                field,
                code,
                message,
            },
            FieldErrorRepr::Message(message) => Self {
                message: message.unwrap_or_default(),
                ..Self::default()
            },
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.code.is_empty() && self.field.is_empty() {
            return f.write_str(&self.message);
        }
        write!(
            f,
            "{} error caused by {} field on {} resource",
            self.code, self.field, self.resource
        )
    }
}

/// Present when access to a resource was blocked (451 and friends).
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBlock {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// An API error: the decoded body plus the response it arrived with.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub body: ErrorBody,
    pub response: Response,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_request_line(f, &self.response)?;
        write!(f, "{}", self.body.message)?;
        if !self.body.errors.is_empty() {
            let details: Vec<String> = self.body.errors.iter().map(ToString::to_string).collect();
            write!(f, " [{}]", details.join(", "))?;
        }
        if let Some(block) = &self.body.block {
            write!(f, " (blocked: {})", block.reason)?;
        }
        Ok(())
    }
}

/// The primary rate limit has been exhausted.
#[derive(Debug, Clone)]
pub struct RateLimitError {
    pub rate: Rate,
    pub message: String,
    pub response: Response,
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_request_line(f, &self.response)?;
        write!(f, "{} {}", self.message, format_rate_reset(self.rate.reset))
    }
}

/// A secondary rate limit or abuse-detection response.
#[derive(Debug, Clone)]
pub struct SecondaryRateLimitError {
    pub message: String,
    pub documentation_url: String,
    /// Server-advised wait before retrying.
    pub retry_after: Option<Duration>,
    pub response: Response,
}

impl fmt::Display for SecondaryRateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_request_line(f, &self.response)?;
        f.write_str(&self.message)?;
        if let Some(wait) = self.retry_after {
            write!(f, " (retry after {}s)", wait.as_secs())?;
        }
        Ok(())
    }
}

fn write_request_line(f: &mut fmt::Formatter<'_>, response: &Response) -> fmt::Result {
    write!(
        f,
        "{} {}: {} ",
        response.method(),
        sanitize_url(response.url()),
        response.status().as_u16()
    )
}

/// Describe a rate-limit reset time relative to now.
///
/// Renders as `[rate reset in 2m03s]`, or `[rate limit was reset 5s ago]`
/// once the reset time has passed.
pub(crate) fn format_rate_reset(reset: Option<DateTime<Utc>>) -> String {
    let Some(reset) = reset else {
        return "[rate reset unknown]".to_string();
    };

    let delta = (reset - Utc::now()).num_seconds();
    let (secs, passed) = if delta < 0 { (-delta, true) } else { (delta, false) };
    let span = if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    };

    if passed {
        format!("[rate limit was reset {span} ago]")
    } else {
        format!("[rate reset in {span}]")
    }
}

/// Classify a response by status.
///
/// 2xx passes through unchanged except 202, which becomes
/// [`Error::Accepted`]. Everything else maps onto an error variant; the
/// body is decoded as an [`ErrorBody`] on a best-effort basis.
///
/// # Errors
///
/// Returns the classified error for any non-2xx status, and for 202.
pub fn check_response(body: Bytes, response: Response) -> Result<(Bytes, Response)> {
    let status = response.status();
    if status == StatusCode::ACCEPTED {
        return Err(Error::Accepted {
            raw: body,
            response: Box::new(response),
        });
    }
    if status.is_success() {
        return Ok((body, response));
    }

    let error_body: ErrorBody = serde_json::from_slice(&body).unwrap_or_default();
    Err(classify(status, error_body, response))
}

fn classify(status: StatusCode, body: ErrorBody, response: Response) -> Error {
    let primary_exhausted = response.header(HEADER_RATE_REMAINING) == Some("0");

    match status {
        StatusCode::NOT_MODIFIED => Error::NotModified {
            response: Box::new(response),
        },
        StatusCode::UNAUTHORIZED if response.header(HEADER_OTP).is_some() => {
            Error::TwoFactorRequired(Box::new(ApiError { body, response }))
        }
        StatusCode::FORBIDDEN if is_secondary_rate_limit(&body) => {
            Error::SecondaryRateLimited(Box::new(secondary(body, response)))
        }
        StatusCode::FORBIDDEN if is_abuse(&body) => {
            Error::AbuseDetected(Box::new(secondary(body, response)))
        }
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS if primary_exhausted => {
            tracing::warn!(
                reset = ?response.rate.reset,
                resource = %response.rate.resource,
                "primary rate limit exhausted"
            );
            Error::RateLimited(Box::new(RateLimitError {
                rate: response.rate.clone(),
                message: body.message,
                response,
            }))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            Error::SecondaryRateLimited(Box::new(secondary(body, response)))
        }
        StatusCode::MOVED_PERMANENTLY
        | StatusCode::FOUND
        | StatusCode::SEE_OTHER
        | StatusCode::TEMPORARY_REDIRECT
        | StatusCode::PERMANENT_REDIRECT => Error::Redirect {
            status,
            location: response.header(HEADER_LOCATION).map(str::to_string),
            response: Box::new(response),
        },
        StatusCode::UNPROCESSABLE_ENTITY => Error::Validation(Box::new(ApiError { body, response })),
        _ => Error::Api(Box::new(ApiError { body, response })),
    }
}

fn is_secondary_rate_limit(body: &ErrorBody) -> bool {
    body.message.starts_with(SECONDARY_RATE_LIMIT_MESSAGE)
        || body.documentation_url.ends_with(SECONDARY_RATE_LIMIT_DOC_SUFFIX)
}

fn is_abuse(body: &ErrorBody) -> bool {
    body.message.to_ascii_lowercase().contains("abuse")
        || body.documentation_url.ends_with(ABUSE_RATE_LIMIT_DOC_SUFFIX)
}

fn secondary(body: ErrorBody, response: Response) -> SecondaryRateLimitError {
    let retry_after = parse_secondary_rate(response.headers());
    tracing::warn!(?retry_after, message = %body.message, "secondary rate limit triggered");
    SecondaryRateLimitError {
        message: body.message,
        documentation_url: body.documentation_url,
        retry_after,
        response,
    }
}

/// Convert the outcome of a yes/no endpoint into a boolean.
///
/// GitHub answers such queries with 204 for yes and 404 for no. A 404 API
/// error becomes `Ok((false, response))`; any other error is returned
/// unchanged.
///
/// # Errors
///
/// Returns every error other than a 404 API error.
pub fn parse_bool_response(result: Result<Response>) -> Result<(bool, Response)> {
    match result {
        Ok(response) => Ok((true, response)),
        Err(Error::Api(err)) if err.response.status() == StatusCode::NOT_FOUND => {
            Ok((false, err.response))
        }
        Err(err) => Err(err),
    }
}
