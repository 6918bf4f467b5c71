//! HTTP client for the CareHQ API.
//!
//! Gated behind the `client` cargo feature (enabled by default) so crates that
//! only need the signing and parameter types do not pull in `reqwest`.

mod api;
mod rate_limit;

pub use api::ApiClient;
pub use rate_limit::{
    RATE_LIMIT_LIMIT_HEADER, RATE_LIMIT_REMAINING_HEADER, RATE_LIMIT_RESET_HEADER, RateLimit,
};

use crate::config::ConfigError;
use crate::error::{ApiError, MalformedErrorBody};

/// Errors produced by [`ApiClient`].
///
/// Only [`ClientError::Api`] carries an HTTP status; every other variant is a
/// failure to complete or understand the exchange.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured timeout elapsed before the response arrived.
    #[error("request timed out: {0}")]
    Timeout(reqwest::Error),

    /// The server answered with a status other than 200 or 204.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// The response body was not valid JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The error body was JSON but its diagnostics had an unexpected shape.
    #[error(transparent)]
    MalformedErrorBody(#[from] MalformedErrorBody),

    /// `{base_url}/v1/{path}` did not parse as a URL.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Classify a reqwest failure, splitting timeouts out of the generic
    /// transport errors.
    fn transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Http(err)
        }
    }

    /// The API error, if the server produced one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
