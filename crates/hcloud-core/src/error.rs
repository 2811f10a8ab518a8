//! Error types for Hetzner Cloud operations.
//!
//! This module provides the error type shared by every hcloud crate, the mapping from
//! HTTP status codes and API error bodies onto it, and the classification of transient
//! failures used by the retry loop.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Main error type for Hetzner Cloud operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The API could not be reached or answered with a server error
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Request was rejected by the rate limiter and retries were exhausted
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Request timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The API rejected the request with a structured error body
    #[error("API error {status} ({code}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// API error code, e.g. `invalid_input` or `uniqueness_error`
        code: String,
        /// Human-readable error message
        message: String,
    },

    /// An action finished with status `error`
    #[error("Action {id} failed ({code}): {message}")]
    ActionFailed {
        /// ID of the failed action
        id: i64,
        /// Error code reported by the action
        code: String,
        /// Error message reported by the action
        message: String,
    },

    /// Actions that were being waited on are no longer returned by the API
    #[error("Actions not found: {0:?}")]
    ActionsNotFound(Vec<i64>),

    /// The cancellation token fired before the operation completed
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Failed to parse an API response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid resource ID
    #[error("Invalid ID: {0}")]
    InvalidId(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Specialized result type for Hetzner Cloud operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error body returned by the API for failed requests.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail structure.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ErrorDetail {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &str {
        match self {
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Api { code, .. } | Self::ActionFailed { code, .. } => code.as_str(),
            Self::ActionsNotFound(_) => "ACTIONS_NOT_FOUND",
            Self::Cancelled(_) => "CANCELLED",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::InvalidId(_) => "INVALID_ID",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    /// Returns true if the request that produced this error may succeed when retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable(_) | Self::RateLimited(_) | Self::Timeout(_)
        )
    }

    /// Returns true if this error reports a missing resource.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true if this error was caused by cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Map a non-success HTTP response onto an [`Error`].
///
/// The API reports failures as `{"error": {"code": ..., "message": ...}}`; when the body
/// cannot be decoded the raw text is kept as the message.
#[must_use]
pub fn map_status_to_error(status: StatusCode, text: &str) -> Error {
    let detail = serde_json::from_str::<ErrorResponse>(text)
        .ok()
        .map(|body| body.error);

    if status == StatusCode::NOT_FOUND
        || detail.as_ref().is_some_and(|d| d.code == "not_found")
    {
        let message = detail.map_or_else(|| text.to_string(), |d| d.message);
        return Error::NotFound(message);
    }

    match status {
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited(
            detail.map_or_else(|| text.to_string(), |d| d.message),
        ),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            Error::ServiceUnavailable(format!("API temporarily unavailable: {text}"))
        }
        status if status.is_server_error() => {
            Error::ServiceUnavailable(format!("API server error {status}: {text}"))
        }
        status => match detail {
            Some(detail) => Error::Api {
                status: status.as_u16(),
                code: detail.code,
                message: detail.message,
            },
            None => Error::HttpError(format!("API error {status}: {text}")),
        },
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}
