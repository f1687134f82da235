//! Provider error types

use std::time::Duration;
use thiserror::Error;

/// Wait used when a 429 carries no usable `retry-after` header
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Failures talking to a model endpoint
///
/// Any of these ends the current run. Tool failures never show up here.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited by provider, retry after {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("Provider returned HTTP {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Transport failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Could not decode provider JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Provider configuration: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Classify a non-success HTTP response
    pub(crate) fn from_status(status: u16, message: String, retry_after: Option<Duration>) -> Self {
        if status == 429 {
            return LlmError::RateLimited {
                retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER),
            };
        }
        LlmError::ApiError { status, message }
    }

    /// Classify a reqwest failure that happened before any response arrived
    pub(crate) fn from_transport(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            LlmError::Timeout { url: url.to_string() }
        } else {
            LlmError::Network(err)
        }
    }

    /// Whether sending the same request again may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } | LlmError::Network(_) | LlmError::Timeout { .. } => true,
            LlmError::ApiError { status, .. } => matches!(status, 408 | 500 | 502 | 503 | 504 | 529),
            LlmError::InvalidResponse(_) | LlmError::Json(_) | LlmError::Configuration(_) => false,
        }
    }

    /// Server-requested wait before the next attempt
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
