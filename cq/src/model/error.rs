//! Errors surfaced by model clients
//!
//! Provider adapters normalize their failures into [`ModelError`] so the
//! engine and embedding applications can react uniformly: transient
//! conditions are worth another attempt, malformed payloads are not.

use std::time::Duration;
use thiserror::Error;

/// Failure modes of a completion call
#[derive(Debug, Error)]
pub enum ModelError {
    /// The provider asked us to slow down
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Backoff the provider requested
        retry_after: Duration,
    },

    /// Non-success HTTP status, with the provider's own message
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The call came back but its payload made no sense
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    /// Whether another attempt could plausibly succeed
    ///
    /// Rate limits, server-side statuses (including 408 and 529), network
    /// trouble, and timeouts are transient. A payload that did not parse
    /// will not parse better on the next try.
    pub fn is_retryable(&self) -> bool {
        match self {
            ModelError::RateLimited { .. } | ModelError::Network(_) | ModelError::Timeout(_) => {
                true
            }
            ModelError::Api { status, .. } => *status >= 500 || *status == 408,
            ModelError::InvalidResponse(_) | ModelError::Json(_) => false,
        }
    }

    /// Provider-requested backoff, when it sent one
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ModelError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_failures_are_retryable() {
        assert!(ModelError::RateLimited { retry_after: Duration::from_secs(60) }.is_retryable());
        assert!(ModelError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(ModelError::Api { status: 408, message: "request timeout".to_string() }.is_retryable());
        assert!(ModelError::Api { status: 500, message: "down".to_string() }.is_retryable());
        assert!(ModelError::Api { status: 529, message: "overloaded".to_string() }.is_retryable());
    }

    #[test]
    fn test_caller_errors_and_bad_payloads_are_not() {
        assert!(!ModelError::Api { status: 400, message: "bad request".to_string() }.is_retryable());
        assert!(!ModelError::InvalidResponse("not json".to_string()).is_retryable());
    }

    #[test]
    fn test_retry_after_comes_only_from_rate_limits() {
        let limited = ModelError::RateLimited { retry_after: Duration::from_secs(42) };
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(42)));

        let api = ModelError::Api { status: 503, message: "unavailable".to_string() };
        assert_eq!(api.retry_after(), None);
    }
}
