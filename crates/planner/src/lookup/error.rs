//! Error types for the lookup clients.

use thiserror::Error;

/// Errors that can occur while calling the open-sections or rating services.
#[derive(Debug, Error, Clone)]
pub enum LookupError {
    /// Network/HTTP request failed
    #[error("Network error: {message}")]
    Network { message: String },

    /// Request did not complete within the configured timeout
    #[error("Request timed out: {message}")]
    Timeout { message: String },

    /// Service answered with a non-success status
    #[error("Service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    /// URL parsing/construction failed
    #[error("URL error: {message}")]
    UrlError { message: String },

    /// Request rejected before reaching the service
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// The service is not configured
    #[error("Service not configured: {service}")]
    NotConfigured { service: &'static str },

    /// Circuit breaker is open due to repeated failures
    #[error("Circuit breaker open - too many recent failures")]
    CircuitBreakerOpen,
}

impl LookupError {
    /// Returns true if this error is potentially transient and retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            LookupError::Network { .. } | LookupError::Timeout { .. } => true,
            LookupError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LookupError::Timeout {
                message: err.to_string(),
            }
        } else if err.is_decode() {
            LookupError::UnexpectedResponse {
                message: err.to_string(),
            }
        } else {
            LookupError::Network {
                message: err.to_string(),
            }
        }
    }
}

impl From<url::ParseError> for LookupError {
    fn from(err: url::ParseError) -> Self {
        LookupError::UrlError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        LookupError::UnexpectedResponse {
            message: err.to_string(),
        }
    }
}
