//! Error types for the security layer

use crate::rate_limiter::EndpointClass;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Validation failure
///
/// Every variant carries a stable reason code (see [`ValidationError::code`])
/// that callers surface to users and security logs unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail")]
pub enum ValidationError {
    /// Malformed input shape
    #[error("Invalid format: {0}")]
    #[serde(rename = "format_error")]
    Format(String),

    /// Fails algorithmic validity (Luhn)
    #[error("Checksum failed: {0}")]
    #[serde(rename = "checksum_error")]
    Checksum(String),

    /// Value outside its domain
    #[error("Out of range: {0}")]
    #[serde(rename = "range_error")]
    Range(String),

    /// Temporally invalid
    #[error("Expired: {0}")]
    #[serde(rename = "expired_error")]
    Expired(String),

    /// Length mismatch against a dependent rule
    #[error("Invalid length: expected {expected}, got {actual}")]
    #[serde(rename = "length_error")]
    Length {
        /// Length required by the rule
        expected: usize,
        /// Length supplied
        actual: usize,
    },
}

impl ValidationError {
    /// Stable reason code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::Format(_) => "format_error",
            ValidationError::Checksum(_) => "checksum_error",
            ValidationError::Range(_) => "range_error",
            ValidationError::Expired(_) => "expired_error",
            ValidationError::Length { .. } => "length_error",
        }
    }
}

/// Result of a validation call
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Security layer errors
#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected by a validator
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Client exceeded the request budget for an endpoint class
    #[error("Rate limit exceeded for {class}: retry after {}ms", .retry_after.as_millis())]
    RateLimitExceeded {
        /// Endpoint class whose budget is exhausted
        class: EndpointClass,
        /// Time until the oldest request leaves the window
        retry_after: Duration,
    },

    /// Token could not be produced or opened
    #[error("Tokenization error: {0}")]
    Tokenization(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Stable reason code
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(e) => e.code(),
            Error::RateLimitExceeded { .. } => "rate_limit_exceeded",
            Error::Tokenization(_) => "tokenization_error",
            Error::Config(_) => "configuration_error",
        }
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
