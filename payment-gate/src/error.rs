//! Gate errors
//!
//! Every failure keeps its specific reason; nothing is folded into a generic
//! error, since the reason drives user-facing messages and security logging.

use security::{EndpointClass, ValidationError};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Result type
pub type Result<T> = std::result::Result<T, GateError>;

/// Payment gate error
#[derive(Debug, Error)]
pub enum GateError {
    /// Input rejected by a validator
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Client exceeded its request budget
    #[error("Rate limit exceeded for {class}: retry after {}s", .retry_after.as_secs())]
    RateLimited {
        /// Endpoint class whose budget is exhausted
        class: EndpointClass,
        /// Time until a request would be admitted
        retry_after: Duration,
    },

    /// Card token could not be produced
    #[error("Tokenization error: {0}")]
    Tokenization(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registry failure
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl GateError {
    /// Stable reason code
    pub fn code(&self) -> &'static str {
        match self {
            GateError::Validation(e) => e.code(),
            GateError::RateLimited { .. } => "rate_limit_exceeded",
            GateError::Tokenization(_) => "tokenization_error",
            GateError::Config(_) => "configuration_error",
            GateError::Metrics(_) => "metrics_error",
        }
    }

    /// Retry hint for rate limit errors
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GateError::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Error body for callers: `{"error": CODE, "message": ..., "retry_after_secs": ...}`
    pub fn to_json(&self) -> serde_json::Value {
        let mut body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        if let Some(retry_after) = self.retry_after() {
            body["retry_after_secs"] = json!(retry_after.as_secs_f64().ceil() as u64);
        }
        body
    }
}

impl From<security::Error> for GateError {
    fn from(err: security::Error) -> Self {
        match err {
            security::Error::Validation(e) => GateError::Validation(e),
            security::Error::RateLimitExceeded { class, retry_after } => {
                GateError::RateLimited { class, retry_after }
            }
            security::Error::Tokenization(msg) => GateError::Tokenization(msg),
            security::Error::Config(msg) => GateError::Config(msg),
        }
    }
}

impl From<risk_engine::Error> for GateError {
    fn from(err: risk_engine::Error) -> Self {
        match err {
            risk_engine::Error::InvalidConfig(msg) => GateError::Config(msg),
        }
    }
}

impl From<config::ConfigError> for GateError {
    fn from(err: config::ConfigError) -> Self {
        GateError::Config(err.to_string())
    }
}
