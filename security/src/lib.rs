//! Security layer for the payment gate
//!
//! Everything that runs before a payment reaches the processor:
//! - Card validation (Luhn checksum, issuer prefixes, expiry, CVV)
//! - Free-text sanitization
//! - Sliding-window rate limiting per client and endpoint class
//! - Transaction integrity hashes
//! - Nominal card tokenization (AES-256-GCM, no vault)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐   ┌──────────────────┐
//! │ Rate Limiter │ → │ Card Validator │ → │ Risk Engine      │
//! │ (one lock)   │   │ Input Sanitizer│   │ (reads velocity) │
//! └──────────────┘   └────────────────┘   └──────────────────┘
//! ```
//!
//! The rate limiter is the only stateful component. It is built once per
//! process and shared by handle; validators are plain functions.
//!
//! # Usage
//!
//! ```
//! use security::card_validator::{validate_card_number, CardBrand};
//! use security::rate_limiter::{EndpointClass, RateLimiter, RateLimiterConfig};
//!
//! let card = validate_card_number("4532 0151 1283 0366").unwrap();
//! assert_eq!(card.brand, CardBrand::Visa);
//! assert_eq!(card.masked_number, "************0366");
//!
//! let limiter = RateLimiter::new(RateLimiterConfig::default());
//! assert!(limiter
//!     .check("203.0.113.7", EndpointClass::PaymentProcessing)
//!     .is_allowed());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod card_validator;
pub mod clock;
pub mod error;
pub mod input_sanitizer;
pub mod integrity;
pub mod rate_limiter;
pub mod tokenization;

pub use card_validator::{CardBrand, CardClassification, CardDetails, ExpiryDate, ValidatedCard};
pub use clock::{Clock, MockClock, SystemClock};
pub use error::{Error, Result, ValidationError, ValidationResult};
pub use input_sanitizer::sanitize;
pub use rate_limiter::{EndpointClass, LimitRule, RateLimitResult, RateLimiter, RateLimiterConfig};
pub use tokenization::{PaymentTokenizer, TokenPayload};
