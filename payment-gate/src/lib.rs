//! Payment gate
//!
//! Runs every payment attempt through rate limiting, input validation and
//! risk scoring before it may reach the payment processor:
//!
//! ```text
//! request ─→ RateLimiter ─→ validators ─→ RiskScorer ─→ GateDecision
//!               │                             ↑
//!               └──────── velocity ───────────┘
//! ```
//!
//! One [`PaymentGate`] is built per process; it owns the shared rate limiter
//! and hands out its handle to anything else that needs it.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod gate;
pub mod metrics;
pub mod models;
pub mod settings;

pub use error::{GateError, Result};
pub use gate::PaymentGate;
pub use metrics::GateMetrics;
pub use models::{GateDecision, PaymentRequest, Verdict};
pub use settings::GateConfig;
