//! Risk engine for the payment gate
//!
//! Heuristic fraud scoring run before a payment reaches the processor.
//! The score is a weighted sum of independent signals, clamped to [0, 1]:
//!
//! | signal                       | contribution               |
//! |------------------------------|----------------------------|
//! | amount above high threshold  | full amount weight         |
//! | amount above mid threshold   | half amount weight         |
//! | disposable email domain      | full email weight          |
//! | loopback / private client IP | half IP weight             |
//! | request velocity             | full velocity weight       |
//! | outside normal hours         | flat off-hours bonus       |
//!
//! Velocity is read from the rate limiter through [`VelocitySource`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod scoring;
pub mod types;
pub mod velocity;

pub use config::RiskConfig;
pub use error::{Error, Result};
pub use scoring::RiskScorer;
pub use types::*;
pub use velocity::VelocitySource;
