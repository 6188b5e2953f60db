//! Core types for risk engine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Score above which the level is [`RiskLevel::High`]
pub const HIGH_LEVEL_THRESHOLD: Decimal = dec!(0.7);

/// Score above which the level is [`RiskLevel::Medium`]
pub const MEDIUM_LEVEL_THRESHOLD: Decimal = dec!(0.3);

/// Score above which the recommendation is [`Recommendation::Block`]
pub const BLOCK_THRESHOLD: Decimal = dec!(0.8);

/// Score above which the recommendation is [`Recommendation::Review`]
pub const REVIEW_THRESHOLD: Decimal = dec!(0.5);

/// Transaction fields the scorer looks at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAttributes {
    /// Amount in the caller's currency unit
    pub amount: Decimal,

    /// ISO currency code
    pub currency: String,

    /// Payer email
    pub email: String,
}

/// Signal that contributed to a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    /// Amount above the high threshold
    HighAmount,
    /// Amount above the mid threshold
    ElevatedAmount,
    /// Email on the disposable-domain denylist
    DisposableEmailDomain,
    /// Loopback or private client address
    PrivateNetworkAddress,
    /// Too many recent requests from the client
    HighVelocity,
    /// Outside normal hours
    OffHours,
}

/// Risk level
///
/// Uses its own thresholds, independent of [`Recommendation`]: a score of
/// 0.75 is high risk but only flagged for review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Low risk
    Low,
    /// Medium risk
    Medium,
    /// High risk
    High,
}

impl RiskLevel {
    /// Level for a clamped score
    pub fn from_score(score: Decimal) -> Self {
        if score > HIGH_LEVEL_THRESHOLD {
            RiskLevel::High
        } else if score > MEDIUM_LEVEL_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// What the caller should do with the payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Proceed
    Approve,
    /// Hold for manual review
    Review,
    /// Refuse
    Block,
}

impl Recommendation {
    /// Recommendation for a clamped score
    pub fn from_score(score: Decimal) -> Self {
        if score > BLOCK_THRESHOLD {
            Recommendation::Block
        } else if score > REVIEW_THRESHOLD {
            Recommendation::Review
        } else {
            Recommendation::Approve
        }
    }
}

/// Risk assessment result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Score in [0, 1]
    pub score: f64,

    /// Signals that contributed
    pub factors: BTreeSet<RiskFactor>,

    /// Risk level
    pub level: RiskLevel,

    /// Recommendation
    pub recommendation: Recommendation,

    /// Assessment timestamp
    pub assessed_at: DateTime<Utc>,
}
