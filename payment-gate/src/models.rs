//! Gate request and decision types

use chrono::{DateTime, Utc};
use risk_engine::{Recommendation, RiskAssessment};
use rust_decimal::Decimal;
use security::{CardClassification, CardDetails};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment submitted to the gate
///
/// Deserialize-only: it may carry raw card fields, which are never written
/// back out.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    /// Amount in the currency's major unit
    pub amount: Decimal,

    /// ISO currency code
    pub currency: String,

    /// Payer email
    pub email: String,

    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,

    /// Client address, used as the rate limit identifier
    pub client_ip: String,

    /// Client user agent
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Raw card fields
    #[serde(default)]
    pub card: Option<CardDetails>,
}

/// What the caller should do with the payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Continue processing
    Proceed,
    /// Hold for manual review
    Review,
    /// Refuse
    Reject,
}

impl Verdict {
    /// Metric label
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Proceed => "proceed",
            Verdict::Review => "review",
            Verdict::Reject => "reject",
        }
    }
}

impl From<Recommendation> for Verdict {
    fn from(recommendation: Recommendation) -> Self {
        match recommendation {
            Recommendation::Approve => Verdict::Proceed,
            Recommendation::Review => Verdict::Review,
            Recommendation::Block => Verdict::Reject,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`PaymentGate::admit`](crate::PaymentGate::admit)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDecision {
    /// Verdict derived from the risk recommendation
    pub verdict: Verdict,

    /// Full risk assessment
    pub risk: RiskAssessment,

    /// Payment requests left in the client's current window
    pub rate_limit_remaining: u32,

    /// Validated amount
    pub amount: Decimal,

    /// Normalized currency code
    pub currency: String,

    /// Normalized email
    pub email: String,

    /// Sanitized description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Brand and masked number, when a card was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<CardClassification>,

    /// Integrity hash over amount, currency, email and decision time
    pub security_hash: String,

    /// Card token, when tokenization is enabled and the payment was not rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_token: Option<String>,

    /// Decision time
    pub decided_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_from_recommendation() {
        assert_eq!(Verdict::from(Recommendation::Approve), Verdict::Proceed);
        assert_eq!(Verdict::from(Recommendation::Review), Verdict::Review);
        assert_eq!(Verdict::from(Recommendation::Block), Verdict::Reject);
    }

    #[test]
    fn test_request_optional_fields() {
        let request: PaymentRequest = serde_json::from_str(
            r#"{"amount": "25.50", "currency": "usd", "email": "a@example.com", "client_ip": "203.0.113.9"}"#,
        )
        .unwrap();

        assert_eq!(request.amount, Decimal::new(2550, 2));
        assert!(request.description.is_none());
        assert!(request.card.is_none());
    }

    #[test]
    fn test_request_debug_hides_card_number() {
        let request: PaymentRequest = serde_json::from_str(
            r#"{
                "amount": 10,
                "currency": "USD",
                "email": "a@example.com",
                "client_ip": "203.0.113.9",
                "card": {
                    "number": "4532015112830366",
                    "expiry_month": "08",
                    "expiry_year": "2029",
                    "cvv": "123",
                    "cardholder_name": "Jane Doe"
                }
            }"#,
        )
        .unwrap();

        let rendered = format!("{:?}", request);
        assert!(!rendered.contains("4532015112830366"));
        assert!(!rendered.contains("\"123\""));
    }
}
