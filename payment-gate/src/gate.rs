//! Payment gate pipeline

use crate::error::{GateError, Result};
use crate::metrics::GateMetrics;
use crate::models::{GateDecision, PaymentRequest, Verdict};
use crate::settings::GateConfig;
use risk_engine::{RiskScorer, TransactionAttributes};
use security::card_validator::validate_card_on;
use security::input_sanitizer::{sanitize, validate_amount, validate_currency, validate_email};
use security::integrity::security_hash;
use security::{
    CardClassification, CardDetails, Clock, EndpointClass, PaymentTokenizer, RateLimiter,
    SystemClock, TokenPayload,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Admissions between sweeps of idle rate limit entries
pub const PURGE_INTERVAL: u64 = 1024;

/// Payment gate
///
/// Owns the one rate limiter of the process. Handlers that need their own
/// budget checks take it from [`limiter`](Self::limiter) rather than building
/// another.
#[derive(Debug)]
pub struct PaymentGate {
    limiter: Arc<RateLimiter>,
    scorer: RiskScorer,
    tokenizer: Option<PaymentTokenizer>,
    clock: Arc<dyn Clock>,
    hash_salt: String,
    metrics: GateMetrics,
    admissions: AtomicU64,
}

impl PaymentGate {
    /// Build a gate on the system clock
    pub fn new(config: GateConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Build a gate on an explicit clock
    pub fn with_clock(config: GateConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let GateConfig {
            rate_limits,
            risk,
            security: secrets,
        } = config;

        let limiter = Arc::new(RateLimiter::with_clock(rate_limits, Arc::clone(&clock)));
        let scorer = RiskScorer::new(risk)?;

        let tokenizer = secrets
            .token_key_hex
            .as_deref()
            .map(PaymentTokenizer::from_hex_key)
            .transpose()?;

        let hash_salt = if secrets.hash_salt.is_empty() {
            warn!("No hash salt configured, using a random one; integrity hashes will not survive a restart");
            Uuid::new_v4().simple().to_string()
        } else {
            secrets.hash_salt
        };

        info!(
            tokenization = tokenizer.is_some(),
            "Payment gate initialized"
        );

        Ok(Self {
            limiter,
            scorer,
            tokenizer,
            clock,
            hash_salt,
            metrics: GateMetrics::new()?,
            admissions: AtomicU64::new(0),
        })
    }

    /// Shared rate limiter handle
    pub fn limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }

    /// Gate metrics
    pub fn metrics(&self) -> &GateMetrics {
        &self.metrics
    }

    /// Open a token issued by this gate
    pub fn detokenize(&self, token: &str) -> Result<TokenPayload> {
        let tokenizer = self
            .tokenizer
            .as_ref()
            .ok_or_else(|| GateError::Tokenization("tokenization is not configured".to_string()))?;
        Ok(tokenizer.detokenize(token)?)
    }

    /// Run a payment through the full pipeline
    ///
    /// Rate limit, field validation, card checks, risk scoring, then the
    /// integrity hash and card token. The first failure is returned as is.
    ///
    /// Every [`PURGE_INTERVAL`] admissions the limiter drops clients whose
    /// windows have emptied, so the client map does not grow without bound.
    pub fn admit(&self, request: &PaymentRequest) -> Result<GateDecision> {
        let admitted = self.admissions.fetch_add(1, Ordering::Relaxed) + 1;
        if admitted % PURGE_INTERVAL == 0 {
            self.limiter.purge_idle();
        }

        let result = self.evaluate(request);
        match &result {
            Ok(decision) => self
                .metrics
                .record_decision(decision.verdict, decision.risk.score),
            Err(err) => {
                self.metrics.record_error(err);
                warn!(
                    client_ip = %request.client_ip,
                    reason = err.code(),
                    error = %err,
                    "Payment refused"
                );
            }
        }
        result
    }

    /// Validate a card on its own, under the card validation budget
    pub fn check_card(&self, client_ip: &str, details: &CardDetails) -> Result<CardClassification> {
        let result = self
            .limiter
            .enforce(client_ip, EndpointClass::CardValidation)
            .map_err(GateError::from)
            .and_then(|_| {
                let today = self.clock.utc_now().date_naive();
                Ok(validate_card_on(details, today)?.classification)
            });

        match &result {
            Ok(card) => debug!(client_ip, brand = %card.brand, masked = %card.masked_number, "Card accepted"),
            Err(err) => {
                self.metrics.record_error(err);
                warn!(client_ip, reason = err.code(), "Card refused");
            }
        }
        result
    }

    fn evaluate(&self, request: &PaymentRequest) -> Result<GateDecision> {
        let client_ip = request.client_ip.trim();
        let remaining = self
            .limiter
            .enforce(client_ip, EndpointClass::PaymentProcessing)?;

        let amount = validate_amount(request.amount)?;
        let currency = validate_currency(&request.currency)?;
        let email = validate_email(&request.email)?;
        let description = request
            .description
            .as_deref()
            .map(sanitize)
            .filter(|d| !d.is_empty());

        let now = self.clock.utc_now();
        let card = request
            .card
            .as_ref()
            .map(|details| validate_card_on(details, now.date_naive()))
            .transpose()?;

        let attrs = TransactionAttributes {
            amount,
            currency,
            email,
        };
        let risk = self.scorer.score_at(
            &attrs,
            client_ip,
            request.user_agent.as_deref(),
            self.limiter.as_ref(),
            now,
        );
        let verdict = Verdict::from(risk.recommendation);

        let payment_token = match (&self.tokenizer, &card) {
            (Some(tokenizer), Some(card)) if verdict != Verdict::Reject => {
                Some(tokenizer.tokenize(&TokenPayload::from_card(card, now))?)
            }
            _ => None,
        };

        let security_hash =
            security_hash(attrs.amount, &attrs.currency, &attrs.email, now, &self.hash_salt);

        let card = card.map(|c| c.classification);
        match verdict {
            Verdict::Reject => warn!(
                client_ip,
                score = risk.score,
                factors = ?risk.factors,
                "Payment rejected by risk scoring"
            ),
            _ => info!(
                client_ip,
                %verdict,
                score = risk.score,
                level = ?risk.level,
                card = card.as_ref().map(|c| c.masked_number.as_str()).unwrap_or("-"),
                "Payment admitted"
            ),
        }

        Ok(GateDecision {
            verdict,
            risk,
            rate_limit_remaining: remaining,
            amount: attrs.amount,
            currency: attrs.currency,
            email: attrs.email,
            description,
            card,
            security_hash,
            payment_token,
            decided_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use security::{CardBrand, MockClock, ValidationError};

    fn gate_at(hour: u32) -> (PaymentGate, MockClock) {
        let clock = MockClock::at(Utc.with_ymd_and_hms(2026, 10, 15, hour, 0, 0).unwrap());
        let mut config = GateConfig::default();
        config.security.hash_salt = "pepper".to_string();
        let gate = PaymentGate::with_clock(config, Arc::new(clock.clone())).unwrap();
        (gate, clock)
    }

    fn request(amount: rust_decimal::Decimal, email: &str) -> PaymentRequest {
        PaymentRequest {
            amount,
            currency: "usd".to_string(),
            email: email.to_string(),
            description: Some("Order #42 <script>alert(1)</script>".to_string()),
            client_ip: "203.0.113.50".to_string(),
            user_agent: Some("test-agent".to_string()),
            card: None,
        }
    }

    fn card(number: &str) -> CardDetails {
        CardDetails {
            number: number.to_string(),
            expiry_month: "08".to_string(),
            expiry_year: "2029".to_string(),
            cvv: "123".to_string(),
            cardholder_name: "Jane Doe".to_string(),
        }
    }

    #[test]
    fn test_clean_payment_proceeds() {
        let (gate, _) = gate_at(12);
        let decision = gate.admit(&request(dec!(25), " Jane@Example.com ")).unwrap();

        assert_eq!(decision.verdict, Verdict::Proceed);
        assert_eq!(decision.rate_limit_remaining, 4);
        assert_eq!(decision.currency, "USD");
        assert_eq!(decision.email, "jane@example.com");
        assert_eq!(decision.description.as_deref(), Some("Order #42"));
        assert_eq!(decision.security_hash.len(), 64);
        assert!(decision.payment_token.is_none());
    }

    #[test]
    fn test_validation_failure_keeps_reason() {
        let (gate, _) = gate_at(12);
        let mut bad = request(dec!(25), "jane@example.com");
        bad.currency = "dollars".to_string();

        let err = gate.admit(&bad).unwrap_err();
        assert!(matches!(err, GateError::Validation(ValidationError::Format(_))));
        assert_eq!(err.code(), "format_error");

        let err = gate.admit(&request(dec!(0), "jane@example.com")).unwrap_err();
        assert_eq!(err.code(), "range_error");
    }

    #[test]
    fn test_payment_budget_enforced() {
        let (gate, _) = gate_at(12);
        for _ in 0..5 {
            gate.admit(&request(dec!(25), "jane@example.com")).unwrap();
        }

        let err = gate.admit(&request(dec!(25), "jane@example.com")).unwrap_err();
        assert_eq!(err.code(), "rate_limit_exceeded");
        assert!(err.retry_after().is_some());
    }

    #[test]
    fn test_check_card() {
        let (gate, _) = gate_at(12);

        let classification = gate
            .check_card("203.0.113.60", &card("4532 0151 1283 0366"))
            .unwrap();
        assert_eq!(classification.brand, CardBrand::Visa);
        assert_eq!(classification.last_four, "0366");

        let err = gate
            .check_card("203.0.113.60", &card("4532015112830367"))
            .unwrap_err();
        assert_eq!(err.code(), "checksum_error");
    }

    #[test]
    fn test_card_and_payment_budgets_are_separate() {
        let (gate, _) = gate_at(12);
        for _ in 0..10 {
            gate.check_card("203.0.113.50", &card("4532015112830366")).unwrap();
        }
        assert_eq!(
            gate.check_card("203.0.113.50", &card("4532015112830366"))
                .unwrap_err()
                .code(),
            "rate_limit_exceeded"
        );

        assert!(gate.admit(&request(dec!(25), "jane@example.com")).is_ok());
    }

    #[test]
    fn test_idle_clients_purged_periodically() {
        let (gate, clock) = gate_at(12);
        let mut idle = request(dec!(25), "jane@example.com");
        idle.client_ip = "203.0.113.51".to_string();
        gate.admit(&idle).unwrap();

        clock.advance(std::time::Duration::from_secs(61));
        let busy = request(dec!(25), "jane@example.com");
        for _ in 1..PURGE_INTERVAL {
            let _ = gate.admit(&busy);
        }

        assert_eq!(gate.limiter().tracked_clients(), 1);
        assert_eq!(gate.limiter().velocity("203.0.113.51", std::time::Duration::from_secs(3600)), 0);
    }

    #[test]
    fn test_detokenize_without_key() {
        let (gate, _) = gate_at(12);
        assert!(matches!(gate.detokenize("00"), Err(GateError::Tokenization(_))));
    }

    #[test]
    fn test_bad_token_key_rejected() {
        let mut config = GateConfig::default();
        config.security.token_key_hex = Some("abcd".to_string());
        assert!(matches!(PaymentGate::new(config), Err(GateError::Config(_))));
    }

    #[test]
    fn test_random_salt_when_unset() {
        let gate = PaymentGate::new(GateConfig::default()).unwrap();
        assert_eq!(gate.hash_salt.len(), 32);
    }
}
