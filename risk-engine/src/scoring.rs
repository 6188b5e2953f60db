//! Risk scoring engine

use crate::{
    Recommendation, Result, RiskAssessment, RiskConfig, RiskFactor, RiskLevel,
    TransactionAttributes, VelocitySource,
};
use chrono::{DateTime, Timelike, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashSet};
use std::net::IpAddr;
use tracing::debug;

/// Half of a signal's weight
const HALF: Decimal = rust_decimal_macros::dec!(0.5);

/// Risk scorer
///
/// Stateless apart from its configuration; share freely across threads.
#[derive(Debug, Clone)]
pub struct RiskScorer {
    config: RiskConfig,
    disposable_domains: HashSet<String>,
}

impl RiskScorer {
    /// Create new risk scorer
    pub fn new(config: RiskConfig) -> Result<Self> {
        config.validate()?;

        let disposable_domains = config
            .disposable_domains
            .iter()
            .map(|d| d.trim().to_ascii_lowercase())
            .collect();

        Ok(Self {
            config,
            disposable_domains,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Score a transaction at the current time
    pub fn score(
        &self,
        attrs: &TransactionAttributes,
        client_ip: &str,
        user_agent: Option<&str>,
        velocity: &dyn VelocitySource,
    ) -> RiskAssessment {
        self.score_at(attrs, client_ip, user_agent, velocity, Utc::now())
    }

    /// Score a transaction at an explicit time
    ///
    /// Contributions are summed as decimals, so the result does not depend
    /// on the order signals are evaluated in.
    pub fn score_at(
        &self,
        attrs: &TransactionAttributes,
        client_ip: &str,
        user_agent: Option<&str>,
        velocity: &dyn VelocitySource,
        now: DateTime<Utc>,
    ) -> RiskAssessment {
        let config = &self.config;
        let mut factors = BTreeSet::new();
        let mut total = Decimal::ZERO;

        if attrs.amount > config.high_amount_threshold {
            total += config.amount_weight;
            factors.insert(RiskFactor::HighAmount);
        } else if attrs.amount > config.mid_amount_threshold {
            total += config.amount_weight * HALF;
            factors.insert(RiskFactor::ElevatedAmount);
        }

        if self.is_disposable_email(&attrs.email) {
            total += config.email_domain_weight;
            factors.insert(RiskFactor::DisposableEmailDomain);
        }

        if is_private_or_loopback(client_ip) {
            total += config.ip_weight * HALF;
            factors.insert(RiskFactor::PrivateNetworkAddress);
        }

        let recent = velocity.velocity(client_ip, config.velocity_window());
        if recent > config.velocity_threshold {
            total += config.velocity_weight;
            factors.insert(RiskFactor::HighVelocity);
        }

        if !config.is_normal_hour(now.hour()) {
            total += config.off_hours_bonus;
            factors.insert(RiskFactor::OffHours);
        }

        let score = total.clamp(Decimal::ZERO, Decimal::ONE);
        let level = RiskLevel::from_score(score);
        let recommendation = Recommendation::from_score(score);

        debug!(
            client_ip,
            user_agent = user_agent.unwrap_or("-"),
            recent_requests = recent,
            score = %score,
            ?level,
            ?recommendation,
            ?factors,
            "Risk assessed"
        );

        RiskAssessment {
            score: score.to_f64().unwrap_or(1.0),
            factors,
            level,
            recommendation,
            assessed_at: now,
        }
    }

    fn is_disposable_email(&self, email: &str) -> bool {
        email
            .rsplit_once('@')
            .map(|(_, domain)| domain.trim().to_ascii_lowercase())
            .map_or(false, |domain| self.disposable_domains.contains(&domain))
    }
}

/// Loopback or private-range address; `localhost` counts as loopback
fn is_private_or_loopback(client_ip: &str) -> bool {
    let client_ip = client_ip.trim();
    if client_ip.eq_ignore_ascii_case("localhost") {
        return true;
    }

    match client_ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4.is_loopback() || v4.is_private(),
        Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.is_loopback() || v4.is_private(),
            // fc00::/7 unique local
            None => v6.is_loopback() || (v6.segments()[0] & 0xfe00) == 0xfc00,
        },
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    struct FixedVelocity(usize);

    impl VelocitySource for FixedVelocity {
        fn velocity(&self, _identifier: &str, _window: Duration) -> usize {
            self.0
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap()
    }

    fn night() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 15, 3, 0, 0).unwrap()
    }

    fn attrs(amount: Decimal, email: &str) -> TransactionAttributes {
        TransactionAttributes {
            amount,
            currency: "USD".to_string(),
            email: email.to_string(),
        }
    }

    fn assert_score(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "score {} != {}",
            actual,
            expected
        );
    }

    fn scorer() -> RiskScorer {
        RiskScorer::new(RiskConfig::default()).unwrap()
    }

    #[test]
    fn test_clean_transaction_approved() {
        let assessment = scorer().score_at(
            &attrs(dec!(50), "jane@example.com"),
            "203.0.113.10",
            Some("Mozilla/5.0"),
            &FixedVelocity(0),
            noon(),
        );

        assert_score(assessment.score, 0.0);
        assert!(assessment.factors.is_empty());
        assert_eq!(assessment.level, RiskLevel::Low);
        assert_eq!(assessment.recommendation, Recommendation::Approve);
        assert_eq!(assessment.assessed_at, noon());
    }

    #[test]
    fn test_amount_tiers() {
        let s = scorer();
        let at = |amount| {
            s.score_at(&attrs(amount, "a@example.com"), "203.0.113.10", None, &FixedVelocity(0), noon())
        };

        assert_score(at(dec!(500)).score, 0.0);
        assert_score(at(dec!(500.01)).score, 0.15);
        assert!(at(dec!(500.01)).factors.contains(&RiskFactor::ElevatedAmount));
        assert_score(at(dec!(1000)).score, 0.15);
        assert_score(at(dec!(1000.01)).score, 0.3);
        assert!(at(dec!(1500)).factors.contains(&RiskFactor::HighAmount));
    }

    #[test]
    fn test_high_risk_combination() {
        let s = scorer();
        let daytime = s.score_at(
            &attrs(dec!(1500), "fraud@temp-mail.org"),
            "127.0.0.1",
            None,
            &FixedVelocity(0),
            noon(),
        );

        // 0.3 + 0.4 + 0.5 * 0.2
        assert_score(daytime.score, 0.8);
        assert_eq!(daytime.level, RiskLevel::High);
        assert_eq!(daytime.recommendation, Recommendation::Review);

        let overnight = s.score_at(
            &attrs(dec!(1500), "fraud@temp-mail.org"),
            "127.0.0.1",
            None,
            &FixedVelocity(0),
            night(),
        );
        assert!(overnight.score > 0.8);
        assert_eq!(overnight.level, RiskLevel::High);
        assert_eq!(overnight.recommendation, Recommendation::Block);
        assert!(overnight.factors.contains(&RiskFactor::OffHours));
    }

    #[test]
    fn test_score_is_clamped() {
        let assessment = scorer().score_at(
            &attrs(dec!(5000), "x@GuerrillaMail.com"),
            "10.1.2.3",
            None,
            &FixedVelocity(50),
            night(),
        );

        assert_score(assessment.score, 1.0);
        assert_eq!(assessment.factors.len(), 5);
        assert_eq!(assessment.recommendation, Recommendation::Block);
    }

    #[test]
    fn test_velocity_signal() {
        let s = scorer();
        let at = |count| {
            s.score_at(&attrs(dec!(10), "a@example.com"), "203.0.113.10", None, &FixedVelocity(count), noon())
        };

        assert!(at(10).factors.is_empty());
        assert_score(at(11).score, 0.2);
        assert!(at(11).factors.contains(&RiskFactor::HighVelocity));
    }

    #[test]
    fn test_email_domain_exact_match() {
        let s = scorer();
        let at = |email| {
            s.score_at(&attrs(dec!(10), email), "203.0.113.10", None, &FixedVelocity(0), noon())
        };

        assert_score(at("a@10minutemail.com").score, 0.4);
        assert_score(at("a@sub.10minutemail.com").score, 0.0);
        assert_score(at("not-an-email").score, 0.0);
    }

    #[test]
    fn test_private_addresses() {
        assert!(is_private_or_loopback("127.0.0.1"));
        assert!(is_private_or_loopback("localhost"));
        assert!(is_private_or_loopback("10.0.0.8"));
        assert!(is_private_or_loopback("172.16.4.1"));
        assert!(is_private_or_loopback("192.168.1.1"));
        assert!(is_private_or_loopback("::1"));
        assert!(is_private_or_loopback("fd00::1"));
        assert!(is_private_or_loopback("::ffff:192.168.0.1"));

        assert!(!is_private_or_loopback("8.8.8.8"));
        assert!(!is_private_or_loopback("2001:db8::1"));
        assert!(!is_private_or_loopback("garbage"));
    }

    #[test]
    fn test_scorer_reads_rate_limiter_velocity() {
        use security::{EndpointClass, RateLimiter, RateLimiterConfig};

        let limiter = RateLimiter::new(RateLimiterConfig::default());
        for _ in 0..11 {
            limiter.check("198.51.100.20", EndpointClass::GeneralApi);
        }

        let assessment = scorer().score_at(
            &attrs(dec!(10), "a@example.com"),
            "198.51.100.20",
            None,
            &limiter,
            noon(),
        );
        assert!(assessment.factors.contains(&RiskFactor::HighVelocity));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RiskConfig {
            velocity_window_secs: 0,
            ..RiskConfig::default()
        };
        assert!(RiskScorer::new(config).is_err());
    }
}
