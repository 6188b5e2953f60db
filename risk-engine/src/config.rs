//! Scoring weights and signal thresholds

use crate::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Risk scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Weight of the amount signal
    pub amount_weight: Decimal,

    /// Amounts above this score the full amount weight
    pub high_amount_threshold: Decimal,

    /// Amounts above this score half the amount weight
    pub mid_amount_threshold: Decimal,

    /// Weight of a disposable email domain
    pub email_domain_weight: Decimal,

    /// Disposable email domains (matched exactly, case-insensitive)
    pub disposable_domains: Vec<String>,

    /// Weight of the client IP signal; loopback/private scores half
    pub ip_weight: Decimal,

    /// Weight of the velocity signal
    pub velocity_weight: Decimal,

    /// Requests tolerated in the velocity window
    pub velocity_threshold: usize,

    /// Velocity lookback in seconds
    pub velocity_window_secs: u64,

    /// Flat bonus outside normal hours
    pub off_hours_bonus: Decimal,

    /// First normal hour (UTC, inclusive)
    pub normal_hours_start: u32,

    /// End of normal hours (UTC, exclusive); may wrap past midnight
    pub normal_hours_end: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            amount_weight: dec!(0.3),
            high_amount_threshold: dec!(1000),
            mid_amount_threshold: dec!(500),
            email_domain_weight: dec!(0.4),
            disposable_domains: vec![
                "temp-mail.org".to_string(),
                "10minutemail.com".to_string(),
                "guerrillamail.com".to_string(),
            ],
            ip_weight: dec!(0.2),
            velocity_weight: dec!(0.2),
            velocity_threshold: 10,
            velocity_window_secs: 3600,
            off_hours_bonus: dec!(0.1),
            normal_hours_start: 6,
            normal_hours_end: 23,
        }
    }
}

impl RiskConfig {
    /// Velocity lookback
    pub fn velocity_window(&self) -> Duration {
        Duration::from_secs(self.velocity_window_secs)
    }

    /// Whether a UTC hour falls inside normal hours
    pub fn is_normal_hour(&self, hour: u32) -> bool {
        let (start, end) = (self.normal_hours_start, self.normal_hours_end);
        if start <= end {
            (start..end).contains(&hour)
        } else {
            hour >= start || hour < end
        }
    }

    /// Reject configurations the scorer cannot apply
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("amount_weight", self.amount_weight),
            ("email_domain_weight", self.email_domain_weight),
            ("ip_weight", self.ip_weight),
            ("velocity_weight", self.velocity_weight),
            ("off_hours_bonus", self.off_hours_bonus),
        ];
        for (name, weight) in weights {
            if weight.is_sign_negative() {
                return Err(Error::InvalidConfig(format!(
                    "{} must not be negative, got {}",
                    name, weight
                )));
            }
        }

        if self.mid_amount_threshold > self.high_amount_threshold {
            return Err(Error::InvalidConfig(format!(
                "mid_amount_threshold {} exceeds high_amount_threshold {}",
                self.mid_amount_threshold, self.high_amount_threshold
            )));
        }

        if self.normal_hours_start > 23 || self.normal_hours_end > 24 {
            return Err(Error::InvalidConfig(format!(
                "normal hours {}..{} out of range",
                self.normal_hours_start, self.normal_hours_end
            )));
        }

        if self.velocity_window_secs == 0 {
            return Err(Error::InvalidConfig(
                "velocity_window_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RiskConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.velocity_window(), Duration::from_secs(3600));
    }

    #[test]
    fn test_normal_hours() {
        let config = RiskConfig::default();
        assert!(!config.is_normal_hour(3));
        assert!(config.is_normal_hour(6));
        assert!(config.is_normal_hour(22));
        assert!(!config.is_normal_hour(23));

        let night_shift = RiskConfig {
            normal_hours_start: 22,
            normal_hours_end: 6,
            ..RiskConfig::default()
        };
        assert!(night_shift.is_normal_hour(23));
        assert!(night_shift.is_normal_hour(2));
        assert!(!night_shift.is_normal_hour(12));
    }

    #[test]
    fn test_invalid_configs() {
        let negative = RiskConfig {
            ip_weight: dec!(-0.1),
            ..RiskConfig::default()
        };
        assert!(negative.validate().is_err());

        let inverted = RiskConfig {
            mid_amount_threshold: dec!(2000),
            ..RiskConfig::default()
        };
        assert!(inverted.validate().is_err());

        let hours = RiskConfig {
            normal_hours_start: 25,
            ..RiskConfig::default()
        };
        assert!(hours.validate().is_err());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: RiskConfig = serde_json::from_str(r#"{"velocity_threshold": 3}"#).unwrap();
        assert_eq!(config.velocity_threshold, 3);
        assert_eq!(config.amount_weight, dec!(0.3));
    }
}
