//! Gate configuration
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. optional TOML file (`PAYMENT_GATE_CONFIG`, default `payment-gate.toml`)
//! 3. environment, e.g. `PAYMENT_GATE__RISK__VELOCITY_THRESHOLD=20`

use crate::error::{GateError, Result};
use config::{Config, Environment, File};
use risk_engine::RiskConfig;
use security::RateLimiterConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Config file used when `PAYMENT_GATE_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "payment-gate.toml";

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "PAYMENT_GATE_CONFIG";

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "PAYMENT_GATE";

/// Gate configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Request budgets per endpoint class
    pub rate_limits: RateLimiterConfig,

    /// Risk scoring weights and thresholds
    pub risk: RiskConfig,

    /// Hashing and tokenization secrets
    pub security: SecurityConfig,
}

/// Hashing and tokenization secrets
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Salt mixed into integrity hashes; a random one is drawn at startup
    /// when empty
    pub hash_salt: String,

    /// Hex-encoded 32-byte AES key; tokenization is off when unset
    pub token_key_hex: Option<String>,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |set: bool| if set { "[redacted]" } else { "[unset]" };
        f.debug_struct("SecurityConfig")
            .field("hash_salt", &redact(!self.hash_salt.is_empty()))
            .field("token_key_hex", &redact(self.token_key_hex.is_some()))
            .finish()
    }
}

impl GateConfig {
    /// Load from the file named by `PAYMENT_GATE_CONFIG` (or the default
    /// file) plus environment overrides
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(path)
    }

    /// Load from an explicit file plus environment overrides; a missing file
    /// is not an error
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let config: GateConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; absent sections keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GateConfig = toml::from_str(content)
            .map_err(|e| GateError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the gate cannot run with
    pub fn validate(&self) -> Result<()> {
        for class in security::EndpointClass::ALL {
            if self.rate_limits.rule(class).window_secs == 0 {
                return Err(GateError::Config(format!(
                    "rate_limits.{}.window_secs must be positive",
                    class
                )));
            }
        }

        self.risk.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use security::{EndpointClass, LimitRule};

    #[test]
    fn test_default_config() {
        let config = GateConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.rate_limits.rule(EndpointClass::PaymentProcessing),
            LimitRule::new(5, 60)
        );
        assert!(config.security.token_key_hex.is_none());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = GateConfig::from_toml_str(
            r#"
            [rate_limits.payment_processing]
            max_requests = 3
            window_secs = 120

            [risk]
            velocity_threshold = 25
            amount_weight = 0.35

            [security]
            hash_salt = "pepper"
            "#,
        )
        .unwrap();

        assert_eq!(config.rate_limits.payment_processing, LimitRule::new(3, 120));
        assert_eq!(config.rate_limits.card_validation, LimitRule::new(10, 60));
        assert_eq!(config.risk.velocity_threshold, 25);
        assert_eq!(config.risk.amount_weight, dec!(0.35));
        assert_eq!(config.risk.email_domain_weight, dec!(0.4));
        assert_eq!(config.security.hash_salt, "pepper");
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(matches!(
            GateConfig::from_toml_str("[rate_limits.general_api]\nmax_requests = 1\nwindow_secs = 0\n"),
            Err(GateError::Config(_))
        ));
        assert!(matches!(
            GateConfig::from_toml_str("risk = 3"),
            Err(GateError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("payment-gate-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[rate_limits.card_validation]\nmax_requests = 2\nwindow_secs = 30\n",
        )
        .unwrap();

        let config = GateConfig::load_from(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.rate_limits.card_validation, LimitRule::new(2, 30));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = GateConfig::load_from("/nonexistent/payment-gate.toml").unwrap();
        assert_eq!(config.rate_limits, RateLimiterConfig::default());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = SecurityConfig {
            hash_salt: "pepper".to_string(),
            token_key_hex: Some("00".repeat(32)),
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("pepper"));
        assert!(!rendered.contains("0000"));
    }
}
