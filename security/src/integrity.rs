//! Transaction integrity hashes

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

/// SHA-256 over amount, currency, email, timestamp and salt; lower-case hex
///
/// Stored alongside the transaction so later tampering with those fields is
/// detectable. The timestamp is rendered as RFC 3339 with microseconds.
pub fn security_hash(
    amount: Decimal,
    currency: &str,
    email: &str,
    timestamp: DateTime<Utc>,
    salt: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(amount.normalize().to_string().as_bytes());
    hasher.update(currency.as_bytes());
    hasher.update(email.as_bytes());
    hasher.update(timestamp.to_rfc3339_opts(SecondsFormat::Micros, true).as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}
