//! Card field validation
//!
//! Stateless checks on raw card fields:
//! - Card number: digits only, 13-19 long, Luhn checksum, issuer prefix
//! - Expiry month/year against the current month
//! - CVV length for the detected brand
//!
//! Clear card numbers and CVVs never leave this module; callers get a
//! [`CardClassification`] with a masked number.

use crate::error::{ValidationError, ValidationResult};
use crate::input_sanitizer::sanitize;
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shortest accepted card number
pub const MIN_CARD_DIGITS: usize = 13;

/// Longest accepted card number
pub const MAX_CARD_DIGITS: usize = 19;

/// Card issuer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardBrand {
    /// Visa
    Visa,
    /// Mastercard
    Mastercard,
    /// American Express
    Amex,
    /// Discover
    Discover,
    /// No prefix rule matched
    Unknown,
}

impl CardBrand {
    /// Lower-case brand name
    pub fn as_str(&self) -> &'static str {
        match self {
            CardBrand::Visa => "visa",
            CardBrand::Mastercard => "mastercard",
            CardBrand::Amex => "amex",
            CardBrand::Discover => "discover",
            CardBrand::Unknown => "unknown",
        }
    }

    /// Required CVV length
    pub fn cvv_length(&self) -> usize {
        match self {
            CardBrand::Amex => 4,
            _ => 3,
        }
    }
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numbers whose leading `width` digits fall in `low..=high` belong to `brand`.
struct PrefixRule {
    width: usize,
    low: u32,
    high: u32,
    brand: CardBrand,
}

impl PrefixRule {
    const fn new(width: usize, low: u32, high: u32, brand: CardBrand) -> Self {
        Self {
            width,
            low,
            high,
            brand,
        }
    }

    fn matches(&self, digits: &str) -> bool {
        digits
            .get(..self.width)
            .and_then(|prefix| prefix.parse::<u32>().ok())
            .map_or(false, |prefix| (self.low..=self.high).contains(&prefix))
    }
}

/// Evaluated top to bottom; first match wins.
const BRAND_TABLE: &[PrefixRule] = &[
    PrefixRule::new(1, 4, 4, CardBrand::Visa),
    PrefixRule::new(2, 51, 55, CardBrand::Mastercard),
    PrefixRule::new(2, 34, 34, CardBrand::Amex),
    PrefixRule::new(2, 37, 37, CardBrand::Amex),
    PrefixRule::new(4, 6011, 6011, CardBrand::Discover),
    PrefixRule::new(3, 644, 649, CardBrand::Discover),
    PrefixRule::new(2, 65, 65, CardBrand::Discover),
];

/// Classify the issuer of a digits-only card number
pub fn detect_brand(digits: &str) -> CardBrand {
    BRAND_TABLE
        .iter()
        .find(|rule| rule.matches(digits))
        .map_or(CardBrand::Unknown, |rule| rule.brand)
}

/// Luhn checksum of a digit string; valid numbers return `Some(0)`
///
/// `None` when the input contains anything but ASCII digits.
pub fn luhn_checksum(digits: &str) -> Option<u32> {
    let mut sum = 0u32;
    for (position, c) in digits.chars().rev().enumerate() {
        let digit = c.to_digit(10)?;
        sum += if position % 2 == 1 {
            let doubled = digit * 2;
            if doubled > 9 {
                doubled - 9
            } else {
                doubled
            }
        } else {
            digit
        };
    }

    Some(sum % 10)
}

/// Validated card number, safe to log and return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardClassification {
    /// Detected issuer
    pub brand: CardBrand,

    /// Number with all but the last four digits replaced by `*`
    pub masked_number: String,

    /// Last four digits
    pub last_four: String,
}

/// Validate a raw card number
///
/// Spaces and dashes are stripped first.
pub fn validate_card_number(raw: &str) -> ValidationResult<CardClassification> {
    let digits: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::Format(
            "card number must contain only digits".to_string(),
        ));
    }

    if !(MIN_CARD_DIGITS..=MAX_CARD_DIGITS).contains(&digits.len()) {
        return Err(ValidationError::Format(format!(
            "card number must be {}-{} digits, got {}",
            MIN_CARD_DIGITS,
            MAX_CARD_DIGITS,
            digits.len()
        )));
    }

    if luhn_checksum(&digits) != Some(0) {
        return Err(ValidationError::Checksum(
            "card number failed the Luhn check".to_string(),
        ));
    }

    let split = digits.len() - 4;
    let last_four = digits[split..].to_string();

    Ok(CardClassification {
        brand: detect_brand(&digits),
        masked_number: format!("{}{}", "*".repeat(split), last_four),
        last_four,
    })
}

/// Card expiry (month 1-12, four-digit year)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryDate {
    /// Month, 1-12
    pub month: u32,
    /// Year
    pub year: i32,
}

/// Validate an expiry against the current UTC month
pub fn validate_expiry(month: &str, year: &str) -> ValidationResult<ExpiryDate> {
    validate_expiry_on(month, year, Utc::now().date_naive())
}

/// Validate an expiry against an explicit date
///
/// A card stays valid through its whole expiry month.
pub fn validate_expiry_on(month: &str, year: &str, today: NaiveDate) -> ValidationResult<ExpiryDate> {
    let month = parse_integer(month)
        .ok_or_else(|| ValidationError::Format(format!("invalid expiry month: {:?}", month)))?;
    let year = parse_integer(year)
        .ok_or_else(|| ValidationError::Format(format!("invalid expiry year: {:?}", year)))?;

    if !(1..=12).contains(&month) {
        return Err(ValidationError::Range(format!(
            "expiry month must be 1-12, got {}",
            month
        )));
    }
    let month = month as u32;

    let year = i32::try_from(year)
        .map_err(|_| ValidationError::Range(format!("expiry year out of range: {}", year)))?;

    if (year, month) < (today.year(), today.month()) {
        return Err(ValidationError::Expired(format!(
            "card expired {:02}/{}",
            month, year
        )));
    }

    Ok(ExpiryDate { month, year })
}

/// Optional `-` followed by ASCII digits. Values too large for `i64`
/// saturate, so they still fail the range check rather than the format one.
fn parse_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(match raw.parse::<i64>() {
        Ok(value) => value,
        Err(_) if negative => i64::MIN,
        Err(_) => i64::MAX,
    })
}

/// Validate a CVV for the given brand
pub fn validate_cvv(cvv: &str, brand: CardBrand) -> ValidationResult<()> {
    if cvv.is_empty() || !cvv.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::Format(
            "CVV must contain only digits".to_string(),
        ));
    }

    let expected = brand.cvv_length();
    if cvv.len() != expected {
        return Err(ValidationError::Length {
            expected,
            actual: cvv.len(),
        });
    }

    Ok(())
}

/// Raw card fields as submitted by a client
#[derive(Clone, Deserialize)]
pub struct CardDetails {
    /// Card number, spaces and dashes allowed
    pub number: String,
    /// Expiry month
    pub expiry_month: String,
    /// Expiry year
    pub expiry_year: String,
    /// Card verification value
    pub cvv: String,
    /// Name printed on the card
    pub cardholder_name: String,
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &"[redacted]")
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field("cvv", &"[redacted]")
            .field("cardholder_name", &self.cardholder_name)
            .finish()
    }
}

/// Card that passed every check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedCard {
    /// Brand and masked number
    pub classification: CardClassification,
    /// Expiry
    pub expiry: ExpiryDate,
    /// Sanitized cardholder name
    pub cardholder_name: String,
}

/// Run every card check against the current UTC month
pub fn validate_card(details: &CardDetails) -> ValidationResult<ValidatedCard> {
    validate_card_on(details, Utc::now().date_naive())
}

/// Run every card check against an explicit date
///
/// Order: number, expiry, CVV (against the detected brand), cardholder name.
pub fn validate_card_on(details: &CardDetails, today: NaiveDate) -> ValidationResult<ValidatedCard> {
    let classification = validate_card_number(&details.number)?;
    let expiry = validate_expiry_on(&details.expiry_month, &details.expiry_year, today)?;
    validate_cvv(&details.cvv, classification.brand)?;

    let cardholder_name = sanitize(&details.cardholder_name);
    if cardholder_name.is_empty() {
        return Err(ValidationError::Format(
            "cardholder name is empty after sanitization".to_string(),
        ));
    }

    Ok(ValidatedCard {
        classification,
        expiry,
        cardholder_name,
    })
}
