//! Input sanitization and transaction field checks
//!
//! [`sanitize`] is best-effort denylisting for free-text fields that end up
//! in logs, receipts and processor metadata. It is not an XSS or injection
//! guarantee; output encoding stays the caller's job.

use crate::error::{ValidationError, ValidationResult};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

/// Characters removed from free text
pub const DENYLIST: [char; 12] = ['<', '>', '"', '\'', '&', ';', '(', ')', '{', '}', '[', ']'];

/// Longest accepted email address
pub const MAX_EMAIL_LENGTH: usize = 254;

lazy_static! {
    /// Whole `<script ...>...</script>` elements
    static ref SCRIPT_ELEMENT: Regex =
        Regex::new(r"(?is)<\s*script\b[^>]*>.*?<\s*/\s*script\s*>").expect("script element pattern");

    /// Stray opening or closing script tags; an unterminated `<script`
    /// is left to the denylist so the text after it survives
    static ref SCRIPT_TAG: Regex =
        Regex::new(r"(?i)<\s*/?\s*script\b[^>]*>").expect("script tag pattern");

    static ref EMAIL: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern");
}

/// Strip script tags and denylisted characters, then trim
///
/// Idempotent: the output contains no `<`, so neither script pattern can
/// match a second time.
pub fn sanitize(text: &str) -> String {
    let without_elements = SCRIPT_ELEMENT.replace_all(text, "");
    let without_tags = SCRIPT_TAG.replace_all(&without_elements, "");

    without_tags
        .chars()
        .filter(|c| !DENYLIST.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Validate and normalize an email address (trimmed, lower-cased)
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim().to_lowercase();

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::Length {
            expected: MAX_EMAIL_LENGTH,
            actual: email.len(),
        });
    }

    if !EMAIL.is_match(&email) {
        return Err(ValidationError::Format("invalid email address".to_string()));
    }

    Ok(email)
}

/// Validate a currency code (three ASCII letters), returned upper-cased
pub fn validate_currency(code: &str) -> ValidationResult<String> {
    let code = code.trim().to_uppercase();

    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::Format(format!(
            "currency code must be three letters, got {:?}",
            code
        )));
    }

    Ok(code)
}

/// Validate a payment amount (strictly positive)
pub fn validate_amount(amount: Decimal) -> ValidationResult<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::Range(format!(
            "amount must be positive, got {}",
            amount
        )));
    }

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sanitize_denylist() {
        assert_eq!(sanitize("  Hello World  "), "Hello World");
        assert_eq!(sanitize("O'Brien & Sons; (Ltd) {x} [y]"), "OBrien  Sons Ltd x y");
        assert_eq!(sanitize("say \"hi\""), "say hi");
    }

    #[test]
    fn test_sanitize_script_tags() {
        assert_eq!(sanitize("<script>alert('x')</script>Jane"), "Jane");
        assert_eq!(sanitize("Jane<SCRIPT src=evil.js></ScRiPt>"), "Jane");
        assert_eq!(
            sanitize("a<script>\nsteal()\n</script>b"),
            "ab"
        );
        // stray tag without a closing element
        assert_eq!(sanitize("x<script type=text/javascript>y"), "xy");
        assert_eq!(sanitize("x</script>y"), "xy");
    }

    #[test]
    fn test_sanitize_unterminated_script_keeps_text() {
        assert_eq!(
            sanitize("Order <script reference 42 for Jane"),
            "Order script reference 42 for Jane"
        );
        assert_eq!(sanitize("Jane Doe </script"), "Jane Doe /script");
    }

    #[test]
    fn test_sanitize_keeps_script_word() {
        assert_eq!(sanitize("manuscript"), "manuscript");
        assert_eq!(sanitize("script kiddie"), "script kiddie");
    }

    #[test]
    fn test_sanitize_idempotent() {
        for input in [
            "<script>alert(1)</script> hi ",
            " <<script>script>> ",
            "plain",
            "  ; ; ",
            "<scr<script>ipt>",
        ] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input {:?}", input);
        }
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" User@Example.COM ").unwrap(), "user@example.com");
        assert!(matches!(validate_email("invalid"), Err(ValidationError::Format(_))));
        assert!(matches!(validate_email("@example.com"), Err(ValidationError::Format(_))));

        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(validate_email(&long), Err(ValidationError::Length { .. })));
    }

    #[test]
    fn test_validate_currency() {
        assert_eq!(validate_currency("usd").unwrap(), "USD");
        assert!(validate_currency("US").is_err());
        assert!(validate_currency("US1").is_err());
        assert!(validate_currency("EURO").is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(validate_amount(dec!(10.50)).unwrap(), dec!(10.50));
        assert!(matches!(validate_amount(Decimal::ZERO), Err(ValidationError::Range(_))));
        assert!(matches!(validate_amount(dec!(-1)), Err(ValidationError::Range(_))));
    }
}
