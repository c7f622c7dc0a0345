//! Lenient conversion of form text into numbers.
//!
//! Deal sheets are typed by hand and re-evaluated on every keystroke, so a
//! half-typed field must read as zero rather than fail. None of these
//! functions return an error.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::types::{Money, Percent};

/// Parse a currency string such as `"$1,250,000.50"`.
///
/// Everything except digits, `.` and `-` is discarded; whatever remains must
/// be a valid decimal or the result is 0.
pub fn parse_currency(text: &str) -> Money {
    parse_stripped(text)
}

/// Parse a percentage such as `"7.5"` or `"7.5%"` into the plain value `7.5`.
pub fn parse_percent(text: &str) -> Percent {
    parse_stripped(text)
}

/// Parse a whole count (years, months). Fractions are truncated, negatives read as 0.
pub fn parse_count(text: &str) -> u32 {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || c.is_whitespace() || *c == ',')
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

/// `parse_percent`, falling back to `default` when the field reads as zero.
pub fn parse_percent_or(text: &str, default: Percent) -> Percent {
    let value = parse_percent(text);
    if value.is_zero() {
        default
    } else {
        value
    }
}

/// `parse_count`, falling back to `default` when the field reads as zero.
pub fn parse_count_or(text: &str, default: u32) -> u32 {
    match parse_count(text) {
        0 => default,
        n => n,
    }
}

fn parse_stripped(text: &str) -> Decimal {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(&cleaned).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_currency_strips_formatting() {
        assert_eq!(parse_currency("$1,250,000"), dec!(1250000));
        assert_eq!(parse_currency(" 2,200.50 "), dec!(2200.50));
        assert_eq!(parse_currency("-$500"), dec!(-500));
    }

    #[test]
    fn test_parse_currency_invalid_is_zero() {
        assert_eq!(parse_currency(""), Decimal::ZERO);
        assert_eq!(parse_currency("abc"), Decimal::ZERO);
        assert_eq!(parse_currency("1.2.3"), Decimal::ZERO);
        assert_eq!(parse_currency("5-3"), Decimal::ZERO);
    }

    #[test]
    fn test_parse_percent_is_plain_value() {
        assert_eq!(parse_percent("7.5"), dec!(7.5));
        assert_eq!(parse_percent("7.5%"), dec!(7.5));
        assert_eq!(parse_percent("25 %"), dec!(25));
        assert_eq!(parse_percent("n/a"), Decimal::ZERO);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("30"), 30);
        assert_eq!(parse_count(" 6 months"), 6);
        assert_eq!(parse_count("7.9"), 7);
        assert_eq!(parse_count("-5"), 0);
        assert_eq!(parse_count(""), 0);
    }

    #[test]
    fn test_defaults_apply_only_to_zero() {
        assert_eq!(parse_percent_or("", dec!(75)), dec!(75));
        assert_eq!(parse_percent_or("0", dec!(75)), dec!(75));
        assert_eq!(parse_percent_or("70", dec!(75)), dec!(70));
        assert_eq!(parse_count_or("", 30), 30);
        assert_eq!(parse_count_or("15", 30), 15);
    }
}
