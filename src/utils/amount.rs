/// Money parsing for form input.
///
/// Amounts are kept as `BigDecimal` from the request string to the NUMERIC
/// column, so a budget typed as "100" comes back as exactly 100.
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};

const MAX_WHOLE_DIGITS: usize = 12;
const MAX_FRACTION_DIGITS: usize = 2;

/// Plain decimal notation only: an optional minus sign, digits and at most
/// one point. Exponents are refused so the value always fits a NUMERIC.
fn check_notation(value: &str, field: &str) -> Result<(), String> {
    let unsigned = value.strip_prefix('-').unwrap_or(value);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let digits_only = whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit());
    if !digits_only || (whole.is_empty() && fraction.is_empty()) {
        return Err(format!("{} must be a number", field));
    }
    if whole.trim_start_matches('0').len() > MAX_WHOLE_DIGITS {
        return Err(format!("{} is too large", field));
    }
    if fraction.len() > MAX_FRACTION_DIGITS {
        return Err(format!(
            "{} can have at most {} decimal places",
            field, MAX_FRACTION_DIGITS
        ));
    }
    Ok(())
}

/// Parse a required, non-negative amount.
pub fn parse_amount(value: &str, field: &str) -> Result<BigDecimal, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} is required", field));
    }
    check_notation(trimmed, field)?;
    let amount = BigDecimal::from_str(trimmed)
        .map_err(|_| format!("{} must be a number", field))?;
    if amount < BigDecimal::zero() {
        return Err(format!("{} cannot be negative", field));
    }
    Ok(amount)
}

/// Blank input means "not given".
pub fn parse_optional_amount(value: Option<&str>, field: &str) -> Result<Option<BigDecimal>, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_amount(v, field).map(Some),
    }
}

/// Parse an amount that must be strictly greater than zero (bids).
pub fn parse_positive_amount(value: &str, field: &str) -> Result<BigDecimal, String> {
    let amount = parse_amount(value, field)?;
    if amount.is_zero() {
        return Err(format!("{} must be greater than zero", field));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("100", "Budget"), Ok(BigDecimal::from(100)));
        assert_eq!(parse_amount(" 500 ", "Budget"), Ok(BigDecimal::from(500)));
        assert_eq!(parse_amount("-5", "Budget"), Err("Budget cannot be negative".to_string()));
        assert_eq!(parse_amount("abc", "Budget"), Err("Budget must be a number".to_string()));
        assert_eq!(parse_amount("", "Budget"), Err("Budget is required".to_string()));
    }

    #[test]
    fn test_exponent_notation_rejected() {
        for input in ["1e999999999", "1e-999999999", "1E3", "2.5e2"] {
            assert_eq!(
                parse_positive_amount(input, "Amount"),
                Err("Amount must be a number".to_string()),
                "{}",
                input
            );
        }
        assert!(parse_optional_amount(Some("1e999999999"), "Budget").is_err());
    }

    #[test]
    fn test_amount_bounds() {
        assert_eq!(
            parse_amount("999999999999.99", "Budget"),
            Ok(BigDecimal::from_str("999999999999.99").unwrap())
        );
        assert_eq!(parse_amount("0001500", "Budget"), Ok(BigDecimal::from(1500)));
        assert_eq!(
            parse_amount("1000000000000", "Budget"),
            Err("Budget is too large".to_string())
        );
        assert_eq!(
            parse_positive_amount("0.001", "Amount"),
            Err("Amount can have at most 2 decimal places".to_string())
        );
        assert_eq!(parse_amount(".", "Budget"), Err("Budget must be a number".to_string()));
        assert_eq!(parse_amount("1.2.3", "Budget"), Err("Budget must be a number".to_string()));
    }

    #[test]
    fn test_decimal_is_exact() {
        let amount = parse_amount("0.10", "Amount").unwrap();
        assert_eq!(amount.to_string(), "0.10");
        assert_eq!(amount, BigDecimal::from_str("0.1").unwrap());
    }

    #[test]
    fn test_parse_optional_amount() {
        assert_eq!(parse_optional_amount(None, "Budget"), Ok(None));
        assert_eq!(parse_optional_amount(Some("  "), "Budget"), Ok(None));
        assert_eq!(parse_optional_amount(Some("250"), "Budget"), Ok(Some(BigDecimal::from(250))));
        assert!(parse_optional_amount(Some("NaN"), "Budget").is_err());
    }

    #[test]
    fn test_parse_positive_amount() {
        assert_eq!(parse_positive_amount("200", "Amount"), Ok(BigDecimal::from(200)));
        assert_eq!(parse_positive_amount("0", "Amount"), Err("Amount must be greater than zero".to_string()));
        assert_eq!(parse_positive_amount("-5", "Amount"), Err("Amount cannot be negative".to_string()));
        assert_eq!(parse_positive_amount("abc", "Amount"), Err("Amount must be a number".to_string()));
    }
}
