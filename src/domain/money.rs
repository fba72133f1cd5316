use thiserror::Error;

/// Amounts are kept as integer cents in memory: 1 unit = 100 cents.
pub type Cents = i64;

/// Format cents as plain decimal text with two fraction digits.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse decimal text into cents.
///
/// Accepts `"50"`, `"12.5"`, `".50"` and a leading sign. A third or later
/// decimal digit is only accepted when it is zero; otherwise the amount cannot
/// be stored exactly and [`ParseCentsError::TooPrecise`] is returned.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseCentsError::Empty);
    }

    let invalid = || ParseCentsError::InvalidFormat(trimmed.to_string());

    let (negative, digits) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (units_str, fraction_str) = digits.split_once('.').unwrap_or((digits, ""));
    if units_str.is_empty() && fraction_str.is_empty() {
        return Err(invalid());
    }
    if !units_str.bytes().all(|b| b.is_ascii_digit())
        || !fraction_str.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| invalid())?
    };

    if fraction_str.len() > 2 && fraction_str[2..].bytes().any(|b| b != b'0') {
        return Err(ParseCentsError::TooPrecise(trimmed.to_string()));
    }

    let fraction: i64 = match fraction_str.len() {
        0 => 0,
        1 => fraction_str.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => fraction_str[..2].parse().map_err(|_| invalid())?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .ok_or_else(invalid)?;

    Ok(if negative { -cents } else { cents })
}

/// Convert cents into the value stored in the `amount REAL` column.
pub fn cents_to_real(cents: Cents) -> f64 {
    cents as f64 / 100.0
}

/// Convert a stored `amount REAL` value back into cents.
pub fn real_to_cents(amount: f64) -> Cents {
    (amount * 100.0).round() as Cents
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCentsError {
    #[error("amount is empty")]
    Empty,

    #[error("invalid money format: {0}")]
    InvalidFormat(String),

    #[error("{0} has more than two decimal places")]
    TooPrecise(String),
}
