// 💲 Price - Currency amounts as integer cents
// Catalogue prices, scale-label prices and manual prices all flow through here

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// PRICE
// ============================================================================

/// Non-negative amount with 2-decimal currency semantics.
///
/// Stored as whole cents so totals never drift. Serialized to JSON as a
/// plain number (`7.07`) to stay compatible with the list files and the
/// browser client, which both treat prices as numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(u64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("price is negative: {0}")]
    Negative(String),

    #[error("price is not a number: {0:?}")]
    Invalid(String),

    #[error("price has more than 2 decimal places: {0}")]
    TooPrecise(String),

    #[error("price is above 999999.99: {0}")]
    TooLarge(String),
}

impl Price {
    pub const ZERO: Price = Price(0);

    /// Largest accepted price, in cents. Keeps qty × price inside `i64`.
    pub const MAX_CENTS: u64 = 99_999_999;

    pub fn from_cents(cents: u64) -> Self {
        Price(cents)
    }

    pub fn cents(&self) -> u64 {
        self.0
    }

    /// Parse a decimal amount such as `"4.99"`, `"$12"`, `" .5 "`.
    ///
    /// A leading currency symbol and surrounding whitespace are tolerated.
    /// An empty string is zero (blank price cells in the item list).
    pub fn parse(input: &str) -> Result<Price, PriceError> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();

        if trimmed.is_empty() {
            return Ok(Price::ZERO);
        }
        if trimmed.starts_with('-') {
            return Err(PriceError::Negative(input.to_string()));
        }
        let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);

        let (whole, frac) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };

        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
            return Err(PriceError::Invalid(input.to_string()));
        }

        // Trailing zeros beyond the cents position carry no value ("1.500")
        let frac = frac.trim_end_matches('0');
        if frac.len() > 2 {
            return Err(PriceError::TooPrecise(input.to_string()));
        }

        let whole_value: u64 = if whole.is_empty() {
            0
        } else {
            // All digits, so a parse failure can only be overflow
            whole
                .parse()
                .map_err(|_| PriceError::TooLarge(input.to_string()))?
        };
        let frac_value: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().unwrap_or(0) * 10,
            _ => frac.parse::<u64>().unwrap_or(0),
        };

        match whole_value.checked_mul(100).and_then(|c| c.checked_add(frac_value)) {
            Some(cents) if cents <= Self::MAX_CENTS => Ok(Price(cents)),
            _ => Err(PriceError::TooLarge(input.to_string())),
        }
    }

    /// Convert a JSON/float amount, rounding to the nearest cent.
    pub fn from_f64(value: f64) -> Result<Price, PriceError> {
        if !value.is_finite() {
            return Err(PriceError::Invalid(value.to_string()));
        }
        if value < 0.0 {
            return Err(PriceError::Negative(value.to_string()));
        }
        let cents = (value * 100.0).round();
        if cents > Self::MAX_CENTS as f64 {
            return Err(PriceError::TooLarge(value.to_string()));
        }
        Ok(Price(cents as u64))
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Line total for a (possibly negative) quantity, in signed cents.
    /// Saturates at the `i64` bounds.
    pub fn times(&self, qty: i64) -> i64 {
        let total = i128::from(self.0) * i128::from(qty);
        i64::try_from(total).unwrap_or(if total < 0 { i64::MIN } else { i64::MAX })
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Price::parse(s)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Format signed cents (line totals, grand totals) as `-12.34`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

// ============================================================================
// SERDE
// ============================================================================

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriceRepr {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match PriceRepr::deserialize(deserializer)? {
            PriceRepr::Number(n) => Price::from_f64(n),
            PriceRepr::Text(s) => Price::parse(&s),
        }
        .map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// TESTS
// ============================================================================
