//! Price normalization for heterogeneous catalog data.
//!
//! The catalog store is hand-maintained and stores prices inconsistently:
//! some rows carry a number, others a formatted string such as `"19,99 €"`.
//! [`Price::parse_lenient`] folds all of those into a non-negative
//! [`Decimal`], defaulting to zero when nothing parseable remains.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A non-negative price in EUR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount, clamping negatives to zero.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        if amount.is_sign_negative() {
            Self(Decimal::ZERO)
        } else {
            Self(amount)
        }
    }

    /// Parse a price from a raw catalog value.
    ///
    /// Accepts a JSON number or a string. Strings are stripped of everything
    /// except digits, `.` and `,` (a decimal comma becomes a decimal point).
    /// Anything unparseable, including nulls, normalizes to zero.
    #[must_use]
    pub fn parse_lenient(raw: &serde_json::Value) -> Self {
        match raw {
            serde_json::Value::Number(n) => n
                .to_string()
                .parse::<Decimal>()
                .map_or(Self::ZERO, Self::new),
            serde_json::Value::String(s) => Self::parse_str(s),
            _ => Self::ZERO,
        }
    }

    fn parse_str(s: &str) -> Self {
        let cleaned: String = s
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
            .map(|c| if c == ',' { '.' } else { c })
            .collect();

        cleaned.parse::<Decimal>().map_or(Self::ZERO, Self::new)
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format as a fixed two-decimal string, as the payment API expects.
    #[must_use]
    pub fn to_fixed2(&self) -> String {
        format!("{:.2}", self.0)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}
