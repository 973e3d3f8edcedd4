//! Monetary amounts for display.
//!
//! Values are stored and summed as [`Decimal`]; `Amount` only adds the
//! grouped rendering used in tables, exports and chart labels.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A decimal amount rendered with thousands separators and two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(pub Decimal);

impl Amount {
    /// Wrap a decimal.
    #[must_use]
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// The underlying decimal.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Grouped rendering, e.g. `-1,234,567.80`.
    #[must_use]
    pub fn grouped(self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let plain = format!("{:.2}", rounded.abs());
        let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        if negative {
            format!("-{grouped}.{frac_part}")
        } else {
            format!("{grouped}.{frac_part}")
        }
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.grouped())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(s: &str) -> Amount {
        Amount(s.parse().unwrap_or_default())
    }

    #[test]
    fn test_grouped_formatting() {
        assert_eq!(amount("0").grouped(), "0.00");
        assert_eq!(amount("12.5").grouped(), "12.50");
        assert_eq!(amount("999").grouped(), "999.00");
        assert_eq!(amount("1000").grouped(), "1,000.00");
        assert_eq!(amount("1234567.891").grouped(), "1,234,567.89");
        assert_eq!(amount("-1234.5").grouped(), "-1,234.50");
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        assert_eq!(amount("0.005").grouped(), "0.01");
        assert_eq!(amount("-0.005").grouped(), "-0.01");
        assert_eq!(amount("-0.001").grouped(), "0.00");
    }
}
