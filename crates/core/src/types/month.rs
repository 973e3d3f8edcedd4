//! Calendar month of a financial record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a month cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid month: {0}")]
pub struct MonthError(pub String);

const NAMES: [(&str, &str, &str); 12] = [
    ("Jan", "january", "januari"),
    ("Feb", "february", "februari"),
    ("Mar", "march", "maret"),
    ("Apr", "april", "april"),
    ("May", "may", "mei"),
    ("Jun", "june", "juni"),
    ("Jul", "july", "juli"),
    ("Aug", "august", "agustus"),
    ("Sep", "september", "september"),
    ("Oct", "october", "oktober"),
    ("Nov", "november", "november"),
    ("Dec", "december", "desember"),
];

/// A month number in `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Month(u8);

impl Month {
    /// Build a month from its number.
    ///
    /// # Errors
    ///
    /// Returns [`MonthError`] unless `number` is in `1..=12`.
    pub fn new(number: u8) -> Result<Self, MonthError> {
        if (1..=12).contains(&number) {
            Ok(Self(number))
        } else {
            Err(MonthError(number.to_string()))
        }
    }

    /// Month number, 1-based.
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Zero-based index, handy for monthly buckets.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// Three-letter English abbreviation.
    #[must_use]
    pub fn short_name(self) -> &'static str {
        NAMES.get(self.index()).map_or("?", |n| n.0)
    }

    /// All twelve months in calendar order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=12).map(Self)
    }

    /// Interpret a spreadsheet number cell (e.g. `3.0`).
    ///
    /// # Errors
    ///
    /// Returns [`MonthError`] for fractional or out-of-range values.
    pub fn from_number(value: f64) -> Result<Self, MonthError> {
        if value.fract() != 0.0 || !(1.0..=12.0).contains(&value) {
            return Err(MonthError(value.to_string()));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range checked above
        Self::new(value as u8)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for Month {
    type Err = MonthError;

    /// Accepts `3`, `"03"`, `"Mar"`, `"March"`, `"Maret"` (any case).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(number) = trimmed.parse::<u8>() {
            return Self::new(number);
        }
        if let Ok(number) = trimmed.parse::<f64>() {
            return Self::from_number(number);
        }

        let lower = trimmed.to_lowercase();
        NAMES
            .iter()
            .position(|(short, en, id)| {
                lower == short.to_lowercase() || lower == *en || lower == *id
            })
            .and_then(|idx| u8::try_from(idx + 1).ok())
            .map(Self)
            .ok_or_else(|| MonthError(trimmed.to_owned()))
    }
}

impl TryFrom<u8> for Month {
    type Error = MonthError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Month> for u8 {
    fn from(month: Month) -> Self {
        month.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_month_range() {
        assert!(Month::new(0).is_err());
        assert!(Month::new(13).is_err());
        assert_eq!(Month::new(12).unwrap().index(), 11);
    }

    #[test]
    fn test_month_parses_numbers_and_names() {
        assert_eq!("3".parse::<Month>().unwrap().number(), 3);
        assert_eq!("03".parse::<Month>().unwrap().number(), 3);
        assert_eq!("3.0".parse::<Month>().unwrap().number(), 3);
        assert_eq!("mar".parse::<Month>().unwrap().number(), 3);
        assert_eq!("March".parse::<Month>().unwrap().number(), 3);
        assert_eq!("MARET".parse::<Month>().unwrap().number(), 3);
        assert_eq!("Agustus".parse::<Month>().unwrap().number(), 8);
        assert!("Smarch".parse::<Month>().is_err());
        assert!("2.5".parse::<Month>().is_err());
    }

    #[test]
    fn test_from_number_rejects_fractions() {
        assert_eq!(Month::from_number(7.0).unwrap().number(), 7);
        assert!(Month::from_number(7.5).is_err());
        assert!(Month::from_number(-1.0).is_err());
    }

    #[test]
    fn test_all_months_in_order() {
        let names: Vec<_> = Month::all().map(Month::short_name).collect();
        assert_eq!(names.len(), 12);
        assert_eq!(names.first(), Some(&"Jan"));
        assert_eq!(names.last(), Some(&"Dec"));
    }

    #[test]
    fn test_serde_uses_number() {
        let month: Month = serde_json::from_str("5").unwrap();
        assert_eq!(month.to_string(), "May");
        assert!(serde_json::from_str::<Month>("13").is_err());
    }
}
