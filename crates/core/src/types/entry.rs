//! Debit/credit marker on a unit data row.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type of a transaction row.
///
/// Source spreadsheets mark expenses as `Debit` and leave anything else
/// (`Credit`, `CR`, `K`) for revenue, so parsing is lenient: only the debit
/// spellings map to [`EntryType::Debit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "dashboard.entry_type", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Expense side.
    #[default]
    Debit,
    /// Revenue side.
    Credit,
}

impl EntryType {
    /// Parse a spreadsheet cell. Blank cells default to `Debit`.
    #[must_use]
    pub fn from_cell(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "" | "debit" | "d" | "dr" | "debet" => Self::Debit,
            _ => Self::Credit,
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Debit => "Debit",
            Self::Credit => "Credit",
        }
    }

    /// Whether this row counts towards expenses.
    #[must_use]
    pub const fn is_expense(self) -> bool {
        matches!(self, Self::Debit)
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cell_debit_spellings() {
        for cell in ["Debit", "DEBIT", " d ", "Dr", "debet", ""] {
            assert_eq!(EntryType::from_cell(cell), EntryType::Debit, "{cell:?}");
        }
    }

    #[test]
    fn test_from_cell_everything_else_is_credit() {
        for cell in ["Credit", "CR", "K", "kredit", "other"] {
            assert_eq!(EntryType::from_cell(cell), EntryType::Credit, "{cell:?}");
        }
    }

    #[test]
    fn test_is_expense() {
        assert!(EntryType::Debit.is_expense());
        assert!(!EntryType::Credit.is_expense());
    }
}
