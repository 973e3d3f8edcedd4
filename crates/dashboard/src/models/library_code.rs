//! Library code domain types (bulk-imported reference table).

use serde::Serialize;

use finboard_core::LibraryCodeId;

/// A library code row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryCode {
    pub id: LibraryCodeId,
    pub code: String,
    pub name: String,
    pub short_name: Option<String>,
}

/// Input row for a library code import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryCodeInput {
    pub code: String,
    pub name: String,
    pub short_name: Option<String>,
}
