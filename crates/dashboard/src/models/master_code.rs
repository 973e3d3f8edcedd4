//! Master code domain types.
//!
//! The master code table maps raw account codes to the categories used in
//! reports. Unit data uploads fall back to it when a row has no category.

use serde::Serialize;

use finboard_core::MasterCodeId;

/// A master code row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MasterCode {
    /// Row ID.
    pub id: MasterCodeId,
    /// Account code (unique).
    pub account_code: String,
    /// Reporting category.
    pub category: String,
    /// Account name.
    pub account_name: String,
    /// Free-form description.
    pub description: Option<String>,
}

/// Input for creating or updating a master code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterCodeInput {
    pub account_code: String,
    pub category: String,
    pub account_name: String,
    pub description: Option<String>,
}
