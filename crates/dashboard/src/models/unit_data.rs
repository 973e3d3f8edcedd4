//! Unit data domain types.
//!
//! A unit data item is one transaction row of a unit's financial data for a
//! given year. Rows arrive in bulk from spreadsheet uploads; each upload is
//! tagged with an import batch ID so it can be removed as a whole.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use finboard_core::{EntryType, Month, UnitDataItemId, UnitId};

/// A stored unit data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitDataItem {
    pub id: UnitDataItemId,
    pub unit_id: UnitId,
    pub year: i32,
    pub account_code: String,
    pub month: Month,
    pub category: String,
    pub area: Option<String>,
    pub business_line: Option<String>,
    pub value: Decimal,
    pub entry_type: EntryType,
    /// Upload that created this row (`None` for rows entered by hand).
    pub import_batch: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A parsed row ready to be inserted for some unit and year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUnitDataItem {
    pub account_code: String,
    pub month: Month,
    pub category: String,
    pub area: Option<String>,
    pub business_line: Option<String>,
    pub value: Decimal,
    pub entry_type: EntryType,
}

/// Editable fields of an existing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDataUpdate {
    pub account_code: String,
    pub month: Month,
    pub category: String,
    pub area: Option<String>,
    pub business_line: Option<String>,
    pub value: Decimal,
    pub entry_type: EntryType,
}

/// Filter for listing unit data.
#[derive(Debug, Clone, Default)]
pub struct UnitDataFilter {
    /// Units to include. Empty means no rows.
    pub unit_ids: Vec<UnitId>,
    pub year: i32,
    pub category: Option<String>,
    pub month: Option<Month>,
}

/// Summary of one import batch for the uploads list.
#[derive(Debug, Clone)]
pub struct ImportBatchSummary {
    pub batch_id: Uuid,
    pub unit_id: UnitId,
    pub year: i32,
    pub row_count: i64,
    pub imported_at: DateTime<Utc>,
}
