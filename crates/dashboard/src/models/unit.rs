//! Business unit domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use finboard_core::UnitId;

/// An organisational division that financial data is tracked against.
#[derive(Debug, Clone, Serialize)]
pub struct Unit {
    /// Unit ID.
    pub id: UnitId,
    /// Display name (unique, case-insensitive).
    pub name: String,
    /// When the unit was created.
    pub created_at: DateTime<Utc>,
    /// When the unit was last renamed.
    pub updated_at: DateTime<Utc>,
}

/// A unit together with the number of users assigned to it.
#[derive(Debug, Clone)]
pub struct UnitWithUsage {
    /// The unit.
    pub unit: Unit,
    /// Number of users that have this unit assigned.
    pub user_count: i64,
}
