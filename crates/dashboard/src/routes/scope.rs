//! Unit and year selection shared by the data and report pages.
//!
//! A request may name a unit and a year. The unit must be one the user can
//! see; without one the first visible unit is used. Without a year the
//! latest year with data is used, falling back to the current year.

use chrono::Datelike;
use serde::Deserialize;

use finboard_core::{Month, UnitId};

use crate::db::UnitRepository;
use crate::error::AppError;
use crate::i18n::MessageKey;
use crate::models::{CurrentUser, Unit};
use crate::state::AppState;

use super::empty_string_as_none;

/// Query parameters selecting a unit, year and optional filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopeQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub unit: Option<i32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub month: Option<Month>,
}

impl ScopeQuery {
    /// Query string that reselects `unit` and `year`.
    #[must_use]
    pub fn query_string(unit: Option<UnitId>, year: i32) -> String {
        match unit {
            Some(unit) => format!("unit={unit}&year={year}"),
            None => format!("year={year}"),
        }
    }
}

/// Option in a unit selector.
#[derive(Debug, Clone)]
pub struct UnitOption {
    pub id: i32,
    pub name: String,
    pub selected: bool,
}

/// Option in a year selector.
#[derive(Debug, Clone)]
pub struct YearOption {
    pub year: i32,
    pub selected: bool,
}

/// Units the user can see, in name order.
///
/// # Errors
///
/// Returns `AppError::Database` if the units cannot be loaded.
pub async fn visible_units(state: &AppState, user: &CurrentUser) -> Result<Vec<Unit>, AppError> {
    let units = UnitRepository::new(state.pool()).list_all().await?;
    Ok(user.visible_units(units))
}

/// Resolve the requested unit among `visible`.
///
/// # Errors
///
/// Returns `AppError::Forbidden` if the user may not see the requested unit
/// and `AppError::NotFound` if it is not among the units at all.
pub fn pick_unit(
    state: &AppState,
    user: &CurrentUser,
    visible: &[Unit],
    requested: Option<i32>,
) -> Result<Option<Unit>, AppError> {
    match requested {
        None => Ok(visible.first().cloned()),
        Some(id) => {
            let id = UnitId::new(id);
            if !user.can_see_unit(id) {
                return Err(AppError::Forbidden(state.t(MessageKey::Forbidden).to_string()));
            }
            visible
                .iter()
                .find(|u| u.id == id)
                .cloned()
                .map(Some)
                .ok_or_else(|| AppError::NotFound(state.t(MessageKey::NotFound).to_string()))
        }
    }
}

/// Check that `unit_id` is visible to `user`.
///
/// # Errors
///
/// Returns `AppError::Forbidden` otherwise.
pub fn ensure_visible(state: &AppState, user: &CurrentUser, unit_id: UnitId) -> Result<(), AppError> {
    if user.can_see_unit(unit_id) {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.id, unit_id = %unit_id, "Unit outside user's scope");
        Err(AppError::Forbidden(state.t(MessageKey::Forbidden).to_string()))
    }
}

/// The requested year, else the latest of `years`, else the current year.
#[must_use]
pub fn pick_year(years: &[i32], requested: Option<i32>) -> i32 {
    requested
        .or_else(|| years.iter().copied().max())
        .unwrap_or_else(|| chrono::Utc::now().year())
}

/// Year options: the years with data plus the selected year, newest first.
#[must_use]
pub fn year_options(years: &[i32], selected: i32) -> Vec<YearOption> {
    let mut all: Vec<i32> = years.to_vec();
    if !all.contains(&selected) {
        all.push(selected);
    }
    all.sort_unstable_by(|a, b| b.cmp(a));
    all.into_iter()
        .map(|year| YearOption {
            year,
            selected: year == selected,
        })
        .collect()
}

/// Unit options with `selected` marked.
#[must_use]
pub fn unit_options(units: &[Unit], selected: Option<UnitId>) -> Vec<UnitOption> {
    units
        .iter()
        .map(|u| UnitOption {
            id: u.id.as_i32(),
            name: u.name.clone(),
            selected: Some(u.id) == selected,
        })
        .collect()
}

/// Years accepted on upload and in filters.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 2000..=2100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_year_prefers_request_then_latest() {
        assert_eq!(pick_year(&[2022, 2024, 2023], Some(2021)), 2021);
        assert_eq!(pick_year(&[2022, 2024, 2023], None), 2024);
        assert_eq!(pick_year(&[], None), chrono::Utc::now().year());
    }

    #[test]
    fn test_year_options_include_selected() {
        let options = year_options(&[2023, 2024], 2025);
        let years: Vec<i32> = options.iter().map(|o| o.year).collect();
        assert_eq!(years, vec![2025, 2024, 2023]);
        assert!(options.first().is_some_and(|o| o.selected));
    }

    #[test]
    fn test_query_string() {
        assert_eq!(
            ScopeQuery::query_string(Some(UnitId::new(4)), 2024),
            "unit=4&year=2024"
        );
        assert_eq!(ScopeQuery::query_string(None, 2024), "year=2024");
    }
}
