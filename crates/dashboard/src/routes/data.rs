//! Unit data pages: the per-unit, per-year table, uploads and edits.

use std::collections::HashMap;

use askama::Template;
use axum::{
    Form,
    extract::{Multipart, Path, Query, State},
    response::{Html, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use finboard_core::{Amount, EntryType, Month, UnitDataItemId, UnitId};

use crate::components::Flash;
use crate::components::data_table::{DataTableConfig, unit_data_table_config};
use crate::db::{MasterCodeRepository, UnitDataRepository};
use crate::error::AppError;
use crate::filters;
use crate::i18n::MessageKey;
use crate::middleware::{RequireAuth, RequireDataEditor, RequireRole};
use crate::models::{CurrentUser, Unit, UnitDataFilter, UnitDataItem, UnitDataUpdate};
use crate::services::export::{Sheet, to_csv, to_xlsx, unit_data_sheet};
use crate::services::import::{parse_amount, parse_unit_data_rows, read_workbook};
use crate::services::{ImportOutcome, summarize};
use crate::state::AppState;

use super::scope::{
    ScopeQuery, UnitOption, YEAR_RANGE, YearOption, ensure_visible, pick_unit, pick_year,
    unit_options, visible_units, year_options,
};
use super::upload::{import_failure_flash, import_success_flash, read_upload};
use super::{
    CSV_CONTENT_TYPE, PageContext, XLSX_CONTENT_TYPE, download, empty_string_as_none, non_blank,
    redirect_with, render,
};

/// Uploads listed under the table.
const RECENT_UPLOADS: i64 = 10;

/// Unit data row view for templates.
#[derive(Debug, Clone)]
pub struct ItemView {
    pub id: i32,
    pub account_code: String,
    pub month_number: u8,
    pub month_name: &'static str,
    pub category: String,
    pub area: String,
    pub business_line: String,
    pub value: String,
    pub value_plain: String,
    pub entry_key: &'static str,
    pub entry_label: &'static str,
    pub is_expense: bool,
}

impl From<&UnitDataItem> for ItemView {
    fn from(item: &UnitDataItem) -> Self {
        Self {
            id: item.id.as_i32(),
            account_code: item.account_code.clone(),
            month_number: item.month.number(),
            month_name: item.month.short_name(),
            category: item.category.clone(),
            area: item.area.clone().unwrap_or_default(),
            business_line: item.business_line.clone().unwrap_or_default(),
            value: Amount::new(item.value).grouped(),
            value_plain: item.value.to_string(),
            entry_key: match item.entry_type {
                EntryType::Debit => "debit",
                EntryType::Credit => "credit",
            },
            entry_label: item.entry_type.label(),
            is_expense: item.entry_type.is_expense(),
        }
    }
}

/// Upload row view.
#[derive(Debug, Clone)]
pub struct BatchView {
    pub id: Uuid,
    pub row_count: i64,
    pub imported_at: DateTime<Utc>,
}

/// Totals of the listed rows.
#[derive(Debug, Clone)]
pub struct TotalsView {
    pub revenue: String,
    pub expenses: String,
    pub net: String,
}

/// Unit data page template.
#[derive(Template)]
#[template(path = "data/index.html")]
pub struct DataIndexTemplate {
    pub page: PageContext,
    pub table: DataTableConfig,
    pub units: Vec<UnitOption>,
    pub years: Vec<YearOption>,
    pub unit_id: Option<i32>,
    pub unit_name: String,
    pub year: i32,
    pub filter_category: String,
    pub filter_month: String,
    pub export_query: String,
    pub items: Vec<ItemView>,
    pub totals: TotalsView,
    pub batches: Vec<BatchView>,
    pub months: Vec<(u8, &'static str)>,
    pub can_upload: bool,
    pub can_edit: bool,
}

/// Form for editing one item.
#[derive(Debug, Default, Deserialize)]
pub struct ItemForm {
    #[serde(default)]
    pub account_code: String,
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub business_line: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub entry_type: String,
}

impl ItemForm {
    /// Validate the edit form.
    ///
    /// # Errors
    ///
    /// Returns `MessageKey::RequiredFieldsEmpty` if a required field is blank
    /// or the month does not parse, and `MessageKey::InvalidAmount` if the
    /// value is not a plain amount with at most two decimal places.
    pub fn validate(&self) -> Result<UnitDataUpdate, MessageKey> {
        let account_code = non_blank(&self.account_code).ok_or(MessageKey::RequiredFieldsEmpty)?;
        let category = non_blank(&self.category).ok_or(MessageKey::RequiredFieldsEmpty)?;
        let month: Month = self
            .month
            .parse()
            .map_err(|_| MessageKey::RequiredFieldsEmpty)?;
        let value = non_blank(&self.value).ok_or(MessageKey::RequiredFieldsEmpty)?;
        let value = parse_amount(&value).map_err(|_| MessageKey::InvalidAmount)?;

        Ok(UnitDataUpdate {
            account_code,
            month,
            category,
            area: non_blank(&self.area),
            business_line: non_blank(&self.business_line),
            value,
            entry_type: EntryType::from_cell(&self.entry_type),
        })
    }
}

/// Unit and year of a clear request.
#[derive(Debug, Deserialize)]
pub struct ClearForm {
    pub unit: i32,
    pub year: i32,
}

/// Resolved selection for the data page and exports.
struct DataScope {
    units: Vec<Unit>,
    unit: Option<Unit>,
    year: i32,
    years: Vec<i32>,
    filter: UnitDataFilter,
}

async fn resolve_scope(
    state: &AppState,
    user: &CurrentUser,
    query: &ScopeQuery,
) -> Result<DataScope, AppError> {
    let units = visible_units(state, user).await?;
    let unit = pick_unit(state, user, &units, query.unit)?;

    let repo = UnitDataRepository::new(state.pool());
    let years = match &unit {
        Some(unit) => repo.years_for_unit(unit.id).await?,
        None => Vec::new(),
    };
    let year = pick_year(&years, query.year);

    let filter = UnitDataFilter {
        unit_ids: unit.iter().map(|u| u.id).collect(),
        year,
        category: query.category.clone(),
        month: query.month,
    };

    Ok(DataScope {
        units,
        unit,
        year,
        years,
        filter,
    })
}

fn data_path(unit_id: UnitId, year: i32) -> String {
    format!("/data?{}", ScopeQuery::query_string(Some(unit_id), year))
}

/// Unit data page handler.
#[instrument(skip_all)]
pub async fn index(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ScopeQuery>,
) -> Result<Html<String>, AppError> {
    let scope = resolve_scope(&state, &user, &query).await?;
    let repo = UnitDataRepository::new(state.pool());

    let (items, categories, batches) = match &scope.unit {
        Some(unit) => (
            repo.list(&scope.filter).await?,
            repo.categories(unit.id, scope.year).await?,
            repo.recent_batches(&[unit.id], RECENT_UPLOADS).await?,
        ),
        None => (Vec::new(), Vec::new(), Vec::new()),
    };

    let summary = summarize(&items);
    let filter_category = query.category.clone().unwrap_or_default();
    let filter_month = query.month.map(|m| m.number().to_string()).unwrap_or_default();
    let can_edit = user.roles.can_edit_data();

    let template = DataIndexTemplate {
        page: PageContext::new(&user, "/data", &session).await,
        table: unit_data_table_config(
            &categories,
            query.category.as_deref(),
            Some(filter_month.as_str()).filter(|m| !m.is_empty()),
            can_edit,
        ),
        units: unit_options(&scope.units, scope.unit.as_ref().map(|u| u.id)),
        years: year_options(&scope.years, scope.year),
        unit_id: scope.unit.as_ref().map(|u| u.id.as_i32()),
        unit_name: scope.unit.as_ref().map(|u| u.name.clone()).unwrap_or_default(),
        year: scope.year,
        export_query: export_query(&scope, &filter_category, &filter_month),
        filter_category,
        filter_month,
        items: items.iter().map(ItemView::from).collect(),
        totals: TotalsView {
            revenue: Amount::new(summary.revenue).grouped(),
            expenses: Amount::new(summary.expenses).grouped(),
            net: Amount::new(summary.net).grouped(),
        },
        batches: batches
            .into_iter()
            .filter(|b| b.year == scope.year)
            .map(|b| BatchView {
                id: b.batch_id,
                row_count: b.row_count,
                imported_at: b.imported_at,
            })
            .collect(),
        months: Month::all().map(|m| (m.number(), m.short_name())).collect(),
        can_upload: user.roles.can_upload_data(),
        can_edit,
    };

    Ok(render(&template))
}

fn export_query(scope: &DataScope, category: &str, month: &str) -> String {
    let mut query = ScopeQuery::query_string(scope.unit.as_ref().map(|u| u.id), scope.year);
    if !category.is_empty() {
        query.push_str("&category=");
        query.push_str(&url::form_urlencoded::byte_serialize(category.as_bytes()).collect::<String>());
    }
    if !month.is_empty() {
        query.push_str("&month=");
        query.push_str(month);
    }
    query
}

/// Upload a spreadsheet of unit data for a unit and year.
///
/// The whole file is rejected if any row is invalid.
#[instrument(skip_all)]
pub async fn import(
    RequireRole(user, _): RequireDataEditor,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let upload = match read_upload(multipart, state.config().max_upload_bytes).await {
        Ok(upload) => upload,
        Err(e) => return Ok(redirect_with(&session, "/data", e.flash(&state)).await),
    };

    let unit_id = upload.field("unit").and_then(|v| v.parse::<i32>().ok());
    let year = upload
        .field("year")
        .and_then(|v| v.parse::<i32>().ok())
        .filter(|y| YEAR_RANGE.contains(y));
    let (Some(unit_id), Some(year)) = (unit_id, year) else {
        return Ok(redirect_with(
            &session,
            "/data",
            Flash::error(state.t(MessageKey::RequiredFieldsEmpty)),
        )
        .await);
    };
    let unit_id = UnitId::new(unit_id);
    ensure_visible(&state, &user, unit_id)?;
    let back = data_path(unit_id, year);

    let lookup = MasterCodeRepository::new(state.pool())
        .category_lookup()
        .await?;
    let parsed = read_workbook(&upload.bytes, &upload.file_name)
        .and_then(|rows| parse_unit_data_rows(&rows, &lookup))
        .and_then(ImportOutcome::into_result);
    let items = match parsed {
        Ok(items) => items,
        Err(e) => {
            tracing::info!(error = %e, file = %upload.file_name, unit_id = %unit_id, "Unit data import rejected");
            return Ok(redirect_with(&session, &back, import_failure_flash(&state, &e)).await);
        }
    };

    let (batch, count) = UnitDataRepository::new(state.pool())
        .insert_many(unit_id, year, &items)
        .await?;

    tracing::info!(
        unit_id = %unit_id,
        year,
        rows = count,
        batch = %batch,
        by = %user.id,
        "Unit data imported"
    );
    Ok(redirect_with(&session, &back, import_success_flash(&state, count)).await)
}

/// Load an item and check the user may edit its unit.
async fn editable_item(
    state: &AppState,
    user: &CurrentUser,
    id: i32,
) -> Result<UnitDataItem, AppError> {
    let item = UnitDataRepository::new(state.pool())
        .get_by_id(UnitDataItemId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(state.t(MessageKey::NotFound).to_string()))?;
    ensure_visible(state, user, item.unit_id)?;
    Ok(item)
}

/// Edit one item.
#[instrument(skip_all, fields(item_id = id))]
pub async fn update_item(
    RequireRole(user, _): RequireDataEditor,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<ItemForm>,
) -> Result<Redirect, AppError> {
    let item = editable_item(&state, &user, id).await?;
    let back = data_path(item.unit_id, item.year);

    let update = match form.validate() {
        Ok(update) => update,
        Err(key) => return Ok(redirect_with(&session, &back, Flash::error(state.t(key))).await),
    };

    UnitDataRepository::new(state.pool())
        .update(item.id, &update)
        .await?;
    Ok(redirect_with(&session, &back, Flash::success(state.t(MessageKey::Saved))).await)
}

/// Delete one item.
#[instrument(skip_all, fields(item_id = id))]
pub async fn delete_item(
    RequireRole(user, _): RequireDataEditor,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    let item = editable_item(&state, &user, id).await?;
    UnitDataRepository::new(state.pool()).delete(item.id).await?;
    Ok(redirect_with(
        &session,
        &data_path(item.unit_id, item.year),
        Flash::success(state.t(MessageKey::Deleted)),
    )
    .await)
}

/// Delete every row of one upload.
#[instrument(skip_all, fields(batch = %id))]
pub async fn delete_batch(
    RequireRole(user, _): RequireDataEditor,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Redirect, AppError> {
    let repo = UnitDataRepository::new(state.pool());
    let (unit_id, year) = repo
        .batch_scope(id)
        .await?
        .ok_or_else(|| AppError::NotFound(state.t(MessageKey::NotFound).to_string()))?;
    ensure_visible(&state, &user, unit_id)?;

    let removed = repo.delete_batch(id).await?;
    tracing::info!(batch = %id, rows = removed, by = %user.id, "Import batch deleted");
    Ok(redirect_with(
        &session,
        &data_path(unit_id, year),
        Flash::success(state.t(MessageKey::Deleted)),
    )
    .await)
}

/// Delete all rows of a unit and year.
#[instrument(skip_all)]
pub async fn clear(
    RequireRole(user, _): RequireDataEditor,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ClearForm>,
) -> Result<Redirect, AppError> {
    let unit_id = UnitId::new(form.unit);
    ensure_visible(&state, &user, unit_id)?;

    let removed = UnitDataRepository::new(state.pool())
        .delete_for_year(unit_id, form.year)
        .await?;
    tracing::info!(unit_id = %unit_id, year = form.year, rows = removed, by = %user.id, "Unit data cleared");
    Ok(redirect_with(
        &session,
        &data_path(unit_id, form.year),
        Flash::success(state.t(MessageKey::Cleared)),
    )
    .await)
}

async fn export_sheet(
    state: &AppState,
    user: &CurrentUser,
    query: &ScopeQuery,
) -> Result<(Sheet, String), AppError> {
    let scope = resolve_scope(state, user, query).await?;
    let Some(unit) = &scope.unit else {
        return Err(AppError::NotFound(state.t(MessageKey::NotFound).to_string()));
    };

    let items = UnitDataRepository::new(state.pool())
        .list(&scope.filter)
        .await?;
    let names: HashMap<UnitId, String> = HashMap::from([(unit.id, unit.name.clone())]);
    let title = format!("{} {}", unit.name, scope.year);
    let file_stem = format!("unit-data-{}-{}", unit.name, scope.year);
    Ok((unit_data_sheet(&title, &items, &names), file_stem))
}

/// Export the filtered rows as `.xlsx`.
#[instrument(skip_all)]
pub async fn export_xlsx(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Response, AppError> {
    let (sheet, stem) = export_sheet(&state, &user, &query).await?;
    Ok(download(to_xlsx(&sheet)?, XLSX_CONTENT_TYPE, &format!("{stem}.xlsx")))
}

/// Export the filtered rows as `.csv`.
#[instrument(skip_all)]
pub async fn export_csv(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Response, AppError> {
    let (sheet, stem) = export_sheet(&state, &user, &query).await?;
    Ok(download(to_csv(&sheet)?, CSV_CONTENT_TYPE, &format!("{stem}.csv")))
}
