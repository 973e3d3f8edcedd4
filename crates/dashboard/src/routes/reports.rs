//! Aggregated reports: monthly pivot, totals, charts and exports.

use std::collections::HashMap;

use askama::Template;
use axum::{
    Json,
    extract::{Query, State},
    response::{Html, Response},
};
use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;

use finboard_core::{Amount, Month, UnitId};

use crate::db::UnitDataRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, Unit, UnitDataItem};
use crate::services::export::{Sheet, pivot_sheet, summary_totals, to_csv, to_pdf, to_xlsx};
use crate::services::report::{GROSS_TOTAL_LABEL, pivot_totals};
use crate::services::{CategoryRow, ChartData, PdfReport, ReportSummary, pivot_by_category, summarize};
use crate::state::AppState;

use super::scope::{
    ScopeQuery, UnitOption, YearOption, pick_unit, pick_year, unit_options, visible_units,
    year_options,
};
use super::{
    CSV_CONTENT_TYPE, PDF_CONTENT_TYPE, PageContext, XLSX_CONTENT_TYPE, download, render,
};

const TOTAL_LABEL: &str = "Total";
const ALL_UNITS: &str = "All units";

/// Pivot row view with formatted cells.
#[derive(Debug, Clone)]
pub struct PivotRowView {
    pub category: String,
    pub months: Vec<String>,
    pub total: String,
}

impl From<&CategoryRow> for PivotRowView {
    fn from(row: &CategoryRow) -> Self {
        Self {
            category: row.category.clone(),
            months: row.months.iter().map(|v| Amount::new(*v).grouped()).collect(),
            total: Amount::new(row.total).grouped(),
        }
    }
}

/// Revenue, expense and net figures for one label.
#[derive(Debug, Clone)]
pub struct TotalsRowView {
    pub label: String,
    pub revenue: String,
    pub expenses: String,
    pub net: String,
}

impl TotalsRowView {
    fn new(
        label: impl Into<String>,
        revenue: rust_decimal::Decimal,
        expenses: rust_decimal::Decimal,
    ) -> Self {
        Self {
            label: label.into(),
            revenue: Amount::new(revenue).grouped(),
            expenses: Amount::new(expenses).grouped(),
            net: Amount::new(revenue - expenses).grouped(),
        }
    }
}

/// Reports page template.
#[derive(Template)]
#[template(path = "reports/index.html")]
pub struct ReportsTemplate {
    pub page: PageContext,
    pub units: Vec<UnitOption>,
    pub all_units_selected: bool,
    pub years: Vec<YearOption>,
    pub year: i32,
    pub scope_label: String,
    pub overall: TotalsRowView,
    pub item_count: usize,
    pub month_names: Vec<&'static str>,
    pub pivot: Vec<PivotRowView>,
    pub pivot_total: PivotRowView,
    pub categories: Vec<TotalsRowView>,
    pub unit_totals: Vec<TotalsRowView>,
    pub export_query: String,
    pub chart_src: String,
}

/// Selected units, year and the rows they cover.
struct ReportScope {
    units: Vec<Unit>,
    selected: Option<Unit>,
    years: Vec<i32>,
    year: i32,
    items: Vec<UnitDataItem>,
}

impl ReportScope {
    fn label(&self) -> String {
        self.selected
            .as_ref()
            .map_or_else(|| ALL_UNITS.to_owned(), |u| u.name.clone())
    }

    fn query_string(&self) -> String {
        ScopeQuery::query_string(self.selected.as_ref().map(|u| u.id), self.year)
    }
}

/// Resolve the report scope. Without a unit the report covers every unit
/// visible to the user.
async fn resolve_scope(
    state: &AppState,
    user: &CurrentUser,
    query: &ScopeQuery,
) -> Result<ReportScope, AppError> {
    let units = visible_units(state, user).await?;
    let selected = match query.unit {
        Some(_) => pick_unit(state, user, &units, query.unit)?,
        None => None,
    };
    let unit_ids: Vec<UnitId> = match &selected {
        Some(unit) => vec![unit.id],
        None => units.iter().map(|u| u.id).collect(),
    };

    let repo = UnitDataRepository::new(state.pool());
    let years = repo.years_for_units(&unit_ids).await?;
    let year = pick_year(&years, query.year);
    let items = repo.list_for_units(&unit_ids, year).await?;

    Ok(ReportScope {
        units,
        selected,
        years,
        year,
        items,
    })
}

fn unit_totals(summary: &ReportSummary, units: &[Unit]) -> Vec<TotalsRowView> {
    let names: HashMap<UnitId, &str> = units.iter().map(|u| (u.id, u.name.as_str())).collect();
    summary
        .units
        .iter()
        .map(|t| {
            let label = names
                .get(&t.unit_id)
                .map_or_else(|| t.unit_id.to_string(), |n| (*n).to_owned());
            TotalsRowView::new(label, t.revenue, t.expenses)
        })
        .collect()
}

/// Reports page handler.
#[instrument(skip_all)]
pub async fn index(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ScopeQuery>,
) -> Result<Html<String>, AppError> {
    let scope = resolve_scope(&state, &user, &query).await?;
    let summary = summarize(&scope.items);
    let rows = pivot_by_category(&scope.items);
    let query_string = scope.query_string();

    let template = ReportsTemplate {
        page: PageContext::new(&user, "/reports", &session).await,
        units: unit_options(&scope.units, scope.selected.as_ref().map(|u| u.id)),
        all_units_selected: scope.selected.is_none(),
        years: year_options(&scope.years, scope.year),
        year: scope.year,
        scope_label: scope.label(),
        overall: TotalsRowView::new(TOTAL_LABEL, summary.revenue, summary.expenses),
        item_count: summary.item_count,
        month_names: Month::all().map(Month::short_name).collect(),
        pivot: rows.iter().map(PivotRowView::from).collect(),
        pivot_total: PivotRowView::from(&pivot_totals(&rows, GROSS_TOTAL_LABEL)),
        categories: summary
            .categories
            .iter()
            .map(|c| TotalsRowView::new(c.category.clone(), c.revenue, c.expenses))
            .collect(),
        unit_totals: unit_totals(&summary, &scope.units),
        chart_src: format!("/api/reports/chart?{query_string}"),
        export_query: query_string,
    };

    Ok(render(&template))
}

/// Chart payload for the selected scope.
#[instrument(skip_all)]
pub async fn chart(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<ChartData>, AppError> {
    let scope = resolve_scope(&state, &user, &query).await?;
    Ok(Json(ChartData::from_summary(&summarize(&scope.items))))
}

async fn pivot_export(
    state: &AppState,
    user: &CurrentUser,
    query: &ScopeQuery,
) -> Result<(Sheet, ReportSummary, String), AppError> {
    let scope = resolve_scope(state, user, query).await?;
    let label = scope.label();
    let title = format!("Report {label} {}", scope.year);
    let sheet = pivot_sheet(&title, &pivot_by_category(&scope.items), GROSS_TOTAL_LABEL);
    let summary = summarize(&scope.items);
    Ok((sheet, summary, format!("report-{label}-{}", scope.year)))
}

/// Export the monthly pivot as `.xlsx`.
#[instrument(skip_all)]
pub async fn export_xlsx(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Response, AppError> {
    let (sheet, _, stem) = pivot_export(&state, &user, &query).await?;
    Ok(download(to_xlsx(&sheet)?, XLSX_CONTENT_TYPE, &format!("{stem}.xlsx")))
}

/// Export the monthly pivot as `.csv`.
#[instrument(skip_all)]
pub async fn export_csv(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Response, AppError> {
    let (sheet, _, stem) = pivot_export(&state, &user, &query).await?;
    Ok(download(to_csv(&sheet)?, CSV_CONTENT_TYPE, &format!("{stem}.csv")))
}

/// Export the monthly pivot and totals as a printable PDF.
#[instrument(skip_all)]
pub async fn export_pdf(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Response, AppError> {
    let (sheet, summary, stem) = pivot_export(&state, &user, &query).await?;
    let report = PdfReport {
        sheet: &sheet,
        generated_at: Utc::now(),
        totals: summary_totals(&summary),
    };
    tracing::info!(user_id = %user.id, rows = sheet.rows.len(), "PDF report generated");
    Ok(download(to_pdf(&report)?, PDF_CONTENT_TYPE, &format!("{stem}.pdf")))
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_row_net() {
        let row = TotalsRowView::new(
            "Sales",
            "1500".parse().unwrap_or_default(),
            "2000.5".parse().unwrap_or_default(),
        );
        assert_eq!(row.revenue, "1,500.00");
        assert_eq!(row.expenses, "2,000.50");
        assert_eq!(row.net, "-500.50");
    }

    #[test]
    fn test_pivot_row_view_formats_every_month() {
        let mut months = [rust_decimal::Decimal::ZERO; 12];
        months[0] = "1234".parse().unwrap_or_default();
        let row = CategoryRow {
            category: "Sales".into(),
            months,
            total: "1234".parse().unwrap_or_default(),
        };
        let view = PivotRowView::from(&row);
        assert_eq!(view.months.len(), 12);
        assert_eq!(view.months.first().map(String::as_str), Some("1,234.00"));
        assert_eq!(view.total, "1,234.00");
    }
}
