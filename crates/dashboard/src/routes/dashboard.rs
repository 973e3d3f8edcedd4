//! Role dashboards (`/admin`, `/manager`, `/supervisor`, `/user`).

use std::collections::HashMap;

use askama::Template;
use axum::{
    extract::State,
    http::Uri,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Datelike, Utc};
use tower_sessions::Session;
use tracing::instrument;

use finboard_core::{Amount, Role, UnitId};

use crate::db::{MasterCodeRepository, UnitDataRepository, UserRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::ImportBatchSummary;
use crate::services::summarize;
use crate::state::AppState;

use super::scope::{ScopeQuery, visible_units};
use super::{PageContext, render};

/// Number of uploads listed on the dashboard.
const RECENT_UPLOADS: i64 = 5;

/// Headline figures for the current year.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    pub revenue: String,
    pub expenses: String,
    pub net: String,
    pub net_negative: bool,
    pub item_count: usize,
    pub unit_count: usize,
}

/// Extra counts shown to super admins.
#[derive(Debug, Clone)]
pub struct AdminCounts {
    pub users: usize,
    pub master_codes: usize,
}

/// Recent upload view for the dashboard.
#[derive(Debug, Clone)]
pub struct UploadView {
    pub unit_name: String,
    pub year: i32,
    pub row_count: i64,
    pub imported_at: DateTime<Utc>,
    pub data_link: String,
}

impl UploadView {
    fn new(batch: &ImportBatchSummary, unit_names: &HashMap<UnitId, String>) -> Self {
        Self {
            unit_name: unit_names
                .get(&batch.unit_id)
                .cloned()
                .unwrap_or_else(|| batch.unit_id.to_string()),
            year: batch.year,
            row_count: batch.row_count,
            imported_at: batch.imported_at,
            data_link: format!(
                "/data?{}",
                ScopeQuery::query_string(Some(batch.unit_id), batch.year)
            ),
        }
    }
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub title: &'static str,
    pub year: i32,
    pub metrics: DashboardMetrics,
    pub admin_counts: Option<AdminCounts>,
    pub recent_uploads: Vec<UploadView>,
    pub chart_src: String,
    pub can_upload: bool,
}

/// Title for a role home path.
#[must_use]
pub fn dashboard_title(path: &str) -> &'static str {
    match path {
        "/admin" => Role::SuperAdmin.label(),
        "/manager" => Role::Manager.label(),
        "/supervisor" => Role::Supervisor.label(),
        _ => "Dashboard",
    }
}

/// Role dashboard handler.
///
/// Users opening a dashboard none of their roles grants are redirected to
/// their own home.
#[instrument(skip_all, fields(path = %uri.path()))]
pub async fn home(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    uri: Uri,
) -> Result<Response, AppError> {
    let path = uri.path();
    if !user.roles.can_open_home(path) {
        return Ok(Redirect::to(user.roles.home_path()).into_response());
    }

    let year = Utc::now().year();
    let units = visible_units(&state, &user).await?;
    let unit_ids: Vec<UnitId> = units.iter().map(|u| u.id).collect();
    let unit_names: HashMap<UnitId, String> =
        units.iter().map(|u| (u.id, u.name.clone())).collect();

    let data_repo = UnitDataRepository::new(state.pool());
    let items = data_repo.list_for_units(&unit_ids, year).await?;
    let summary = summarize(&items);

    let recent_uploads = data_repo
        .recent_batches(&unit_ids, RECENT_UPLOADS)
        .await?
        .iter()
        .map(|b| UploadView::new(b, &unit_names))
        .collect();

    let admin_counts = if user.roles.contains(Role::SuperAdmin) {
        Some(AdminCounts {
            users: UserRepository::new(state.pool()).list_all().await?.len(),
            master_codes: MasterCodeRepository::new(state.pool())
                .list(None)
                .await?
                .len(),
        })
    } else {
        None
    };

    let template = DashboardTemplate {
        page: PageContext::new(&user, path, &session).await,
        title: dashboard_title(path),
        year,
        metrics: DashboardMetrics {
            revenue: Amount::new(summary.revenue).grouped(),
            expenses: Amount::new(summary.expenses).grouped(),
            net: Amount::new(summary.net).grouped(),
            net_negative: summary.net.is_sign_negative() && !summary.net.is_zero(),
            item_count: summary.item_count,
            unit_count: units.len(),
        },
        admin_counts,
        recent_uploads,
        chart_src: format!("/api/reports/chart?year={year}"),
        can_upload: user.roles.can_upload_data(),
    };

    Ok(render(&template).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_titles() {
        assert_eq!(dashboard_title("/admin"), "Super Admin");
        assert_eq!(dashboard_title("/manager"), "Manager");
        assert_eq!(dashboard_title("/user"), "Dashboard");
    }
}
