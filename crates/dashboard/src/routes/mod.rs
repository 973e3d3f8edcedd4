//! HTTP route handlers for the dashboard.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Login page (redirects home when signed in)
//!
//! # Auth
//! POST /auth/login                - Email/password login
//! POST /auth/logout               - Logout
//! GET  /auth/forgot               - Forgot password form
//! POST /auth/forgot               - Send reset link
//! GET  /auth/reset/{token}        - Reset form
//! POST /auth/reset/{token}        - Set new password
//!
//! # Role dashboards
//! GET  /admin | /manager | /supervisor | /user
//!
//! # Business units (super admin)
//! GET  /units                     - List units
//! POST /units                     - Create unit
//! POST /units/{id}                - Rename unit
//! POST /units/{id}/delete         - Delete unit
//!
//! # Users (super admin)
//! GET  /users                     - List users
//! POST /users                     - Create user
//! GET  /users/{id}/edit           - Edit form
//! POST /users/{id}                - Update user
//! POST /users/{id}/delete         - Delete user
//!
//! # Master codes (super admin)
//! GET  /master-codes              - List/search
//! POST /master-codes              - Create
//! POST /master-codes/import       - Spreadsheet import
//! GET  /master-codes/export.xlsx  - Export
//! POST /master-codes/{id}         - Update
//! POST /master-codes/{id}/delete  - Delete
//!
//! # Library codes (super admin)
//! GET  /library-codes             - List
//! POST /library-codes/import      - Spreadsheet import
//! POST /library-codes/clear       - Delete all
//! POST /library-codes/{id}/delete - Delete one
//!
//! # Unit data
//! GET  /data                      - Table for a unit and year
//! POST /data/import               - Upload spreadsheet (super admin, manager)
//! POST /data/clear                - Delete a unit's year
//! POST /data/items/{id}           - Edit item
//! POST /data/items/{id}/delete    - Delete item
//! POST /data/batches/{id}/delete  - Delete an upload
//! GET  /data/export.xlsx | /data/export.csv
//!
//! # Reports
//! GET  /reports                   - Monthly table, totals, charts
//! GET  /reports/export.xlsx | .csv | .pdf
//! GET  /api/reports/chart         - Chart payloads (JSON)
//! ```

pub mod auth;
pub mod dashboard;
pub mod data;
pub mod library_codes;
pub mod master_codes;
pub mod reports;
pub mod scope;
pub mod units;
pub mod upload;
pub mod users;

use std::fmt;
use std::str::FromStr;

use askama::Template;
use axum::{
    Router,
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Deserializer, de};
use tower_sessions::Session;

use crate::components::{Flash, NavItem, menu_for, set_flash, take_flash};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Signed-in user view for templates.
#[derive(Debug, Clone)]
pub struct UserView {
    pub name: String,
    pub email: String,
    pub roles: String,
    pub home_path: &'static str,
    pub menu: Vec<NavItem>,
}

impl From<&CurrentUser> for UserView {
    fn from(user: &CurrentUser) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.to_string(),
            roles: user.roles.labels(),
            home_path: user.roles.home_path(),
            menu: menu_for(&user.roles),
        }
    }
}

/// Shared page chrome: user, active path and the pending notice.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub user: UserView,
    pub current_path: String,
    pub flash: Option<Flash>,
}

impl PageContext {
    /// Build the context, consuming any pending notice.
    pub async fn new(user: &CurrentUser, current_path: &str, session: &Session) -> Self {
        Self {
            user: UserView::from(user),
            current_path: current_path.to_string(),
            flash: take_flash(session).await,
        }
    }

    /// Whether a sidebar entry is active.
    #[must_use]
    pub fn is_active(&self, item: &NavItem) -> bool {
        item.is_active(&self.current_path)
    }
}

/// Render a template, logging failures.
pub fn render(template: &impl Template) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Store `flash` and redirect to `to` (post/redirect/get).
pub async fn redirect_with(session: &Session, to: &str, flash: Flash) -> Redirect {
    set_flash(session, flash).await;
    Redirect::to(to)
}

/// A file download response.
pub fn download(bytes: Vec<u8>, content_type: &'static str, file_name: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", safe_file_name(file_name)),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Content type of `.xlsx` downloads.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// Content type of `.csv` downloads.
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
/// Content type of `.pdf` downloads.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Keep download names to a header-safe character set.
fn safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Deserialize blank form/query values as `None`.
///
/// HTML selects submit `""` for "no choice", which would otherwise fail to
/// parse as a number.
///
/// # Errors
///
/// Returns an error if a non-blank value does not parse as `T`.
pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(de::Error::custom),
    }
}

/// Trimmed value, or `None` when blank.
#[must_use]
pub fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/forgot", get(auth::forgot_page).post(auth::forgot))
        .route("/reset/{token}", get(auth::reset_page).post(auth::reset))
}

/// Create the business unit routes router.
pub fn unit_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(units::index).post(units::create))
        .route("/{id}", post(units::rename))
        .route("/{id}/delete", post(units::delete))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index).post(users::create))
        .route("/{id}", post(users::update))
        .route("/{id}/edit", get(users::edit))
        .route("/{id}/delete", post(users::delete))
}

/// Create the master code routes router.
pub fn master_code_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(master_codes::index).post(master_codes::create))
        .route("/import", post(master_codes::import))
        .route("/export.xlsx", get(master_codes::export_xlsx))
        .route("/{id}", post(master_codes::update))
        .route("/{id}/delete", post(master_codes::delete))
}

/// Create the library code routes router.
pub fn library_code_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(library_codes::index))
        .route("/import", post(library_codes::import))
        .route("/clear", post(library_codes::clear))
        .route("/{id}/delete", post(library_codes::delete))
}

/// Create the unit data routes router.
pub fn data_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(data::index))
        .route("/import", post(data::import))
        .route("/clear", post(data::clear))
        .route("/export.xlsx", get(data::export_xlsx))
        .route("/export.csv", get(data::export_csv))
        .route("/items/{id}", post(data::update_item))
        .route("/items/{id}/delete", post(data::delete_item))
        .route("/batches/{id}/delete", post(data::delete_batch))
}

/// Create the report routes router.
pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(reports::index))
        .route("/export.xlsx", get(reports::export_xlsx))
        .route("/export.csv", get(reports::export_csv))
        .route("/export.pdf", get(reports::export_pdf))
}

/// Create all page and API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::login_page))
        .nest("/auth", auth_routes())
        // Role dashboards
        .route("/admin", get(dashboard::home))
        .route("/manager", get(dashboard::home))
        .route("/supervisor", get(dashboard::home))
        .route("/user", get(dashboard::home))
        .nest("/units", unit_routes())
        .nest("/users", user_routes())
        .nest("/master-codes", master_code_routes())
        .nest("/library-codes", library_code_routes())
        .nest("/data", data_routes())
        .nest("/reports", report_routes())
        .route("/api/reports/chart", get(reports::chart))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Query {
        #[serde(default, deserialize_with = "empty_string_as_none")]
        unit: Option<i32>,
    }

    #[test]
    fn test_empty_string_as_none() {
        let blank: Query = serde_urlencoded_from("unit=");
        assert_eq!(blank.unit, None);
        let set: Query = serde_urlencoded_from("unit=7");
        assert_eq!(set.unit, Some(7));
        let missing: Query = serde_urlencoded_from("");
        assert_eq!(missing.unit, None);
    }

    fn serde_urlencoded_from(query: &str) -> Query {
        let uri: axum::http::Uri = format!("/data?{query}").parse().unwrap();
        axum::extract::Query::<Query>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("report 2024/Q1.pdf"), "report_2024_Q1.pdf");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  North "), Some("North".to_string()));
        assert_eq!(non_blank("   "), None);
    }
}
