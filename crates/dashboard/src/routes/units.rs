//! Business unit management (super admin).

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, Redirect},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use finboard_core::UnitId;

use crate::components::Flash;
use crate::components::data_table::{DataTableConfig, units_table_config};
use crate::db::{RepositoryError, UnitRepository};
use crate::error::AppError;
use crate::filters;
use crate::i18n::MessageKey;
use crate::middleware::{RequireRole, RequireSuperAdmin};
use crate::state::AppState;

use super::{PageContext, non_blank, redirect_with, render};

/// Unit row view for templates.
#[derive(Debug, Clone)]
pub struct UnitListItem {
    pub id: i32,
    pub name: String,
    pub user_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Units page template.
#[derive(Template)]
#[template(path = "units/index.html")]
pub struct UnitsIndexTemplate {
    pub page: PageContext,
    pub table: DataTableConfig,
    pub units: Vec<UnitListItem>,
}

/// Create/rename form data.
#[derive(Debug, Deserialize)]
pub struct UnitForm {
    #[serde(default)]
    pub name: String,
}

/// Units list page handler.
#[instrument(skip_all)]
pub async fn index(
    RequireRole(user, _): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>, AppError> {
    let units = UnitRepository::new(state.pool())
        .list_with_usage()
        .await?
        .into_iter()
        .map(|u| UnitListItem {
            id: u.unit.id.as_i32(),
            name: u.unit.name,
            user_count: u.user_count,
            created_at: u.unit.created_at,
        })
        .collect();

    Ok(render(&UnitsIndexTemplate {
        page: PageContext::new(&user, "/units", &session).await,
        table: units_table_config(),
        units,
    }))
}

fn failure_flash(state: &AppState, err: &RepositoryError) -> Result<Flash, AppError> {
    let key = match err {
        RepositoryError::Conflict(_) => MessageKey::DuplicateUnit,
        RepositoryError::NotFound => MessageKey::NotFound,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            return Err(AppError::Internal(err.to_string()));
        }
    };
    Ok(Flash::error(state.t(key)))
}

/// Create a unit.
#[instrument(skip_all)]
pub async fn create(
    RequireRole(user, _): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UnitForm>,
) -> Result<Redirect, AppError> {
    let Some(name) = non_blank(&form.name) else {
        return Ok(redirect_with(
            &session,
            "/units",
            Flash::error(state.t(MessageKey::RequiredFieldsEmpty)),
        )
        .await);
    };

    let flash = match UnitRepository::new(state.pool()).create(&name).await {
        Ok(unit) => {
            tracing::info!(unit_id = %unit.id, by = %user.id, "Unit created");
            Flash::success(state.t(MessageKey::Saved))
        }
        Err(e) => failure_flash(&state, &e)?,
    };
    Ok(redirect_with(&session, "/units", flash).await)
}

/// Rename a unit.
#[instrument(skip_all, fields(unit_id = id))]
pub async fn rename(
    RequireRole(_user, _): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<UnitForm>,
) -> Result<Redirect, AppError> {
    let Some(name) = non_blank(&form.name) else {
        return Ok(redirect_with(
            &session,
            "/units",
            Flash::error(state.t(MessageKey::RequiredFieldsEmpty)),
        )
        .await);
    };

    let flash = match UnitRepository::new(state.pool())
        .rename(UnitId::new(id), &name)
        .await
    {
        Ok(_) => Flash::success(state.t(MessageKey::Saved)),
        Err(e) => failure_flash(&state, &e)?,
    };
    Ok(redirect_with(&session, "/units", flash).await)
}

/// Delete a unit. Units still assigned to users are kept.
#[instrument(skip_all, fields(unit_id = id))]
pub async fn delete(
    RequireRole(user, _): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    let flash = match UnitRepository::new(state.pool())
        .delete(UnitId::new(id))
        .await
    {
        Ok(()) => {
            tracing::info!(unit_id = id, by = %user.id, "Unit deleted");
            Flash::success(state.t(MessageKey::Deleted))
        }
        Err(RepositoryError::Conflict(_)) => Flash::error(state.t(MessageKey::UnitInUseByUsers)),
        Err(e) => failure_flash(&state, &e)?,
    };
    Ok(redirect_with(&session, "/units", flash).await)
}
