//! Library code management (super admin).

use askama::Template;
use axum::{
    extract::{Multipart, Path, State},
    response::{Html, Redirect},
};
use tower_sessions::Session;
use tracing::instrument;

use finboard_core::LibraryCodeId;

use crate::components::Flash;
use crate::components::data_table::{DataTableConfig, library_codes_table_config};
use crate::db::{LibraryCodeRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::i18n::MessageKey;
use crate::middleware::{RequireRole, RequireSuperAdmin};
use crate::models::LibraryCode;
use crate::services::ImportOutcome;
use crate::services::import::{parse_library_code_rows, read_workbook};
use crate::state::AppState;

use super::upload::{import_failure_flash, import_success_flash, read_upload};
use super::{PageContext, redirect_with, render};

/// Library codes page template.
#[derive(Template)]
#[template(path = "library_codes/index.html")]
pub struct LibraryCodesIndexTemplate {
    pub page: PageContext,
    pub table: DataTableConfig,
    pub codes: Vec<LibraryCode>,
}

/// Library codes list page handler.
#[instrument(skip_all)]
pub async fn index(
    RequireRole(user, _): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>, AppError> {
    let codes = LibraryCodeRepository::new(state.pool()).list().await?;

    Ok(render(&LibraryCodesIndexTemplate {
        page: PageContext::new(&user, "/library-codes", &session).await,
        table: library_codes_table_config(),
        codes,
    }))
}

/// Bulk import library codes; existing codes are updated.
#[instrument(skip_all)]
pub async fn import(
    RequireRole(user, _): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let upload = match read_upload(multipart, state.config().max_upload_bytes).await {
        Ok(upload) => upload,
        Err(e) => return Ok(redirect_with(&session, "/library-codes", e.flash(&state)).await),
    };

    let parsed = read_workbook(&upload.bytes, &upload.file_name)
        .and_then(|rows| parse_library_code_rows(&rows))
        .and_then(ImportOutcome::into_result);
    let inputs = match parsed {
        Ok(inputs) => inputs,
        Err(e) => {
            tracing::info!(error = %e, file = %upload.file_name, "Library code import rejected");
            return Ok(
                redirect_with(&session, "/library-codes", import_failure_flash(&state, &e)).await,
            );
        }
    };

    let count = LibraryCodeRepository::new(state.pool())
        .insert_many(&inputs)
        .await?;
    tracing::info!(rows = count, by = %user.id, "Library codes imported");
    Ok(redirect_with(&session, "/library-codes", import_success_flash(&state, count)).await)
}

/// Delete one library code.
#[instrument(skip_all, fields(library_code_id = id))]
pub async fn delete(
    RequireRole(_user, _): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    let flash = match LibraryCodeRepository::new(state.pool())
        .delete(LibraryCodeId::new(id))
        .await
    {
        Ok(()) => Flash::success(state.t(MessageKey::Deleted)),
        Err(RepositoryError::NotFound) => Flash::error(state.t(MessageKey::NotFound)),
        Err(e) => return Err(e.into()),
    };
    Ok(redirect_with(&session, "/library-codes", flash).await)
}

/// Delete every library code.
#[instrument(skip_all)]
pub async fn clear(
    RequireRole(user, _): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, AppError> {
    let removed = LibraryCodeRepository::new(state.pool()).delete_all().await?;
    tracing::info!(rows = removed, by = %user.id, "Library codes cleared");
    Ok(redirect_with(
        &session,
        "/library-codes",
        Flash::success(state.t(MessageKey::Cleared)),
    )
    .await)
}
