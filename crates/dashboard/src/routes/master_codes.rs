//! Master code management (super admin).

use askama::Template;
use axum::{
    Form,
    extract::{Multipart, Path, Query, State},
    response::{Html, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use finboard_core::MasterCodeId;

use crate::components::Flash;
use crate::components::data_table::{DataTableConfig, master_codes_table_config};
use crate::db::{MasterCodeRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::i18n::MessageKey;
use crate::middleware::{RequireRole, RequireSuperAdmin};
use crate::models::{MasterCode, MasterCodeInput};
use crate::services::ImportOutcome;
use crate::services::export::{master_code_sheet, to_xlsx};
use crate::services::import::{parse_master_code_rows, read_workbook};
use crate::state::AppState;

use super::upload::{import_failure_flash, import_success_flash, read_upload};
use super::{PageContext, XLSX_CONTENT_TYPE, download, non_blank, redirect_with, render};

/// Search query.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Create/update form data.
#[derive(Debug, Default, Deserialize)]
pub struct MasterCodeForm {
    #[serde(default)]
    pub account_code: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub description: String,
}

impl MasterCodeForm {
    /// Validate required fields.
    ///
    /// # Errors
    ///
    /// Returns `MessageKey::RequiredFieldsEmpty` if code, category or name
    /// is blank.
    pub fn validate(&self) -> Result<MasterCodeInput, MessageKey> {
        match (
            non_blank(&self.account_code),
            non_blank(&self.category),
            non_blank(&self.account_name),
        ) {
            (Some(account_code), Some(category), Some(account_name)) => Ok(MasterCodeInput {
                account_code,
                category,
                account_name,
                description: non_blank(&self.description),
            }),
            _ => Err(MessageKey::RequiredFieldsEmpty),
        }
    }
}

/// Master codes page template.
#[derive(Template)]
#[template(path = "master_codes/index.html")]
pub struct MasterCodesIndexTemplate {
    pub page: PageContext,
    pub table: DataTableConfig,
    pub search: String,
    pub codes: Vec<MasterCode>,
}

fn repository_flash(state: &AppState, err: RepositoryError) -> Result<Flash, AppError> {
    match err {
        RepositoryError::Conflict(_) => Ok(Flash::error(state.t(MessageKey::DuplicateAccountCode))),
        RepositoryError::NotFound => Ok(Flash::error(state.t(MessageKey::NotFound))),
        other => Err(AppError::Database(other)),
    }
}

/// Master codes list page handler.
#[instrument(skip_all)]
pub async fn index(
    RequireRole(user, _): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SearchQuery>,
) -> Result<Html<String>, AppError> {
    let search = non_blank(&query.q);
    let codes = MasterCodeRepository::new(state.pool())
        .list(search.as_deref())
        .await?;

    Ok(render(&MasterCodesIndexTemplate {
        page: PageContext::new(&user, "/master-codes", &session).await,
        table: master_codes_table_config(search.as_deref()),
        search: search.unwrap_or_default(),
        codes,
    }))
}

/// Create a master code.
#[instrument(skip_all)]
pub async fn create(
    RequireRole(_user, _): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<MasterCodeForm>,
) -> Result<Redirect, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(key) => return Ok(redirect_with(&session, "/master-codes", Flash::error(state.t(key))).await),
    };

    let flash = match MasterCodeRepository::new(state.pool()).create(&input).await {
        Ok(_) => Flash::success(state.t(MessageKey::Saved)),
        Err(e) => repository_flash(&state, e)?,
    };
    Ok(redirect_with(&session, "/master-codes", flash).await)
}

/// Update a master code.
#[instrument(skip_all, fields(master_code_id = id))]
pub async fn update(
    RequireRole(_user, _): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<MasterCodeForm>,
) -> Result<Redirect, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(key) => return Ok(redirect_with(&session, "/master-codes", Flash::error(state.t(key))).await),
    };

    let flash = match MasterCodeRepository::new(state.pool())
        .update(MasterCodeId::new(id), &input)
        .await
    {
        Ok(_) => Flash::success(state.t(MessageKey::Saved)),
        Err(e) => repository_flash(&state, e)?,
    };
    Ok(redirect_with(&session, "/master-codes", flash).await)
}

/// Delete a master code.
#[instrument(skip_all, fields(master_code_id = id))]
pub async fn delete(
    RequireRole(_user, _): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    let flash = match MasterCodeRepository::new(state.pool())
        .delete(MasterCodeId::new(id))
        .await
    {
        Ok(()) => Flash::success(state.t(MessageKey::Deleted)),
        Err(e) => repository_flash(&state, e)?,
    };
    Ok(redirect_with(&session, "/master-codes", flash).await)
}

/// Import master codes from a spreadsheet, upserting by account code.
#[instrument(skip_all)]
pub async fn import(
    RequireRole(user, _): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let upload = match read_upload(multipart, state.config().max_upload_bytes).await {
        Ok(upload) => upload,
        Err(e) => return Ok(redirect_with(&session, "/master-codes", e.flash(&state)).await),
    };

    let parsed = read_workbook(&upload.bytes, &upload.file_name)
        .and_then(|rows| parse_master_code_rows(&rows))
        .and_then(ImportOutcome::into_result);
    let inputs = match parsed {
        Ok(inputs) => inputs,
        Err(e) => {
            tracing::info!(error = %e, file = %upload.file_name, "Master code import rejected");
            return Ok(redirect_with(&session, "/master-codes", import_failure_flash(&state, &e)).await);
        }
    };

    let count = MasterCodeRepository::new(state.pool())
        .upsert_many(&inputs)
        .await?;
    tracing::info!(rows = count, by = %user.id, "Master codes imported");
    Ok(redirect_with(&session, "/master-codes", import_success_flash(&state, count)).await)
}

/// Export all master codes as `.xlsx`.
#[instrument(skip_all)]
pub async fn export_xlsx(
    RequireRole(_user, _): RequireSuperAdmin,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let codes = MasterCodeRepository::new(state.pool()).list(None).await?;
    let bytes = to_xlsx(&master_code_sheet(&codes))?;
    Ok(download(bytes, XLSX_CONTENT_TYPE, "master-codes.xlsx"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims_and_keeps_optional_description() {
        let form = MasterCodeForm {
            account_code: " 4100 ".into(),
            category: "Sales".into(),
            account_name: "Product sales".into(),
            description: "  ".into(),
        };
        let input = form.validate().unwrap();
        assert_eq!(input.account_code, "4100");
        assert_eq!(input.description, None);
    }

    #[test]
    fn test_validate_rejects_empty_required_fields() {
        let form = MasterCodeForm {
            account_code: "4100".into(),
            category: String::new(),
            account_name: "Product sales".into(),
            description: String::new(),
        };
        assert_eq!(form.validate().unwrap_err(), MessageKey::RequiredFieldsEmpty);
    }
}
