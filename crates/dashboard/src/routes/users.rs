//! User management (super admin).

use std::collections::HashMap;

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use finboard_core::{Email, Role, RoleSet, UnitId, UserId};

use crate::components::Flash;
use crate::components::data_table::{DataTableConfig, users_table_config};
use crate::db::{RepositoryError, UNKNOWN_UNIT, UnitRepository, UserRepository};
use crate::error::AppError;
use crate::filters;
use crate::i18n::MessageKey;
use crate::middleware::{RequireRole, RequireSuperAdmin};
use crate::models::{Unit, User, UserProfile};
use crate::services::AuthError;
use crate::services::auth::{MIN_PASSWORD_LENGTH, hash_password, validate_new_password};
use crate::state::AppState;

use super::{PageContext, redirect_with, render};

/// User row view for templates.
#[derive(Debug, Clone)]
pub struct UserListItem {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub roles: String,
    pub units: String,
    pub is_self: bool,
}

/// Checkbox option for roles.
#[derive(Debug, Clone)]
pub struct RoleOption {
    pub key: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

/// Checkbox option for units.
#[derive(Debug, Clone)]
pub struct UnitCheckbox {
    pub id: i32,
    pub name: String,
    pub checked: bool,
}

/// Users page template.
#[derive(Template)]
#[template(path = "users/index.html")]
pub struct UsersIndexTemplate {
    pub page: PageContext,
    pub table: DataTableConfig,
    pub users: Vec<UserListItem>,
    pub role_options: Vec<RoleOption>,
    pub unit_options: Vec<UnitCheckbox>,
    pub min_password_length: usize,
}

/// Edit user page template.
#[derive(Template)]
#[template(path = "users/edit.html")]
pub struct UserEditTemplate {
    pub page: PageContext,
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role_options: Vec<RoleOption>,
    pub unit_options: Vec<UnitCheckbox>,
    pub min_password_length: usize,
}

/// Raw user form.
///
/// Role and unit checkboxes repeat their key, so the body is read as
/// key/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub units: Vec<String>,
    pub password: String,
    pub password_confirm: String,
}

/// A validated user form.
#[derive(Debug, Clone)]
pub struct ValidUserForm {
    pub profile: UserProfile,
    pub unit_ids: Vec<UnitId>,
    /// New password, when one was entered.
    pub password: Option<String>,
}

impl UserForm {
    /// Collect the form from urlencoded pairs.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "name" => form.name = value,
                "email" => form.email = value,
                "roles" => form.roles.push(value),
                "units" => form.units.push(value),
                "password" => form.password = value,
                "password_confirm" => form.password_confirm = value,
                _ => {}
            }
        }
        form
    }

    /// Validate the form. A password is required when creating a user and
    /// optional when editing one.
    ///
    /// # Errors
    ///
    /// Returns the message describing the first problem found.
    pub fn validate(&self, require_password: bool) -> Result<ValidUserForm, MessageKey> {
        let name = self.name.trim();
        if name.is_empty() || self.email.trim().is_empty() || self.roles.is_empty() {
            return Err(MessageKey::RequiredFieldsEmpty);
        }
        if require_password && self.password.is_empty() {
            return Err(MessageKey::RequiredFieldsEmpty);
        }

        let email = Email::parse(&self.email).map_err(|_| MessageKey::InvalidEmail)?;
        let roles = RoleSet::parse_all(&self.roles).map_err(|_| MessageKey::RequiredFieldsEmpty)?;

        let mut unit_ids = Vec::with_capacity(self.units.len());
        for raw in &self.units {
            let id = raw
                .trim()
                .parse::<i32>()
                .map_err(|_| MessageKey::RequiredFieldsEmpty)?;
            let id = UnitId::new(id);
            if !unit_ids.contains(&id) {
                unit_ids.push(id);
            }
        }

        let password = if self.password.is_empty() {
            None
        } else {
            validate_new_password(&self.password, &self.password_confirm).map_err(|e| match e {
                AuthError::PasswordMismatch => MessageKey::PasswordsDoNotMatch,
                _ => MessageKey::PasswordTooShort,
            })?;
            Some(self.password.clone())
        };

        Ok(ValidUserForm {
            profile: UserProfile {
                name: name.to_string(),
                email,
                roles,
            },
            unit_ids,
            password,
        })
    }
}

fn role_options(selected: Option<&RoleSet>) -> Vec<RoleOption> {
    Role::ALL
        .iter()
        .map(|role| RoleOption {
            key: role.key(),
            label: role.label(),
            checked: selected.is_some_and(|roles| roles.contains(*role)),
        })
        .collect()
}

fn unit_checkboxes(units: &[Unit], selected: &[UnitId]) -> Vec<UnitCheckbox> {
    units
        .iter()
        .map(|u| UnitCheckbox {
            id: u.id.as_i32(),
            name: u.name.clone(),
            checked: selected.contains(&u.id),
        })
        .collect()
}

fn list_item(user: &User, unit_names: &HashMap<UnitId, String>, current: UserId) -> UserListItem {
    let units = user
        .unit_ids
        .iter()
        .filter_map(|id| unit_names.get(id).cloned())
        .collect::<Vec<_>>()
        .join(", ");
    UserListItem {
        id: user.id.as_i32(),
        name: user.name.clone(),
        email: user.email.to_string(),
        roles: user.roles.labels(),
        units,
        is_self: user.id == current,
    }
}

fn repository_flash(state: &AppState, err: RepositoryError) -> Result<Flash, AppError> {
    conflict_message(&err)
        .map(|key| Flash::error(state.t(key)))
        .ok_or(AppError::Database(err))
}

/// Message key for a repository error the user can fix from the form.
fn conflict_message(err: &RepositoryError) -> Option<MessageKey> {
    match err {
        RepositoryError::Conflict(reason) if reason == UNKNOWN_UNIT => Some(MessageKey::UnknownUnit),
        RepositoryError::Conflict(_) => Some(MessageKey::DuplicateEmail),
        RepositoryError::NotFound => Some(MessageKey::NotFound),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => None,
    }
}

/// Users list page handler.
#[instrument(skip_all)]
pub async fn index(
    RequireRole(admin, _): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>, AppError> {
    let units = UnitRepository::new(state.pool()).list_all().await?;
    let unit_names: HashMap<UnitId, String> =
        units.iter().map(|u| (u.id, u.name.clone())).collect();

    let users = UserRepository::new(state.pool())
        .list_all()
        .await?
        .iter()
        .map(|u| list_item(u, &unit_names, admin.id))
        .collect();

    Ok(render(&UsersIndexTemplate {
        page: PageContext::new(&admin, "/users", &session).await,
        table: users_table_config(),
        users,
        role_options: role_options(None),
        unit_options: unit_checkboxes(&units, &[]),
        min_password_length: MIN_PASSWORD_LENGTH,
    }))
}

/// Create a user.
#[instrument(skip_all)]
pub async fn create(
    RequireRole(admin, _): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect, AppError> {
    let form = match UserForm::from_pairs(pairs).validate(true) {
        Ok(form) => form,
        Err(key) => return Ok(redirect_with(&session, "/users", Flash::error(state.t(key))).await),
    };

    let hash = form.password.as_deref().map(hash_password).transpose()?;

    let flash = match UserRepository::new(state.pool())
        .create(&form.profile, hash.as_deref(), &form.unit_ids)
        .await
    {
        Ok(id) => {
            tracing::info!(user_id = %id, by = %admin.id, "User created");
            Flash::success(state.t(MessageKey::Saved))
        }
        Err(e) => repository_flash(&state, e)?,
    };
    Ok(redirect_with(&session, "/users", flash).await)
}

/// Edit user page handler.
#[instrument(skip_all, fields(user_id = id))]
pub async fn edit(
    RequireRole(admin, _): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let user = UserRepository::new(state.pool())
        .get_by_id(UserId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(state.t(MessageKey::NotFound).to_string()))?;
    let units = UnitRepository::new(state.pool()).list_all().await?;

    Ok(render(&UserEditTemplate {
        page: PageContext::new(&admin, "/users", &session).await,
        id,
        name: user.name.clone(),
        email: user.email.to_string(),
        role_options: role_options(Some(&user.roles)),
        unit_options: unit_checkboxes(&units, &user.unit_ids),
        min_password_length: MIN_PASSWORD_LENGTH,
    }))
}

/// Update a user's profile, units and optionally password.
#[instrument(skip_all, fields(user_id = id))]
pub async fn update(
    RequireRole(admin, _): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect, AppError> {
    let edit_path = format!("/users/{id}/edit");
    let form = match UserForm::from_pairs(pairs).validate(false) {
        Ok(form) => form,
        Err(key) => return Ok(redirect_with(&session, &edit_path, Flash::error(state.t(key))).await),
    };

    let password_hash = form.password.as_deref().map(hash_password).transpose()?;

    if let Err(e) = UserRepository::new(state.pool())
        .update(UserId::new(id), &form.profile, &form.unit_ids, password_hash.as_deref())
        .await
    {
        let flash = repository_flash(&state, e)?;
        return Ok(redirect_with(&session, &edit_path, flash).await);
    }

    tracing::info!(user_id = id, by = %admin.id, "User updated");
    Ok(redirect_with(&session, "/users", Flash::success(state.t(MessageKey::Saved))).await)
}

/// Delete a user. Admins cannot delete themselves.
#[instrument(skip_all, fields(user_id = id))]
pub async fn delete(
    RequireRole(admin, _): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    let user_id = UserId::new(id);
    if user_id == admin.id {
        return Ok(redirect_with(&session, "/users", Flash::error(state.t(MessageKey::Forbidden))).await);
    }

    let flash = match UserRepository::new(state.pool()).delete(user_id).await {
        Ok(()) => {
            tracing::info!(user_id = id, by = %admin.id, "User deleted");
            Flash::success(state.t(MessageKey::Deleted))
        }
        Err(e) => repository_flash(&state, e)?,
    };
    Ok(redirect_with(&session, "/users", flash).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn valid_pairs() -> Vec<(String, String)> {
        pairs(&[
            ("name", " Rina "),
            ("email", "rina@finboard.test"),
            ("roles", "manager"),
            ("roles", "ga_fs"),
            ("units", "3"),
            ("units", "5"),
            ("units", "3"),
            ("password", "longenough"),
            ("password_confirm", "longenough"),
        ])
    }

    #[test]
    fn test_conflict_message_names_the_cause() {
        let conflict = |reason: &str| RepositoryError::Conflict(reason.to_owned());
        assert_eq!(
            conflict_message(&conflict(UNKNOWN_UNIT)),
            Some(MessageKey::UnknownUnit)
        );
        assert_eq!(
            conflict_message(&conflict(crate::db::EMAIL_TAKEN)),
            Some(MessageKey::DuplicateEmail)
        );
        assert_eq!(
            conflict_message(&RepositoryError::NotFound),
            Some(MessageKey::NotFound)
        );
        assert_eq!(
            conflict_message(&RepositoryError::DataCorruption("roles".into())),
            None
        );
    }

    #[test]
    fn test_from_pairs_collects_repeated_keys() {
        let form = UserForm::from_pairs(valid_pairs());
        assert_eq!(form.roles, vec!["manager", "ga_fs"]);
        assert_eq!(form.units.len(), 3);
    }

    #[test]
    fn test_validate_builds_profile() {
        let valid = UserForm::from_pairs(valid_pairs()).validate(true).unwrap();
        assert_eq!(valid.profile.name, "Rina");
        assert!(valid.profile.roles.contains(Role::Manager));
        assert!(valid.profile.roles.contains(Role::GaFs));
        assert_eq!(valid.unit_ids, vec![UnitId::new(3), UnitId::new(5)]);
        assert_eq!(valid.password.as_deref(), Some("longenough"));
    }

    #[test]
    fn test_validate_rejects_empty_required_fields() {
        let form = UserForm::from_pairs(pairs(&[("name", ""), ("email", "a@b.test"), ("roles", "user")]));
        assert_eq!(form.validate(false).unwrap_err(), MessageKey::RequiredFieldsEmpty);

        let no_roles = UserForm::from_pairs(pairs(&[("name", "A"), ("email", "a@b.test")]));
        assert_eq!(no_roles.validate(false).unwrap_err(), MessageKey::RequiredFieldsEmpty);
    }

    #[test]
    fn test_validate_requires_password_on_create_only() {
        let form = UserForm::from_pairs(pairs(&[("name", "A"), ("email", "a@b.test"), ("roles", "user")]));
        assert_eq!(form.validate(true).unwrap_err(), MessageKey::RequiredFieldsEmpty);
        assert!(form.validate(false).unwrap().password.is_none());
    }

    #[test]
    fn test_validate_password_rules() {
        let short = UserForm::from_pairs(pairs(&[
            ("name", "A"),
            ("email", "a@b.test"),
            ("roles", "user"),
            ("password", "short"),
            ("password_confirm", "short"),
        ]));
        assert_eq!(short.validate(true).unwrap_err(), MessageKey::PasswordTooShort);

        let mismatch = UserForm::from_pairs(pairs(&[
            ("name", "A"),
            ("email", "a@b.test"),
            ("roles", "user"),
            ("password", "longenough"),
            ("password_confirm", "different1"),
        ]));
        assert_eq!(mismatch.validate(true).unwrap_err(), MessageKey::PasswordsDoNotMatch);
    }

    #[test]
    fn test_validate_rejects_bad_email() {
        let form = UserForm::from_pairs(pairs(&[("name", "A"), ("email", "not-an-email"), ("roles", "user")]));
        assert_eq!(form.validate(false).unwrap_err(), MessageKey::InvalidEmail);
    }

    #[test]
    fn test_role_options_mark_selected() {
        let options = role_options(Some(&RoleSet::single(Role::Supervisor)));
        assert_eq!(options.len(), 5);
        assert!(options.iter().any(|o| o.key == "supervisor" && o.checked));
        assert_eq!(options.iter().filter(|o| o.checked).count(), 1);
    }
}
