//! User bootstrap command.
//!
//! # Usage
//!
//! ```bash
//! fb-cli user create -e admin@example.com -n "Admin Name" -r super_admin
//! fb-cli user create -e ops@example.com -n "Ops" -r manager -r supervisor -u "North" -u "South"
//! ```
//!
//! The password comes from `--password` or `FB_BOOTSTRAP_PASSWORD`. Without
//! one the account can only sign in after a password reset.

use finboard_core::{Email, EmailError, RoleError, RoleSet, UnitId};
use finboard_dashboard::db::{RepositoryError, UnitRepository, UserRepository};
use finboard_dashboard::models::UserProfile;
use finboard_dashboard::services::AuthError;
use finboard_dashboard::services::auth::{hash_password, validate_password};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur while creating a user.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Invalid roles: {0}")]
    InvalidRole(#[from] RoleError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid password: {0}")]
    Password(#[from] AuthError),

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("User already exists with email: {0}")]
    UserExists(String),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Arguments of `user create`.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub roles: &'a [String],
    pub password: Option<&'a str>,
    pub units: &'a [String],
}

/// Create a dashboard user.
///
/// # Returns
///
/// The ID of the created user.
pub async fn create(request: &NewUser<'_>) -> Result<i32, UserError> {
    let profile = UserProfile {
        name: request.name.trim().to_owned(),
        email: Email::parse(request.email)?,
        roles: RoleSet::parse_all(request.roles)?,
    };
    let password_hash = match request.password {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => {
            tracing::warn!("No password given; the user must reset their password to sign in");
            None
        }
    };

    let pool = connect().await?;
    let users = UserRepository::new(&pool);
    if users.get_by_email(&profile.email).await?.is_some() {
        return Err(UserError::UserExists(profile.email.to_string()));
    }

    let unit_ids = resolve_units(&UnitRepository::new(&pool), request.units).await?;

    tracing::info!("Creating user: {} ({})", profile.email, profile.roles.labels());
    let user_id = users
        .create(&profile, password_hash.as_deref(), &unit_ids)
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Units: {}",
        user_id,
        profile.email,
        unit_ids.len()
    );
    Ok(user_id.as_i32())
}

async fn resolve_units(
    repo: &UnitRepository<'_>,
    names: &[String],
) -> Result<Vec<UnitId>, UserError> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let units = repo.list_all().await?;
    names
        .iter()
        .map(|name| {
            units
                .iter()
                .find(|u| u.name.eq_ignore_ascii_case(name.trim()))
                .map(|u| u.id)
                .ok_or_else(|| UserError::UnknownUnit(name.clone()))
        })
        .collect()
}
