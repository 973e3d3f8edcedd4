//! Database operations for the dashboard `PostgreSQL`.
//!
//! # Schema: `dashboard`
//!
//! ## Tables
//!
//! - `unit` - Business units
//! - `app_user` - Dashboard users (roles stored as `TEXT[]`)
//! - `user_unit` - Unit assignments per user
//! - `master_code` - Account code to report category lookup
//! - `unit_data_item` - Transaction rows per unit and year
//! - `library_code` - Reference codes
//! - `password_reset` - Hashed password reset tokens
//! - `session` - tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/dashboard/migrations/` and run via:
//! ```bash
//! cargo run -p finboard-cli -- migrate
//! ```

pub mod library_codes;
pub mod master_codes;
pub mod password_resets;
pub mod unit_data;
pub mod units;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use library_codes::LibraryCodeRepository;
pub use master_codes::MasterCodeRepository;
pub use password_resets::{PasswordReset, PasswordResetRepository};
pub use unit_data::UnitDataRepository;
pub use units::UnitRepository;
pub use users::{EMAIL_TAKEN, UNKNOWN_UNIT, UserRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique and foreign key violations to `Conflict` with `message`.
    pub(crate) fn from_constraint(err: sqlx::Error, message: &str) -> Self {
        match err {
            sqlx::Error::Database(ref db_err)
                if db_err.is_unique_violation() || db_err.is_foreign_key_violation() =>
            {
                Self::Conflict(message.to_owned())
            }
            other => Self::Database(other),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Trim a form or cell value, mapping blanks to `None`.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(Some(" North ")), Some("North".to_owned()));
    }

    #[test]
    fn test_from_constraint_passes_through_other_errors() {
        let err = RepositoryError::from_constraint(sqlx::Error::RowNotFound, "duplicate");
        assert!(matches!(err, RepositoryError::Database(sqlx::Error::RowNotFound)));
    }
}
