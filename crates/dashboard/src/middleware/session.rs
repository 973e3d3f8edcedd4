//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions
//! (SameSite=Strict, HttpOnly, 12 hour inactivity expiry).

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::DashboardConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "finboard_session";

/// Session expiry time in seconds (12 hours of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 12 * 60 * 60;

/// The store rejected the schema or table name.
#[derive(Debug, thiserror::Error)]
#[error("invalid session store configuration: {0}")]
pub struct SessionStoreError(String);

/// Build the `PostgreSQL` session store in the `dashboard` schema.
///
/// # Errors
///
/// Returns an error if the schema or table name is rejected.
pub fn create_session_store(pool: &PgPool) -> Result<PostgresStore, SessionStoreError> {
    // The session table is created by the dashboard migrations.
    PostgresStore::new(pool.clone())
        .with_schema_name("dashboard")
        .map_err(SessionStoreError)?
        .with_table_name("session")
        .map_err(SessionStoreError)
}

/// Create the session layer with `PostgreSQL` store.
///
/// # Errors
///
/// Returns an error if the store cannot be configured.
pub fn create_session_layer(
    pool: &PgPool,
    config: &DashboardConfig,
) -> Result<SessionManagerLayer<PostgresStore>, SessionStoreError> {
    let store = create_session_store(pool)?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/"))
}
