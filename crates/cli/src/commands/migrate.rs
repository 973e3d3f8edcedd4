//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! fb-cli migrate
//! fb-cli migrate --dir /srv/finboard/migrations
//! ```
//!
//! # Environment Variables
//!
//! - `DASHBOARD_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `FB_MIGRATIONS_DIR` - Migration directory (default: `crates/dashboard/migrations`)

use std::path::Path;

use sqlx::migrate::{MigrateError, Migrator};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Migration error: {0}")]
    Migration(#[from] MigrateError),
}

/// Apply every pending migration in `dir`.
pub async fn run(dir: &Path) -> Result<(), MigrationError> {
    let pool = connect().await?;

    let migrator = Migrator::new(dir).await?;
    tracing::info!(
        dir = %dir.display(),
        available = migrator.iter().count(),
        "Running dashboard migrations..."
    );
    migrator.run(&pool).await?;

    tracing::info!("Dashboard migrations complete!");
    Ok(())
}
