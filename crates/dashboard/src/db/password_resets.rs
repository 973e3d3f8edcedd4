//! Password reset token repository.
//!
//! Only the SHA-256 hex digest of a token is stored; the raw token exists
//! in the emailed link alone.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use finboard_core::UserId;

use super::RepositoryError;

/// A stored, still-valid reset request.
#[derive(Debug, Clone)]
pub struct PasswordReset {
    pub id: i32,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct PasswordResetRow {
    id: i32,
    user_id: i32,
    expires_at: DateTime<Utc>,
}

/// Repository for password reset tokens.
pub struct PasswordResetRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PasswordResetRepository<'a> {
    /// Create a new password reset repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a token hash for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, token_hash), fields(user_id = %user_id))]
    pub async fn create(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO dashboard.password_reset (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Find an unused, unexpired reset by token hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, token_hash))]
    pub async fn find_valid(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, RepositoryError> {
        let row: Option<PasswordResetRow> = sqlx::query_as(
            r"
            SELECT id, user_id, expires_at
            FROM dashboard.password_reset
            WHERE token_hash = $1 AND used_at IS NULL AND expires_at > $2
            ",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|row| PasswordReset {
            id: row.id,
            user_id: UserId::new(row.user_id),
            expires_at: row.expires_at,
        }))
    }

    /// Spend a reset token and store the new password hash atomically.
    ///
    /// The token is claimed with a conditional update, so of two concurrent
    /// submissions only one sees the row. Other open resets of the same user
    /// are closed in the same transaction.
    ///
    /// Returns `None` if the token is unknown, expired or already used.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    #[instrument(skip_all)]
    pub async fn redeem(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
        password_hash: &str,
    ) -> Result<Option<UserId>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let claimed: Option<i32> = sqlx::query_scalar(
            r"
            UPDATE dashboard.password_reset
            SET used_at = $2
            WHERE token_hash = $1 AND used_at IS NULL AND expires_at > $2
            RETURNING user_id
            ",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_id) = claimed.map(UserId::new) else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            r"
            UPDATE dashboard.app_user
            SET password_hash = $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            UPDATE dashboard.password_reset
            SET used_at = $2
            WHERE user_id = $1 AND used_at IS NULL
            ",
        )
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(user_id))
    }
}
