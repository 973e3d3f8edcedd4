//! Dashboard user repository.
//!
//! Roles live in a `TEXT[]` column and unit assignments in `user_unit`;
//! both are folded into the [`User`] domain type on read.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use finboard_core::{Email, RoleSet, UnitId, UserId};

use super::RepositoryError;
use crate::models::{User, UserProfile, UserWithPassword};

/// `Conflict` message when the email belongs to another user.
pub const EMAIL_TAKEN: &str = "email already exists";

/// `Conflict` message when an assigned unit does not exist.
pub const UNKNOWN_UNIT: &str = "unknown unit";

const USER_COLUMNS: &str = r"
    u.id, u.name, u.email, u.roles, u.password_hash, u.created_at, u.updated_at,
    COALESCE(
        array_agg(uu.unit_id ORDER BY uu.unit_id) FILTER (WHERE uu.unit_id IS NOT NULL),
        '{}'
    ) AS unit_ids
";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    roles: Vec<String>,
    password_hash: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    unit_ids: Vec<i32>,
}

impl TryFrom<UserRow> for UserWithPassword {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let roles = RoleSet::parse_all(&row.roles).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid roles in database: {e}"))
        })?;

        Ok(Self {
            user: User {
                id: UserId::new(row.id),
                name: row.name,
                email,
                roles,
                unit_ids: row.unit_ids.into_iter().map(UnitId::new).collect(),
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            password_hash: row.password_hash,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        UserWithPassword::try_from(row).map(|u| u.user)
    }
}

/// Repository for dashboard users.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all users with their unit assignments, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email or role is invalid.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            r"
            SELECT {USER_COLUMNS}
            FROM dashboard.app_user u
            LEFT JOIN dashboard.user_unit uu ON uu.user_id = u.id
            GROUP BY u.id
            ORDER BY lower(u.name)
            "
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            SELECT {USER_COLUMNS}
            FROM dashboard.app_user u
            LEFT JOIN dashboard.user_unit uu ON uu.user_id = u.id
            WHERE u.id = $1
            GROUP BY u.id
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user and their password hash by email, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    #[instrument(skip(self, email))]
    pub async fn get_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserWithPassword>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            SELECT {USER_COLUMNS}
            FROM dashboard.app_user u
            LEFT JOIN dashboard.user_unit uu ON uu.user_id = u.id
            WHERE u.email = $1
            GROUP BY u.id
            "
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a user with their unit assignments in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists or a
    /// unit does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, profile, password_hash), fields(email = %profile.email))]
    pub async fn create(
        &self,
        profile: &UserProfile,
        password_hash: Option<&str>,
        unit_ids: &[UnitId],
    ) -> Result<UserId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO dashboard.app_user (name, email, roles, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&profile.name)
        .bind(profile.email.as_str())
        .bind(profile.roles.keys())
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, EMAIL_TAKEN))?;

        let id = UserId::new(id);
        replace_units(&mut tx, id, unit_ids).await?;
        tx.commit().await?;

        Ok(id)
    }

    /// Update name, email, roles, unit assignments and optionally the
    /// password hash in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Conflict` with [`EMAIL_TAKEN`] if the email
    /// belongs to another user, or [`UNKNOWN_UNIT`] if a unit is gone.
    #[instrument(skip(self, profile, password_hash), fields(user_id = %id))]
    pub async fn update(
        &self,
        id: UserId,
        profile: &UserProfile,
        unit_ids: &[UnitId],
        password_hash: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE dashboard.app_user
            SET name = $2, email = $3, roles = $4,
                password_hash = COALESCE($5, password_hash), updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&profile.name)
        .bind(profile.email.as_str())
        .bind(profile.roles.keys())
        .bind(password_hash)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, EMAIL_TAKEN))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        replace_units(&mut tx, id, unit_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Units assigned to a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn units_for_user(&self, id: UserId) -> Result<Vec<UnitId>, RepositoryError> {
        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT unit_id FROM dashboard.user_unit WHERE user_id = $1 ORDER BY unit_id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(ids.into_iter().map(UnitId::new).collect())
    }

    /// Delete a user. Unit assignments and reset tokens go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM dashboard.app_user WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

async fn replace_units(
    tx: &mut Transaction<'_, Postgres>,
    id: UserId,
    unit_ids: &[UnitId],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM dashboard.user_unit WHERE user_id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;

    let raw: Vec<i32> = unit_ids.iter().map(UnitId::as_i32).collect();
    sqlx::query(
        r"
        INSERT INTO dashboard.user_unit (user_id, unit_id)
        SELECT $1, unit_id FROM unnest($2::int4[]) AS t(unit_id)
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(id)
    .bind(raw)
    .execute(&mut **tx)
    .await
    .map_err(|e| RepositoryError::from_constraint(e, UNKNOWN_UNIT))?;

    Ok(())
}
