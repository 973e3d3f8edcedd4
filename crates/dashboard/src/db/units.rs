//! Business unit repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use finboard_core::UnitId;

use super::RepositoryError;
use crate::models::{Unit, UnitWithUsage};

#[derive(Debug, sqlx::FromRow)]
struct UnitRow {
    id: i32,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UnitRow> for Unit {
    fn from(row: UnitRow) -> Self {
        Self {
            id: UnitId::new(row.id),
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UnitUsageRow {
    id: i32,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_count: i64,
}

/// Repository for business units.
pub struct UnitRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UnitRepository<'a> {
    /// Create a new unit repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all units ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Unit>, RepositoryError> {
        let rows: Vec<UnitRow> = sqlx::query_as(
            r"
            SELECT id, name, created_at, updated_at
            FROM dashboard.unit
            ORDER BY lower(name)
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Unit::from).collect())
    }

    /// List all units with the number of users assigned to each.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_with_usage(&self) -> Result<Vec<UnitWithUsage>, RepositoryError> {
        let rows: Vec<UnitUsageRow> = sqlx::query_as(
            r"
            SELECT u.id, u.name, u.created_at, u.updated_at,
                   COUNT(uu.user_id) AS user_count
            FROM dashboard.unit u
            LEFT JOIN dashboard.user_unit uu ON uu.unit_id = u.id
            GROUP BY u.id
            ORDER BY lower(u.name)
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| UnitWithUsage {
                user_count: row.user_count,
                unit: Unit {
                    id: UnitId::new(row.id),
                    name: row.name,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                },
            })
            .collect())
    }

    /// Get a unit by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(unit_id = %id))]
    pub async fn get_by_id(&self, id: UnitId) -> Result<Option<Unit>, RepositoryError> {
        let row: Option<UnitRow> = sqlx::query_as(
            r"
            SELECT id, name, created_at, updated_at
            FROM dashboard.unit
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Unit::from))
    }

    /// Create a unit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a unit with the same name
    /// (ignoring case) exists.
    #[instrument(skip(self))]
    pub async fn create(&self, name: &str) -> Result<Unit, RepositoryError> {
        let row: UnitRow = sqlx::query_as(
            r"
            INSERT INTO dashboard.unit (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            ",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "unit name already exists"))?;

        Ok(row.into())
    }

    /// Rename a unit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the unit does not exist.
    /// Returns `RepositoryError::Conflict` if the new name is taken.
    #[instrument(skip(self), fields(unit_id = %id))]
    pub async fn rename(&self, id: UnitId, name: &str) -> Result<Unit, RepositoryError> {
        let row: Option<UnitRow> = sqlx::query_as(
            r"
            UPDATE dashboard.unit
            SET name = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, name, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "unit name already exists"))?;

        row.map(Unit::from).ok_or(RepositoryError::NotFound)
    }

    /// Count users assigned to a unit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(unit_id = %id))]
    pub async fn count_assigned_users(&self, id: UnitId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM dashboard.user_unit WHERE unit_id = $1",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Delete a unit together with its data rows.
    ///
    /// Units still assigned to users cannot be deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if users are assigned to the unit.
    /// Returns `RepositoryError::NotFound` if the unit does not exist.
    #[instrument(skip(self), fields(unit_id = %id))]
    pub async fn delete(&self, id: UnitId) -> Result<(), RepositoryError> {
        if self.count_assigned_users(id).await? > 0 {
            return Err(RepositoryError::Conflict(
                "unit is assigned to users".to_owned(),
            ));
        }

        let result = sqlx::query("DELETE FROM dashboard.unit WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_constraint(e, "unit is assigned to users"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
