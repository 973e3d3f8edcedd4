//! Master code repository.

use std::collections::HashMap;

use sqlx::PgPool;
use tracing::instrument;

use finboard_core::MasterCodeId;

use super::RepositoryError;
use crate::models::{MasterCode, MasterCodeInput};

#[derive(Debug, sqlx::FromRow)]
struct MasterCodeRow {
    id: i32,
    account_code: String,
    category: String,
    account_name: String,
    description: Option<String>,
}

impl From<MasterCodeRow> for MasterCode {
    fn from(row: MasterCodeRow) -> Self {
        Self {
            id: MasterCodeId::new(row.id),
            account_code: row.account_code,
            category: row.category,
            account_name: row.account_name,
            description: row.description,
        }
    }
}

/// Repository for master codes.
pub struct MasterCodeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MasterCodeRepository<'a> {
    /// Create a new master code repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List master codes ordered by account code.
    ///
    /// `search` matches account code, category or account name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<MasterCode>, RepositoryError> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        let rows: Vec<MasterCodeRow> = sqlx::query_as(
            r"
            SELECT id, account_code, category, account_name, description
            FROM dashboard.master_code
            WHERE $1::text IS NULL
               OR account_code ILIKE $1
               OR category ILIKE $1
               OR account_name ILIKE $1
            ORDER BY account_code
            ",
        )
        .bind(pattern)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(MasterCode::from).collect())
    }

    /// Get a master code by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(master_code_id = %id))]
    pub async fn get_by_id(&self, id: MasterCodeId) -> Result<Option<MasterCode>, RepositoryError> {
        let row: Option<MasterCodeRow> = sqlx::query_as(
            r"
            SELECT id, account_code, category, account_name, description
            FROM dashboard.master_code
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(MasterCode::from))
    }

    /// Create a master code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the account code already exists.
    #[instrument(skip(self, input), fields(account_code = %input.account_code))]
    pub async fn create(&self, input: &MasterCodeInput) -> Result<MasterCode, RepositoryError> {
        let row: MasterCodeRow = sqlx::query_as(
            r"
            INSERT INTO dashboard.master_code (account_code, category, account_name, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, account_code, category, account_name, description
            ",
        )
        .bind(&input.account_code)
        .bind(&input.category)
        .bind(&input.account_name)
        .bind(input.description.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "account code already exists"))?;

        Ok(row.into())
    }

    /// Update a master code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row does not exist.
    /// Returns `RepositoryError::Conflict` if the account code is taken.
    #[instrument(skip(self, input), fields(master_code_id = %id))]
    pub async fn update(
        &self,
        id: MasterCodeId,
        input: &MasterCodeInput,
    ) -> Result<MasterCode, RepositoryError> {
        let row: Option<MasterCodeRow> = sqlx::query_as(
            r"
            UPDATE dashboard.master_code
            SET account_code = $2, category = $3, account_name = $4,
                description = $5, updated_at = now()
            WHERE id = $1
            RETURNING id, account_code, category, account_name, description
            ",
        )
        .bind(id)
        .bind(&input.account_code)
        .bind(&input.category)
        .bind(&input.account_name)
        .bind(input.description.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "account code already exists"))?;

        row.map(MasterCode::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete a master code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row does not exist.
    #[instrument(skip(self), fields(master_code_id = %id))]
    pub async fn delete(&self, id: MasterCodeId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM dashboard.master_code WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Map of account code to category, used to fill missing categories
    /// during unit data imports.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn category_lookup(&self) -> Result<HashMap<String, String>, RepositoryError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT account_code, category FROM dashboard.master_code")
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().collect())
    }

    /// Insert or update master codes by account code in one statement.
    ///
    /// Later rows win when the same account code appears twice.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    #[instrument(skip(self, inputs), fields(count = inputs.len()))]
    pub async fn upsert_many(&self, inputs: &[MasterCodeInput]) -> Result<u64, RepositoryError> {
        let mut by_code: HashMap<&str, &MasterCodeInput> = HashMap::new();
        for input in inputs {
            by_code.insert(input.account_code.as_str(), input);
        }

        let mut codes = Vec::with_capacity(by_code.len());
        let mut categories = Vec::with_capacity(by_code.len());
        let mut names = Vec::with_capacity(by_code.len());
        let mut descriptions = Vec::with_capacity(by_code.len());
        for input in by_code.into_values() {
            codes.push(input.account_code.clone());
            categories.push(input.category.clone());
            names.push(input.account_name.clone());
            descriptions.push(input.description.clone());
        }

        let result = sqlx::query(
            r"
            INSERT INTO dashboard.master_code (account_code, category, account_name, description)
            SELECT * FROM unnest($1::text[], $2::text[], $3::text[], $4::text[])
            ON CONFLICT (account_code) DO UPDATE
            SET category = EXCLUDED.category,
                account_name = EXCLUDED.account_name,
                description = EXCLUDED.description,
                updated_at = now()
            ",
        )
        .bind(codes)
        .bind(categories)
        .bind(names)
        .bind(descriptions)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// Escape `LIKE` wildcards in user input.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("51%_x\\"), "51\\%\\_x\\\\");
        assert_eq!(escape_like("Revenue"), "Revenue");
    }
}
