//! Library code repository.

use std::collections::HashMap;

use sqlx::PgPool;
use tracing::instrument;

use finboard_core::LibraryCodeId;

use super::RepositoryError;
use crate::models::{LibraryCode, LibraryCodeInput};

#[derive(Debug, sqlx::FromRow)]
struct LibraryCodeRow {
    id: i32,
    code: String,
    name: String,
    short_name: Option<String>,
}

impl From<LibraryCodeRow> for LibraryCode {
    fn from(row: LibraryCodeRow) -> Self {
        Self {
            id: LibraryCodeId::new(row.id),
            code: row.code,
            name: row.name,
            short_name: row.short_name,
        }
    }
}

/// Repository for library codes.
pub struct LibraryCodeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LibraryCodeRepository<'a> {
    /// Create a new library code repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all library codes ordered by code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<LibraryCode>, RepositoryError> {
        let rows: Vec<LibraryCodeRow> = sqlx::query_as(
            "SELECT id, code, name, short_name FROM dashboard.library_code ORDER BY code",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(LibraryCode::from).collect())
    }

    /// Insert library codes, replacing name and short name on duplicate codes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    #[instrument(skip(self, inputs), fields(count = inputs.len()))]
    pub async fn insert_many(&self, inputs: &[LibraryCodeInput]) -> Result<u64, RepositoryError> {
        let mut by_code: HashMap<&str, &LibraryCodeInput> = HashMap::new();
        for input in inputs {
            by_code.insert(input.code.as_str(), input);
        }

        let mut codes = Vec::with_capacity(by_code.len());
        let mut names = Vec::with_capacity(by_code.len());
        let mut short_names = Vec::with_capacity(by_code.len());
        for input in by_code.into_values() {
            codes.push(input.code.clone());
            names.push(input.name.clone());
            short_names.push(input.short_name.clone());
        }

        let result = sqlx::query(
            r"
            INSERT INTO dashboard.library_code (code, name, short_name)
            SELECT * FROM unnest($1::text[], $2::text[], $3::text[])
            ON CONFLICT (code) DO UPDATE
            SET name = EXCLUDED.name, short_name = EXCLUDED.short_name
            ",
        )
        .bind(codes)
        .bind(names)
        .bind(short_names)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete one library code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row does not exist.
    #[instrument(skip(self), fields(library_code_id = %id))]
    pub async fn delete(&self, id: LibraryCodeId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM dashboard.library_code WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete every library code. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    #[instrument(skip(self))]
    pub async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM dashboard.library_code")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
