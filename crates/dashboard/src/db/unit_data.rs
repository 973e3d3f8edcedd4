//! Unit data repository.
//!
//! Rows are scoped by `(unit_id, year)`. Bulk inserts share one import batch
//! ID so an upload can be removed in one step.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use finboard_core::{EntryType, Month, UnitDataItemId, UnitId};

use super::RepositoryError;
use crate::models::{
    ImportBatchSummary, NewUnitDataItem, UnitDataFilter, UnitDataItem, UnitDataUpdate,
};

/// Rows per `INSERT` statement during bulk imports.
const INSERT_CHUNK: usize = 2_000;

const ITEM_COLUMNS: &str = r"
    id, unit_id, year, account_code, month, category, area, business_line,
    value, entry_type, import_batch, created_at
";

#[derive(Debug, sqlx::FromRow)]
struct UnitDataRow {
    id: i32,
    unit_id: i32,
    year: i32,
    account_code: String,
    month: i16,
    category: String,
    area: Option<String>,
    business_line: Option<String>,
    value: Decimal,
    entry_type: EntryType,
    import_batch: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UnitDataRow> for UnitDataItem {
    type Error = RepositoryError;

    fn try_from(row: UnitDataRow) -> Result<Self, Self::Error> {
        let month = u8::try_from(row.month)
            .ok()
            .and_then(|m| Month::new(m).ok())
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!("invalid month in database: {}", row.month))
            })?;

        Ok(Self {
            id: UnitDataItemId::new(row.id),
            unit_id: UnitId::new(row.unit_id),
            year: row.year,
            account_code: row.account_code,
            month,
            category: row.category,
            area: row.area,
            business_line: row.business_line,
            value: row.value,
            entry_type: row.entry_type,
            import_batch: row.import_batch,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BatchRow {
    import_batch: Uuid,
    unit_id: i32,
    year: i32,
    row_count: i64,
    imported_at: DateTime<Utc>,
}

/// Repository for unit data rows.
pub struct UnitDataRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UnitDataRepository<'a> {
    /// Create a new unit data repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List rows matching the filter, ordered by month then account code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored month is invalid.
    #[instrument(skip(self, filter), fields(year = filter.year, units = filter.unit_ids.len()))]
    pub async fn list(&self, filter: &UnitDataFilter) -> Result<Vec<UnitDataItem>, RepositoryError> {
        if filter.unit_ids.is_empty() {
            return Ok(Vec::new());
        }

        let unit_ids: Vec<i32> = filter.unit_ids.iter().map(UnitId::as_i32).collect();
        let month = filter.month.map(|m| i16::from(m.number()));

        let rows: Vec<UnitDataRow> = sqlx::query_as(&format!(
            r"
            SELECT {ITEM_COLUMNS}
            FROM dashboard.unit_data_item
            WHERE unit_id = ANY($1)
              AND year = $2
              AND ($3::text IS NULL OR category = $3)
              AND ($4::int2 IS NULL OR month = $4)
            ORDER BY month, account_code, id
            "
        ))
        .bind(unit_ids)
        .bind(filter.year)
        .bind(filter.category.as_deref())
        .bind(month)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// All rows of the given units and year, the input for report aggregation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_units(
        &self,
        unit_ids: &[UnitId],
        year: i32,
    ) -> Result<Vec<UnitDataItem>, RepositoryError> {
        self.list(&UnitDataFilter {
            unit_ids: unit_ids.to_vec(),
            year,
            ..UnitDataFilter::default()
        })
        .await
    }

    /// Get a row by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn get_by_id(
        &self,
        id: UnitDataItemId,
    ) -> Result<Option<UnitDataItem>, RepositoryError> {
        let row: Option<UnitDataRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM dashboard.unit_data_item WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Distinct categories present for a unit and year, for the filter menu.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(unit_id = %unit_id))]
    pub async fn categories(&self, unit_id: UnitId, year: i32) -> Result<Vec<String>, RepositoryError> {
        let categories: Vec<String> = sqlx::query_scalar(
            r"
            SELECT DISTINCT category
            FROM dashboard.unit_data_item
            WHERE unit_id = $1 AND year = $2
            ORDER BY category
            ",
        )
        .bind(unit_id)
        .bind(year)
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Years that have data for any of the given units, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, unit_ids))]
    pub async fn years_for_units(&self, unit_ids: &[UnitId]) -> Result<Vec<i32>, RepositoryError> {
        let raw: Vec<i32> = unit_ids.iter().map(UnitId::as_i32).collect();
        let years: Vec<i32> = sqlx::query_scalar(
            r"
            SELECT DISTINCT year
            FROM dashboard.unit_data_item
            WHERE unit_id = ANY($1)
            ORDER BY year DESC
            ",
        )
        .bind(raw)
        .fetch_all(self.pool)
        .await?;

        Ok(years)
    }

    /// Years that have data for one unit, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn years_for_unit(&self, unit_id: UnitId) -> Result<Vec<i32>, RepositoryError> {
        self.years_for_units(&[unit_id]).await
    }

    /// Insert parsed rows for a unit and year in one transaction.
    ///
    /// Returns the new import batch ID and the number of rows inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the unit does not exist.
    /// Returns `RepositoryError::Database` for other database errors; no
    /// rows are kept in that case.
    #[instrument(skip(self, items), fields(unit_id = %unit_id, count = items.len()))]
    pub async fn insert_many(
        &self,
        unit_id: UnitId,
        year: i32,
        items: &[NewUnitDataItem],
    ) -> Result<(Uuid, u64), RepositoryError> {
        let batch = Uuid::new_v4();
        let mut inserted = 0;
        let mut tx = self.pool.begin().await?;

        for chunk in items.chunks(INSERT_CHUNK) {
            let mut codes = Vec::with_capacity(chunk.len());
            let mut months = Vec::with_capacity(chunk.len());
            let mut categories = Vec::with_capacity(chunk.len());
            let mut areas = Vec::with_capacity(chunk.len());
            let mut lines = Vec::with_capacity(chunk.len());
            let mut values = Vec::with_capacity(chunk.len());
            let mut types = Vec::with_capacity(chunk.len());
            for item in chunk {
                codes.push(item.account_code.clone());
                months.push(i16::from(item.month.number()));
                categories.push(item.category.clone());
                areas.push(item.area.clone());
                lines.push(item.business_line.clone());
                values.push(item.value);
                types.push(entry_type_key(item.entry_type));
            }

            let result = sqlx::query(
                r"
                INSERT INTO dashboard.unit_data_item
                    (unit_id, year, account_code, month, category, area,
                     business_line, value, entry_type, import_batch)
                SELECT $1, $2, t.account_code, t.month, t.category, t.area,
                       t.business_line, t.value, t.entry_type::dashboard.entry_type, $3
                FROM unnest($4::text[], $5::int2[], $6::text[], $7::text[],
                            $8::text[], $9::numeric[], $10::text[])
                    AS t(account_code, month, category, area, business_line, value, entry_type)
                ",
            )
            .bind(unit_id)
            .bind(year)
            .bind(batch)
            .bind(codes)
            .bind(months)
            .bind(categories)
            .bind(areas)
            .bind(lines)
            .bind(values)
            .bind(types)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_constraint(e, "unit does not exist"))?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok((batch, inserted))
    }

    /// Update the editable fields of a row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row does not exist.
    #[instrument(skip(self, update), fields(item_id = %id))]
    pub async fn update(
        &self,
        id: UnitDataItemId,
        update: &UnitDataUpdate,
    ) -> Result<UnitDataItem, RepositoryError> {
        let row: Option<UnitDataRow> = sqlx::query_as(&format!(
            r"
            UPDATE dashboard.unit_data_item
            SET account_code = $2, month = $3, category = $4, area = $5,
                business_line = $6, value = $7, entry_type = $8, updated_at = now()
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&update.account_code)
        .bind(i16::from(update.month.number()))
        .bind(&update.category)
        .bind(update.area.as_deref())
        .bind(update.business_line.as_deref())
        .bind(update.value)
        .bind(update.entry_type)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete a row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row does not exist.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn delete(&self, id: UnitDataItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM dashboard.unit_data_item WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete every row of a unit and year. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    #[instrument(skip(self), fields(unit_id = %unit_id))]
    pub async fn delete_for_year(&self, unit_id: UnitId, year: i32) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM dashboard.unit_data_item WHERE unit_id = $1 AND year = $2")
                .bind(unit_id)
                .bind(year)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Delete the rows of one import batch. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no rows carry the batch ID.
    #[instrument(skip(self))]
    pub async fn delete_batch(&self, batch: Uuid) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM dashboard.unit_data_item WHERE import_batch = $1")
            .bind(batch)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(result.rows_affected())
    }

    /// Unit and year of an import batch, used for access checks.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn batch_scope(&self, batch: Uuid) -> Result<Option<(UnitId, i32)>, RepositoryError> {
        let row: Option<(i32, i32)> = sqlx::query_as(
            r"
            SELECT unit_id, year
            FROM dashboard.unit_data_item
            WHERE import_batch = $1
            LIMIT 1
            ",
        )
        .bind(batch)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(unit_id, year)| (UnitId::new(unit_id), year)))
    }

    /// Most recent import batches across the given units.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, unit_ids))]
    pub async fn recent_batches(
        &self,
        unit_ids: &[UnitId],
        limit: i64,
    ) -> Result<Vec<ImportBatchSummary>, RepositoryError> {
        let raw: Vec<i32> = unit_ids.iter().map(UnitId::as_i32).collect();
        let rows: Vec<BatchRow> = sqlx::query_as(
            r"
            SELECT import_batch, unit_id, year,
                   COUNT(*) AS row_count,
                   MIN(created_at) AS imported_at
            FROM dashboard.unit_data_item
            WHERE import_batch IS NOT NULL AND unit_id = ANY($1)
            GROUP BY import_batch, unit_id, year
            ORDER BY imported_at DESC
            LIMIT $2
            ",
        )
        .bind(raw)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ImportBatchSummary {
                batch_id: row.import_batch,
                unit_id: UnitId::new(row.unit_id),
                year: row.year,
                row_count: row.row_count,
                imported_at: row.imported_at,
            })
            .collect())
    }
}

const fn entry_type_key(entry_type: EntryType) -> &'static str {
    match entry_type {
        EntryType::Debit => "debit",
        EntryType::Credit => "credit",
    }
}
