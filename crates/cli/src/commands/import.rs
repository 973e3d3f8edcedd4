//! Lookup table import commands.
//!
//! # Usage
//!
//! ```bash
//! fb-cli import master-codes master_codes.xlsx
//! fb-cli import library-codes library.csv
//! ```
//!
//! Files go through the same parser as dashboard uploads: any invalid row
//! rejects the whole file.

use std::path::Path;

use finboard_dashboard::db::{LibraryCodeRepository, MasterCodeRepository, RepositoryError};
use finboard_dashboard::services::ImportError;
use finboard_dashboard::services::import::{
    parse_library_code_rows, parse_master_code_rows, read_workbook,
};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur while importing.
#[derive(Debug, Error)]
pub enum ImportCommandError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Failed to read {0}: {1}")]
    Read(String, std::io::Error),

    #[error("Import rejected: {0}")]
    Import(#[from] ImportError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

async fn read_rows(
    path: &Path,
) -> Result<Vec<finboard_dashboard::services::SheetRow>, ImportCommandError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ImportCommandError::Read(path.display().to_string(), e))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(read_workbook(&bytes, &file_name)?)
}

fn log_rejection(err: &ImportError) {
    if let ImportError::RowsRejected(rows) = err {
        for row in rows {
            tracing::error!("  {row}");
        }
    }
}

/// Upsert master codes from a spreadsheet.
pub async fn master_codes(path: &Path) -> Result<u64, ImportCommandError> {
    let rows = read_rows(path).await?;
    let codes = parse_master_code_rows(&rows)
        .and_then(finboard_dashboard::services::ImportOutcome::into_result)
        .inspect_err(log_rejection)?;

    let pool = connect().await?;
    let count = MasterCodeRepository::new(&pool).upsert_many(&codes).await?;
    tracing::info!("Imported {} master codes from {}", count, path.display());
    Ok(count)
}

/// Upsert library codes from a spreadsheet.
pub async fn library_codes(path: &Path) -> Result<u64, ImportCommandError> {
    let rows = read_rows(path).await?;
    let codes = parse_library_code_rows(&rows)
        .and_then(finboard_dashboard::services::ImportOutcome::into_result)
        .inspect_err(log_rejection)?;

    let pool = connect().await?;
    let count = LibraryCodeRepository::new(&pool).insert_many(&codes).await?;
    tracing::info!("Imported {} library codes from {}", count, path.display());
    Ok(count)
}
