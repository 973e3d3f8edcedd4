//! Multipart spreadsheet uploads.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::Multipart;
use axum::http::StatusCode;

use crate::components::Flash;
use crate::i18n::MessageKey;
use crate::services::ImportError;
use crate::services::import::is_supported_file;
use crate::state::AppState;

/// Maximum number of rejected rows listed in a notice.
const MAX_LISTED_ROW_ERRORS: usize = 20;

/// A parsed upload form: text fields plus one file.
#[derive(Debug)]
pub struct Upload {
    pub fields: HashMap<String, String>,
    pub file_name: String,
    pub bytes: Bytes,
}

impl Upload {
    /// A text field, trimmed.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Why an upload form was rejected before parsing the file.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no file selected")]
    NoFile,
    #[error("unsupported file type")]
    UnsupportedFileType,
    #[error("file too large")]
    TooLarge,
    #[error("malformed upload: {0}")]
    Malformed(String),
}

impl UploadError {
    /// Translated notice for the error.
    #[must_use]
    pub fn flash(&self, state: &AppState) -> Flash {
        let key = match self {
            Self::NoFile => MessageKey::NoFileSelected,
            Self::UnsupportedFileType => MessageKey::UnsupportedFileType,
            Self::TooLarge => MessageKey::FileTooLarge,
            Self::Malformed(_) => MessageKey::ImportFailed,
        };
        Flash::error(state.t(key))
    }
}

/// Read all fields of a multipart form. The field named `file` is the upload.
///
/// # Errors
///
/// Returns an [`UploadError`] if no file was chosen, the file type is not a
/// spreadsheet, the body exceeds `max_bytes` or the form is malformed.
pub async fn read_upload(mut multipart: Multipart, max_bytes: usize) -> Result<Upload, UploadError> {
    let mut fields = HashMap::new();
    let mut file: Option<(String, Bytes)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(UploadError::TooLarge);
            }
            Err(e) => return Err(UploadError::Malformed(e.body_text())),
        };

        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(|e| {
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    UploadError::TooLarge
                } else {
                    UploadError::Malformed(e.body_text())
                }
            })?;
            file = Some((file_name, bytes));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| UploadError::Malformed(e.body_text()))?;
            fields.insert(name, value);
        }
    }

    let (file_name, bytes) = file.ok_or(UploadError::NoFile)?;
    if file_name.trim().is_empty() || bytes.is_empty() {
        return Err(UploadError::NoFile);
    }
    if !is_supported_file(&file_name) {
        return Err(UploadError::UnsupportedFileType);
    }
    if bytes.len() > max_bytes {
        return Err(UploadError::TooLarge);
    }

    Ok(Upload {
        fields,
        file_name,
        bytes,
    })
}

/// Translated notice for a rejected import, listing row errors.
#[must_use]
pub fn import_failure_flash(state: &AppState, err: &ImportError) -> Flash {
    match err {
        ImportError::RowsRejected(rows) => Flash::error(state.t(MessageKey::ImportFailed))
            .with_details(rows.iter().map(ToString::to_string).collect(), MAX_LISTED_ROW_ERRORS),
        ImportError::UnsupportedFileType(_) => Flash::error(state.t(MessageKey::UnsupportedFileType)),
        other => {
            Flash::error(state.t(MessageKey::ImportFailed)).with_details(vec![other.to_string()], 1)
        }
    }
}

/// Success notice with the imported row count.
#[must_use]
pub fn import_success_flash(state: &AppState, rows: u64) -> Flash {
    Flash::success(format!("{} ({rows})", state.t(MessageKey::ImportSucceeded)))
}
