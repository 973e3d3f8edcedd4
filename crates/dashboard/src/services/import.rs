//! Spreadsheet import.
//!
//! Uploaded `.xlsx`/`.xls`/`.ods` workbooks (first worksheet) and `.csv`
//! files are read into [`SheetRow`]s keyed by normalised column header.
//! Row mappers turn those into records for unit data, master codes and
//! library codes, collecting one [`RowError`] per rejected row. An import is
//! all-or-nothing: any row error rejects the whole file.

use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use calamine::{Data, Reader};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use thiserror::Error;

use finboard_core::{EntryType, Month};

use crate::models::{LibraryCodeInput, MasterCodeInput, NewUnitDataItem};

/// Errors that reject an uploaded file.
#[derive(Debug, Error)]
pub enum ImportError {
    /// File extension is not a supported spreadsheet type.
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Workbook could not be opened or has no worksheet.
    #[error("could not read workbook: {0}")]
    Workbook(String),

    /// CSV could not be parsed.
    #[error("could not read csv: {0}")]
    Csv(#[from] csv::Error),

    /// The sheet has no header row or no data rows.
    #[error("the file contains no data rows")]
    NoRows,

    /// Required columns are absent from the header row.
    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// One or more rows failed validation.
    #[error("{} row(s) rejected", .0.len())]
    RowsRejected(Vec<RowError>),
}

/// A rejected row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 1-based row number in the source sheet.
    pub row: usize,
    /// Column the problem was found in.
    pub field: String,
    pub reason: String,
}

impl RowError {
    fn new(row: usize, field: &str, reason: impl Into<String>) -> Self {
        Self {
            row,
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}: {}", self.row, self.field, self.reason)
    }
}

/// Records parsed from a sheet plus the rows that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome<T> {
    pub records: Vec<T>,
    pub errors: Vec<RowError>,
}

impl<T> ImportOutcome<T> {
    /// Accept the records only if no row failed and at least one parsed.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::RowsRejected` if any row failed, or
    /// `ImportError::NoRows` if nothing was parsed.
    pub fn into_result(self) -> Result<Vec<T>, ImportError> {
        if !self.errors.is_empty() {
            return Err(ImportError::RowsRejected(self.errors));
        }
        if self.records.is_empty() {
            return Err(ImportError::NoRows);
        }
        Ok(self.records)
    }
}

impl<T> FromIterator<Result<T, RowError>> for ImportOutcome<T> {
    fn from_iter<I: IntoIterator<Item = Result<T, RowError>>>(iter: I) -> Self {
        let mut outcome = Self {
            records: Vec::new(),
            errors: Vec::new(),
        };
        for result in iter {
            match result {
                Ok(record) => outcome.records.push(record),
                Err(err) => outcome.errors.push(err),
            }
        }
        outcome
    }
}

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self::Empty
        } else {
            Self::Text(trimmed.to_owned())
        }
    }

    /// Whether the cell holds nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Cell content as trimmed text. Whole numbers render without a
    /// decimal point so numeric account codes read back as `51001`.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{n:.0}")),
            Self::Number(n) => Some(n.to_string()),
            Self::Bool(b) => Some(b.to_string()),
        }
    }

    /// Cell content as a decimal. Text may carry thousands separators.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        self.as_amount().ok()
    }

    /// Cell content as a stored amount with at most [`AMOUNT_SCALE`]
    /// decimal places.
    ///
    /// Numeric cells drop float noise beyond six places first; text is
    /// taken as written, so `1.250` counts as three places.
    ///
    /// # Errors
    ///
    /// Returns the [`AmountError`] naming why the cell is not an amount.
    pub fn as_amount(&self) -> Result<Decimal, AmountError> {
        let value = match self {
            Self::Number(n) => Decimal::from_f64(*n)
                .map(|d| d.round_dp(6).normalize())
                .ok_or(AmountError::NotANumber)?,
            Self::Text(s) => parse_amount_text(s)?,
            Self::Empty | Self::Bool(_) => return Err(AmountError::NotANumber),
        };
        check_scale(value)
    }

    fn as_month(&self) -> Result<Month, String> {
        match self {
            Self::Number(n) => Month::from_number(*n).map_err(|e| e.to_string()),
            Self::Text(s) => Month::from_str(s).map_err(|e| e.to_string()),
            Self::Empty => Err("required".to_owned()),
            Self::Bool(_) => Err("not a month".to_owned()),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Self::Empty,
            Data::String(s) => Self::from_text(s),
            #[allow(clippy::cast_precision_loss)]
            Data::Int(i) => Self::Number(*i as f64),
            Data::Float(f) => Self::Number(*f),
            Data::Bool(b) => Self::Bool(*b),
            other => Self::from_text(&other.to_string()),
        }
    }
}

/// Decimal places kept by `unit_data_item.value`.
pub const AMOUNT_SCALE: u32 = 2;

/// Why a value could not be read as an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("not a number")]
    NotANumber,

    /// Separators do not follow `1,234,567.89`, e.g. `1.250,50`.
    #[error("ambiguous number format")]
    AmbiguousFormat,

    #[error("more than 2 decimal places")]
    TooManyDecimals,
}

/// Parse an amount written as `1,234.50`, `-1234.5` or `(2,000)`.
///
/// `,` is only accepted as a thousands separator in the integer part and
/// `.` only as the decimal point, so `1.250,50` and `1,25` are rejected
/// rather than misread.
///
/// # Errors
///
/// Returns `AmountError::AmbiguousFormat` for misplaced separators and
/// `AmountError::NotANumber` for anything else that does not parse.
pub fn parse_amount_text(raw: &str) -> Result<Decimal, AmountError> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}'))
        .collect();
    let (negative, body) = match cleaned.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };

    if body.matches('.').count() > 1 {
        return Err(AmountError::AmbiguousFormat);
    }
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
    if frac_part.contains(',') || !valid_grouping(int_part) {
        return Err(AmountError::AmbiguousFormat);
    }

    let digits = body.replace(',', "");
    let value = Decimal::from_str(&digits)
        .or_else(|_| Decimal::from_scientific(&digits))
        .map_err(|_| AmountError::NotANumber)?;
    Ok(if negative { -value } else { value })
}

/// `,` groups must be three digits after the first group.
fn valid_grouping(int_part: &str) -> bool {
    if !int_part.contains(',') {
        return true;
    }
    let unsigned = int_part.trim_start_matches(['-', '+']);
    let mut groups = unsigned.split(',');
    let first_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()) && g.bytes().all(|b| b.is_ascii_digit()));
    first_ok && groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

fn check_scale(value: Decimal) -> Result<Decimal, AmountError> {
    if value.scale() > AMOUNT_SCALE {
        Err(AmountError::TooManyDecimals)
    } else {
        Ok(value)
    }
}

/// Parse a typed amount, e.g. from an edit form, with the same rules as
/// spreadsheet text cells.
///
/// # Errors
///
/// Returns the [`AmountError`] naming why the text is not an amount.
pub fn parse_amount(raw: &str) -> Result<Decimal, AmountError> {
    parse_amount_text(raw).and_then(check_scale)
}

static EMPTY_CELL: CellValue = CellValue::Empty;

/// One data row keyed by normalised header.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    /// 1-based row number in the source sheet.
    pub number: usize,
    cells: HashMap<String, CellValue>,
}

impl SheetRow {
    /// Build a row from `(header, value)` pairs. Headers are normalised.
    #[must_use]
    pub fn new<'a>(number: usize, cells: impl IntoIterator<Item = (&'a str, CellValue)>) -> Self {
        Self {
            number,
            cells: cells
                .into_iter()
                .map(|(k, v)| (normalize_header(k), v))
                .collect(),
        }
    }

    /// First non-empty cell among the given header aliases.
    #[must_use]
    pub fn get(&self, aliases: &[&str]) -> &CellValue {
        aliases
            .iter()
            .filter_map(|alias| self.cells.get(*alias))
            .find(|cell| !cell.is_empty())
            .unwrap_or(&EMPTY_CELL)
    }

    fn text(&self, field: &Field) -> Option<String> {
        self.get(field.aliases).as_text()
    }

    fn required_text(&self, field: &Field) -> Result<String, RowError> {
        self.text(field)
            .ok_or_else(|| RowError::new(self.number, field.name, "required"))
    }
}

/// Lowercase, trim and collapse spaces, underscores and dashes to one space.
#[must_use]
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('\u{feff}')
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A logical column and the headers accepted for it.
struct Field {
    name: &'static str,
    aliases: &'static [&'static str],
}

const ACCOUNT_CODE: Field = Field {
    name: "account code",
    aliases: &["account code", "accountcode", "kode akun", "no akun", "account"],
};
const MONTH: Field = Field {
    name: "month",
    aliases: &["month", "bulan", "periode"],
};
const VALUE: Field = Field {
    name: "value",
    aliases: &["value", "nilai", "amount", "jumlah"],
};
const CATEGORY: Field = Field {
    name: "category",
    aliases: &["category", "kategori"],
};
const AREA: Field = Field {
    name: "area",
    aliases: &["area", "wilayah"],
};
const BUSINESS_LINE: Field = Field {
    name: "business line",
    aliases: &["business line", "businessline", "lini bisnis", "line of business"],
};
const ENTRY_TYPE: Field = Field {
    name: "type",
    aliases: &["type", "tipe", "entry type", "jenis", "debit/credit"],
};
const ACCOUNT_NAME: Field = Field {
    name: "account name",
    aliases: &["account name", "nama akun"],
};
const DESCRIPTION: Field = Field {
    name: "description",
    aliases: &["description", "deskripsi", "keterangan"],
};
const CODE: Field = Field {
    name: "code",
    aliases: &["code", "kode"],
};
const NAME: Field = Field {
    name: "name",
    aliases: &["name", "nama"],
};
const SHORT_NAME: Field = Field {
    name: "short name",
    aliases: &["short name", "shortname", "nama singkat", "singkatan"],
};

/// Read the first worksheet of a workbook, or a CSV file, into rows.
///
/// The first non-empty row is the header. Fully empty rows are skipped.
///
/// # Errors
///
/// Returns `ImportError::UnsupportedFileType` for other extensions,
/// `ImportError::Workbook`/`ImportError::Csv` for unreadable files and
/// `ImportError::NoRows` when no data row follows the header.
pub fn read_workbook(bytes: &[u8], file_name: &str) -> Result<Vec<SheetRow>, ImportError> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    let grid = match extension.as_str() {
        "csv" => read_csv_grid(bytes)?,
        "xlsx" | "xlsm" | "xls" | "ods" => read_sheet_grid(bytes)?,
        _ => return Err(ImportError::UnsupportedFileType(file_name.to_owned())),
    };

    rows_from_grid(grid)
}

/// Whether the file name has an extension [`read_workbook`] accepts.
#[must_use]
pub fn is_supported_file(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| {
            matches!(
                ext.to_lowercase().as_str(),
                "csv" | "xlsx" | "xlsm" | "xls" | "ods"
            )
        })
}

type Grid = Vec<(usize, Vec<CellValue>)>;

fn read_sheet_grid(bytes: &[u8]) -> Result<Grid, ImportError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ImportError::Workbook(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::Workbook("workbook has no worksheets".to_owned()))?
        .map_err(|e| ImportError::Workbook(e.to_string()))?;

    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    let first_col = range.start().map_or(0, |(_, col)| col as usize);

    Ok(range
        .rows()
        .enumerate()
        .map(|(idx, cells)| {
            let mut values = vec![CellValue::Empty; first_col];
            values.extend(cells.iter().map(CellValue::from));
            (first_row + idx + 1, values)
        })
        .collect())
}

fn read_csv_grid(bytes: &[u8]) -> Result<Grid, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut grid = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map_or(idx + 1, |p| usize::try_from(p.line()).unwrap_or(idx + 1));
        let values = record
            .iter()
            .map(|field| CellValue::from_text(field.trim_start_matches('\u{feff}')))
            .collect();
        grid.push((line, values));
    }
    Ok(grid)
}

fn rows_from_grid(grid: Grid) -> Result<Vec<SheetRow>, ImportError> {
    let mut rows = grid
        .into_iter()
        .filter(|(_, cells)| cells.iter().any(|c| !c.is_empty()));

    let (_, header_cells) = rows.next().ok_or(ImportError::NoRows)?;
    let headers: Vec<Option<String>> = header_cells
        .iter()
        .map(|cell| cell.as_text().map(|h| normalize_header(&h)))
        .collect();

    let data: Vec<SheetRow> = rows
        .map(|(number, cells)| {
            let mut map = HashMap::new();
            for (header, cell) in headers.iter().zip(cells) {
                if let Some(header) = header {
                    map.entry(header.clone()).or_insert(cell);
                }
            }
            SheetRow { number, cells: map }
        })
        .collect();

    if data.is_empty() {
        return Err(ImportError::NoRows);
    }
    Ok(data)
}

/// Fail fast when a required column is absent from every row.
fn require_columns(rows: &[SheetRow], fields: &[&Field]) -> Result<(), ImportError> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|field| {
            !rows
                .iter()
                .any(|row| field.aliases.iter().any(|a| row.cells.contains_key(*a)))
        })
        .map(|field| field.name.to_owned())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ImportError::MissingColumns(missing))
    }
}

/// Map rows to unit data items.
///
/// Rows without a category take it from `category_lookup` (account code to
/// category); rows missing both are rejected.
///
/// # Errors
///
/// Returns `ImportError::MissingColumns` if account code, month or value
/// columns are absent.
pub fn parse_unit_data_rows(
    rows: &[SheetRow],
    category_lookup: &HashMap<String, String>,
) -> Result<ImportOutcome<NewUnitDataItem>, ImportError> {
    require_columns(rows, &[&ACCOUNT_CODE, &MONTH, &VALUE])?;
    Ok(rows
        .iter()
        .map(|row| parse_unit_data_row(row, category_lookup))
        .collect())
}

fn parse_unit_data_row(
    row: &SheetRow,
    category_lookup: &HashMap<String, String>,
) -> Result<NewUnitDataItem, RowError> {
    let account_code = row.required_text(&ACCOUNT_CODE)?;

    let month = row
        .get(MONTH.aliases)
        .as_month()
        .map_err(|reason| RowError::new(row.number, MONTH.name, reason))?;

    let value_cell = row.get(VALUE.aliases);
    if value_cell.is_empty() {
        return Err(RowError::new(row.number, VALUE.name, "required"));
    }
    let value = value_cell
        .as_amount()
        .map_err(|e| RowError::new(row.number, VALUE.name, e.to_string()))?;

    let category = row
        .text(&CATEGORY)
        .or_else(|| category_lookup.get(&account_code).cloned())
        .ok_or_else(|| {
            RowError::new(
                row.number,
                CATEGORY.name,
                format!("missing and account code {account_code} is not in master codes"),
            )
        })?;

    let entry_type = EntryType::from_cell(&row.text(&ENTRY_TYPE).unwrap_or_default());

    Ok(NewUnitDataItem {
        account_code,
        month,
        category,
        area: row.text(&AREA),
        business_line: row.text(&BUSINESS_LINE),
        value,
        entry_type,
    })
}

/// Map rows to master code inputs.
///
/// # Errors
///
/// Returns `ImportError::MissingColumns` if account code, category or
/// account name columns are absent.
pub fn parse_master_code_rows(
    rows: &[SheetRow],
) -> Result<ImportOutcome<MasterCodeInput>, ImportError> {
    require_columns(rows, &[&ACCOUNT_CODE, &CATEGORY, &ACCOUNT_NAME])?;
    Ok(rows
        .iter()
        .map(|row| {
            Ok(MasterCodeInput {
                account_code: row.required_text(&ACCOUNT_CODE)?,
                category: row.required_text(&CATEGORY)?,
                account_name: row.required_text(&ACCOUNT_NAME)?,
                description: row.text(&DESCRIPTION),
            })
        })
        .collect())
}

/// Map rows to library code inputs.
///
/// # Errors
///
/// Returns `ImportError::MissingColumns` if code or name columns are absent.
pub fn parse_library_code_rows(
    rows: &[SheetRow],
) -> Result<ImportOutcome<LibraryCodeInput>, ImportError> {
    require_columns(rows, &[&CODE, &NAME])?;
    Ok(rows
        .iter()
        .map(|row| {
            Ok(LibraryCodeInput {
                code: row.required_text(&CODE)?,
                name: row.required_text(&NAME)?,
                short_name: row.text(&SHORT_NAME),
            })
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn csv_rows(body: &str) -> Vec<SheetRow> {
        read_workbook(body.as_bytes(), "upload.csv").unwrap()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Account_Code "), "account code");
        assert_eq!(normalize_header("Business-Line"), "business line");
        assert_eq!(normalize_header("\u{feff}KODE   AKUN"), "kode akun");
    }

    #[test]
    fn test_read_csv_skips_leading_and_blank_rows() {
        let rows = csv_rows(",,\nAccount Code,Month,Value\n51001,1,100\n,,\n51002,Feb,\"1,250.50\"\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number, 3);
        assert_eq!(rows[1].number, 5);
        assert_eq!(
            rows[1].get(&["value"]).as_decimal(),
            Some(dec("1250.50"))
        );
    }

    #[test]
    fn test_read_workbook_rejects_unknown_extension() {
        assert!(matches!(
            read_workbook(b"x", "notes.txt"),
            Err(ImportError::UnsupportedFileType(_))
        ));
        assert!(is_supported_file("Data.XLSX"));
        assert!(!is_supported_file("data"));
    }

    #[test]
    fn test_header_only_file_has_no_rows() {
        assert!(matches!(
            read_workbook(b"Account Code,Month,Value\n", "a.csv"),
            Err(ImportError::NoRows)
        ));
    }

    #[test]
    fn test_cell_value_text_and_decimal() {
        assert_eq!(CellValue::Number(51001.0).as_text().as_deref(), Some("51001"));
        assert_eq!(CellValue::Number(1.5).as_text().as_deref(), Some("1.5"));
        assert_eq!(CellValue::Number(0.1).as_decimal(), Some(dec("0.1")));
        assert_eq!(
            CellValue::Text("(2,000)".into()).as_decimal(),
            Some(dec("-2000"))
        );
        assert_eq!(CellValue::Text("abc".into()).as_decimal(), None);
    }

    #[test]
    fn test_amount_rejects_ambiguous_separators() {
        for raw in ["1.250,50", "1,25", "1.2.3", "12,34.5", "1,2345"] {
            assert_eq!(
                parse_amount_text(raw),
                Err(AmountError::AmbiguousFormat),
                "{raw:?}"
            );
        }
        assert_eq!(parse_amount_text("-1,234,567.89"), Ok(dec("-1234567.89")));
        assert_eq!(parse_amount_text("1 250.5"), Ok(dec("1250.5")));
    }

    #[test]
    fn test_amount_keeps_two_decimal_places() {
        assert_eq!(parse_amount("0.125"), Err(AmountError::TooManyDecimals));
        assert_eq!(parse_amount("1.250"), Err(AmountError::TooManyDecimals));
        assert_eq!(parse_amount("0.12"), Ok(dec("0.12")));
        assert_eq!(
            CellValue::Number(0.1 + 0.2).as_amount(),
            Ok(dec("0.3"))
        );
        assert_eq!(
            CellValue::Number(0.125).as_amount(),
            Err(AmountError::TooManyDecimals)
        );
    }

    #[test]
    fn test_parse_unit_data_rejects_imprecise_and_ambiguous_values() {
        let rows = csv_rows(
            "Account Code,Month,Value,Category\n\
             51001,1,0.125,Ops\n\
             51002,1,\"1.250,50\",Ops\n\
             51003,1,\"1,250.50\",Ops\n",
        );
        let outcome = parse_unit_data_rows(&rows, &HashMap::new()).unwrap();

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].value, dec("1250.50"));
        let reasons: Vec<(usize, &str)> = outcome
            .errors
            .iter()
            .map(|e| (e.row, e.reason.as_str()))
            .collect();
        assert_eq!(
            reasons,
            vec![(2, "more than 2 decimal places"), (3, "ambiguous number format")]
        );
    }

    #[test]
    fn test_parse_unit_data_uses_aliases_and_lookup() {
        let rows = csv_rows(
            "Kode Akun,Bulan,Nilai,Kategori,Tipe\n\
             51001,Januari,1500,,Debit\n\
             41001,3,2500.25,Sales,Credit\n",
        );
        let lookup = HashMap::from([("51001".to_owned(), "Salaries".to_owned())]);
        let items = parse_unit_data_rows(&rows, &lookup)
            .unwrap()
            .into_result()
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].category, "Salaries");
        assert_eq!(items[0].month.number(), 1);
        assert_eq!(items[0].entry_type, EntryType::Debit);
        assert_eq!(items[1].value, dec("2500.25"));
        assert_eq!(items[1].entry_type, EntryType::Credit);
    }

    #[test]
    fn test_parse_unit_data_reports_row_errors() {
        let rows = csv_rows(
            "Account Code,Month,Value,Category\n\
             51001,13,10,Ops\n\
             ,1,10,Ops\n\
             51003,1,ten,Ops\n\
             99999,1,10,\n\
             51005,Dec,10,Ops\n",
        );
        let outcome = parse_unit_data_rows(&rows, &HashMap::new()).unwrap();

        assert_eq!(outcome.records.len(), 1);
        let fields: Vec<(usize, &str)> = outcome
            .errors
            .iter()
            .map(|e| (e.row, e.field.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![(2, "month"), (3, "account code"), (4, "value"), (5, "category")]
        );
        assert!(matches!(
            outcome.into_result(),
            Err(ImportError::RowsRejected(errors)) if errors.len() == 4
        ));
    }

    #[test]
    fn test_parse_unit_data_requires_columns() {
        let rows = csv_rows("Account Code,Value\n51001,10\n");
        match parse_unit_data_rows(&rows, &HashMap::new()) {
            Err(ImportError::MissingColumns(missing)) => assert_eq!(missing, vec!["month"]),
            other => panic!("expected missing columns, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_master_codes() {
        let rows = csv_rows(
            "Account Code,Category,Account Name,Description\n\
             51001,Salaries,Staff salaries,Monthly payroll\n\
             51002,Utilities,,\n",
        );
        let outcome = parse_master_code_rows(&rows).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(
            outcome.records[0].description.as_deref(),
            Some("Monthly payroll")
        );
        assert_eq!(outcome.errors, vec![RowError::new(3, "account name", "required")]);
    }

    #[test]
    fn test_parse_library_codes() {
        let rows = csv_rows("Kode,Nama,Nama Singkat\nLIB-1,Library One,L1\nLIB-2,Library Two,\n");
        let codes = parse_library_code_rows(&rows)
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(codes.len(), 2);
        assert_eq!(codes[0].short_name.as_deref(), Some("L1"));
        assert_eq!(codes[1].short_name, None);
    }

    #[test]
    fn test_row_error_display() {
        let err = RowError::new(7, "value", "not a number");
        assert_eq!(err.to_string(), "row 7: value: not a number");
    }
}
