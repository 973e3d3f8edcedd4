//! Table exports to `.xlsx`, `.csv` and PDF.
//!
//! Every export starts from a [`Sheet`]; the builders at the bottom turn
//! domain rows into sheets whose headers the import side accepts, so an
//! exported file can be uploaded again unchanged.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;

use finboard_core::{Amount, Month, UnitId};

use super::report::{CategoryRow, ReportSummary, pivot_totals};
use crate::models::{LibraryCode, MasterCode, UnitDataItem};

/// Errors from writing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("xlsx error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("pdf error: {0}")]
    Pdf(String),
}

/// A table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportCell {
    Text(String),
    Number(Decimal),
}

impl ExportCell {
    /// Plain rendering used by CSV (no grouping, so it parses back).
    #[must_use]
    pub fn plain(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }

    /// Display rendering used by PDF.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => Amount::new(*n).grouped(),
        }
    }
}

impl From<&str> for ExportCell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ExportCell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Option<&str>> for ExportCell {
    fn from(value: Option<&str>) -> Self {
        Self::Text(value.unwrap_or_default().to_owned())
    }
}

impl From<Decimal> for ExportCell {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

/// A titled table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<ExportCell>>,
}

impl Sheet {
    /// Create an empty sheet with headers.
    #[must_use]
    pub fn new(title: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            title: title.into(),
            headers: headers.iter().map(|h| (*h).to_owned()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row.
    pub fn push(&mut self, row: Vec<ExportCell>) {
        self.rows.push(row);
    }
}

/// Worksheet names are limited to 31 characters without `[]:*?/\`.
fn worksheet_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| if matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\') { '-' } else { c })
        .take(31)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet1".to_owned()
    } else {
        cleaned
    }
}

/// Write a sheet to an `.xlsx` workbook with a bold header row.
///
/// # Errors
///
/// Returns `ExportError::Xlsx` if the workbook cannot be written.
pub fn to_xlsx(sheet: &Sheet) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let amount_format = Format::new().set_num_format("#,##0.00");

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(worksheet_name(&sheet.title))?;

    for (col, header) in (0u16..).zip(&sheet.headers) {
        worksheet.write_string_with_format(0, col, header, &header_format)?;
        worksheet.set_column_width(col, 16)?;
    }

    for (row_idx, row) in (1u32..).zip(&sheet.rows) {
        for (col, cell) in (0u16..).zip(row) {
            match cell {
                ExportCell::Text(text) => {
                    worksheet.write_string(row_idx, col, text)?;
                }
                ExportCell::Number(n) => {
                    worksheet.write_number_with_format(
                        row_idx,
                        col,
                        n.to_f64().unwrap_or_default(),
                        &amount_format,
                    )?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Write a sheet as comma-separated values with a header line.
///
/// # Errors
///
/// Returns `ExportError::Csv` if a record cannot be written.
pub fn to_csv(sheet: &Sheet) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&sheet.headers)?;
    for row in &sheet.rows {
        writer.write_record(row.iter().map(ExportCell::plain))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))
}

/// A printable report: a sheet plus labelled totals.
#[derive(Debug, Clone)]
pub struct PdfReport<'a> {
    pub sheet: &'a Sheet,
    pub generated_at: DateTime<Utc>,
    /// `(label, value)` lines printed under the table.
    pub totals: Vec<(String, String)>,
}

const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 12.0;
const LINE_HEIGHT: f32 = 5.0;
const TITLE_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 7.0;
/// Approximate Helvetica glyph width at 1pt, in millimetres.
const GLYPH_WIDTH_PER_PT: f32 = 0.19;

struct PdfFonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Render a report as a landscape A4 PDF, adding pages as rows overflow.
///
/// # Errors
///
/// Returns `ExportError::Pdf` if the document cannot be built.
pub fn to_pdf(report: &PdfReport<'_>) -> Result<Vec<u8>, ExportError> {
    let sheet = report.sheet;
    let (doc, first_page, first_layer) = PdfDocument::new(
        sheet.title.as_str(),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let fonts = PdfFonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(e.to_string()))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ExportError::Pdf(e.to_string()))?,
    };

    let columns = sheet.headers.len().max(1);
    #[allow(clippy::cast_precision_loss)]
    let column_width = (PAGE_WIDTH - 2.0 * MARGIN) / columns as f32;
    let max_chars = max_chars_for(column_width);

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    let mut y = PAGE_HEIGHT - MARGIN;

    layer.use_text(sheet.title.as_str(), TITLE_SIZE, Mm(MARGIN), Mm(y), &fonts.bold);
    y -= LINE_HEIGHT * 1.5;
    layer.use_text(
        format!("Generated {}", report.generated_at.format("%Y-%m-%d %H:%M UTC")),
        BODY_SIZE,
        Mm(MARGIN),
        Mm(y),
        &fonts.regular,
    );
    y -= LINE_HEIGHT * 1.5;

    write_row(&layer, &sheet.headers, y, column_width, max_chars, &fonts.bold);
    y -= LINE_HEIGHT;

    for row in &sheet.rows {
        if y < MARGIN + LINE_HEIGHT {
            let (page, page_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            layer = doc.get_page(page).get_layer(page_layer);
            y = PAGE_HEIGHT - MARGIN;
            write_row(&layer, &sheet.headers, y, column_width, max_chars, &fonts.bold);
            y -= LINE_HEIGHT;
        }
        let cells: Vec<String> = row.iter().map(ExportCell::display).collect();
        write_row(&layer, &cells, y, column_width, max_chars, &fonts.regular);
        y -= LINE_HEIGHT;
    }

    if !report.totals.is_empty() {
        y -= LINE_HEIGHT;
        for (label, value) in &report.totals {
            if y < MARGIN {
                let (page, page_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
                layer = doc.get_page(page).get_layer(page_layer);
                y = PAGE_HEIGHT - MARGIN;
            }
            layer.use_text(
                format!("{label}: {value}"),
                BODY_SIZE + 1.0,
                Mm(MARGIN),
                Mm(y),
                &fonts.bold,
            );
            y -= LINE_HEIGHT;
        }
    }

    doc.save_to_bytes()
        .map_err(|e| ExportError::Pdf(e.to_string()))
}

fn max_chars_for(column_width: f32) -> usize {
    let chars = (column_width / (BODY_SIZE * GLYPH_WIDTH_PER_PT)).floor();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let chars = chars.max(3.0) as usize;
    chars
}

fn write_row(
    layer: &PdfLayerReference,
    cells: &[String],
    y: f32,
    column_width: f32,
    max_chars: usize,
    font: &IndirectFontRef,
) {
    let mut x = MARGIN;
    for cell in cells {
        layer.use_text(truncate(cell, max_chars), BODY_SIZE, Mm(x), Mm(y), font);
        x += column_width;
    }
}

/// Shorten `text` to `max` characters, marking the cut with `..`.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let kept: String = text.chars().take(max.saturating_sub(2)).collect();
    format!("{kept}..")
}

// =============================================================================
// Sheet builders
// =============================================================================

/// Headers of a unit data sheet, matching the import columns.
pub const UNIT_DATA_HEADERS: [&str; 8] = [
    "Unit",
    "Account Code",
    "Month",
    "Category",
    "Area",
    "Business Line",
    "Value",
    "Type",
];

/// Unit data rows; `unit_names` maps IDs to display names.
#[must_use]
pub fn unit_data_sheet(
    title: &str,
    items: &[UnitDataItem],
    unit_names: &HashMap<UnitId, String>,
) -> Sheet {
    let mut sheet = Sheet::new(title, &UNIT_DATA_HEADERS);
    for item in items {
        sheet.push(vec![
            unit_names
                .get(&item.unit_id)
                .cloned()
                .unwrap_or_else(|| item.unit_id.to_string())
                .into(),
            item.account_code.as_str().into(),
            item.month.number().to_string().into(),
            item.category.as_str().into(),
            item.area.as_deref().into(),
            item.business_line.as_deref().into(),
            item.value.into(),
            item.entry_type.label().into(),
        ]);
    }
    sheet
}

/// Master code rows.
#[must_use]
pub fn master_code_sheet(codes: &[MasterCode]) -> Sheet {
    let mut sheet = Sheet::new(
        "Master Codes",
        &["Account Code", "Category", "Account Name", "Description"],
    );
    for code in codes {
        sheet.push(vec![
            code.account_code.as_str().into(),
            code.category.as_str().into(),
            code.account_name.as_str().into(),
            code.description.as_deref().into(),
        ]);
    }
    sheet
}

/// Library code rows.
#[must_use]
pub fn library_code_sheet(codes: &[LibraryCode]) -> Sheet {
    let mut sheet = Sheet::new("Library Codes", &["Code", "Name", "Short Name"]);
    for code in codes {
        sheet.push(vec![
            code.code.as_str().into(),
            code.name.as_str().into(),
            code.short_name.as_deref().into(),
        ]);
    }
    sheet
}

/// The monthly table: one row per category, a column per month, a total
/// column and a closing totals row labelled `total_label`.
#[must_use]
pub fn pivot_sheet(title: &str, rows: &[CategoryRow], total_label: &str) -> Sheet {
    let mut headers = vec!["Category"];
    headers.extend(Month::all().map(|m| m.short_name()));
    headers.push(total_label);

    let mut sheet = Sheet::new(title, &headers);
    let totals = pivot_totals(rows, total_label);
    for row in rows.iter().chain(std::iter::once(&totals)) {
        let mut cells: Vec<ExportCell> = Vec::with_capacity(14);
        cells.push(row.category.as_str().into());
        cells.extend(row.months.iter().map(|v| ExportCell::Number(*v)));
        cells.push(row.total.into());
        sheet.push(cells);
    }
    sheet
}

/// Labelled totals for the PDF footer.
#[must_use]
pub fn summary_totals(summary: &ReportSummary) -> Vec<(String, String)> {
    vec![
        ("Revenue".to_owned(), Amount::new(summary.revenue).grouped()),
        ("Expenses".to_owned(), Amount::new(summary.expenses).grouped()),
        ("Net".to_owned(), Amount::new(summary.net).grouped()),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;
    use finboard_core::{EntryType, UnitDataItemId};

    use super::*;
    use crate::services::import::{parse_unit_data_rows, read_workbook};
    use crate::services::report::{pivot_by_category, summarize};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn items() -> Vec<UnitDataItem> {
        let make = |month: u8, category: &str, value: &str, entry_type, area: Option<&str>| {
            UnitDataItem {
                id: UnitDataItemId::new(1),
                unit_id: UnitId::new(7),
                year: 2024,
                account_code: "51001".to_owned(),
                month: Month::new(month).unwrap(),
                category: category.to_owned(),
                area: area.map(str::to_owned),
                business_line: None,
                value: dec(value),
                entry_type,
                import_batch: None,
                created_at: Utc::now(),
            }
        };
        vec![
            make(1, "Salaries, Staff", "1234.56", EntryType::Debit, Some("North")),
            make(2, "Sales \"Retail\"", "98765.4", EntryType::Credit, None),
            make(12, "Utilities", "-15.25", EntryType::Debit, Some("South")),
        ]
    }

    fn unit_names() -> HashMap<UnitId, String> {
        HashMap::from([(UnitId::new(7), "Head Office".to_owned())])
    }

    fn assert_round_trip(bytes: &[u8], file_name: &str) {
        let original = items();
        let rows = read_workbook(bytes, file_name).unwrap();
        let parsed = parse_unit_data_rows(&rows, &HashMap::new())
            .unwrap()
            .into_result()
            .unwrap();

        assert_eq!(parsed.len(), original.len());
        for (back, item) in parsed.iter().zip(&original) {
            assert_eq!(back.account_code, item.account_code);
            assert_eq!(back.month, item.month);
            assert_eq!(back.category, item.category);
            assert_eq!(back.area, item.area);
            assert_eq!(back.value, item.value);
            assert_eq!(back.entry_type, item.entry_type);
        }
    }

    #[test]
    fn test_csv_round_trip_preserves_values() {
        let sheet = unit_data_sheet("Unit data", &items(), &unit_names());
        let bytes = to_csv(&sheet).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("Unit,Account Code,Month,Category"));
        assert!(text.contains("\"Salaries, Staff\""));
        assert_round_trip(&bytes, "export.csv");
    }

    #[test]
    fn test_xlsx_round_trip_preserves_values() {
        let sheet = unit_data_sheet("Unit data", &items(), &unit_names());
        let bytes = to_xlsx(&sheet).unwrap();
        assert!(bytes.starts_with(b"PK"));
        assert_round_trip(&bytes, "export.xlsx");
    }

    #[test]
    fn test_pdf_has_header_and_paginates() {
        let mut sheet = Sheet::new("Report 2024", &["Category", "Total"]);
        for i in 0..120 {
            sheet.push(vec![format!("Category {i}").into(), Decimal::from(i).into()]);
        }
        let report = PdfReport {
            sheet: &sheet,
            generated_at: Utc::now(),
            totals: vec![("Net".to_owned(), "1,000.00".to_owned())],
        };
        let bytes = to_pdf(&report).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_pivot_sheet_has_totals_row() {
        let rows = pivot_by_category(&items());
        let sheet = pivot_sheet("Monthly 2024", &rows, "Total");

        assert_eq!(sheet.headers.len(), 14);
        assert_eq!(sheet.headers[1], "Jan");
        assert_eq!(sheet.rows.len(), rows.len() + 1);
        let last = sheet.rows.last().unwrap();
        assert_eq!(last[0], ExportCell::Text("Total".to_owned()));
        assert_eq!(last[13], ExportCell::Number(dec("99984.71")));
    }

    #[test]
    fn test_summary_totals_are_grouped() {
        let totals = summary_totals(&summarize(&items()));
        assert_eq!(totals[0], ("Revenue".to_owned(), "98,765.40".to_owned()));
        assert_eq!(totals[1], ("Expenses".to_owned(), "1,219.31".to_owned()));
    }

    #[test]
    fn test_worksheet_name_is_sanitised() {
        assert_eq!(worksheet_name("Data 2024/25 [draft]"), "Data 2024-25 -draft-");
        assert_eq!(worksheet_name(""), "Sheet1");
        assert_eq!(worksheet_name(&"x".repeat(40)).len(), 31);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Revenue", 10), "Revenue");
        assert_eq!(truncate("Administrative", 8), "Admini..");
    }
}
