//! End-to-end tests of the upload pipeline without a database: a user's
//! spreadsheet is parsed, aggregated into the report and exported again.

use std::collections::HashMap;

use chrono::Utc;
use finboard_core::{EntryType, Month, UnitDataItemId, UnitId};
use finboard_dashboard::models::{NewUnitDataItem, UnitDataItem};
use finboard_dashboard::services::export::{
    PdfReport, pivot_sheet, summary_totals, to_csv, to_pdf, to_xlsx, unit_data_sheet,
};
use finboard_dashboard::services::import::{parse_unit_data_rows, read_workbook};
use finboard_dashboard::services::report::{GROSS_TOTAL_LABEL, pivot_totals};
use finboard_dashboard::services::{
    ChartData, ImportError, ImportOutcome, pivot_by_category, summarize,
};
use rust_decimal::Decimal;

const UPLOAD_CSV: &str = "\
Kode Akun,Bulan,Kategori,Wilayah,Lini Bisnis,Nilai,Tipe
4000,Jan,Sales,North,Retail,1500.00,Credit
5100,1,,North,Retail,400.00,Debit
5100,Feb,,South,,250.50,Debit
4000,Februari,Sales,South,Wholesale,900,CR
6200,3,Rent,North,,1200,Debit
";

fn dec(s: &str) -> Decimal {
    s.parse().unwrap_or_default()
}

fn lookup() -> HashMap<String, String> {
    HashMap::from([("5100".to_string(), "Salaries".to_string())])
}

fn stored(unit: i32, items: Vec<NewUnitDataItem>) -> Vec<UnitDataItem> {
    items
        .into_iter()
        .zip(1..)
        .map(|(item, id)| UnitDataItem {
            id: UnitDataItemId::new(id),
            unit_id: UnitId::new(unit),
            year: 2024,
            account_code: item.account_code,
            month: item.month,
            category: item.category,
            area: item.area,
            business_line: item.business_line,
            value: item.value,
            entry_type: item.entry_type,
            import_batch: None,
            created_at: Utc::now(),
        })
        .collect()
}

fn parse(bytes: &[u8], file_name: &str) -> Result<Vec<NewUnitDataItem>, ImportError> {
    read_workbook(bytes, file_name)
        .and_then(|rows| parse_unit_data_rows(&rows, &lookup()))
        .and_then(ImportOutcome::into_result)
}

#[test]
fn test_indonesian_headers_and_master_code_categories() {
    let items = parse(UPLOAD_CSV.as_bytes(), "upload.csv").unwrap_or_default();
    assert_eq!(items.len(), 5);

    let salaries: Vec<_> = items.iter().filter(|i| i.category == "Salaries").collect();
    assert_eq!(salaries.len(), 2);
    assert!(salaries.iter().all(|i| i.entry_type == EntryType::Debit));

    let wholesale = items.iter().find(|i| i.business_line.as_deref() == Some("Wholesale"));
    assert_eq!(wholesale.map(|i| i.entry_type), Some(EntryType::Credit));
    assert_eq!(wholesale.map(|i| i.month), Month::new(2).ok());
}

#[test]
fn test_report_totals_match_hand_computed_values() {
    let items = stored(1, parse(UPLOAD_CSV.as_bytes(), "upload.csv").unwrap_or_default());
    let summary = summarize(&items);

    assert_eq!(summary.revenue, dec("2400.00"));
    assert_eq!(summary.expenses, dec("1850.50"));
    assert_eq!(summary.net, dec("549.50"));
    assert_eq!(summary.item_count, 5);

    let rows = pivot_by_category(&items);
    let total = pivot_totals(&rows, GROSS_TOTAL_LABEL);
    assert_eq!(total.total, rows.iter().map(|r| r.total).sum::<Decimal>());
    assert_eq!(total.months.iter().copied().sum::<Decimal>(), total.total);

    let chart = ChartData::from_summary(&summary);
    let json = serde_json::to_value(&chart).unwrap_or_default();
    assert_eq!(json["bar"]["labels"].as_array().map(Vec::len), Some(12));
    assert_eq!(json["line"]["values"].as_array().map(Vec::len), Some(12));
}

#[test]
fn test_one_bad_row_rejects_the_whole_upload() {
    let csv = format!("{UPLOAD_CSV}7000,13,Misc,,,10,Debit\n9999,4,,,,abc,Debit\n");
    let err = parse(csv.as_bytes(), "upload.csv").err();

    let Some(ImportError::RowsRejected(rows)) = err else {
        panic!("expected rejected rows, got {err:?}");
    };
    assert_eq!(rows.len(), 2);
    let messages: Vec<String> = rows.iter().map(ToString::to_string).collect();
    assert!(messages.iter().any(|m| m.starts_with("row 7:")), "{messages:?}");
    assert!(messages.iter().any(|m| m.starts_with("row 8:")), "{messages:?}");
}

#[test]
fn test_exported_rows_reimport_as_xlsx_and_csv() {
    let items = stored(3, parse(UPLOAD_CSV.as_bytes(), "upload.csv").unwrap_or_default());
    let names = HashMap::from([(UnitId::new(3), "North Branch".to_string())]);
    let sheet = unit_data_sheet("North Branch 2024", &items, &names);

    for (bytes, file) in [
        (to_xlsx(&sheet).unwrap_or_default(), "export.xlsx"),
        (to_csv(&sheet).unwrap_or_default(), "export.csv"),
    ] {
        let again = parse(&bytes, file).unwrap_or_default();
        assert_eq!(again.len(), items.len(), "{file}");
        let total: Decimal = again.iter().map(|i| i.value).sum();
        assert_eq!(total, dec("4250.50"), "{file}");
    }
}

#[test]
fn test_pdf_report_is_a_pdf() {
    let items = stored(1, parse(UPLOAD_CSV.as_bytes(), "upload.csv").unwrap_or_default());
    let sheet = pivot_sheet("Report All units 2024", &pivot_by_category(&items), GROSS_TOTAL_LABEL);
    let report = PdfReport {
        sheet: &sheet,
        generated_at: Utc::now(),
        totals: summary_totals(&summarize(&items)),
    };

    let bytes = to_pdf(&report).unwrap_or_default();
    assert!(bytes.starts_with(b"%PDF"));
}
