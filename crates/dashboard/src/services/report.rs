//! Report aggregation over unit data rows.
//!
//! Plain folds over fetched rows: totals by entry type, twelve monthly
//! buckets, per-category and per-unit totals, the category-by-month pivot
//! shown as the monthly table, and the chart payloads built from them.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use finboard_core::{Month, UnitId};

use crate::models::UnitDataItem;

/// Revenue and expenses of one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyTotals {
    pub month: Month,
    pub revenue: Decimal,
    pub expenses: Decimal,
}

impl MonthlyTotals {
    /// Revenue minus expenses.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.revenue - self.expenses
    }
}

/// Totals of one reporting category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: String,
    pub revenue: Decimal,
    pub expenses: Decimal,
}

impl CategoryTotal {
    /// Revenue minus expenses.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.revenue - self.expenses
    }
}

/// Totals of one business unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitTotal {
    pub unit_id: UnitId,
    pub revenue: Decimal,
    pub expenses: Decimal,
}

impl UnitTotal {
    /// Revenue minus expenses.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.revenue - self.expenses
    }
}

/// Aggregated view of a set of rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    /// Sum of `Credit` rows.
    pub revenue: Decimal,
    /// Sum of `Debit` rows.
    pub expenses: Decimal,
    /// `revenue - expenses`.
    pub net: Decimal,
    /// Always twelve entries, January first.
    pub monthly: Vec<MonthlyTotals>,
    /// Sorted by absolute net, largest first; ties by name.
    pub categories: Vec<CategoryTotal>,
    /// Sorted by unit ID.
    pub units: Vec<UnitTotal>,
    pub item_count: usize,
}

/// Sums of one category per month (the monthly table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    pub category: String,
    /// January first.
    pub months: [Decimal; 12],
    pub total: Decimal,
}

fn split(item: &UnitDataItem) -> (Decimal, Decimal) {
    if item.entry_type.is_expense() {
        (Decimal::ZERO, item.value)
    } else {
        (item.value, Decimal::ZERO)
    }
}

/// Aggregate rows into totals, monthly buckets, categories and units.
#[must_use]
pub fn summarize(items: &[UnitDataItem]) -> ReportSummary {
    let mut monthly: Vec<MonthlyTotals> = Month::all()
        .map(|month| MonthlyTotals {
            month,
            revenue: Decimal::ZERO,
            expenses: Decimal::ZERO,
        })
        .collect();
    let mut categories: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();
    let mut units: BTreeMap<i32, (Decimal, Decimal)> = BTreeMap::new();
    let mut revenue = Decimal::ZERO;
    let mut expenses = Decimal::ZERO;

    for item in items {
        let (rev, exp) = split(item);
        revenue += rev;
        expenses += exp;

        if let Some(bucket) = monthly.get_mut(item.month.index()) {
            bucket.revenue += rev;
            bucket.expenses += exp;
        }

        let cat = categories.entry(item.category.as_str()).or_default();
        cat.0 += rev;
        cat.1 += exp;

        let unit = units.entry(item.unit_id.as_i32()).or_default();
        unit.0 += rev;
        unit.1 += exp;
    }

    let mut categories: Vec<CategoryTotal> = categories
        .into_iter()
        .map(|(category, (revenue, expenses))| CategoryTotal {
            category: category.to_owned(),
            revenue,
            expenses,
        })
        .collect();
    categories.sort_by(|a, b| {
        b.net()
            .abs()
            .cmp(&a.net().abs())
            .then_with(|| a.category.cmp(&b.category))
    });

    ReportSummary {
        revenue,
        expenses,
        net: revenue - expenses,
        monthly,
        categories,
        units: units
            .into_iter()
            .map(|(id, (revenue, expenses))| UnitTotal {
                unit_id: UnitId::new(id),
                revenue,
                expenses,
            })
            .collect(),
        item_count: items.len(),
    }
}

/// Per category, the sum of row values in each month plus the annual total.
///
/// Values are summed unsigned regardless of entry type. Rows are ordered
/// by category name.
#[must_use]
pub fn pivot_by_category(items: &[UnitDataItem]) -> Vec<CategoryRow> {
    let mut rows: BTreeMap<&str, [Decimal; 12]> = BTreeMap::new();
    for item in items {
        let months = rows.entry(item.category.as_str()).or_insert([Decimal::ZERO; 12]);
        if let Some(cell) = months.get_mut(item.month.index()) {
            *cell += item.value;
        }
    }

    rows.into_iter()
        .map(|(category, months)| CategoryRow {
            category: category.to_owned(),
            total: months.iter().copied().sum(),
            months,
        })
        .collect()
}

/// Label for the [`pivot_totals`] row.
pub const GROSS_TOTAL_LABEL: &str = "Gross total";

/// Column totals of a pivot, labelled `label`.
///
/// This is a gross total: Debit and Credit values are added together as
/// they appear in the category rows. Net figures come from
/// [`ReportSummary::net`] and the monthly series.
#[must_use]
pub fn pivot_totals(rows: &[CategoryRow], label: &str) -> CategoryRow {
    let mut months = [Decimal::ZERO; 12];
    for row in rows {
        for (total, value) in months.iter_mut().zip(row.months.iter()) {
            *total += *value;
        }
    }
    CategoryRow {
        category: label.to_owned(),
        total: months.iter().copied().sum(),
        months,
    }
}

/// Pie chart: share of expenses per category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Bar chart: revenue and expenses per month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub labels: Vec<String>,
    pub revenue: Vec<f64>,
    pub expenses: Vec<f64>,
}

/// Line chart: cumulative net per month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Payloads for the client-side chart library.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub pie: PieChart,
    pub bar: BarChart,
    pub line: LineChart,
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

impl ChartData {
    /// Build chart payloads from a summary.
    #[must_use]
    pub fn from_summary(summary: &ReportSummary) -> Self {
        let mut expense_categories: Vec<&CategoryTotal> = summary
            .categories
            .iter()
            .filter(|c| c.expenses > Decimal::ZERO)
            .collect();
        expense_categories.sort_by(|a, b| {
            b.expenses
                .cmp(&a.expenses)
                .then_with(|| a.category.cmp(&b.category))
        });

        let month_labels: Vec<String> = summary
            .monthly
            .iter()
            .map(|m| m.month.short_name().to_owned())
            .collect();

        let mut running = Decimal::ZERO;
        let cumulative: Vec<f64> = summary
            .monthly
            .iter()
            .map(|m| {
                running += m.net();
                to_f64(running)
            })
            .collect();

        Self {
            pie: PieChart {
                labels: expense_categories
                    .iter()
                    .map(|c| c.category.clone())
                    .collect(),
                values: expense_categories.iter().map(|c| to_f64(c.expenses)).collect(),
            },
            bar: BarChart {
                labels: month_labels.clone(),
                revenue: summary.monthly.iter().map(|m| to_f64(m.revenue)).collect(),
                expenses: summary.monthly.iter().map(|m| to_f64(m.expenses)).collect(),
            },
            line: LineChart {
                labels: month_labels,
                values: cumulative,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;
    use finboard_core::{EntryType, UnitDataItemId};

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(unit: i32, month: u8, category: &str, value: &str, entry_type: EntryType) -> UnitDataItem {
        UnitDataItem {
            id: UnitDataItemId::new(1),
            unit_id: UnitId::new(unit),
            year: 2024,
            account_code: "51001".to_owned(),
            month: Month::new(month).unwrap(),
            category: category.to_owned(),
            area: None,
            business_line: None,
            value: dec(value),
            entry_type,
            import_batch: None,
            created_at: Utc::now(),
        }
    }

    fn fixture() -> Vec<UnitDataItem> {
        vec![
            item(1, 1, "Sales", "1000.00", EntryType::Credit),
            item(1, 1, "Salaries", "400.50", EntryType::Debit),
            item(1, 2, "Sales", "1200.00", EntryType::Credit),
            item(2, 2, "Utilities", "99.50", EntryType::Debit),
            item(2, 3, "Salaries", "400.50", EntryType::Debit),
            item(2, 12, "Sales", "300.25", EntryType::Credit),
        ]
    }

    #[test]
    fn test_summary_totals_match_hand_computed() {
        let summary = summarize(&fixture());

        assert_eq!(summary.revenue, dec("2500.25"));
        assert_eq!(summary.expenses, dec("900.50"));
        assert_eq!(summary.net, dec("1599.75"));
        assert_eq!(summary.item_count, 6);
    }

    #[test]
    fn test_summary_monthly_buckets() {
        let summary = summarize(&fixture());

        assert_eq!(summary.monthly.len(), 12);
        assert_eq!(summary.monthly[0].revenue, dec("1000.00"));
        assert_eq!(summary.monthly[0].expenses, dec("400.50"));
        assert_eq!(summary.monthly[1].net(), dec("1100.50"));
        assert_eq!(summary.monthly[5].revenue, Decimal::ZERO);
        assert_eq!(summary.monthly[11].revenue, dec("300.25"));
    }

    #[test]
    fn test_summary_categories_sorted_by_absolute_net() {
        let summary = summarize(&fixture());
        let order: Vec<&str> = summary
            .categories
            .iter()
            .map(|c| c.category.as_str())
            .collect();

        assert_eq!(order, vec!["Sales", "Salaries", "Utilities"]);
        assert_eq!(summary.categories[1].expenses, dec("801.00"));
        assert_eq!(summary.categories[1].net(), dec("-801.00"));
    }

    #[test]
    fn test_summary_per_unit() {
        let summary = summarize(&fixture());

        assert_eq!(summary.units.len(), 2);
        assert_eq!(summary.units[0].unit_id, UnitId::new(1));
        assert_eq!(summary.units[0].net(), dec("1799.50"));
        assert_eq!(summary.units[1].revenue, dec("300.25"));
        assert_eq!(summary.units[1].expenses, dec("500.00"));
    }

    #[test]
    fn test_summary_of_nothing_is_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary.net, Decimal::ZERO);
        assert_eq!(summary.monthly.len(), 12);
        assert!(summary.categories.is_empty());
    }

    #[test]
    fn test_pivot_by_category() {
        let rows = pivot_by_category(&fixture());
        let names: Vec<&str> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(names, vec!["Salaries", "Sales", "Utilities"]);

        let sales = &rows[1];
        assert_eq!(sales.months[0], dec("1000.00"));
        assert_eq!(sales.months[1], dec("1200.00"));
        assert_eq!(sales.months[11], dec("300.25"));
        assert_eq!(sales.total, dec("2500.25"));

        let totals = pivot_totals(&rows, GROSS_TOTAL_LABEL);
        assert_eq!(totals.category, "Gross total");
        assert_eq!(totals.months[0], dec("1400.50"));
        assert_eq!(totals.total, dec("3400.75"));
    }

    #[test]
    fn test_pivot_total_is_gross_not_net() {
        let items = fixture();
        let summary = summarize(&items);
        let totals = pivot_totals(&pivot_by_category(&items), GROSS_TOTAL_LABEL);

        assert_eq!(totals.total, summary.revenue + summary.expenses);
        assert_ne!(totals.total, summary.net);
    }

    #[test]
    fn test_chart_data() {
        let charts = ChartData::from_summary(&summarize(&fixture()));

        assert_eq!(charts.pie.labels, vec!["Salaries", "Utilities"]);
        assert_eq!(charts.pie.values, vec![801.0, 99.5]);
        assert_eq!(charts.bar.labels.len(), 12);
        assert_eq!(charts.bar.labels[0], "Jan");
        assert_eq!(charts.bar.revenue[1], 1200.0);
        assert_eq!(charts.line.values[0], 599.5);
        assert_eq!(charts.line.values[11], 1599.75);

        let json = serde_json::to_value(&charts).unwrap();
        assert!(json["pie"]["labels"].is_array());
        assert!(json["bar"]["expenses"].is_array());
    }
}
