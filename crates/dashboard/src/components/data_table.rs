//! Data table component types.
//!
//! These types define the configuration for the reusable data tables on the
//! management pages.

use serde::{Deserialize, Serialize};

/// Column definition for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    /// Unique key for the column.
    pub key: String,
    /// Display label for the column header.
    pub label: String,
    /// Whether the column is sortable.
    pub sortable: bool,
    /// Right-align the column (amounts).
    pub numeric: bool,
}

impl TableColumn {
    /// Create a new sortable column.
    #[must_use]
    pub fn sortable(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            sortable: true,
            numeric: false,
        }
    }

    /// Create a new non-sortable column.
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            sortable: false,
            numeric: false,
        }
    }

    /// Mark the column as numeric.
    #[must_use]
    pub const fn numeric(mut self) -> Self {
        self.numeric = true;
        self
    }
}

/// Filter type for data tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Text input filter.
    Text,
    /// Single-select dropdown.
    Select,
}

/// Option for select filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOption {
    /// Option value.
    pub value: String,
    /// Display label.
    pub label: String,
    /// Whether the option is the current selection.
    pub selected: bool,
}

impl FilterOption {
    /// Create a new filter option.
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            selected: false,
        }
    }

    /// Mark the option selected when `value` matches `current`.
    #[must_use]
    pub fn selected_if(mut self, current: Option<&str>) -> Self {
        self.selected = current == Some(self.value.as_str());
        self
    }
}

/// Filter definition for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFilter {
    /// Filter parameter key.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Filter type.
    pub filter_type: FilterType,
    /// Placeholder text (for text inputs).
    pub placeholder: Option<String>,
    /// Available options (for selects).
    pub options: Vec<FilterOption>,
}

impl TableFilter {
    /// Create a text filter.
    #[must_use]
    pub fn text(key: &str, label: &str, placeholder: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Text,
            placeholder: Some(placeholder.to_string()),
            options: vec![],
        }
    }

    /// Create a select filter.
    #[must_use]
    pub fn select(key: &str, label: &str, options: Vec<FilterOption>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Select,
            placeholder: None,
            options,
        }
    }

    /// Whether this is a select filter (for templates).
    #[must_use]
    pub fn is_select(&self) -> bool {
        self.filter_type == FilterType::Select
    }
}

/// Configuration for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTableConfig {
    /// Unique table identifier.
    pub table_id: String,
    /// Column definitions.
    pub columns: Vec<TableColumn>,
    /// Filter definitions.
    pub filters: Vec<TableFilter>,
    /// Search placeholder text.
    pub search_placeholder: String,
    /// Title for empty state.
    pub empty_title: String,
    /// Description for empty state.
    pub empty_description: Option<String>,
    /// Whether to show the filter bar.
    pub has_filters: bool,
}

impl DataTableConfig {
    /// Create a new data table configuration.
    #[must_use]
    pub fn new(table_id: &str) -> Self {
        Self {
            table_id: table_id.to_string(),
            columns: vec![],
            filters: vec![],
            search_placeholder: "Search...".to_string(),
            empty_title: "No items found".to_string(),
            empty_description: None,
            has_filters: false,
        }
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, filter: TableFilter) -> Self {
        self.has_filters = true;
        self.filters.push(filter);
        self
    }

    /// Set search placeholder.
    #[must_use]
    pub fn search_placeholder(mut self, placeholder: &str) -> Self {
        self.search_placeholder = placeholder.to_string();
        self
    }

    /// Set empty state configuration.
    #[must_use]
    pub fn empty_state(mut self, title: &str, description: Option<&str>) -> Self {
        self.empty_title = title.to_string();
        self.empty_description = description.map(ToString::to_string);
        self
    }

    /// Number of columns, for `colspan` on empty rows.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Build the units table configuration.
#[must_use]
pub fn units_table_config() -> DataTableConfig {
    DataTableConfig::new("units")
        .column(TableColumn::sortable("name", "Unit"))
        .column(TableColumn::new("users", "Assigned users").numeric())
        .column(TableColumn::sortable("created", "Created"))
        .column(TableColumn::new("actions", ""))
        .empty_state("No units yet", Some("Create the first business unit above"))
}

/// Build the users table configuration.
#[must_use]
pub fn users_table_config() -> DataTableConfig {
    DataTableConfig::new("users")
        .column(TableColumn::sortable("name", "Name"))
        .column(TableColumn::sortable("email", "Email"))
        .column(TableColumn::new("roles", "Roles"))
        .column(TableColumn::new("units", "Units"))
        .column(TableColumn::new("actions", ""))
        .empty_state("No users found", None)
}

/// Build the master codes table configuration.
#[must_use]
pub fn master_codes_table_config(search: Option<&str>) -> DataTableConfig {
    let mut config = DataTableConfig::new("master-codes")
        .column(TableColumn::sortable("account_code", "Account Code"))
        .column(TableColumn::sortable("category", "Category"))
        .column(TableColumn::new("account_name", "Account Name"))
        .column(TableColumn::new("description", "Description"))
        .column(TableColumn::new("actions", ""))
        .search_placeholder("Search by code, category or name...")
        .empty_state(
            "No master codes found",
            Some("Import a spreadsheet or add codes one by one"),
        );
    if search.is_some() {
        config = config.empty_state("No master codes match your search", None);
    }
    config
}

/// Build the library codes table configuration.
#[must_use]
pub fn library_codes_table_config() -> DataTableConfig {
    DataTableConfig::new("library-codes")
        .column(TableColumn::sortable("code", "Code"))
        .column(TableColumn::new("name", "Name"))
        .column(TableColumn::new("short_name", "Short Name"))
        .column(TableColumn::new("actions", ""))
        .empty_state("No library codes", Some("Import a spreadsheet to fill the table"))
}

/// Build the unit data table configuration with category and month filters.
#[must_use]
pub fn unit_data_table_config(
    categories: &[String],
    category: Option<&str>,
    month: Option<&str>,
    editable: bool,
) -> DataTableConfig {
    let mut category_options = vec![FilterOption::new("", "All categories")];
    category_options.extend(
        categories
            .iter()
            .map(|c| FilterOption::new(c, c).selected_if(category)),
    );

    let mut month_options = vec![FilterOption::new("", "All months")];
    month_options.extend(finboard_core::Month::all().map(|m| {
        FilterOption::new(&m.number().to_string(), m.short_name()).selected_if(month)
    }));

    let mut config = DataTableConfig::new("unit-data")
        .column(TableColumn::sortable("account_code", "Account Code"))
        .column(TableColumn::sortable("month", "Month"))
        .column(TableColumn::sortable("category", "Category"))
        .column(TableColumn::new("area", "Area"))
        .column(TableColumn::new("business_line", "Business Line"))
        .column(TableColumn::new("value", "Value").numeric())
        .column(TableColumn::new("type", "Type"))
        .filter(TableFilter::select("category", "Category", category_options))
        .filter(TableFilter::select("month", "Month", month_options))
        .empty_state(
            "No data for this unit and year",
            Some("Upload a spreadsheet to add rows"),
        );
    if editable {
        config = config.column(TableColumn::new("actions", ""));
    }
    config
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_data_table_marks_selected_filters() {
        let categories = vec!["Sales".to_string(), "Salaries".to_string()];
        let config = unit_data_table_config(&categories, Some("Salaries"), Some("3"), false);

        assert_eq!(config.filters.len(), 2);
        let category = &config.filters[0];
        assert!(category.is_select());
        assert_eq!(category.options.len(), 3);
        assert!(category.options[2].selected);
        assert!(!category.options[1].selected);

        let month = &config.filters[1];
        assert_eq!(month.options.len(), 13);
        assert!(month.options[3].selected);
        assert_eq!(month.options[3].label, "Mar");
    }

    #[test]
    fn test_actions_column_only_when_editable() {
        assert_eq!(unit_data_table_config(&[], None, None, false).column_count(), 7);
        assert_eq!(unit_data_table_config(&[], None, None, true).column_count(), 8);
    }

    #[test]
    fn test_master_codes_empty_state_for_search() {
        assert_eq!(
            master_codes_table_config(Some("xyz")).empty_title,
            "No master codes match your search"
        );
        assert!(!master_codes_table_config(None).has_filters);
    }
}
