//! Business logic services for the dashboard.
//!
//! # Services
//!
//! - `auth` - Email/password login and password reset
//! - `email` - Email delivery via SMTP
//! - `export` - `.xlsx`, `.csv` and PDF table exports
//! - `import` - Spreadsheet parsing into unit data and code records
//! - `report` - Aggregation of unit data into totals, pivots and charts

pub mod auth;
pub mod email;
pub mod export;
pub mod import;
pub mod report;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, EmailService};
pub use export::{ExportCell, ExportError, PdfReport, Sheet};
pub use import::{ImportError, ImportOutcome, RowError, SheetRow};
pub use report::{CategoryRow, ChartData, ReportSummary, pivot_by_category, summarize};
