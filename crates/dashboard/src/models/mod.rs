//! Domain models for the dashboard.

pub mod library_code;
pub mod master_code;
pub mod session;
pub mod unit;
pub mod unit_data;
pub mod user;

pub use library_code::{LibraryCode, LibraryCodeInput};
pub use master_code::{MasterCode, MasterCodeInput};
pub use session::{CurrentUser, keys as session_keys};
pub use unit::{Unit, UnitWithUsage};
pub use unit_data::{
    ImportBatchSummary, NewUnitDataItem, UnitDataFilter, UnitDataItem, UnitDataUpdate,
};
pub use user::{User, UserProfile, UserWithPassword};
