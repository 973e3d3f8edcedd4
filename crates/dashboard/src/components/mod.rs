//! Reusable view components.

pub mod data_table;
pub mod flash;
pub mod nav;

pub use data_table::{DataTableConfig, FilterOption, TableColumn, TableFilter};
pub use flash::{Flash, FlashKind, set_flash, take_flash};
pub use nav::{NavItem, menu_for};
