//! Core types for Finboard.
//!
//! This module provides type-safe wrappers for the dashboard's domain concepts.

pub mod amount;
pub mod email;
pub mod entry;
pub mod id;
pub mod month;
pub mod role;

pub use amount::Amount;
pub use email::{Email, EmailError};
pub use entry::EntryType;
pub use id::*;
pub use month::{Month, MonthError};
pub use role::{Role, RoleError, RoleSet};
