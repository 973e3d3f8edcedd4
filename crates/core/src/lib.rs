//! Finboard Core - Shared domain types.
//!
//! This crate provides the types used across the Finboard components:
//! - `dashboard` - The multi-role financial dashboard server
//! - `cli` - Command-line tools for migrations, bootstrap users and bulk imports
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Role capability checks and month/entry parsing live here so
//! that the server, the CLI and the tests agree on them.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, roles, months, entry types and amounts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
