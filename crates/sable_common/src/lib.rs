//! Shared foundational types used across the Sable compiler toolchain.
//!
//! This crate provides infrastructure that is independent of any one
//! compilation phase, currently the append-only sorted record tables that
//! back the debug-information mapping layers.

#![warn(missing_docs)]

pub mod record_table;

pub use record_table::{OutOfOrderAppend, RecordTable, RecordTableBuilder};
