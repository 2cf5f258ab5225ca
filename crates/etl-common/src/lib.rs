//! Shared utilities for the ETL crates.
//!
//! This crate provides the Polars helpers every pipeline stage needs to read
//! cell values out of a `DataFrame` without caring about the column's dtype.

pub mod polars;

pub use polars::{
    any_to_f64, any_to_string, column_value_string, date_from_days, days_from_date,
    format_numeric, is_missing_value, parse_f64,
};
