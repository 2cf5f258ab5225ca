//! Loading stage of the ETL pipeline.
//!
//! The destination is an embedded SQLite database. Column types are inferred
//! from the frame, the table is created on first use and every later load
//! appends.

mod error;
mod schema;
mod store;

pub use error::{LoadError, Result};
pub use schema::{SqlType, column_definitions, infer_sql_type, quote_identifier};
pub use store::{DEFAULT_DATABASE, LoadOutcome, Store};
