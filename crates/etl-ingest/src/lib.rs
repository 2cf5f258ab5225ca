//! Data extraction for the ETL pipeline.
//!
//! This crate reads a delimited text source into a Polars `DataFrame`:
//!
//! - **Decoding**: the raw bytes are decoded under a configured encoding label
//! - **Header detection**: column names come from the first row
//! - **Type inference**: integer, float and text columns are inferred per column
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use etl_ingest::{extract, DEFAULT_ENCODING};
//!
//! let df = extract(Path::new("data/clients.csv"), DEFAULT_ENCODING)?;
//! println!("{} rows", df.height());
//! ```

mod source;
mod error;

// === Error Types ===
pub use error::{IngestError, Result};

// === Source Reading ===
pub use source::{
    DEFAULT_ENCODING, InferredType, RawTable, build_frame, decode_source, extract,
    infer_column_type, parse_table, resolve_encoding,
};
