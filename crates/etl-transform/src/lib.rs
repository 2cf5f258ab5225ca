//! Cleaning and transformation stages of the ETL pipeline.
//!
//! - **clean**: exact-duplicate removal and required-field null removal
//! - **transform**: case folding, trimming, date parsing and derived columns
//! - **dates**: the date formats accepted by the `date` transform

pub mod clean;
pub mod dates;
mod error;
pub mod transform;

pub use clean::{CleanOutcome, clean, log_null_counts, remove_duplicates, remove_missing_required};
pub use dates::parse_date_value;
pub use error::{Result, TransformError};
pub use transform::{TransformOutcome, apply_transform, apply_transforms};
