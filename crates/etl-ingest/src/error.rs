//! Error types for data extraction.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while extracting a source file.
///
/// Every variant is fatal for a run: extraction is a single local read with
/// nothing worth retrying.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Source file does not exist.
    #[error("source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Decoding Errors ===
    /// The configured encoding label is not recognised.
    #[error("unknown text encoding '{label}' for {path}")]
    UnknownEncoding { path: PathBuf, label: String },

    /// The file contains bytes that are invalid under the configured encoding.
    #[error("{path} is not valid {encoding}")]
    Encoding {
        path: PathBuf,
        encoding: &'static str,
    },

    // === CSV Parsing Errors ===
    /// The file has no header row.
    #[error("source file is empty: {path}")]
    EmptyInput { path: PathBuf },

    /// Malformed CSV content.
    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A header cell is blank.
    #[error("empty column name at position {position} in {path}")]
    EmptyColumnName { path: PathBuf, position: usize },

    /// Two header cells carry the same name.
    #[error("duplicate column '{column}' in {path}")]
    DuplicateColumn { path: PathBuf, column: String },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl IngestError {
    /// Short machine-friendly name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceNotFound { .. } => "SourceNotFound",
            Self::FileRead { .. } => "FileRead",
            Self::UnknownEncoding { .. } | Self::Encoding { .. } => "EncodingError",
            Self::EmptyInput { .. } => "EmptyInput",
            Self::Csv { .. } | Self::EmptyColumnName { .. } | Self::DuplicateColumn { .. } => {
                "CsvParse"
            }
            Self::DataFrame { .. } => "DataFrame",
        }
    }
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, IngestError>;
