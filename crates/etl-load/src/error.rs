//! Error types for the SQLite store.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the destination store.
///
/// Row-level insert failures are not errors here; they are counted in
/// [`crate::LoadOutcome`].
#[derive(Debug, Error)]
pub enum LoadError {
    // === Connection Errors ===
    #[error("failed to open database {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    // === Schema Errors ===
    #[error("cannot create table '{table}' from a frame without columns")]
    NoColumns { table: String },

    #[error("failed to create table '{table}': {source}")]
    CreateTable {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    // === Batch Errors ===
    #[error("load into '{table}' failed: {source}")]
    Batch {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl LoadError {
    /// True when the database itself could not be opened.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Open { .. })
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;
