use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("database not found: {path}")]
    DatabaseNotFound { path: PathBuf },

    #[error("failed to open database {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error(transparent)]
    InvalidTable(#[from] etl_model::ModelError),

    #[error("table '{table}' does not exist")]
    UnknownTable { table: String },

    #[error("query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
