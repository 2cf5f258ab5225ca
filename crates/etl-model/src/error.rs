use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid table name: {0:?}")]
    InvalidTableName(String),
}

/// Configuration errors raised while compiling rule tables.
///
/// Every variant is fatal for a run and is raised before the source is read.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("unknown {table} rule kind '{kind}' for field '{field}'")]
    UnknownKind {
        table: &'static str,
        field: String,
        kind: String,
    },

    #[error("{kind} rule for field '{field}' is missing parameter '{parameter}'")]
    MissingParameter {
        field: String,
        kind: String,
        parameter: &'static str,
    },

    #[error("invalid regex for field '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("range rule for field '{field}' has min {min} greater than max {max}")]
    InvalidRange { field: String, min: f64, max: f64 },

    #[error("unknown derived operation '{op}' for field '{field}'")]
    UnknownOperation { field: String, op: String },

    #[error("rule declared for an empty field name")]
    EmptyField,
}
