use thiserror::Error;

/// Errors raised while cleaning or transforming a frame.
///
/// Bad data never ends up here; it is counted instead. These are failures of
/// the frame operations themselves.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for TransformError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
