//! Error types for pipeline runs.

use thiserror::Error;

use etl_ingest::IngestError;
use etl_load::LoadError;
use etl_model::{RuleError, RunReport};
use etl_transform::TransformError;
use etl_validate::ValidateError;

/// A fatal pipeline error.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A rule table failed to compile.
    #[error("invalid rule: {0}")]
    InvalidRule(#[from] RuleError),

    /// The source could not be extracted.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// The batch could not be written.
    #[error("load failed: {0}")]
    Load(#[source] LoadError),

    /// The destination database could not be opened.
    #[error("storage unavailable: {0}")]
    Storage(#[source] LoadError),

    /// An in-memory frame operation failed.
    #[error("frame operation failed: {message}")]
    Frame { message: String },
}

impl PipelineError {
    /// Short machine-friendly name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRule(_) => "InvalidRule",
            Self::Ingest(err) => err.kind(),
            Self::Load(_) => "LoadError",
            Self::Storage(_) => "StorageError",
            Self::Frame { .. } => "FrameError",
        }
    }
}

impl From<LoadError> for PipelineError {
    fn from(err: LoadError) -> Self {
        if err.is_storage() {
            Self::Storage(err)
        } else {
            Self::Load(err)
        }
    }
}

impl From<TransformError> for PipelineError {
    fn from(err: TransformError) -> Self {
        Self::Frame {
            message: err.to_string(),
        }
    }
}

impl From<ValidateError> for PipelineError {
    fn from(err: ValidateError) -> Self {
        Self::Frame {
            message: err.to_string(),
        }
    }
}

/// A failed run: the error plus the report as it stood when the run stopped.
#[derive(Debug, Error)]
#[error("pipeline run failed: {error}")]
pub struct RunFailure {
    pub report: RunReport,
    #[source]
    pub error: PipelineError,
}

impl RunFailure {
    pub fn kind(&self) -> &'static str {
        self.error.kind()
    }
}
