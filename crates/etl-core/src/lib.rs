//! Pipeline configuration and orchestration.
//!
//! A run moves one source file through five stages:
//!
//! 1. **Extract**: decode and parse the source into a frame
//! 2. **Clean**: drop exact duplicates and rows missing required fields
//! 3. **Validate**: drop rows failing a field rule
//! 4. **Transform**: rewrite or derive columns
//! 5. **Load**: append the survivors to the destination table
//!
//! Each stage adds to the [`RunReport`] held by the run's [`RunContext`].

mod config;
mod context;
mod error;
mod pipeline;

pub use config::{
    CleaningConfig, ConfigError, DestinationConfig, JobConfig, PipelineFile, PipelineRequest,
    SourceConfig,
};
pub use context::RunContext;
pub use error::{PipelineError, RunFailure};
pub use etl_model::RunReport;
pub use pipeline::{JobRun, run_jobs, run_pipeline};
