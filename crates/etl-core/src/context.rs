use std::time::Instant;

use tracing::error;

use etl_model::RunReport;

use crate::error::{PipelineError, RunFailure};

/// Mutable state of a single run.
///
/// Stages add to the report; the run ends by consuming the context, which
/// stamps the duration and hands back the report.
#[derive(Debug)]
pub struct RunContext {
    pub report: RunReport,
    started: Instant,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            report: RunReport::default(),
            started: Instant::now(),
        }
    }

    /// Ends a successful run.
    pub fn finish(mut self) -> RunReport {
        self.report.duration = self.started.elapsed();
        self.report
    }

    /// Ends a run on a fatal error.
    pub fn fail(mut self, error: PipelineError) -> RunFailure {
        self.report.errors += 1;
        self.report.duration = self.started.elapsed();
        error!(kind = error.kind(), error = %error, "pipeline failed");
        RunFailure {
            report: self.report,
            error,
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
