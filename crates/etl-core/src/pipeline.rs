//! Pipeline orchestration.

use tracing::{info, info_span};

use etl_ingest::extract;
use etl_load::Store;
use etl_model::{RunReport, ValidationRules, compile_transforms};
use etl_transform::{apply_transforms, clean};
use etl_validate::RuleEngine;

use crate::config::{ConfigError, PipelineFile, PipelineRequest};
use crate::context::RunContext;
use crate::error::{PipelineError, RunFailure};

/// Runs one request end to end.
///
/// Rule tables are compiled before the source is read and the database is
/// opened only once extraction succeeds, so neither a configuration error nor
/// an unreadable source creates or changes the destination. On a fatal error
/// the partially filled report travels inside the [`RunFailure`].
pub fn run_pipeline(request: &PipelineRequest) -> Result<RunReport, RunFailure> {
    let span = info_span!(
        "pipeline",
        table = %request.destination_table,
        source = %request.source_path.display()
    );
    let _guard = span.enter();
    info!("pipeline started");

    let mut ctx = RunContext::new();
    match execute(request, &mut ctx) {
        Ok(()) => {
            let report = ctx.finish();
            info!(
                extracted = report.extracted,
                transformed = report.transformed,
                loaded = report.loaded,
                errors = report.errors,
                duration_ms = report.duration.as_millis() as u64,
                "pipeline finished"
            );
            Ok(report)
        }
        Err(error) => Err(ctx.fail(error)),
    }
}

fn execute(request: &PipelineRequest, ctx: &mut RunContext) -> Result<(), PipelineError> {
    let engine = RuleEngine::new(ValidationRules::compile(&request.validation_rules)?);
    let transforms = compile_transforms(&request.transform_rules)?;

    let mut df = extract(&request.source_path, &request.encoding)?;
    ctx.report.extracted = df.height();

    // Dropped on every exit path, which closes the connection.
    let mut store = Store::open(&request.database)?;

    let cleaned = clean(&mut df, &request.cleaning.required)?;
    ctx.report.duplicates_removed = cleaned.duplicates_removed;
    ctx.report.nulls_removed = cleaned.nulls_removed;

    let validation = engine.apply(&mut df)?;
    for (field, count) in &validation.invalid_by_field {
        ctx.report.record_invalid(field, *count);
    }
    ctx.report.invalid_rows = validation.invalid_rows;

    let transformed = apply_transforms(&mut df, &transforms)?;
    for (field, count) in &transformed.unparsable_dates {
        ctx.report.record_unparsable_dates(field, *count);
    }
    ctx.report.transformed = df.height();

    let outcome = store.load(&request.destination_table, &df, &request.indexes)?;
    ctx.report.loaded = outcome.loaded;
    ctx.report.errors += outcome.errors;
    Ok(())
}

/// Outcome of one job of a pipeline file.
#[derive(Debug)]
pub struct JobRun {
    pub name: String,
    pub result: Result<RunReport, RunFailure>,
}

impl JobRun {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs the selected jobs of a pipeline file in declaration order.
///
/// A failed job does not stop the jobs after it.
pub fn run_jobs(file: &PipelineFile, job: Option<&str>) -> Result<Vec<JobRun>, ConfigError> {
    let jobs = file.select(job)?;
    Ok(jobs
        .into_iter()
        .map(|job| {
            let span = info_span!("job", name = %job.name);
            let _guard = span.enter();
            JobRun {
                name: job.name.clone(),
                result: run_pipeline(&file.request(job)),
            }
        })
        .collect())
}
