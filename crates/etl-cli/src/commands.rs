use anyhow::{Context, Result};
use tracing::{info, info_span};

use etl_core::{JobRun, PipelineFile, run_jobs};
use etl_report::{ReportSection, Reporter};
use etl_sample::{SampleConfig, SampleSummary, generate};

use etl_cli::cli::{GenerateArgs, ReportArgs, RunArgs};

pub fn run_generate(args: &GenerateArgs) -> Result<SampleSummary> {
    let config = SampleConfig {
        clients: args.clients,
        sales: args.sales,
        seed: args.seed,
        output_dir: args.output_dir.clone(),
        ..SampleConfig::default()
    };
    generate(&config)
        .with_context(|| format!("generate sample files in {}", args.output_dir.display()))
}

pub fn run_pipeline_file(args: &RunArgs) -> Result<Vec<JobRun>> {
    let mut file = PipelineFile::load(&args.pipeline)
        .with_context(|| format!("load pipeline {}", args.pipeline.display()))?;
    if let Some(database) = &args.database {
        file.database = database.clone();
    }

    let span = info_span!("run", pipeline = %args.pipeline.display());
    let _guard = span.enter();
    info!(database = %file.database.display(), jobs = file.jobs.len(), "running pipeline file");
    let runs = run_jobs(&file, args.job.as_deref()).context("select jobs")?;
    Ok(runs)
}

pub fn run_report(args: &ReportArgs) -> Result<Vec<ReportSection>> {
    let reporter = Reporter::open(&args.database)
        .with_context(|| format!("open database {}", args.database.display()))?;
    match args.client_id {
        Some(client_id) => {
            let table = reporter
                .client_purchase_history(client_id)
                .with_context(|| format!("purchase history of client {client_id}"))?;
            Ok(vec![ReportSection {
                title: format!("Purchases of client {client_id}"),
                table,
            }])
        }
        None => reporter.full_report(args.limit).context("build report"),
    }
}
