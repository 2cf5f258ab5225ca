//! CLI argument definitions.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{ColorChoice, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;
use tracing::level_filters::LevelFilter;

use etl_report::DEFAULT_LIMIT;

use crate::logging::{LogConfig, LogFormat};

#[derive(Parser)]
#[command(
    name = "etl",
    version,
    about = "Batch CSV to SQLite ETL",
    long_about = "Load CSV files into a SQLite database.\n\n\
                  Each job extracts one file, drops duplicates and rows failing\n\
                  its rules, rewrites columns and appends the survivors to a table."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Append logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Build logging configuration from CLI flags with consistent precedence.
    pub fn log_config(&self) -> LogConfig {
        let mut config = LogConfig {
            level_filter: self.verbosity.tracing_level_filter(),
            ..LogConfig::default()
        };
        config.use_env_filter = !(self.verbosity.is_present() || self.log_level.is_some());
        if let Some(level) = self.log_level {
            config.level_filter = match level {
                LogLevelArg::Error => LevelFilter::ERROR,
                LogLevelArg::Warn => LevelFilter::WARN,
                LogLevelArg::Info => LevelFilter::INFO,
                LogLevelArg::Debug => LevelFilter::DEBUG,
                LogLevelArg::Trace => LevelFilter::TRACE,
            };
        }
        config.format = match self.log_format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        };
        config.log_file = self.log_file.clone();
        config.with_timestamps = self.log_file.is_some();
        config.with_ansi = match self.color.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.log_file.is_none() && io::stderr().is_terminal(),
        };
        config
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Write sample clients.csv and sales.csv files with injected defects.
    Generate(GenerateArgs),

    /// Run the jobs of a pipeline file.
    Run(RunArgs),

    /// Print the reporting catalogue for a database.
    Report(ReportArgs),
}

#[derive(Parser)]
pub struct GenerateArgs {
    /// Number of clients before duplicates are appended.
    #[arg(long, default_value_t = 1000)]
    pub clients: usize,

    /// Number of sales.
    #[arg(long, default_value_t = 500)]
    pub sales: usize,

    /// Seed for reproducible output.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory receiving the files.
    #[arg(long = "output-dir", value_name = "DIR", default_value = "data")]
    pub output_dir: PathBuf,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Pipeline file (TOML) declaring the jobs.
    #[arg(value_name = "PIPELINE")]
    pub pipeline: PathBuf,

    /// Run only the named job.
    #[arg(long, value_name = "NAME")]
    pub job: Option<String>,

    /// Destination database, overriding the pipeline file.
    #[arg(long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Print the run reports as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct ReportArgs {
    /// Database to report on.
    #[arg(long, value_name = "PATH", default_value = "data_warehouse.db")]
    pub database: PathBuf,

    /// Row limit for the "top" sections.
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,

    /// Show the purchase history of one client instead of the full report.
    #[arg(long = "client-id", value_name = "ID")]
    pub client_id: Option<i64>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
