//! ETL command-line entry point.

use clap::Parser;
use etl_cli::cli::{Cli, Command};
use etl_cli::logging::init_logging;
use etl_cli::summary::{print_runs, print_sections, runs_json};

mod commands;

use crate::commands::{run_generate, run_pipeline_file, run_report};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = cli.log_config();
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match &cli.command {
        Command::Generate(args) => match run_generate(args) {
            Ok(summary) => {
                println!(
                    "Wrote {} rows to {}",
                    summary.clients_rows,
                    summary.clients_path.display()
                );
                println!(
                    "Wrote {} rows to {}",
                    summary.sales_rows,
                    summary.sales_path.display()
                );
                0
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Run(args) => match run_pipeline_file(args) {
            Ok(runs) => {
                if args.json {
                    match runs_json(&runs) {
                        Ok(json) => println!("{json}"),
                        Err(error) => eprintln!("error: {error}"),
                    }
                } else {
                    print_runs(&runs);
                }
                if runs.iter().all(|run| run.succeeded()) { 0 } else { 1 }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Report(args) => match run_report(args) {
            Ok(sections) => {
                print_sections(&sections);
                0
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
    };
    std::process::exit(exit_code);
}
