//! Rendering of run summaries and report sections.

use std::collections::BTreeMap;
use std::time::Duration;

use etl_cli::summary::{JobSummary, detail_table, result_table, runs_table};
use etl_core::{JobRun, PipelineError, RunFailure, RunReport};
use etl_report::{Cell, ResultTable};

fn clients_report() -> RunReport {
    RunReport {
        extracted: 4,
        duplicates_removed: 1,
        invalid_removed_by_field: BTreeMap::from([
            ("age".to_string(), 1),
            ("email".to_string(), 1),
        ]),
        invalid_rows: 2,
        transformed: 1,
        loaded: 1,
        duration: Duration::from_millis(1500),
        ..RunReport::default()
    }
}

fn runs() -> Vec<JobRun> {
    vec![
        JobRun {
            name: "clients".to_string(),
            result: Ok(clients_report()),
        },
        JobRun {
            name: "sales".to_string(),
            result: Err(RunFailure {
                report: RunReport {
                    errors: 1,
                    ..RunReport::default()
                },
                error: PipelineError::Frame {
                    message: "column lengths differ".to_string(),
                },
            }),
        },
    ]
}

#[test]
fn test_json_summary() {
    let runs = runs();
    let summaries: Vec<JobSummary<'_>> = runs.iter().map(JobSummary::from_run).collect();
    insta::assert_json_snapshot!(summaries, @r#"
    [
      {
        "job": "clients",
        "status": "ok",
        "report": {
          "extracted": 4,
          "duplicates_removed": 1,
          "nulls_removed": 0,
          "invalid_removed_by_field": {
            "age": 1,
            "email": 1
          },
          "invalid_rows": 2,
          "unparsable_dates": {},
          "transformed": 1,
          "loaded": 1,
          "errors": 0,
          "duration": {
            "secs": 1,
            "nanos": 500000000
          }
        }
      },
      {
        "job": "sales",
        "status": "failed",
        "error_kind": "FrameError",
        "error": "frame operation failed: column lengths differ",
        "report": {
          "extracted": 0,
          "duplicates_removed": 0,
          "nulls_removed": 0,
          "invalid_removed_by_field": {},
          "invalid_rows": 0,
          "unparsable_dates": {},
          "transformed": 0,
          "loaded": 0,
          "errors": 1,
          "duration": {
            "secs": 0,
            "nanos": 0
          }
        }
      }
    ]
    "#);
}

#[test]
fn test_runs_table_lists_each_job_and_total() {
    let mut table = runs_table(&runs());
    table.force_no_tty();
    let rendered = table.to_string();
    assert!(rendered.contains("clients"));
    assert!(rendered.contains("FrameError"));
    assert!(rendered.contains("TOTAL"));
    assert!(rendered.contains("1.50s"));
    assert_eq!(table.row_count(), 3);
}

#[test]
fn test_detail_table_only_when_rows_rejected() {
    let runs = runs();
    let mut table = detail_table(&runs).unwrap();
    table.force_no_tty();
    let rendered = table.to_string();
    assert!(rendered.contains("failed validation"));
    assert!(rendered.contains("email"));
    assert_eq!(table.row_count(), 2);

    let clean = vec![JobRun {
        name: "sales".to_string(),
        result: Ok(RunReport::default()),
    }];
    assert!(detail_table(&clean).is_none());
}

#[test]
fn test_result_table_renders_nulls_and_reals() {
    let result = ResultTable {
        columns: vec!["city".to_string(), "average_spent".to_string()],
        rows: vec![
            vec![Cell::Text("Lyon".to_string()), Cell::Real(1234.5)],
            vec![Cell::Null, Cell::Real(10.0)],
        ],
    };
    let mut table = result_table(&result);
    table.force_no_tty();
    let rendered = table.to_string();
    assert!(rendered.contains("average_spent"));
    assert!(rendered.contains("1234.50"));
    assert!(rendered.contains("10.00"));
    assert_eq!(table.row_count(), 2);
}
