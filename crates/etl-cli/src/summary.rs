//! Terminal and JSON rendering of run reports and report sections.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::Serialize;

use etl_core::{JobRun, RunReport};
use etl_report::{ReportSection, ResultTable};

/// One job's outcome as printed by `etl run --json`.
#[derive(Debug, Serialize)]
pub struct JobSummary<'a> {
    pub job: &'a str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub report: &'a RunReport,
}

impl<'a> JobSummary<'a> {
    pub fn from_run(run: &'a JobRun) -> Self {
        match &run.result {
            Ok(report) => Self {
                job: &run.name,
                status: "ok",
                error_kind: None,
                error: None,
                report,
            },
            Err(failure) => Self {
                job: &run.name,
                status: "failed",
                error_kind: Some(failure.kind()),
                error: Some(failure.error.to_string()),
                report: &failure.report,
            },
        }
    }
}

pub fn runs_json(runs: &[JobRun]) -> serde_json::Result<String> {
    let summaries: Vec<JobSummary<'_>> = runs.iter().map(JobSummary::from_run).collect();
    serde_json::to_string_pretty(&summaries)
}

/// One row per job with the report counters.
pub fn runs_table(runs: &[JobRun]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Job"),
        header_cell("Status"),
        header_cell("Extracted"),
        header_cell("Duplicates"),
        header_cell("Rejected"),
        header_cell("Loaded"),
        header_cell("Errors"),
        header_cell("Duration"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..8 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 1, CellAlignment::Center);

    let mut total_loaded = 0usize;
    let mut total_errors = 0usize;
    for run in runs {
        let (report, status) = match &run.result {
            Ok(report) => (report, status_ok()),
            Err(failure) => (&failure.report, status_failed(failure.kind())),
        };
        total_loaded += report.loaded;
        total_errors += report.errors;
        table.add_row(vec![
            Cell::new(&run.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            status,
            Cell::new(report.extracted),
            count_cell(report.duplicates_removed, Color::Yellow),
            count_cell(report.rejected(), Color::Yellow),
            Cell::new(report.loaded),
            count_cell(report.errors, Color::Red),
            Cell::new(format!("{:.2}s", report.duration.as_secs_f64())),
        ]);
    }
    if runs.len() > 1 {
        table.add_row(vec![
            Cell::new("TOTAL")
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            Cell::new(total_loaded).add_attribute(Attribute::Bold),
            count_cell(total_errors, Color::Red).add_attribute(Attribute::Bold),
            dim_cell("-"),
        ]);
    }
    table
}

/// Per-field detail of rejected rows and unparsable dates, if any.
pub fn detail_table(runs: &[JobRun]) -> Option<Table> {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Job"),
        header_cell("Field"),
        header_cell("Reason"),
        header_cell("Count"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);

    let mut rows = 0usize;
    for run in runs {
        let report = match &run.result {
            Ok(report) => report,
            Err(failure) => &failure.report,
        };
        let invalid = report
            .invalid_removed_by_field
            .iter()
            .map(|(field, count)| (field, "failed validation", count));
        let dates = report
            .unparsable_dates
            .iter()
            .map(|(field, count)| (field, "unparsable date", count));
        for (field, reason, count) in invalid.chain(dates) {
            table.add_row(vec![
                Cell::new(&run.name),
                Cell::new(field),
                Cell::new(reason),
                Cell::new(count).fg(Color::Yellow),
            ]);
            rows += 1;
        }
    }
    (rows > 0).then_some(table)
}

pub fn print_runs(runs: &[JobRun]) {
    println!("{}", runs_table(runs));
    if let Some(table) = detail_table(runs) {
        println!();
        println!("Rejections:");
        println!("{table}");
    }
    for run in runs {
        if let Err(failure) = &run.result {
            eprintln!("error: job '{}': {}", run.name, failure.error);
        }
    }
}

/// Renders a query result; numeric columns are right aligned.
pub fn result_table(result: &ResultTable) -> Table {
    let mut table = Table::new();
    table.set_header(result.columns.iter().map(|name| header_cell(name)));
    apply_table_style(&mut table);
    for (index, _) in result.columns.iter().enumerate() {
        let numeric = result
            .rows
            .iter()
            .filter_map(|row| row.get(index))
            .any(|cell| cell.as_f64().is_some());
        if numeric {
            align_column(&mut table, index, CellAlignment::Right);
        }
    }
    for row in &result.rows {
        table.add_row(row.iter().map(|cell| match cell {
            etl_report::Cell::Null => dim_cell("-"),
            other => Cell::new(other),
        }));
    }
    table
}

pub fn print_sections(sections: &[ReportSection]) {
    for (index, section) in sections.iter().enumerate() {
        if index > 0 {
            println!();
        }
        println!("{}", section.title);
        if section.table.is_empty() {
            println!("  (no rows)");
        } else {
            println!("{}", result_table(&section.table));
        }
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_ok() -> Cell {
    Cell::new("ok").fg(Color::Green).add_attribute(Attribute::Bold)
}

fn status_failed(kind: &str) -> Cell {
    Cell::new(kind).fg(Color::Red).add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
