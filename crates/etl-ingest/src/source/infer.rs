//! Per-column type inference for raw CSV cells.

use polars::prelude::{Column, DataFrame};
use tracing::debug;

use etl_common::parse_f64;

use crate::error::Result;

use super::reader::RawTable;

/// Column type chosen from the non-null cells of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferredType {
    Int64,
    Float64,
    Utf8,
}

fn parse_i64(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

/// Infers the narrowest type that holds every non-null cell.
///
/// Integers win over floats, floats over text. A column with no values at all
/// stays text.
pub fn infer_column_type<'a, I>(cells: I) -> InferredType
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut saw_value = false;
    let mut all_int = true;
    for cell in cells.into_iter().flatten() {
        saw_value = true;
        if all_int && parse_i64(cell).is_some() {
            continue;
        }
        all_int = false;
        if parse_f64(cell).is_none() {
            return InferredType::Utf8;
        }
    }
    match (saw_value, all_int) {
        (false, _) => InferredType::Utf8,
        (true, true) => InferredType::Int64,
        (true, false) => InferredType::Float64,
    }
}

/// Builds a typed `DataFrame` from a raw table, one column per header.
pub fn build_frame(table: &RawTable) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(table.headers.len());
    for (idx, name) in table.headers.iter().enumerate() {
        let cells = || table.rows.iter().map(move |row| row[idx].as_deref());
        let inferred = infer_column_type(cells());
        debug!(column = %name, dtype = ?inferred, "inferred column type");
        let column = match inferred {
            InferredType::Int64 => {
                let values: Vec<Option<i64>> = cells().map(|c| c.and_then(parse_i64)).collect();
                Column::new(name.as_str().into(), values)
            }
            InferredType::Float64 => {
                let values: Vec<Option<f64>> = cells().map(|c| c.and_then(parse_f64)).collect();
                Column::new(name.as_str().into(), values)
            }
            InferredType::Utf8 => {
                let values: Vec<Option<&str>> = cells().collect();
                Column::new(name.as_str().into(), values)
            }
        };
        columns.push(column);
    }
    Ok(DataFrame::new(columns)?)
}
