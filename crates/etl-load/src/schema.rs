//! Column type inference and identifier quoting for SQLite DDL.

use std::fmt;

use polars::prelude::{DataFrame, DataType};

/// SQLite storage class used for a destination column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
}

impl SqlType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a frame column type to the SQLite column type.
///
/// Integers and booleans are `INTEGER`, floats are `REAL`. Everything else,
/// dates included, is stored as `TEXT`.
pub fn infer_sql_type(dtype: &DataType) -> SqlType {
    match dtype {
        DataType::Boolean
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => SqlType::Integer,
        DataType::Float32 | DataType::Float64 => SqlType::Real,
        _ => SqlType::Text,
    }
}

/// Wraps an identifier in double quotes, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Column name and SQL type for every column of `df`, in frame order.
pub fn column_definitions(df: &DataFrame) -> Vec<(String, SqlType)> {
    df.get_columns()
        .iter()
        .map(|column| (column.name().to_string(), infer_sql_type(column.dtype())))
        .collect()
}

pub(crate) fn create_table_sql(table: &str, columns: &[(String, SqlType)]) -> String {
    let body = columns
        .iter()
        .map(|(name, sql_type)| format!("{} {sql_type}", quote_identifier(name)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE IF NOT EXISTS {} ({body})", quote_identifier(table))
}

pub(crate) fn insert_sql(table: &str, columns: &[(String, SqlType)]) -> String {
    let names = columns
        .iter()
        .map(|(name, _)| quote_identifier(name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|idx| format!("?{idx}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({names}) VALUES ({placeholders})",
        quote_identifier(table)
    )
}

/// Index name for `column` on `table`, restricted to identifier characters.
pub(crate) fn index_name(table: &str, column: &str) -> String {
    let column: String = column
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect();
    format!("idx_{table}_{column}")
}
