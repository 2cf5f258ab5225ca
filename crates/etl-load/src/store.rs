//! SQLite destination store.

use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::{AnyValue, DataFrame};
use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, params, params_from_iter};
use tracing::{debug, info, info_span, warn};

use etl_common::any_to_string;
use etl_model::TableName;

use crate::error::{LoadError, Result};
use crate::schema::{column_definitions, create_table_sql, index_name, insert_sql, quote_identifier};

/// Database file used when none is configured.
pub const DEFAULT_DATABASE: &str = "data_warehouse.db";

/// Result of appending one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Rows committed.
    pub loaded: usize,
    /// Rows the database rejected.
    pub errors: usize,
    /// The destination table did not exist before this load.
    pub created: bool,
}

/// An open destination database.
///
/// The connection closes when the store is dropped.
pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened database");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let path = PathBuf::from(":memory:");
        let conn = Connection::open_in_memory().map_err(|source| LoadError::Open {
            path: path.clone(),
            source,
        })?;
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn table_exists(&self, table: &TableName) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn row_count(&self, table: &TableName) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table.as_str()));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Appends every row of `df` to `table` in a single transaction.
    ///
    /// The table is created from the frame's columns when absent. A row the
    /// database rejects (constraint or type violation) is counted and skipped.
    /// Any other failure rolls the whole batch back.
    pub fn load(
        &mut self,
        table: &TableName,
        df: &DataFrame,
        indexes: &[String],
    ) -> Result<LoadOutcome> {
        let span = info_span!("load", table = %table, rows = df.height());
        let _guard = span.enter();
        let start = Instant::now();

        let columns = column_definitions(df);
        if columns.is_empty() {
            return Err(LoadError::NoColumns {
                table: table.to_string(),
            });
        }

        let created = !self.table_exists(table)?;
        self.conn
            .execute(&create_table_sql(table.as_str(), &columns), [])
            .map_err(|source| LoadError::CreateTable {
                table: table.to_string(),
                source,
            })?;
        if created {
            info!(columns = columns.len(), "created destination table");
        }

        let batch_error = |source: rusqlite::Error| LoadError::Batch {
            table: table.to_string(),
            source,
        };
        let tx = self.conn.transaction().map_err(batch_error)?;
        let mut outcome = LoadOutcome {
            created,
            ..LoadOutcome::default()
        };
        {
            let mut stmt = tx
                .prepare(&insert_sql(table.as_str(), &columns))
                .map_err(batch_error)?;
            let frame_columns = df.get_columns();
            for idx in 0..df.height() {
                let values: Vec<Value> = frame_columns
                    .iter()
                    .map(|column| to_sql_value(column.get(idx).unwrap_or(AnyValue::Null)))
                    .collect();
                match stmt.execute(params_from_iter(values.iter())) {
                    Ok(_) => outcome.loaded += 1,
                    Err(err) if is_row_error(&err) => {
                        debug!(row = idx, error = %err, "row rejected");
                        outcome.errors += 1;
                    }
                    Err(source) => return Err(batch_error(source)),
                }
            }
        }
        tx.commit().map_err(batch_error)?;

        if outcome.errors > 0 {
            warn!(rejected = outcome.errors, "rows rejected by the database");
        }
        self.create_indexes(table, df, indexes);
        info!(
            loaded = outcome.loaded,
            duration_ms = start.elapsed().as_millis() as u64,
            "load complete"
        );
        Ok(outcome)
    }

    /// Indexes the first frame column plus each requested column.
    ///
    /// Index failures are logged and do not fail the load.
    fn create_indexes(&self, table: &TableName, df: &DataFrame, requested: &[String]) -> usize {
        let mut targets: Vec<&str> = Vec::new();
        if let Some(first) = df.get_columns().first() {
            targets.push(first.name().as_str());
        }
        for column in requested {
            if df.column(column).is_err() {
                warn!(column = %column, "index column not in destination, skipping");
                continue;
            }
            if !targets.contains(&column.as_str()) {
                targets.push(column.as_str());
            }
        }

        let mut created = 0;
        for column in targets {
            let sql = format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quote_identifier(&index_name(table.as_str(), column)),
                quote_identifier(table.as_str()),
                quote_identifier(column)
            );
            match self.conn.execute(&sql, []) {
                Ok(_) => created += 1,
                Err(err) => warn!(column, error = %err, "failed to create index"),
            }
        }
        created
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "closing database");
    }
}

fn to_sql_value(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(v) => Value::Integer(i64::from(v)),
        AnyValue::Int8(v) => Value::Integer(i64::from(v)),
        AnyValue::Int16(v) => Value::Integer(i64::from(v)),
        AnyValue::Int32(v) => Value::Integer(i64::from(v)),
        AnyValue::Int64(v) => Value::Integer(v),
        AnyValue::UInt8(v) => Value::Integer(i64::from(v)),
        AnyValue::UInt16(v) => Value::Integer(i64::from(v)),
        AnyValue::UInt32(v) => Value::Integer(i64::from(v)),
        AnyValue::UInt64(v) => i64::try_from(v).map_or(Value::Real(v as f64), Value::Integer),
        AnyValue::Float32(v) => Value::Real(f64::from(v)),
        AnyValue::Float64(v) => Value::Real(v),
        other => Value::Text(any_to_string(other)),
    }
}

fn is_row_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => matches!(
            failure.code,
            ErrorCode::ConstraintViolation | ErrorCode::TypeMismatch | ErrorCode::TooBig
        ),
        rusqlite::Error::ToSqlConversionFailure(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_sql_value() {
        assert_eq!(to_sql_value(AnyValue::Null), Value::Null);
        assert_eq!(to_sql_value(AnyValue::Boolean(true)), Value::Integer(1));
        assert_eq!(to_sql_value(AnyValue::Int64(7)), Value::Integer(7));
        assert_eq!(to_sql_value(AnyValue::Float64(1.5)), Value::Real(1.5));
        assert_eq!(
            to_sql_value(AnyValue::String("x")),
            Value::Text("x".to_string())
        );
        assert_eq!(
            to_sql_value(AnyValue::Date(0)),
            Value::Text("1970-01-01".to_string())
        );
    }
}
