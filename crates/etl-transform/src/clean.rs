//! Row-level cleaning: exact duplicates and missing required values.

use std::collections::BTreeSet;

use polars::prelude::{AnyValue, BooleanChunked, DataFrame, NewChunkedArray};
use tracing::{info, info_span, warn};

use etl_common::{any_to_string, is_missing_value};

use crate::error::Result;

/// Row counts dropped by [`clean`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanOutcome {
    pub duplicates_removed: usize,
    pub nulls_removed: usize,
}

/// Removes duplicates, then rows missing a `required` field.
///
/// Running it twice on the same frame removes nothing the second time.
pub fn clean(df: &mut DataFrame, required: &[String]) -> Result<CleanOutcome> {
    let span = info_span!("clean", rows = df.height());
    let _guard = span.enter();

    let duplicates_removed = remove_duplicates(df)?;
    log_null_counts(df);
    let nulls_removed = remove_missing_required(df, required)?;

    info!(
        duplicates_removed,
        nulls_removed,
        remaining = df.height(),
        "cleaning complete"
    );
    Ok(CleanOutcome {
        duplicates_removed,
        nulls_removed,
    })
}

fn row_key(df: &DataFrame, idx: usize) -> Vec<Option<String>> {
    df.get_columns()
        .iter()
        .map(|column| match column.get(idx).unwrap_or(AnyValue::Null) {
            AnyValue::Null => None,
            value => Some(any_to_string(value)),
        })
        .collect()
}

/// Drops rows equal to an earlier row in every column, keeping the first.
pub fn remove_duplicates(df: &mut DataFrame) -> Result<usize> {
    let height = df.height();
    if height == 0 {
        return Ok(0);
    }
    let mut seen = BTreeSet::new();
    let mut keep = Vec::with_capacity(height);
    for idx in 0..height {
        keep.push(seen.insert(row_key(df, idx)));
    }
    let removed = keep.iter().filter(|kept| !**kept).count();
    if removed > 0 {
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        *df = df.filter(&mask)?;
        info!(removed, "removed duplicate rows");
    }
    Ok(removed)
}

/// Drops rows whose value in any `required` column is null or blank.
///
/// A required column absent from the frame is reported and ignored.
pub fn remove_missing_required(df: &mut DataFrame, required: &[String]) -> Result<usize> {
    let height = df.height();
    if height == 0 || required.is_empty() {
        return Ok(0);
    }
    let mut columns = Vec::new();
    for name in required {
        match df.column(name) {
            Ok(column) => columns.push(column),
            Err(_) => warn!(column = %name, "required column not in source, skipping"),
        }
    }
    if columns.is_empty() {
        return Ok(0);
    }
    let keep: Vec<bool> = (0..height)
        .map(|idx| {
            columns
                .iter()
                .all(|column| !is_missing_value(&column.get(idx).unwrap_or(AnyValue::Null)))
        })
        .collect();
    let removed = keep.iter().filter(|kept| !**kept).count();
    if removed > 0 {
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        *df = df.filter(&mask)?;
        info!(removed, "removed rows with missing required values");
    }
    Ok(removed)
}

/// Logs the number of null values per column.
pub fn log_null_counts(df: &DataFrame) {
    for column in df.get_columns() {
        let nulls = column.null_count();
        if nulls > 0 {
            info!(column = %column.name(), nulls, "null values");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, Series};

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new(
                "email".into(),
                vec![Some("a@x.com"), Some("a@x.com"), None, Some("  "), Some("b@x.com")],
            )
            .into(),
            Series::new("age".into(), vec![Some(30i64), Some(30), Some(40), Some(50), Some(30)])
                .into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_remove_duplicates_keeps_first() {
        let mut df = frame();
        let removed = remove_duplicates(&mut df).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(df.height(), 4);
        let email = df.column("email").unwrap().str().unwrap();
        assert_eq!(email.get(0), Some("a@x.com"));
        assert_eq!(email.get(1), None);
    }

    #[test]
    fn test_null_and_empty_differ_for_duplicates() {
        let mut df = DataFrame::new(vec![
            Series::new("city".into(), vec![None, Some(""), None]).into(),
        ])
        .unwrap();
        assert_eq!(remove_duplicates(&mut df).unwrap(), 1);
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_required_fields() {
        let mut df = frame();
        let outcome = clean(&mut df, &["email".to_string()]).unwrap();
        assert_eq!(
            outcome,
            CleanOutcome {
                duplicates_removed: 1,
                nulls_removed: 2,
            }
        );
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_missing_required_column_is_ignored() {
        let mut df = frame();
        let removed = remove_missing_required(&mut df, &["phone".to_string()]).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(df.height(), 5);
    }

    #[test]
    fn test_clean_empty_frame() {
        let mut df = DataFrame::new(vec![
            Series::new("email".into(), Vec::<Option<&str>>::new()).into(),
        ])
        .unwrap();
        let outcome = clean(&mut df, &["email".to_string()]).unwrap();
        assert_eq!(outcome, CleanOutcome::default());
    }
}
