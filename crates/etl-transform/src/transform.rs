//! Field-level transformations applied after validation.
//!
//! Transforms run in declaration order and never drop rows. A transform whose
//! input column is missing is skipped with a warning; `derived` creates its
//! target column.

use std::collections::BTreeMap;

use polars::prelude::{AnyValue, Column, DataFrame, DataType, NamedFrom, Series};
use tracing::{debug, info, info_span, warn};

use etl_common::{any_to_f64, any_to_string, days_from_date};
use etl_model::{Derivation, FieldTransform, Operand, TransformRule};

use crate::dates::parse_date_value;
use crate::error::Result;

/// Per-run results of [`apply_transforms`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOutcome {
    /// Field to number of values a `date` transform nulled out.
    pub unparsable_dates: BTreeMap<String, usize>,
    /// Transforms skipped because an input column was missing.
    pub skipped: Vec<String>,
}

/// Applies every transform in order.
pub fn apply_transforms(
    df: &mut DataFrame,
    transforms: &[FieldTransform],
) -> Result<TransformOutcome> {
    let span = info_span!("transform", rows = df.height(), transforms = transforms.len());
    let _guard = span.enter();

    let mut outcome = TransformOutcome::default();
    for transform in transforms {
        match apply_transform(df, transform)? {
            Some(unparsable) => {
                if unparsable > 0 {
                    *outcome
                        .unparsable_dates
                        .entry(transform.field.clone())
                        .or_insert(0) += unparsable;
                }
            }
            None => outcome.skipped.push(transform.field.clone()),
        }
    }
    info!(rows = df.height(), skipped = outcome.skipped.len(), "transformation complete");
    Ok(outcome)
}

/// Applies one transform.
///
/// Returns `None` when it was skipped, otherwise the number of values that
/// could not be parsed (always zero except for `date`).
pub fn apply_transform(df: &mut DataFrame, transform: &FieldTransform) -> Result<Option<usize>> {
    let field = transform.field.as_str();
    if let TransformRule::Derived(derivation) = &transform.rule {
        return apply_derivation(df, field, derivation);
    }
    if df.column(field).is_err() {
        warn!(
            field,
            kind = transform.rule.kind(),
            "transform field not in frame, skipping"
        );
        return Ok(None);
    }
    match &transform.rule {
        TransformRule::Uppercase => map_text(df, field, |s| s.to_uppercase()).map(|()| Some(0)),
        TransformRule::Lowercase => map_text(df, field, |s| s.to_lowercase()).map(|()| Some(0)),
        TransformRule::Strip => map_text(df, field, |s| s.trim().to_string()).map(|()| Some(0)),
        TransformRule::Date { format } => parse_dates(df, field, format.as_deref()).map(Some),
        TransformRule::Derived(_) => Ok(Some(0)),
    }
}

fn map_text(df: &mut DataFrame, field: &str, f: impl Fn(&str) -> String) -> Result<()> {
    let column = df.column(field)?;
    let values: Vec<Option<String>> = (0..df.height())
        .map(|idx| match column.get(idx).unwrap_or(AnyValue::Null) {
            AnyValue::Null => None,
            value => Some(f(&any_to_string(value))),
        })
        .collect();
    df.with_column(Column::new(field.into(), values))?;
    Ok(())
}

fn parse_dates(df: &mut DataFrame, field: &str, format: Option<&str>) -> Result<usize> {
    let column = df.column(field)?;
    if column.dtype() == &DataType::Date {
        return Ok(0);
    }
    let mut unparsable = 0usize;
    let mut days: Vec<Option<i32>> = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let value = match column.get(idx).unwrap_or(AnyValue::Null) {
            AnyValue::Null => {
                days.push(None);
                continue;
            }
            value => any_to_string(value),
        };
        match parse_date_value(&value, format) {
            Some(date) => days.push(Some(days_from_date(date))),
            None => {
                debug!(field, value = %value, "unparsable date");
                unparsable += 1;
                days.push(None);
            }
        }
    }
    let series = Series::new(field.into(), days).cast(&DataType::Date)?;
    df.with_column(series)?;
    if unparsable > 0 {
        warn!(field, unparsable, "dates could not be parsed and were set to null");
    }
    Ok(unparsable)
}

fn apply_derivation(
    df: &mut DataFrame,
    field: &str,
    derivation: &Derivation,
) -> Result<Option<usize>> {
    let missing: Vec<&str> = derivation
        .inputs()
        .into_iter()
        .filter(|input| df.column(input).is_err())
        .collect();
    if !missing.is_empty() {
        warn!(
            field,
            derivation = %derivation,
            missing = %missing.join(", "),
            "derived inputs not in frame, skipping"
        );
        return Ok(None);
    }
    let column = derive_column(df, field, derivation)?;
    df.with_column(column)?;
    debug!(field, derivation = %derivation, "derived column");
    Ok(Some(0))
}

/// Computes a derived column without touching the frame.
///
/// Each output value depends only on the same row's inputs.
pub fn derive_column(df: &DataFrame, field: &str, derivation: &Derivation) -> Result<Column> {
    let height = df.height();
    match derivation {
        Derivation::Concat { fields, separator } => {
            let columns = fields
                .iter()
                .map(|name| df.column(name))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let values: Vec<Option<String>> = (0..height)
                .map(|idx| {
                    let mut parts = Vec::with_capacity(columns.len());
                    for column in &columns {
                        match column.get(idx).unwrap_or(AnyValue::Null) {
                            AnyValue::Null => return None,
                            value => parts.push(any_to_string(value)),
                        }
                    }
                    Some(parts.join(separator))
                })
                .collect();
            Ok(Column::new(field.into(), values))
        }
        Derivation::Arithmetic { op, left, right } => {
            let left = operand_values(df, left)?;
            let right = operand_values(df, right)?;
            let values: Vec<Option<f64>> = left
                .into_iter()
                .zip(right)
                .map(|(l, r)| op.apply(l?, r?))
                .collect();
            Ok(Column::new(field.into(), values))
        }
    }
}

fn operand_values(df: &DataFrame, operand: &Operand) -> Result<Vec<Option<f64>>> {
    match operand {
        Operand::Constant(value) => Ok(vec![Some(*value); df.height()]),
        Operand::Field(name) => {
            let column = df.column(name)?;
            Ok((0..df.height())
                .map(|idx| any_to_f64(column.get(idx).unwrap_or(AnyValue::Null)))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etl_model::ArithmeticOp;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("name".into(), vec![Some(" ana "), None]).into(),
            Series::new("qty".into(), vec![Some(2i64), Some(3)]).into(),
            Series::new("price".into(), vec![Some(1.5f64), None]).into(),
        ])
        .unwrap()
    }

    fn rule(field: &str, rule: TransformRule) -> FieldTransform {
        FieldTransform {
            field: field.to_string(),
            rule,
        }
    }

    #[test]
    fn test_case_and_strip() {
        let mut df = frame();
        apply_transforms(
            &mut df,
            &[
                rule("name", TransformRule::Strip),
                rule("name", TransformRule::Uppercase),
            ],
        )
        .unwrap();
        let name = df.column("name").unwrap().str().unwrap();
        assert_eq!(name.get(0), Some("ANA"));
        assert_eq!(name.get(1), None);
    }

    #[test]
    fn test_case_on_numeric_column_casts_to_text() {
        let mut df = frame();
        apply_transform(&mut df, &rule("qty", TransformRule::Lowercase)).unwrap();
        let qty = df.column("qty").unwrap();
        assert_eq!(qty.dtype(), &DataType::String);
        assert_eq!(qty.str().unwrap().get(0), Some("2"));
    }

    #[test]
    fn test_missing_field_is_skipped() {
        let mut df = frame();
        let outcome =
            apply_transforms(&mut df, &[rule("city", TransformRule::Uppercase)]).unwrap();
        assert_eq!(outcome.skipped, vec!["city".to_string()]);
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_arithmetic_derivation() {
        let mut df = frame();
        let derived = rule(
            "total",
            TransformRule::Derived(Derivation::Arithmetic {
                op: ArithmeticOp::Multiply,
                left: Operand::Field("qty".to_string()),
                right: Operand::Field("price".to_string()),
            }),
        );
        apply_transform(&mut df, &derived).unwrap();
        let total = df.column("total").unwrap().f64().unwrap();
        assert_eq!(total.get(0), Some(3.0));
        assert_eq!(total.get(1), None);
    }

    #[test]
    fn test_division_by_zero_is_null() {
        let mut df = frame();
        let derived = rule(
            "ratio",
            TransformRule::Derived(Derivation::Arithmetic {
                op: ArithmeticOp::Divide,
                left: Operand::Field("qty".to_string()),
                right: Operand::Constant(0.0),
            }),
        );
        apply_transform(&mut df, &derived).unwrap();
        assert_eq!(df.column("ratio").unwrap().null_count(), 2);
    }

    #[test]
    fn test_concat_derivation() {
        let mut df = frame();
        let derived = rule(
            "label",
            TransformRule::Derived(Derivation::Concat {
                fields: vec!["qty".to_string(), "name".to_string()],
                separator: "-".to_string(),
            }),
        );
        apply_transform(&mut df, &derived).unwrap();
        let label = df.column("label").unwrap().str().unwrap();
        assert_eq!(label.get(0), Some("2- ana "));
        assert_eq!(label.get(1), None);
    }

    #[test]
    fn test_dates_count_unparsable() {
        let mut df = DataFrame::new(vec![
            Series::new(
                "signup".into(),
                vec![Some("2024-01-15"), Some("15/01/2024"), Some("soon"), None],
            )
            .into(),
        ])
        .unwrap();
        let outcome = apply_transforms(
            &mut df,
            &[rule("signup", TransformRule::Date { format: None })],
        )
        .unwrap();
        assert_eq!(outcome.unparsable_dates.get("signup"), Some(&1));
        let signup = df.column("signup").unwrap();
        assert_eq!(signup.dtype(), &DataType::Date);
        assert_eq!(signup.null_count(), 2);
        assert_eq!(df.height(), 4);
        assert_eq!(any_to_string(signup.get(1).unwrap()), "2024-01-15");
    }
}
