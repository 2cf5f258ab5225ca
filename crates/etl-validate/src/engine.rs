//! Rule engine evaluating compiled validation rules against a frame.
//!
//! Every rule is evaluated independently per field. A row is kept only when
//! every rule whose field is present accepts it.

use std::collections::BTreeMap;

use polars::prelude::{AnyValue, BooleanChunked, DataFrame, NewChunkedArray};
use thiserror::Error;
use tracing::{info, info_span, warn};

use etl_common::{any_to_f64, any_to_string};
use etl_model::{ValidationRule, ValidationRules};

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for ValidateError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// What a validation pass found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Row mask: `true` for rows passing every rule.
    pub keep: Vec<bool>,
    /// Per-field count of rows that field's rule rejected.
    pub invalid_by_field: BTreeMap<String, usize>,
    /// Distinct rejected rows.
    pub invalid_rows: usize,
    /// Fields with a rule but no column in the frame.
    pub missing_fields: Vec<String>,
}

/// Checks a single value. Nulls never pass.
///
/// A pattern must match at the start of the rendered value; it may leave a
/// suffix unmatched unless it ends with `$`.
pub fn value_is_valid(rule: &ValidationRule, value: AnyValue<'_>) -> bool {
    if matches!(value, AnyValue::Null) {
        return false;
    }
    match rule {
        ValidationRule::Pattern(regex) => regex
            .find(&any_to_string(value))
            .is_some_and(|found| found.start() == 0),
        ValidationRule::Range { min, max } => {
            any_to_f64(value).is_some_and(|number| number >= *min && number <= *max)
        }
    }
}

/// Evaluates a compiled rule table.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: ValidationRules,
}

impl RuleEngine {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Evaluates every rule without modifying the frame.
    pub fn evaluate(&self, df: &DataFrame) -> ValidationOutcome {
        let height = df.height();
        let mut outcome = ValidationOutcome {
            keep: vec![true; height],
            ..ValidationOutcome::default()
        };
        for field_rule in self.rules.iter() {
            let Ok(column) = df.column(&field_rule.field) else {
                warn!(
                    field = %field_rule.field,
                    kind = field_rule.rule.kind(),
                    "validation field not in frame, rule skipped"
                );
                outcome.missing_fields.push(field_rule.field.clone());
                continue;
            };
            let mut failed = 0usize;
            for (idx, keep) in outcome.keep.iter_mut().enumerate() {
                let value = column.get(idx).unwrap_or(AnyValue::Null);
                if !value_is_valid(&field_rule.rule, value) {
                    failed += 1;
                    *keep = false;
                }
            }
            if failed > 0 {
                info!(field = %field_rule.field, kind = field_rule.rule.kind(), failed, "rows failed validation");
                outcome
                    .invalid_by_field
                    .insert(field_rule.field.clone(), failed);
            }
        }
        outcome.invalid_rows = outcome.keep.iter().filter(|kept| !**kept).count();
        outcome
    }

    /// Evaluates the rules and drops every rejected row from `df`.
    pub fn apply(&self, df: &mut DataFrame) -> Result<ValidationOutcome, ValidateError> {
        let span = info_span!("validate", rows = df.height(), rules = self.rules.len());
        let _guard = span.enter();

        let outcome = self.evaluate(df);
        if outcome.invalid_rows > 0 {
            let mask = BooleanChunked::from_slice("keep".into(), &outcome.keep);
            *df = df.filter(&mask)?;
        }
        info!(
            invalid_rows = outcome.invalid_rows,
            remaining = df.height(),
            "validation complete"
        );
        Ok(outcome)
    }
}
