use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Counters produced by one pipeline run.
///
/// Stages only ever add to the counters. Once the run returns, the report is
/// handed back by value and no longer changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Rows read from the source.
    pub extracted: usize,
    /// Exact duplicate rows dropped during cleaning.
    pub duplicates_removed: usize,
    /// Rows dropped during cleaning for a null required field.
    pub nulls_removed: usize,
    /// Per-field count of rows failing that field's validation rule.
    pub invalid_removed_by_field: BTreeMap<String, usize>,
    /// Distinct rows dropped by validation.
    pub invalid_rows: usize,
    /// Per-field count of values a `date` transform could not parse.
    pub unparsable_dates: BTreeMap<String, usize>,
    /// Rows that left the transformation stage.
    pub transformed: usize,
    /// Rows committed to the destination table.
    pub loaded: usize,
    /// Row-level load failures plus fatal errors.
    pub errors: usize,
    pub duration: Duration,
}

impl RunReport {
    pub fn record_invalid(&mut self, field: &str, count: usize) {
        if count == 0 {
            return;
        }
        *self
            .invalid_removed_by_field
            .entry(field.to_string())
            .or_insert(0) += count;
    }

    pub fn record_unparsable_dates(&mut self, field: &str, count: usize) {
        if count == 0 {
            return;
        }
        *self.unparsable_dates.entry(field.to_string()).or_insert(0) += count;
    }

    /// Rows rejected for data quality: null required fields plus failed validation.
    pub fn rejected(&self) -> usize {
        self.nulls_removed + self.invalid_rows
    }

    /// True when every extracted row is accounted for by a counter.
    ///
    /// Only meaningful for runs that reached the transformation stage.
    pub fn is_conserved(&self) -> bool {
        self.extracted == self.duplicates_removed + self.rejected() + self.transformed
    }
}
