pub mod error;
pub mod ids;
pub mod report;
pub mod rules;

pub use error::{ModelError, RuleError};
pub use ids::{TableName, is_sql_identifier};
pub use report::RunReport;
pub use rules::{
    ArithmeticOp, Derivation, FieldRule, FieldTransform, Operand, RuleDescriptor,
    TransformDescriptor, TransformRule, ValidationRule, ValidationRules, ValidationTable,
    compile_transforms,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes() {
        let mut report = RunReport {
            extracted: 4,
            ..Default::default()
        };
        report.record_invalid("email", 1);
        let json = serde_json::to_string(&report).expect("serialize report");
        let round: RunReport = serde_json::from_str(&json).expect("deserialize report");
        assert_eq!(round.extracted, 4);
        assert_eq!(round.invalid_removed_by_field.get("email"), Some(&1));
    }
}
