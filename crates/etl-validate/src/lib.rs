mod engine;

pub use engine::{RuleEngine, ValidateError, ValidationOutcome, value_is_valid};
