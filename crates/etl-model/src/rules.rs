//! Validation and transformation rule tables.
//!
//! Rule tables arrive as loosely typed descriptors (the shape found in a
//! pipeline file) and are compiled into closed sum types before a run starts.
//! Compilation is where configuration errors surface: an unknown `type`, a
//! missing parameter or an invalid regex all fail here, never mid-run.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::RuleError;

/// Validation rule table: field name to descriptor.
///
/// A map enforces the one-rule-per-field invariant.
pub type ValidationTable = BTreeMap<String, RuleDescriptor>;

/// Raw validation rule as written in a pipeline file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl RuleDescriptor {
    pub fn pattern(regex: impl Into<String>) -> Self {
        Self {
            kind: "pattern".to_string(),
            regex: Some(regex.into()),
            min: None,
            max: None,
        }
    }

    pub fn range(min: f64, max: f64) -> Self {
        Self {
            kind: "range".to_string(),
            regex: None,
            min: Some(min),
            max: Some(max),
        }
    }
}

/// A compiled validation rule.
#[derive(Debug, Clone)]
pub enum ValidationRule {
    /// The value rendered as text must match the regex.
    Pattern(Regex),
    /// The value coerced to a number must lie in `[min, max]`.
    Range { min: f64, max: f64 },
}

impl ValidationRule {
    pub fn compile(field: &str, descriptor: &RuleDescriptor) -> Result<Self, RuleError> {
        let kind = descriptor.kind.trim().to_ascii_lowercase();
        match kind.as_str() {
            "pattern" => {
                let pattern = descriptor
                    .regex
                    .as_deref()
                    .ok_or_else(|| RuleError::MissingParameter {
                        field: field.to_string(),
                        kind: kind.clone(),
                        parameter: "regex",
                    })?;
                let regex = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
                    field: field.to_string(),
                    source,
                })?;
                Ok(Self::Pattern(regex))
            }
            "range" => {
                let min = descriptor.min.ok_or_else(|| RuleError::MissingParameter {
                    field: field.to_string(),
                    kind: kind.clone(),
                    parameter: "min",
                })?;
                let max = descriptor.max.ok_or_else(|| RuleError::MissingParameter {
                    field: field.to_string(),
                    kind: kind.clone(),
                    parameter: "max",
                })?;
                if min > max || min.is_nan() || max.is_nan() {
                    return Err(RuleError::InvalidRange {
                        field: field.to_string(),
                        min,
                        max,
                    });
                }
                Ok(Self::Range { min, max })
            }
            _ => Err(RuleError::UnknownKind {
                table: "validation",
                field: field.to_string(),
                kind: descriptor.kind.clone(),
            }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pattern(_) => "pattern",
            Self::Range { .. } => "range",
        }
    }
}

/// A compiled validation rule bound to its field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: String,
    pub rule: ValidationRule,
}

/// Compiled validation table, ordered by field name.
#[derive(Debug, Clone, Default)]
pub struct ValidationRules {
    rules: Vec<FieldRule>,
}

impl ValidationRules {
    pub fn compile(table: &ValidationTable) -> Result<Self, RuleError> {
        let mut rules = Vec::with_capacity(table.len());
        for (field, descriptor) in table {
            let field = field.trim();
            if field.is_empty() {
                return Err(RuleError::EmptyField);
            }
            rules.push(FieldRule {
                field: field.to_string(),
                rule: ValidationRule::compile(field, descriptor)?,
            });
        }
        Ok(Self { rules })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Operand of an arithmetic derivation: a column reference or a literal.
///
/// In TOML a bare number is a constant and a string names a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Constant(f64),
    Field(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => write!(f, "{value}"),
            Self::Field(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    fn parse(op: &str) -> Option<Self> {
        match op.trim().to_ascii_lowercase().as_str() {
            "add" | "+" => Some(Self::Add),
            "subtract" | "-" => Some(Self::Subtract),
            "multiply" | "*" => Some(Self::Multiply),
            "divide" | "/" => Some(Self::Divide),
            _ => None,
        }
    }

    /// Applies the operation; division by zero yields `None`.
    pub fn apply(self, left: f64, right: f64) -> Option<f64> {
        let value = match self {
            Self::Add => left + right,
            Self::Subtract => left - right,
            Self::Multiply => left * right,
            Self::Divide => {
                if right == 0.0 {
                    return None;
                }
                left / right
            }
        };
        value.is_finite().then_some(value)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }
}

/// How a `derived` column is computed from the other fields of its row.
#[derive(Debug, Clone, PartialEq)]
pub enum Derivation {
    Concat {
        fields: Vec<String>,
        separator: String,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: Operand,
        right: Operand,
    },
}

impl Derivation {
    /// Columns the derivation reads.
    pub fn inputs(&self) -> Vec<&str> {
        match self {
            Self::Concat { fields, .. } => fields.iter().map(String::as_str).collect(),
            Self::Arithmetic { left, right, .. } => [left, right]
                .into_iter()
                .filter_map(|operand| match operand {
                    Operand::Field(name) => Some(name.as_str()),
                    Operand::Constant(_) => None,
                })
                .collect(),
        }
    }
}

impl fmt::Display for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concat { fields, separator } => {
                write!(f, "concat({}; sep={separator:?})", fields.join(", "))
            }
            Self::Arithmetic { op, left, right } => {
                write!(f, "{left} {} {right}", op.symbol())
            }
        }
    }
}

/// Raw transformation entry as written in a pipeline file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformDescriptor {
    pub field: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// chrono format string for `date`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Operation for `derived`: concat, add, subtract, multiply, divide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Operand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Operand>,
}

impl TransformDescriptor {
    pub fn new(field: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: kind.into(),
            format: None,
            op: None,
            fields: Vec::new(),
            separator: None,
            left: None,
            right: None,
        }
    }
}

/// A compiled transformation.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformRule {
    Uppercase,
    Lowercase,
    Strip,
    Date { format: Option<String> },
    Derived(Derivation),
}

impl TransformRule {
    pub fn compile(descriptor: &TransformDescriptor) -> Result<Self, RuleError> {
        let field = descriptor.field.trim();
        if field.is_empty() {
            return Err(RuleError::EmptyField);
        }
        let kind = descriptor.kind.trim().to_ascii_lowercase();
        match kind.as_str() {
            "uppercase" => Ok(Self::Uppercase),
            "lowercase" => Ok(Self::Lowercase),
            "strip" => Ok(Self::Strip),
            "date" => Ok(Self::Date {
                format: descriptor.format.clone(),
            }),
            "derived" => compile_derivation(field, descriptor).map(Self::Derived),
            _ => Err(RuleError::UnknownKind {
                table: "transform",
                field: field.to_string(),
                kind: descriptor.kind.clone(),
            }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Uppercase => "uppercase",
            Self::Lowercase => "lowercase",
            Self::Strip => "strip",
            Self::Date { .. } => "date",
            Self::Derived(_) => "derived",
        }
    }
}

fn compile_derivation(field: &str, descriptor: &TransformDescriptor) -> Result<Derivation, RuleError> {
    let missing = |parameter: &'static str| RuleError::MissingParameter {
        field: field.to_string(),
        kind: "derived".to_string(),
        parameter,
    };
    let op = descriptor.op.as_deref().ok_or_else(|| missing("op"))?;
    if op.trim().eq_ignore_ascii_case("concat") {
        if descriptor.fields.is_empty() {
            return Err(missing("fields"));
        }
        return Ok(Derivation::Concat {
            fields: descriptor.fields.clone(),
            separator: descriptor.separator.clone().unwrap_or_default(),
        });
    }
    let Some(op) = ArithmeticOp::parse(op) else {
        return Err(RuleError::UnknownOperation {
            field: field.to_string(),
            op: op.to_string(),
        });
    };
    let left = descriptor.left.clone().ok_or_else(|| missing("left"))?;
    let right = descriptor.right.clone().ok_or_else(|| missing("right"))?;
    Ok(Derivation::Arithmetic { op, left, right })
}

/// A compiled transformation bound to its target field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTransform {
    pub field: String,
    pub rule: TransformRule,
}

/// Compiles a transformation table, preserving declaration order.
pub fn compile_transforms(
    descriptors: &[TransformDescriptor],
) -> Result<Vec<FieldTransform>, RuleError> {
    descriptors
        .iter()
        .map(|descriptor| {
            Ok(FieldTransform {
                field: descriptor.field.trim().to_string(),
                rule: TransformRule::compile(descriptor)?,
            })
        })
        .collect()
}
