//! Filter operators
//!
//! The operator list for a semantic type is the only gate between the rule
//! builder and the encoder: it populates the operator picker and validates
//! every rule before it is accepted into a [`crate::RuleSet`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ud_core::ContractError;

use crate::catalog::{FieldDescriptor, SemanticType};

/// Filter operators that can be applied to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Exact match
    Equals,
    /// Partial text match
    Contains,
    /// Greater than (sent as the lower bound)
    Gt,
    /// Less than (sent as the upper bound)
    Lt,
    /// Between `value` and `value_to`
    Between,
    /// Field has no value
    IsEmpty,
    /// Field has a value
    IsFull,
}

/// Number of value inputs an operator takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    None,
    One,
    Two,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Contains => "contains",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Between => "between",
            Self::IsEmpty => "is_empty",
            Self::IsFull => "is_full",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Self::IsEmpty | Self::IsFull => Arity::None,
            Self::Between => Arity::Two,
            Self::Equals | Self::Contains | Self::Gt | Self::Lt => Arity::One,
        }
    }

    /// `is_empty` / `is_full`
    pub fn is_null_check(&self) -> bool {
        self.arity() == Arity::None
    }

    /// `gt` / `lt` / `between`
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Gt | Self::Lt | Self::Between)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equals" => Ok(Self::Equals),
            "contains" => Ok(Self::Contains),
            "gt" => Ok(Self::Gt),
            "lt" => Ok(Self::Lt),
            "between" => Ok(Self::Between),
            "is_empty" => Ok(Self::IsEmpty),
            "is_full" => Ok(Self::IsFull),
            other => Err(format!("unknown operator '{}'", other)),
        }
    }
}

const EQUALS_ONLY: &[Operator] = &[Operator::Equals];
const ID_OPERATORS: &[Operator] = &[Operator::Equals, Operator::IsEmpty, Operator::IsFull];
const TEXT_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::Contains,
    Operator::IsEmpty,
    Operator::IsFull,
];
const RANGE_OPERATORS: &[Operator] = &[
    Operator::Gt,
    Operator::Lt,
    Operator::Between,
    Operator::IsEmpty,
    Operator::IsFull,
];

/// Legal operators for a semantic type, in picker order
pub fn operators_for(semantic_type: SemanticType) -> &'static [Operator] {
    match semantic_type {
        SemanticType::Counter | SemanticType::Boolean => EQUALS_ONLY,
        SemanticType::IdNumber => ID_OPERATORS,
        SemanticType::Text => TEXT_OPERATORS,
        SemanticType::RangeNumber | SemanticType::Unix | SemanticType::Datetime => RANGE_OPERATORS,
    }
}

/// Reject an operator the field's type does not allow
pub fn ensure_allowed(field: &FieldDescriptor, operator: Operator) -> Result<(), ContractError> {
    if operators_for(field.semantic_type).contains(&operator) {
        Ok(())
    } else {
        Err(ContractError::IllegalOperator {
            field: field.name.to_string(),
            operator: operator.to_string(),
            semantic_type: field.semantic_type.to_string(),
        })
    }
}
