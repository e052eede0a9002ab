//! Filter rules
//!
//! A [`FilterRule`] is one criterion on one catalog field. Rules live in a
//! [`RuleSet`], keyed by field name: at most one rule per field is active, and
//! every rule in a set has been checked against the catalog and the operator
//! resolver. The encoder only ever sees validated rule sets.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ud_core::ContractError;

use crate::catalog::{user_catalog, FieldCatalog, FieldDescriptor, SemanticType};
use crate::operators::{ensure_allowed, Operator};

/// A rule value: JSON boolean, number, or text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl FilterValue {
    /// Whether the value counts as provided.
    ///
    /// Only the empty string is "no value"; `0` and `false` are real values.
    pub fn is_provided(&self) -> bool {
        !matches!(self, Self::Text(s) if s.is_empty())
    }

    pub fn from_f64(value: f64) -> Option<Self> {
        serde_json::Number::from_f64(value).map(Self::Number)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for FilterValue {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// The provided part of an optional value
pub(crate) fn provided(value: &Option<FilterValue>) -> Option<&FilterValue> {
    value.as_ref().filter(|v| v.is_provided())
}

/// A single filter criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRule {
    /// Catalog field name
    pub field: String,
    pub operator: Operator,
    /// The value, or the lower bound for `between`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FilterValue>,
    /// Upper bound for `between`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_to: Option<FilterValue>,
}

impl FilterRule {
    /// Create a rule without values
    pub fn new(field: impl Into<String>, operator: Operator) -> Self {
        Self {
            field: field.into(),
            operator,
            value: None,
            value_to: None,
        }
    }

    /// Set the value
    pub fn value(mut self, value: impl Into<FilterValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the upper bound
    pub fn value_to(mut self, value: impl Into<FilterValue>) -> Self {
        self.value_to = Some(value.into());
        self
    }

    pub fn equals(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, Operator::Equals).value(value)
    }

    pub fn contains(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, Operator::Contains).value(value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, Operator::Gt).value(value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, Operator::Lt).value(value)
    }

    pub fn between(
        field: impl Into<String>,
        from: impl Into<FilterValue>,
        to: impl Into<FilterValue>,
    ) -> Self {
        Self::new(field, Operator::Between).value(from).value_to(to)
    }

    pub fn is_empty(field: impl Into<String>) -> Self {
        Self::new(field, Operator::IsEmpty)
    }

    pub fn is_full(field: impl Into<String>) -> Self {
        Self::new(field, Operator::IsFull)
    }

    /// Starting rule when a field is added to the builder.
    ///
    /// Temporal fields start at `gt now`, range numbers at `gt 0`, booleans at
    /// `equals true`; everything else starts as an `equals` with no value.
    pub fn initial_for(field: &FieldDescriptor, now: DateTime<Utc>) -> Self {
        match field.semantic_type {
            SemanticType::Unix => Self::gt(field.name, now.timestamp()),
            SemanticType::Datetime => Self::gt(
                field.name,
                now.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            SemanticType::RangeNumber => Self::gt(field.name, 0),
            SemanticType::Boolean => Self::equals(field.name, true),
            SemanticType::Counter | SemanticType::IdNumber | SemanticType::Text => {
                Self::new(field.name, Operator::Equals)
            }
        }
    }

    /// Switch operator, keeping the entered values.
    ///
    /// Selecting `between` without an upper bound starts it at `value`.
    pub fn with_operator(mut self, operator: Operator) -> Self {
        if operator == Operator::Between && provided(&self.value_to).is_none() {
            self.value_to = self.value.clone();
        }
        self.operator = operator;
        self
    }

    /// Check the rule against a catalog and the operator resolver
    pub fn validate<'c>(
        &self,
        catalog: &'c FieldCatalog,
    ) -> Result<&'c FieldDescriptor, ContractError> {
        let descriptor = catalog
            .lookup(&self.field)
            .ok_or_else(|| ContractError::UnknownField {
                field: self.field.clone(),
            })?;
        if !descriptor.filterable {
            return Err(ContractError::NotFilterable {
                field: self.field.clone(),
            });
        }
        ensure_allowed(descriptor, self.operator)?;
        Ok(descriptor)
    }
}

/// Type-appropriate coercion of raw input text.
///
/// Returns `None` when the input carries no usable value. Opaque identifiers
/// that are not numeric are kept as text.
pub fn coerce_input(semantic_type: SemanticType, raw: &str) -> Option<FilterValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match semantic_type {
        SemanticType::Text => Some(FilterValue::Text(raw.to_string())),
        SemanticType::Boolean => match trimmed.to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(FilterValue::Bool(true)),
            "false" | "0" | "no" => Some(FilterValue::Bool(false)),
            _ => None,
        },
        SemanticType::Counter | SemanticType::RangeNumber => parse_number(trimmed),
        SemanticType::IdNumber => {
            parse_number(trimmed).or_else(|| Some(FilterValue::Text(trimmed.to_string())))
        }
        SemanticType::Unix => parse_number(trimmed).or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| FilterValue::from(dt.timestamp()))
        }),
        SemanticType::Datetime => DateTime::parse_from_rfc3339(trimmed).ok().map(|dt| {
            FilterValue::Text(
                dt.with_timezone(&Utc)
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            )
        }),
    }
}

fn parse_number(raw: &str) -> Option<FilterValue> {
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n.into());
    }
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(FilterValue::from_f64)
}

/// Ordered rules, at most one per field, each valid for the user catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FilterRule>", into = "Vec<FilterRule>")]
pub struct RuleSet {
    rules: Vec<FilterRule>,
}

impl RuleSet {
    /// Create a new empty rule set
    pub fn new() -> Self {
        Self { rules: vec![] }
    }

    /// Build a rule set, rejecting the first invalid or duplicate rule
    pub fn from_rules(rules: impl IntoIterator<Item = FilterRule>) -> Result<Self, ContractError> {
        let mut set = Self::new();
        for rule in rules {
            set.insert(rule)?;
        }
        Ok(set)
    }

    /// Rules built inside this crate from known-good parts
    pub(crate) fn from_trusted(rules: Vec<FilterRule>) -> Self {
        debug_assert!(Self::from_rules(rules.clone()).is_ok());
        Self { rules }
    }

    /// Add a rule; a second rule for the same field is rejected
    pub fn insert(&mut self, rule: FilterRule) -> Result<&mut Self, ContractError> {
        rule.validate(user_catalog())?;
        if self.contains(&rule.field) {
            return Err(ContractError::DuplicateField { field: rule.field });
        }
        self.rules.push(rule);
        Ok(self)
    }

    /// Add a rule and return self (builder pattern)
    pub fn with(mut self, rule: FilterRule) -> Result<Self, ContractError> {
        self.insert(rule)?;
        Ok(self)
    }

    /// Swap the active rule for `rule.field`, keeping its position
    pub fn replace(&mut self, rule: FilterRule) -> Result<FilterRule, ContractError> {
        rule.validate(user_catalog())?;
        let slot = self
            .rules
            .iter_mut()
            .find(|r| r.field == rule.field)
            .ok_or_else(|| ContractError::MissingRule {
                field: rule.field.clone(),
            })?;
        Ok(std::mem::replace(slot, rule))
    }

    /// Change the operator of the rule for `field`
    pub fn set_operator(&mut self, field: &str, operator: Operator) -> Result<(), ContractError> {
        let rule = self.require(field)?.clone().with_operator(operator);
        self.replace(rule)?;
        Ok(())
    }

    /// Change the value (lower bound) of the rule for `field`
    pub fn set_value(&mut self, field: &str, value: Option<FilterValue>) -> Result<(), ContractError> {
        self.require_mut(field)?.value = value;
        Ok(())
    }

    /// Change the upper bound of the rule for `field`
    pub fn set_value_to(
        &mut self,
        field: &str,
        value: Option<FilterValue>,
    ) -> Result<(), ContractError> {
        self.require_mut(field)?.value_to = value;
        Ok(())
    }

    /// Remove the rule for a field
    pub fn remove(&mut self, field: &str) -> Option<FilterRule> {
        let position = self.rules.iter().position(|r| r.field == field)?;
        Some(self.rules.remove(position))
    }

    /// Get the rule for a field
    pub fn get(&self, field: &str) -> Option<&FilterRule> {
        self.rules.iter().find(|r| r.field == field)
    }

    /// Check if a field has an active rule
    pub fn contains(&self, field: &str) -> bool {
        self.rules.iter().any(|r| r.field == field)
    }

    /// Filterable fields that have no rule yet
    pub fn available_fields(&self) -> Vec<&'static FieldDescriptor> {
        user_catalog()
            .list(|f| f.filterable && !self.contains(f.name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterRule> {
        self.rules.iter()
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    fn require(&self, field: &str) -> Result<&FilterRule, ContractError> {
        self.get(field).ok_or_else(|| ContractError::MissingRule {
            field: field.to_string(),
        })
    }

    fn require_mut(&mut self, field: &str) -> Result<&mut FilterRule, ContractError> {
        self.rules
            .iter_mut()
            .find(|r| r.field == field)
            .ok_or_else(|| ContractError::MissingRule {
                field: field.to_string(),
            })
    }
}

impl TryFrom<Vec<FilterRule>> for RuleSet {
    type Error = ContractError;

    fn try_from(rules: Vec<FilterRule>) -> Result<Self, Self::Error> {
        Self::from_rules(rules)
    }
}

impl From<RuleSet> for Vec<FilterRule> {
    fn from(set: RuleSet) -> Self {
        set.rules
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a FilterRule;
    type IntoIter = std::slice::Iter<'a, FilterRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
