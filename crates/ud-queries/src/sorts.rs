//! Listing sort order
//!
//! The API takes a single `order_by` parameter: the field name, prefixed with
//! `-` for descending order.

use serde::{Deserialize, Serialize};
use ud_core::ContractError;

use crate::catalog::{fields, user_catalog, FieldCatalog, FieldDescriptor};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order (A-Z, 1-9, oldest first)
    Asc,
    /// Descending order (Z-A, 9-1, newest first)
    #[default]
    Desc,
}

impl SortDirection {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Get the opposite direction
    pub fn reverse(&self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Sort field and direction.
///
/// The field is always a sortable field of the user catalog: every
/// constructor and deserialization checks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSortSpec")]
pub struct SortSpec {
    field: String,
    direction: SortDirection,
}

#[derive(Deserialize)]
struct RawSortSpec {
    field: String,
    direction: SortDirection,
}

impl TryFrom<RawSortSpec> for SortSpec {
    type Error = ContractError;

    fn try_from(raw: RawSortSpec) -> Result<Self, Self::Error> {
        Self::new(raw.field, raw.direction)
    }
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Result<Self, ContractError> {
        let field = field.into();
        check_sortable(user_catalog(), &field)?;
        Ok(Self { field, direction })
    }

    pub fn asc(field: impl Into<String>) -> Result<Self, ContractError> {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Result<Self, ContractError> {
        Self::new(field, SortDirection::Desc)
    }

    /// Parse an `order_by` value; a leading `-` means descending
    pub fn parse(raw: &str) -> Result<Self, ContractError> {
        let raw = raw.trim();
        match raw.strip_prefix('-') {
            Some(rest) => Self::desc(rest),
            None => Self::asc(raw),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// The `order_by` parameter value
    pub fn to_param(&self) -> String {
        match self.direction {
            SortDirection::Asc => self.field.clone(),
            SortDirection::Desc => format!("-{}", self.field),
        }
    }

    /// Catalog entry of the sort field
    pub fn descriptor(&self) -> Option<&'static FieldDescriptor> {
        user_catalog().lookup(&self.field)
    }

    /// Reverse the sort direction
    pub fn toggled(mut self) -> Self {
        self.direction = self.direction.reverse();
        self
    }
}

fn check_sortable<'c>(
    catalog: &'c FieldCatalog,
    field: &str,
) -> Result<&'c FieldDescriptor, ContractError> {
    let descriptor = catalog
        .lookup(field)
        .ok_or_else(|| ContractError::UnknownField {
            field: field.to_string(),
        })?;
    if !descriptor.sortable {
        return Err(ContractError::NotSortable {
            field: field.to_string(),
        });
    }
    Ok(descriptor)
}

impl Default for SortSpec {
    /// Newest users first
    fn default() -> Self {
        Self {
            field: fields::COUNTER.to_string(),
            direction: SortDirection::Desc,
        }
    }
}

/// Fields offered by the sort picker
pub fn sortable_fields() -> Vec<&'static FieldDescriptor> {
    user_catalog().sortable()
}
