//! Core error types for Userdesk
//!
//! Covers the three failure families of the dashboard: rule contract
//! violations (caught before any request is built), local validation of
//! edit forms, and categorized transport/backend failures.

use std::collections::BTreeMap;
use thiserror::Error;

/// Standard Result type for Userdesk operations
pub type UdResult<T> = Result<T, UdError>;

/// Core error type for all Userdesk operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UdError {
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Unprocessable input: {message}")]
    Unprocessable { message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Contract violation: {0}")]
    Contract(#[from] ContractError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Violations of the rule/sort contract.
///
/// These are caller errors: the builder must only offer catalog fields and the
/// operators the resolver lists for them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("Unknown field '{field}'")]
    UnknownField { field: String },

    #[error("Field '{field}' is not filterable")]
    NotFilterable { field: String },

    #[error("Field '{field}' is not sortable")]
    NotSortable { field: String },

    #[error("Operator '{operator}' is not allowed for field '{field}' of type '{semantic_type}'")]
    IllegalOperator {
        field: String,
        operator: String,
        semantic_type: String,
    },

    #[error("A rule for field '{field}' is already active")]
    DuplicateField { field: String },

    #[error("No active rule for field '{field}'")]
    MissingRule { field: String },
}

/// Validation errors collection
#[derive(Error, Debug, Default, Clone, PartialEq)]
#[error("Validation errors: {errors:?}")]
pub struct ValidationErrors {
    /// Field-specific errors: field_name -> messages
    pub errors: BTreeMap<String, Vec<String>>,
    /// Base errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    /// Check if there are errors for a specific field
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Get errors for a specific field
    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        for (field, field_messages) in &self.errors {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }
}

impl UdError {
    /// Categorize a non-2xx response from the users API.
    ///
    /// `message` is the server-provided `error.message`, when there is one.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            401 => UdError::Unauthorized {
                message: message.unwrap_or_else(|| "authentication required".into()),
            },
            403 => UdError::Forbidden {
                message: message.unwrap_or_else(|| "access to this resource is denied".into()),
            },
            404 => UdError::NotFound {
                message: message.unwrap_or_else(|| "resource not found".into()),
            },
            422 => UdError::Unprocessable {
                message: message.unwrap_or_else(|| "invalid input".into()),
            },
            s if s >= 500 => UdError::Server {
                status: s,
                message: message.unwrap_or_else(|| "please try again".into()),
            },
            s => UdError::UnexpectedStatus {
                status: s,
                message: message.unwrap_or_default(),
            },
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            UdError::Unauthorized { .. } => 401,
            UdError::Forbidden { .. } => 403,
            UdError::NotFound { .. } => 404,
            UdError::Unprocessable { .. } => 422,
            UdError::Validation(_) | UdError::Contract(_) => 422,
            UdError::Server { status, .. } | UdError::UnexpectedStatus { status, .. } => *status,
            UdError::Transport(_) | UdError::Decode(_) => 502,
            UdError::Config(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            UdError::Unauthorized { .. } => "unauthorized",
            UdError::Forbidden { .. } => "forbidden",
            UdError::NotFound { .. } => "not_found",
            UdError::Unprocessable { .. } => "unprocessable",
            UdError::Server { .. } => "server_error",
            UdError::UnexpectedStatus { .. } => "unexpected_status",
            UdError::Validation(_) => "validation_failed",
            UdError::Contract(_) => "contract_violated",
            UdError::Transport(_) => "transport_error",
            UdError::Decode(_) => "decode_error",
            UdError::Config(_) => "configuration_error",
        }
    }

    /// The stored credential is no longer valid and the operator must log in again.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, UdError::Unauthorized { .. })
    }

    /// Backend refusals that are shown to the operator as a notification.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            UdError::Forbidden { .. }
                | UdError::NotFound { .. }
                | UdError::Unprocessable { .. }
                | UdError::Server { .. }
        )
    }
}
