//! Filter error type
//!
//! Translation itself never fails; these errors come from loading entity
//! definitions and decoding programmatic input.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    /// Entity definition rejected at load time
    #[error("Invalid filter definition for '{field}': {reason}")]
    InvalidDefinition { field: String, reason: String },

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Unknown sort direction: {0}")]
    UnknownDirection(String),

    #[error("Unknown SQL dialect: {0}")]
    UnknownDialect(String),

    /// Malformed JSON definition or filter input
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FilterError {
    pub fn invalid_definition(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
