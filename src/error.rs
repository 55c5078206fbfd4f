//! Error types for the underwriting engine

use thiserror::Error;

use crate::ports::{IdentityError, LedgerError};

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Main error type for engine operations
///
/// Business-rule refusals (score too low, amount too large, disbursement
/// guard unmet) are not errors; they come back as outcome values.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed input rejected before any state change
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown farmer, application, loan, policy or derivative
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Operation not allowed from the record's current status
    #[error("{kind} {id} is {actual}, expected {expected}")]
    InvalidState {
        kind: &'static str,
        id: String,
        actual: String,
        expected: String,
    },

    /// Fund movement failed; the enclosing operation persisted nothing
    #[error("fund transfer failed: {0}")]
    Transfer(#[from] LedgerError),

    /// Identity resolution or credential verification failed
    #[error("identity check failed: {0}")]
    Identity(#[from] IdentityError),

    /// Configuration rejected by validation
    #[error("invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        EngineError::NotFound { kind, id: id.into() }
    }

    pub fn invalid_state(
        kind: &'static str,
        id: impl Into<String>,
        actual: impl std::fmt::Debug,
        expected: impl std::fmt::Debug,
    ) -> Self {
        EngineError::InvalidState {
            kind,
            id: id.into(),
            actual: format!("{:?}", actual),
            expected: format!("{:?}", expected),
        }
    }
}
