//! Error types for scene planning.

use thiserror::Error;

/// Result type for planning operations.
pub type PlanResult<T> = Result<T, PlanError>;

/// Errors that can occur while planning a tour.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlanError {
    #[error("Insufficient input: {0}")]
    InsufficientInput(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

impl PlanError {
    pub fn insufficient_input(message: impl Into<String>) -> Self {
        Self::InsufficientInput(message.into())
    }

    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::InvalidParameters(message.into())
    }
}
