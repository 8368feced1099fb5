//! # AppError
//!
//! Centralized error handling for Postmortem.
//! Store read failures never reach this type: they are masked as empty
//! collections inside the store itself.

use thiserror::Error;

/// The primary error type for all pm-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Story, Comment)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., empty comment, short password, taken username)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Bad credentials or missing session
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g., a collection could not be written)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn not_found(kind: impl ToString, id: &str) -> Self {
        AppError::NotFound(kind.to_string(), id.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}

/// A specialized Result type for Postmortem logic.
pub type Result<T> = std::result::Result<T, AppError>;
