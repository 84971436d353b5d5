//! Business-level error types
//!
//! These are framework-agnostic; the API layer maps them to HTTP
//! responses.

use std::fmt;

#[derive(Debug)]
pub enum ServiceError {
    /// Resource not found (or not visible to the caller)
    NotFound,
    /// Validation error with message
    Validation(String),
    /// Rejected status change
    InvalidTransition { from: String, to: String },
    /// Constraint violation mapped to a user-facing message
    Conflict(String),
    /// Caller is not allowed to perform the operation
    Forbidden,
    /// Database/persistence error
    Database(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::NotFound => write!(f, "Resource not found"),
            ServiceError::Validation(msg) => write!(f, "{}", msg),
            ServiceError::InvalidTransition { from, to } => {
                write!(f, "Illegal status transition from '{}' to '{}'", from, to)
            }
            ServiceError::Conflict(msg) => write!(f, "{}", msg),
            ServiceError::Forbidden => write!(f, "Not allowed"),
            ServiceError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self {
        ServiceError::Database(e.to_string())
    }
}
