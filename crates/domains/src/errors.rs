//! # DomainError
//!
//! Centralized error handling for the threadline ecosystem.
//! Maps domain-specific failures to actionable error kinds; the HTTP layer
//! turns each kind into a status code.

use thiserror::Error;

/// The primary error type for every port and service operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Bad input, expired window or wrong state (e.g. editing a deleted comment)
    #[error("validation error: {0}")]
    Validation(String),

    /// Non-owner mutation attempt
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (e.g. Comment, Notification, User)
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// Missing or invalid credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Resource already exists, or a guarded write lost a race
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g. DB down, Redis timeout)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound(entity, id.to_string())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Wraps any adapter failure; the source is flattened to its message.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(..) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(err)
    }
}

/// A specialized Result type for threadline logic.
pub type Result<T> = std::result::Result<T, DomainError>;
