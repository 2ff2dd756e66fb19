use std::fmt::Display;

use thiserror::Error;

/// Single error type returned by every lifecycle operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("invalid transition: cannot {action} {entity} in state {from}")]
    InvalidTransition { entity: &'static str, from: String, action: &'static str },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("transient store error: {0}")]
    Transient(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn invalid_transition(entity: &'static str, from: impl Display, action: &'static str) -> Self {
        Self::InvalidTransition { entity, from: from.to_string(), action }
    }

    /// Only transient failures are worth retrying.
    pub fn is_transient(&self) -> bool { matches!(self, ServiceError::Transient(_)) }

    /// Stable machine-readable kind for external mapping
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation",
            ServiceError::Model(models::errors::ModelError::Validation(_)) => "validation",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Unauthorized(_) => "unauthorized",
            ServiceError::InvalidTransition { .. } => "invalid_transition",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Transient(_) => "transient",
            ServiceError::Db(_) | ServiceError::Model(_) => "storage",
        }
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self.kind() {
            "validation" => 2001,
            "not_found" => 2002,
            "unauthorized" => 2003,
            "invalid_transition" => 2004,
            "conflict" => 2005,
            "transient" => 2101,
            _ => 2200,
        }
    }
}
