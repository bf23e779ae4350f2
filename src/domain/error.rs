use thiserror::Error;

use super::user::{UserId, ValidationErrors};

/// Core domain errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("Username '{username}' is already taken")]
    DuplicateUsername { username: String },

    #[error("User with id={id} not found")]
    NotFound { id: UserId },

    #[error("Validation failed: {0}")]
    ValidationFailed(ValidationErrors),

    #[error("Cannot patch user with id={id}: user does not exist")]
    InvalidPatchTarget { id: UserId },

    #[error("Invalid patch: {message}")]
    InvalidPatch { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn duplicate_username(username: impl Into<String>) -> Self {
        Self::DuplicateUsername {
            username: username.into(),
        }
    }

    pub fn not_found(id: UserId) -> Self {
        Self::NotFound { id }
    }

    pub fn invalid_patch(message: impl Into<String>) -> Self {
        Self::InvalidPatch {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        Self::ValidationFailed(errors)
    }
}
