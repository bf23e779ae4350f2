//! API error envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::domain::{DomainError, ValidationErrors};

pub const DUPLICATE_USERNAME_MESSAGE: &str = "There is already a user with username.";
pub const INVALID_PATCH_DOCUMENT_MESSAGE: &str = "Invalid patch document.";
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong. Please try again later.";

/// Error categories exposed to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    ValidationError,
    NotFoundError,
    ServerError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestError => write!(f, "invalid_request_error"),
            Self::ValidationError => write!(f, "validation_error"),
            Self::NotFoundError => write!(f, "not_found_error"),
            Self::ServerError => write!(f, "server_error"),
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Per-field validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub fields: Option<ValidationErrors>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error_type: ApiErrorType, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                    code: None,
                    fields: None,
                },
            },
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.response.error.code = Some(code.into());
        self
    }

    pub fn with_fields(mut self, fields: ValidationErrors) -> Self {
        self.response.error.fields = Some(fields);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiErrorType::InvalidRequestError, message)
    }

    /// Validation failure carrying every field message
    pub fn validation(fields: ValidationErrors) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ApiErrorType::ValidationError,
            "One or more validation errors occurred.",
        )
        .with_code("validation_failed")
        .with_fields(fields)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiErrorType::NotFoundError, message)
    }

    /// Empty or unusable patch document
    pub fn invalid_patch_document() -> Self {
        Self::bad_request(INVALID_PATCH_DOCUMENT_MESSAGE).with_code("invalid_patch")
    }

    /// Internal server error; the cause is logged, never returned
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorType::ServerError,
            INTERNAL_ERROR_MESSAGE,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::DuplicateUsername { .. } => {
                Self::bad_request(DUPLICATE_USERNAME_MESSAGE).with_code("duplicate_username")
            }
            DomainError::NotFound { id } | DomainError::InvalidPatchTarget { id } => {
                Self::not_found(format!("User with id={} not found", id)).with_code("user_not_found")
            }
            DomainError::ValidationFailed(fields) => Self::validation(fields),
            DomainError::InvalidPatch { message } => {
                Self::bad_request(message).with_code("invalid_patch")
            }
            DomainError::Internal { message } => {
                error!(error = %message, "Internal error while handling request");
                Self::internal()
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.error_type, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}
