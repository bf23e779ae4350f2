//! OpenAPI document for the HTTP API

use axum::Json;
use utoipa::OpenApi;

use super::health::{self, HealthResponse, HealthStatus};
use super::types::error::{ApiErrorDetail, ApiErrorResponse, ApiErrorType};
use super::users::{self, UserResponse};
use crate::domain::{PatchDocument, PatchOperation, PatchOperationKind, UserId, UserRequest};

pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(title = "User Lifecycle API", description = "Create, replace, patch and read user records"),
    paths(
        users::list_users,
        users::get_user,
        users::create_user,
        users::replace_user,
        users::patch_user,
        health::health_check,
    ),
    components(schemas(
        UserId,
        UserRequest,
        UserResponse,
        PatchDocument,
        PatchOperation,
        PatchOperationKind,
        ApiErrorResponse,
        ApiErrorDetail,
        ApiErrorType,
        HealthResponse,
        HealthStatus,
    )),
    tags(
        (name = "users", description = "User lifecycle endpoints"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

/// GET /api-docs/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
