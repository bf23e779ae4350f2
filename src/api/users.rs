//! User resource endpoints

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiErrorResponse, Json};
use crate::domain::{PatchDocument, User, UserId, UserRequest};

pub const USERS_PATH: &str = "/api/users";

/// User representation returned to clients; the password is never included
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(value_type = u64, example = 1)]
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[schema(value_type = Option<String>, format = Date, example = "1990-05-12")]
    pub date_of_birth: Option<NaiveDate>,
    pub quantity: i32,
    pub price: String,
    pub amount: f64,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            username: user.username().to_string(),
            email: user.email().to_string(),
            date_of_birth: user.date_of_birth(),
            quantity: user.quantity(),
            price: user.price().to_string(),
            amount: user.amount(),
        }
    }
}

/// Create the `/api/users` router
pub fn create_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(replace_user).patch(patch_user))
}

fn parse_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse::<u64>().map(UserId::new).map_err(|_| {
        ApiError::bad_request(format!("Invalid user id '{}'", raw)).with_code("invalid_id")
    })
}

/// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "All users in insertion order", body = Vec<UserResponse>),
        (status = 500, description = "Unexpected failure", body = ApiErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    debug!("Listing users");

    let users = state.user_service.list().await.map_err(ApiError::from)?;

    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// GET /api/users/{id}
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "No user with this id", body = ApiErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_id(&id)?;
    debug!(%id, "Getting user");

    let user = state
        .user_service
        .get(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| {
            warn!(%id, "User not found");
            ApiError::not_found(format!("User with id={} not found", id)).with_code("user_not_found")
        })?;

    Ok(Json(UserResponse::from(&user)))
}

/// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = UserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse,
            headers(("location" = String, description = "URL of the new user"))),
        (status = 400, description = "Validation failed or username taken", body = ApiErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<UserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    debug!(username = %request.username, "Creating user");

    let user = state
        .user_service
        .create(request)
        .await
        .map_err(ApiError::from)?;

    let location = format!("{}/{}", USERS_PATH, user.id());

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(UserResponse::from(&user)),
    ))
}

/// PUT /api/users/{id}
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = u64, Path, description = "User id")),
    request_body = UserRequest,
    responses(
        (status = 200, description = "User replaced", body = UserResponse),
        (status = 400, description = "Validation failed or username taken", body = ApiErrorResponse),
        (status = 404, description = "No user with this id", body = ApiErrorResponse)
    )
)]
pub async fn replace_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_id(&id)?;
    debug!(%id, username = %request.username, "Replacing user");

    let user = state
        .user_service
        .replace(id, request)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(UserResponse::from(&user)))
}

/// PATCH /api/users/{id}
///
/// The whole document must apply and the fields it touches must validate
/// before anything is stored.
#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = u64, Path, description = "User id")),
    request_body(content = PatchDocument, content_type = "application/json-patch+json"),
    responses(
        (status = 200, description = "User patched", body = UserResponse),
        (status = 400, description = "Invalid patch, validation failed or username taken", body = ApiErrorResponse),
        (status = 404, description = "No user with this id", body = ApiErrorResponse)
    )
)]
pub async fn patch_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    document: Result<Json<PatchDocument>, ApiError>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_id(&id)?;

    let document = match document {
        Ok(Json(document)) if !document.is_empty() => document,
        Ok(_) => {
            warn!(%id, "Empty patch document");
            return Err(ApiError::invalid_patch_document());
        }
        Err(err) => {
            warn!(%id, error = %err, "Unreadable patch document");
            return Err(ApiError::invalid_patch_document());
        }
    };

    debug!(%id, operations = document.operations().len(), "Patching user");

    let user = state
        .user_service
        .patch_validated(id, document)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(UserResponse::from(&user)))
}
