use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use uuid::Uuid;

use super::common::{
    created_response, no_content_response, success_response, validate_input, PaginationParams,
};
use crate::errors::{ApiError, ServiceError};
use crate::services::users::{ChangePasswordRequest, CreateUserRequest, UpdateUserRequest};
use crate::{auth::AuthenticatedUser, AppState};

/// Create a new user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let user = state.services.users.create_user(payload).await?;
    Ok(created_response(user))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/:id",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User returned"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .services
        .users
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {id} not found")))?;
    Ok(success_response(user))
}

/// List users with pagination
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses((status = 200, description = "Users listed")),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let per_page = state.config.clamp_page_size(pagination.per_page);
    let response = state
        .services
        .users
        .list_users(pagination.page.max(1), per_page)
        .await?;
    Ok(success_response(response))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/api/v1/users/:id",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let user = state.services.users.update_user(id, payload).await?;
    Ok(success_response(user))
}

/// Deactivate a user account
#[utoipa::path(
    delete,
    path = "/api/v1/users/:id",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deactivated"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn deactivate_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.users.deactivate_user(id).await?;
    Ok(no_content_response())
}

/// Change a user's password (self-service, or admin)
#[utoipa::path(
    post,
    path = "/api/v1/users/:id/change-password",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 401, description = "Current password incorrect", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn change_password(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    if current_user.user_id != id.to_string() && !current_user.is_admin() {
        return Err(ApiError::ServiceError(ServiceError::Forbidden(
            "You can only change your own password".to_string(),
        )));
    }

    state.services.users.change_password(id, payload).await?;
    Ok(success_response(
        serde_json::json!({ "message": "Password changed successfully" }),
    ))
}

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/api/v1/users/profile",
    responses(
        (status = 200, description = "Current user"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let id = current_user
        .id()
        .map_err(|_| ApiError::Unauthorized)?;
    let user = state
        .services
        .users
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(success_response(user))
}

/// Admin-only user management endpoints
pub fn manage_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
        .route("/users/:id", put(update_user))
        .route("/users/:id", delete(deactivate_user))
}

/// Endpoints any authenticated user may reach for their own account
pub fn self_service_routes() -> Router<AppState> {
    Router::new()
        .route("/users/profile", get(get_current_user))
        .route("/users/:id/change-password", post(change_password))
}
