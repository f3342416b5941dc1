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
use crate::errors::ApiError;
use crate::services::business_units::{CreateBusinessUnitRequest, UpdateBusinessUnitRequest};
use crate::AppState;

/// Create a business unit
#[utoipa::path(
    post,
    path = "/api/v1/business-units",
    request_body = CreateBusinessUnitRequest,
    responses(
        (status = 201, description = "Business unit created"),
        (status = 409, description = "Code already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "business-units"
)]
pub async fn create_business_unit(
    State(state): State<AppState>,
    Json(payload): Json<CreateBusinessUnitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let business_unit = state.services.business_units.create(payload).await?;
    Ok(created_response(business_unit))
}

/// Get a business unit
#[utoipa::path(
    get,
    path = "/api/v1/business-units/:id",
    params(("id" = Uuid, Path, description = "Business unit ID")),
    responses(
        (status = 200, description = "Business unit returned"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "business-units"
)]
pub async fn get_business_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let business_unit = state
        .services
        .business_units
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Business unit {id} not found")))?;
    Ok(success_response(business_unit))
}

/// List business units
#[utoipa::path(
    get,
    path = "/api/v1/business-units",
    responses((status = 200, description = "Business units listed")),
    tag = "business-units"
)]
pub async fn list_business_units(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let per_page = state.config.clamp_page_size(pagination.per_page);
    let response = state
        .services
        .business_units
        .list(pagination.page.max(1), per_page)
        .await?;
    Ok(success_response(response))
}

/// Update a business unit
#[utoipa::path(
    put,
    path = "/api/v1/business-units/:id",
    params(("id" = Uuid, Path, description = "Business unit ID")),
    request_body = UpdateBusinessUnitRequest,
    responses(
        (status = 200, description = "Business unit updated"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "business-units"
)]
pub async fn update_business_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBusinessUnitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let business_unit = state.services.business_units.update(id, payload).await?;
    Ok(success_response(business_unit))
}

/// Delete an empty business unit
#[utoipa::path(
    delete,
    path = "/api/v1/business-units/:id",
    params(("id" = Uuid, Path, description = "Business unit ID")),
    responses(
        (status = 204, description = "Business unit deleted"),
        (status = 409, description = "Business unit still in use", body = crate::errors::ErrorResponse)
    ),
    tag = "business-units"
)]
pub async fn delete_business_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.business_units.delete(id).await?;
    Ok(no_content_response())
}

/// Read-only business unit endpoints
pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/business-units", get(list_business_units))
        .route("/business-units/:id", get(get_business_unit))
        .route(
            "/business-units/:id/departments",
            get(super::departments::list_departments),
        )
        .route("/departments/:id", get(super::departments::get_department))
}

/// Mutating business unit and department endpoints
pub fn manage_routes() -> Router<AppState> {
    Router::new()
        .route("/business-units", post(create_business_unit))
        .route("/business-units/:id", put(update_business_unit))
        .route("/business-units/:id", delete(delete_business_unit))
        .route(
            "/business-units/:id/departments",
            post(super::departments::create_department),
        )
        .route(
            "/departments/:id",
            put(super::departments::update_department),
        )
        .route(
            "/departments/:id",
            delete(super::departments::delete_department),
        )
}
