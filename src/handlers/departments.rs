use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use super::common::{created_response, no_content_response, success_response, validate_input};
use crate::errors::ApiError;
use crate::services::departments::{CreateDepartmentRequest, UpdateDepartmentRequest};
use crate::AppState;

/// Create a department inside a business unit
#[utoipa::path(
    post,
    path = "/api/v1/business-units/:id/departments",
    params(("id" = Uuid, Path, description = "Business unit ID")),
    request_body = CreateDepartmentRequest,
    responses(
        (status = 201, description = "Department created"),
        (status = 404, description = "Business unit not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Code already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "departments"
)]
pub async fn create_department(
    State(state): State<AppState>,
    Path(business_unit_id): Path<Uuid>,
    Json(payload): Json<CreateDepartmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let department = state
        .services
        .departments
        .create(business_unit_id, payload)
        .await?;
    Ok(created_response(department))
}

/// List the departments of a business unit
#[utoipa::path(
    get,
    path = "/api/v1/business-units/:id/departments",
    params(("id" = Uuid, Path, description = "Business unit ID")),
    responses((status = 200, description = "Departments listed")),
    tag = "departments"
)]
pub async fn list_departments(
    State(state): State<AppState>,
    Path(business_unit_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let departments = state
        .services
        .departments
        .list_for_business_unit(business_unit_id)
        .await?;
    Ok(success_response(departments))
}

/// Get a department
#[utoipa::path(
    get,
    path = "/api/v1/departments/:id",
    params(("id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department returned"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "departments"
)]
pub async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let department = state
        .services
        .departments
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Department {id} not found")))?;
    Ok(success_response(department))
}

/// Update a department
#[utoipa::path(
    put,
    path = "/api/v1/departments/:id",
    params(("id" = Uuid, Path, description = "Department ID")),
    request_body = UpdateDepartmentRequest,
    responses(
        (status = 200, description = "Department updated"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "departments"
)]
pub async fn update_department(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDepartmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let department = state.services.departments.update(id, payload).await?;
    Ok(success_response(department))
}

/// Delete an empty department
#[utoipa::path(
    delete,
    path = "/api/v1/departments/:id",
    params(("id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 204, description = "Department deleted"),
        (status = 409, description = "Department still in use", body = crate::errors::ErrorResponse)
    ),
    tag = "departments"
)]
pub async fn delete_department(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.departments.delete(id).await?;
    Ok(no_content_response())
}
