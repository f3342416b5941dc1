use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::common::{created_response, no_content_response, success_response, validate_input};
use crate::entities::material_request::RequestStatus;
use crate::errors::ApiError;
use crate::services::material_requests::{
    CreateItemInput, CreateMaterialRequestRequest, RequestFilters, UpdateMaterialRequestRequest,
};
use crate::{auth::AuthenticatedUser, AppState};

/// List query: pagination plus the request filters.
#[derive(Debug, Deserialize)]
pub struct RequestListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    pub business_unit_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub status: Option<RequestStatus>,
    pub requested_by: Option<Uuid>,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct DisapproveBody {
    /// Why the request was rejected; stored on the document.
    pub reason: String,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct FinalApproveBody {
    /// Queue the document for posting immediately after approval.
    /// Defaults to true.
    pub auto_post: Option<bool>,
}

/// Create a material request (DRAFT)
#[utoipa::path(
    post,
    path = "/api/v1/material-requests",
    request_body = CreateMaterialRequestRequest,
    responses(
        (status = 201, description = "Material request created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "material-requests"
)]
pub async fn create_request(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Json(payload): Json<CreateMaterialRequestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let response = state
        .services
        .material_requests
        .create_request(payload, &current_user)
        .await?;
    Ok(created_response(response))
}

/// Get a material request with its line items
#[utoipa::path(
    get,
    path = "/api/v1/material-requests/:id",
    params(("id" = Uuid, Path, description = "Material request ID")),
    responses(
        (status = 200, description = "Material request returned"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "material-requests"
)]
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .services
        .material_requests
        .get_request(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Material request {id} not found")))?;
    Ok(success_response(response))
}

/// List material requests
#[utoipa::path(
    get,
    path = "/api/v1/material-requests",
    responses(
        (status = 200, description = "Material requests listed"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "material-requests"
)]
pub async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<RequestListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let per_page = state.config.clamp_page_size(query.per_page);
    let filters = RequestFilters {
        business_unit_id: query.business_unit_id,
        department_id: query.department_id,
        status: query.status,
        requested_by: query.requested_by,
    };
    let response = state
        .services
        .material_requests
        .list_requests(filters, query.page.max(1), per_page)
        .await?;
    Ok(success_response(response))
}

/// Update an editable material request header
#[utoipa::path(
    put,
    path = "/api/v1/material-requests/:id",
    params(("id" = Uuid, Path, description = "Material request ID")),
    request_body = UpdateMaterialRequestRequest,
    responses(
        (status = 200, description = "Material request updated"),
        (status = 400, description = "Not editable in current status", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "material-requests"
)]
pub async fn update_request(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMaterialRequestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let response = state
        .services
        .material_requests
        .update_request(id, payload, &current_user)
        .await?;
    Ok(success_response(response))
}

/// Delete a DRAFT material request
#[utoipa::path(
    delete,
    path = "/api/v1/material-requests/:id",
    params(("id" = Uuid, Path, description = "Material request ID")),
    responses(
        (status = 204, description = "Material request deleted"),
        (status = 400, description = "Not a draft", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "material-requests"
)]
pub async fn delete_request(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .material_requests
        .delete_request(id, &current_user)
        .await?;
    Ok(no_content_response())
}

/// List the line items of a request
#[utoipa::path(
    get,
    path = "/api/v1/material-requests/:id/items",
    params(("id" = Uuid, Path, description = "Material request ID")),
    responses((status = 200, description = "Line items returned")),
    tag = "material-requests"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.services.material_requests.list_items(id).await?;
    Ok(success_response(items))
}

/// Add a line item to an editable request
#[utoipa::path(
    post,
    path = "/api/v1/material-requests/:id/items",
    params(("id" = Uuid, Path, description = "Material request ID")),
    request_body = CreateItemInput,
    responses(
        (status = 201, description = "Line item added"),
        (status = 400, description = "Not editable in current status", body = crate::errors::ErrorResponse)
    ),
    tag = "material-requests"
)]
pub async fn add_item(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateItemInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let response = state
        .services
        .material_requests
        .add_item(id, payload, &current_user)
        .await?;
    Ok(created_response(response))
}

/// Replace a line item on an editable request
#[utoipa::path(
    put,
    path = "/api/v1/material-requests/:id/items/:item_id",
    params(
        ("id" = Uuid, Path, description = "Material request ID"),
        ("item_id" = Uuid, Path, description = "Line item ID")
    ),
    request_body = CreateItemInput,
    responses(
        (status = 200, description = "Line item updated"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "material-requests"
)]
pub async fn update_item(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CreateItemInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let response = state
        .services
        .material_requests
        .update_item(id, item_id, payload, &current_user)
        .await?;
    Ok(success_response(response))
}

/// Remove a line item from an editable request
#[utoipa::path(
    delete,
    path = "/api/v1/material-requests/:id/items/:item_id",
    params(
        ("id" = Uuid, Path, description = "Material request ID"),
        ("item_id" = Uuid, Path, description = "Line item ID")
    ),
    responses(
        (status = 200, description = "Line item removed"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "material-requests"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .services
        .material_requests
        .remove_item(id, item_id, &current_user)
        .await?;
    Ok(success_response(response))
}

/// Submit a draft for recommending approval
#[utoipa::path(
    post,
    path = "/api/v1/material-requests/:id/submit",
    params(("id" = Uuid, Path, description = "Material request ID")),
    responses(
        (status = 200, description = "Request submitted"),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "approval"
)]
pub async fn submit_request(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.services.approval.submit(id, &current_user).await?;
    Ok(success_response(response))
}

/// First-stage (recommending) approval
#[utoipa::path(
    post,
    path = "/api/v1/material-requests/:id/recommend-approve",
    params(("id" = Uuid, Path, description = "Material request ID")),
    responses(
        (status = 200, description = "Recommending approval granted"),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse),
        (status = 403, description = "Not the assigned approver", body = crate::errors::ErrorResponse)
    ),
    tag = "approval"
)]
pub async fn recommend_approve(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .services
        .approval
        .recommend_approve(id, &current_user)
        .await?;
    Ok(success_response(response))
}

/// Second-stage (final) approval, with optional auto-posting
#[utoipa::path(
    post,
    path = "/api/v1/material-requests/:id/final-approve",
    params(("id" = Uuid, Path, description = "Material request ID")),
    request_body(content = FinalApproveBody, description = "Optional auto-post override"),
    responses(
        (status = 200, description = "Final approval granted"),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse),
        (status = 403, description = "Not the assigned approver", body = crate::errors::ErrorResponse)
    ),
    tag = "approval"
)]
pub async fn final_approve(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<FinalApproveBody>>,
) -> Result<impl IntoResponse, ApiError> {
    let auto_post = payload
        .and_then(|Json(body)| body.auto_post)
        .unwrap_or(true);
    let response = state
        .services
        .approval
        .final_approve(id, &current_user, auto_post)
        .await?;
    Ok(success_response(response))
}

/// Disapprove at the current approval stage
#[utoipa::path(
    post,
    path = "/api/v1/material-requests/:id/disapprove",
    params(("id" = Uuid, Path, description = "Material request ID")),
    request_body = DisapproveBody,
    responses(
        (status = 200, description = "Request disapproved"),
        (status = 400, description = "Invalid transition or missing reason", body = crate::errors::ErrorResponse),
        (status = 403, description = "Not the assigned approver", body = crate::errors::ErrorResponse)
    ),
    tag = "approval"
)]
pub async fn disapprove(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DisapproveBody>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .services
        .approval
        .disapprove(id, &current_user, payload.reason)
        .await?;
    Ok(success_response(response))
}

/// Recall a pending or disapproved request for editing
#[utoipa::path(
    post,
    path = "/api/v1/material-requests/:id/recall",
    params(("id" = Uuid, Path, description = "Material request ID")),
    responses(
        (status = 200, description = "Request recalled for edit"),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse)
    ),
    tag = "approval"
)]
pub async fn recall_request(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .services
        .approval
        .recall_for_edit(id, &current_user)
        .await?;
    Ok(success_response(response))
}

/// Queue a FINAL_APPROVED request for posting
#[utoipa::path(
    post,
    path = "/api/v1/material-requests/:id/queue-posting",
    params(("id" = Uuid, Path, description = "Material request ID")),
    responses(
        (status = 200, description = "Request queued for posting"),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse)
    ),
    tag = "posting"
)]
pub async fn queue_for_posting(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .services
        .approval
        .queue_for_posting(id, &current_user)
        .await?;
    Ok(success_response(response))
}

/// Post a request, committing it and stamping the posting date
#[utoipa::path(
    post,
    path = "/api/v1/material-requests/:id/post",
    params(("id" = Uuid, Path, description = "Material request ID")),
    responses(
        (status = 200, description = "Request posted"),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse),
        (status = 403, description = "Poster role required", body = crate::errors::ErrorResponse)
    ),
    tag = "posting"
)]
pub async fn post_request(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.services.approval.post(id, &current_user).await?;
    Ok(success_response(response))
}

/// Mark a posted ITEM request as received
#[utoipa::path(
    post,
    path = "/api/v1/material-requests/:id/receive",
    params(("id" = Uuid, Path, description = "Material request ID")),
    responses(
        (status = 200, description = "Request received"),
        (status = 400, description = "Invalid transition or request type", body = crate::errors::ErrorResponse)
    ),
    tag = "posting"
)]
pub async fn receive_request(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.services.approval.receive(id, &current_user).await?;
    Ok(success_response(response))
}

/// Mark a posted SERVICE request as transmitted
#[utoipa::path(
    post,
    path = "/api/v1/material-requests/:id/transmit",
    params(("id" = Uuid, Path, description = "Material request ID")),
    responses(
        (status = 200, description = "Request transmitted"),
        (status = 400, description = "Invalid transition or request type", body = crate::errors::ErrorResponse)
    ),
    tag = "posting"
)]
pub async fn transmit_request(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.services.approval.transmit(id, &current_user).await?;
    Ok(success_response(response))
}

/// Cancel a request before it enters the posting pipeline
#[utoipa::path(
    post,
    path = "/api/v1/material-requests/:id/cancel",
    params(("id" = Uuid, Path, description = "Material request ID")),
    responses(
        (status = 200, description = "Request cancelled"),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse)
    ),
    tag = "approval"
)]
pub async fn cancel_request(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.services.approval.cancel(id, &current_user).await?;
    Ok(success_response(response))
}
