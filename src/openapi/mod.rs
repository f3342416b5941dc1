use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MatReq API",
        version = "1.0.0",
        description = r#"
# Material Request Management API

Create, route, approve, and post purchasing requests scoped to business units
and departments.

## Authentication

All API endpoints require a JWT bearer token obtained from `/auth/login`:

```
Authorization: Bearer <your-jwt-token>
```

## Approval workflow

A request moves `DRAFT → FOR_REC_APPROVAL → FOR_FINAL_APPROVAL → FOR_POSTING
→ POSTED → RECEIVED | TRANSMITTED`. Disapproval and recall-for-edit are the
only backward moves; cancellation is allowed before the posting pipeline.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "material-requests", description = "Material request documents and line items"),
        (name = "approval", description = "Workflow transitions"),
        (name = "posting", description = "Posting pipeline"),
        (name = "business-units", description = "Business unit management"),
        (name = "departments", description = "Department management"),
        (name = "users", description = "User management")
    ),
    paths(
        // Material requests
        crate::handlers::material_requests::list_requests,
        crate::handlers::material_requests::get_request,
        crate::handlers::material_requests::create_request,
        crate::handlers::material_requests::update_request,
        crate::handlers::material_requests::delete_request,
        crate::handlers::material_requests::list_items,
        crate::handlers::material_requests::add_item,
        crate::handlers::material_requests::update_item,
        crate::handlers::material_requests::remove_item,

        // Workflow
        crate::handlers::material_requests::submit_request,
        crate::handlers::material_requests::recommend_approve,
        crate::handlers::material_requests::final_approve,
        crate::handlers::material_requests::disapprove,
        crate::handlers::material_requests::recall_request,
        crate::handlers::material_requests::queue_for_posting,
        crate::handlers::material_requests::post_request,
        crate::handlers::material_requests::receive_request,
        crate::handlers::material_requests::transmit_request,
        crate::handlers::material_requests::cancel_request,

        // Organization
        crate::handlers::business_units::list_business_units,
        crate::handlers::business_units::get_business_unit,
        crate::handlers::business_units::create_business_unit,
        crate::handlers::business_units::update_business_unit,
        crate::handlers::business_units::delete_business_unit,
        crate::handlers::departments::list_departments,
        crate::handlers::departments::get_department,
        crate::handlers::departments::create_department,
        crate::handlers::departments::update_department,
        crate::handlers::departments::delete_department,

        // Users
        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::create_user,
        crate::handlers::users::update_user,
        crate::handlers::users::deactivate_user,
        crate::handlers::users::change_password,
        crate::handlers::users::get_current_user,
    ),
    components(
        schemas(
            // Material request types
            crate::services::material_requests::CreateMaterialRequestRequest,
            crate::services::material_requests::UpdateMaterialRequestRequest,
            crate::services::material_requests::CreateItemInput,
            crate::services::material_requests::MaterialRequestResponse,
            crate::services::material_requests::ItemResponse,
            crate::entities::material_request::RequestStatus,
            crate::entities::material_request::RequestType,
            crate::handlers::material_requests::DisapproveBody,
            crate::handlers::material_requests::FinalApproveBody,

            // Organization types
            crate::services::business_units::CreateBusinessUnitRequest,
            crate::services::business_units::UpdateBusinessUnitRequest,
            crate::services::departments::CreateDepartmentRequest,
            crate::services::departments::UpdateDepartmentRequest,

            // User types
            crate::services::users::CreateUserRequest,
            crate::services::users::UpdateUserRequest,
            crate::services::users::ChangePasswordRequest,
            crate::services::users::UserResponse,

            // Auth types
            crate::auth::LoginCredentials,
            crate::auth::RefreshTokenRequest,
            crate::auth::TokenPair,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_includes_workflow_paths() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("MatReq API"));
        assert!(json.contains("/api/v1/material-requests"));
        assert!(json.contains("recommend-approve"));
    }
}
