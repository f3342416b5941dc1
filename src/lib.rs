//! MatReq API Library
//!
//! This crate provides the core functionality for the MatReq API
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::consts as perm;
use crate::auth::AuthRouterExt;
use crate::db::DbPool;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub search: Option<String>,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

// Enhanced API routes function
pub fn api_v1_routes() -> Router<AppState> {
    // Material request routes with permission gating
    let requests_read = Router::new()
        .route(
            "/material-requests",
            get(handlers::material_requests::list_requests),
        )
        .route(
            "/material-requests/:id",
            get(handlers::material_requests::get_request),
        )
        .route(
            "/material-requests/:id/items",
            get(handlers::material_requests::list_items),
        )
        .with_permission(perm::REQUESTS_READ);

    let requests_create = Router::new()
        .route(
            "/material-requests",
            axum::routing::post(handlers::material_requests::create_request),
        )
        .with_permission(perm::REQUESTS_CREATE);

    let requests_update = Router::new()
        .route(
            "/material-requests/:id",
            axum::routing::put(handlers::material_requests::update_request),
        )
        .route(
            "/material-requests/:id",
            axum::routing::delete(handlers::material_requests::delete_request),
        )
        .route(
            "/material-requests/:id/items",
            axum::routing::post(handlers::material_requests::add_item),
        )
        .route(
            "/material-requests/:id/items/:item_id",
            axum::routing::put(handlers::material_requests::update_item),
        )
        .route(
            "/material-requests/:id/items/:item_id",
            axum::routing::delete(handlers::material_requests::remove_item),
        )
        .with_permission(perm::REQUESTS_UPDATE);

    let requests_submit = Router::new()
        .route(
            "/material-requests/:id/submit",
            axum::routing::post(handlers::material_requests::submit_request),
        )
        .route(
            "/material-requests/:id/recall",
            axum::routing::post(handlers::material_requests::recall_request),
        )
        .with_permission(perm::REQUESTS_SUBMIT);

    let requests_cancel = Router::new()
        .route(
            "/material-requests/:id/cancel",
            axum::routing::post(handlers::material_requests::cancel_request),
        )
        .with_permission(perm::REQUESTS_CANCEL);

    let requests_recommend = Router::new()
        .route(
            "/material-requests/:id/recommend-approve",
            axum::routing::post(handlers::material_requests::recommend_approve),
        )
        .with_permission(perm::REQUESTS_APPROVE_RECOMMEND);

    let requests_final = Router::new()
        .route(
            "/material-requests/:id/final-approve",
            axum::routing::post(handlers::material_requests::final_approve),
        )
        .with_permission(perm::REQUESTS_APPROVE_FINAL);

    let requests_disapprove = Router::new()
        .route(
            "/material-requests/:id/disapprove",
            axum::routing::post(handlers::material_requests::disapprove),
        )
        .with_permission(perm::REQUESTS_DISAPPROVE);

    let requests_post = Router::new()
        .route(
            "/material-requests/:id/queue-posting",
            axum::routing::post(handlers::material_requests::queue_for_posting),
        )
        .route(
            "/material-requests/:id/post",
            axum::routing::post(handlers::material_requests::post_request),
        )
        .route(
            "/material-requests/:id/receive",
            axum::routing::post(handlers::material_requests::receive_request),
        )
        .route(
            "/material-requests/:id/transmit",
            axum::routing::post(handlers::material_requests::transmit_request),
        )
        .with_permission(perm::REQUESTS_POST);

    // Organization routes with permission gating
    let org_read = handlers::business_units::read_routes()
        .with_permission(perm::BUSINESS_UNITS_READ);
    let org_manage = handlers::business_units::manage_routes()
        .with_permission(perm::BUSINESS_UNITS_MANAGE);

    // User routes
    let users_manage = handlers::users::manage_routes().with_permission(perm::USERS_MANAGE);
    let users_self = handlers::users::self_service_routes().with_auth();

    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Material requests API (auth + permissions)
        .merge(requests_read)
        .merge(requests_create)
        .merge(requests_update)
        .merge(requests_submit)
        .merge(requests_cancel)
        .merge(requests_recommend)
        .merge(requests_final)
        .merge(requests_disapprove)
        .merge(requests_post)
        // Organization API (auth + permissions)
        .merge(org_read)
        .merge(org_manage)
        // Users API (auth + permissions)
        .merge(users_self)
        .merge(users_manage)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "service": "matreq-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    // Check database connectivity
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": if db_status == "healthy" { "healthy" } else { "unhealthy" },
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn error_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-err"), async {
                ApiResponse::<()>::error("oops".into())
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-err"));
        assert!(!meta.timestamp.is_empty());
    }
}
