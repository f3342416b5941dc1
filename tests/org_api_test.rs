//! HTTP tests for authentication and the business unit / department / user
//! management endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{expect_json, response_json, TestApp};
use matreq_api::auth::Roles;
use serde_json::json;

#[tokio::test]
async fn login_issues_tokens_and_rejects_bad_credentials() {
    let app = TestApp::new().await;
    let admin = app.seed_admin().await;

    // Look up the seeded email through the profile endpoint
    let profile = expect_json(
        app.request(Method::GET, "/api/v1/users/profile", Some(&admin.token), None)
            .await,
        StatusCode::OK,
    )
    .await;
    let email = profile["email"].as_str().unwrap().to_string();

    let tokens = expect_json(
        app.request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": "correct horse battery staple" })),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(tokens["token_type"], "Bearer");
    assert!(tokens["access_token"].as_str().unwrap().len() > 20);

    // The refresh token can be exchanged exactly once
    let refresh = tokens["refresh_token"].as_str().unwrap().to_string();
    let refreshed = expect_json(
        app.request(
            Method::POST,
            "/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert!(refreshed["access_token"].as_str().is_some());

    let replay = app
        .request(
            Method::POST,
            "/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    let bad = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": "not the password" })),
        )
        .await;
    assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_the_access_token() {
    let app = TestApp::new().await;
    let admin = app.seed_admin().await;

    let response = app
        .request(Method::POST, "/auth/logout", Some(&admin.token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let after = app
        .request(Method::GET, "/api/v1/users/profile", Some(&admin.token), None)
        .await;
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn business_unit_crud_and_code_uniqueness() {
    let app = TestApp::new().await;
    let admin = app.seed_admin().await;
    let requester = app.seed_user(Roles::REQUESTER).await;

    // Only admins may create
    let forbidden = app
        .request(
            Method::POST,
            "/api/v1/business-units",
            Some(&requester.token),
            Some(json!({ "code": "north", "name": "North Plant" })),
        )
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let created = expect_json(
        app.request(
            Method::POST,
            "/api/v1/business-units",
            Some(&admin.token),
            Some(json!({ "code": "north", "name": "North Plant" })),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    // Codes are normalized to uppercase
    assert_eq!(created["code"], "NORTH");
    let id = created["id"].as_str().unwrap().to_string();

    let duplicate = app
        .request(
            Method::POST,
            "/api/v1/business-units",
            Some(&admin.token),
            Some(json!({ "code": "NORTH", "name": "Duplicate" })),
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    // Read access works for any authenticated role
    let listed = expect_json(
        app.request(
            Method::GET,
            "/api/v1/business-units",
            Some(&requester.token),
            None,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(listed["total"], 1);

    let updated = expect_json(
        app.request(
            Method::PUT,
            &format!("/api/v1/business-units/{id}"),
            Some(&admin.token),
            Some(json!({ "name": "North Plant (consolidated)", "active": false })),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(updated["name"], "North Plant (consolidated)");
    assert_eq!(updated["active"], false);

    let deleted = app
        .request(
            Method::DELETE,
            &format!("/api/v1/business-units/{id}"),
            Some(&admin.token),
            None,
        )
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = app
        .request(
            Method::GET,
            &format!("/api/v1/business-units/{id}"),
            Some(&admin.token),
            None,
        )
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn business_unit_with_departments_cannot_be_deleted() {
    let app = TestApp::new().await;
    let admin = app.seed_admin().await;

    let bu = expect_json(
        app.request(
            Method::POST,
            "/api/v1/business-units",
            Some(&admin.token),
            Some(json!({ "code": "EAST", "name": "East Plant" })),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let bu_id = bu["id"].as_str().unwrap().to_string();

    let dept = expect_json(
        app.request(
            Method::POST,
            &format!("/api/v1/business-units/{bu_id}/departments"),
            Some(&admin.token),
            Some(json!({ "code": "QA", "name": "Quality Assurance" })),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;

    let blocked = app
        .request(
            Method::DELETE,
            &format!("/api/v1/business-units/{bu_id}"),
            Some(&admin.token),
            None,
        )
        .await;
    assert_eq!(blocked.status(), StatusCode::CONFLICT);

    // Removing the department unblocks the business unit
    let dept_id = dept["id"].as_str().unwrap();
    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/departments/{dept_id}"),
            Some(&admin.token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let unblocked = app
        .request(
            Method::DELETE,
            &format!("/api/v1/business-units/{bu_id}"),
            Some(&admin.token),
            None,
        )
        .await;
    assert_eq!(unblocked.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn department_codes_are_scoped_to_their_business_unit() {
    let app = TestApp::new().await;
    let admin = app.seed_admin().await;

    let mut bu_ids = Vec::new();
    for code in ["ALFA", "BRVO"] {
        let bu = expect_json(
            app.request(
                Method::POST,
                "/api/v1/business-units",
                Some(&admin.token),
                Some(json!({ "code": code, "name": format!("{code} Plant") })),
            )
            .await,
            StatusCode::CREATED,
        )
        .await;
        bu_ids.push(bu["id"].as_str().unwrap().to_string());
    }

    // The same department code can exist in two business units
    for bu_id in &bu_ids {
        let response = app
            .request(
                Method::POST,
                &format!("/api/v1/business-units/{bu_id}/departments"),
                Some(&admin.token),
                Some(json!({ "code": "OPS", "name": "Operations" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // But not twice in the same one
    let duplicate = app
        .request(
            Method::POST,
            &format!("/api/v1/business-units/{}/departments", bu_ids[0]),
            Some(&admin.token),
            Some(json!({ "code": "OPS", "name": "Operations Again" })),
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn user_management_is_admin_only() {
    let app = TestApp::new().await;
    let admin = app.seed_admin().await;
    let requester = app.seed_user(Roles::REQUESTER).await;

    let forbidden = app
        .request(Method::GET, "/api/v1/users", Some(&requester.token), None)
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let created = expect_json(
        app.request(
            Method::POST,
            "/api/v1/users",
            Some(&admin.token),
            Some(json!({
                "name": "Dana Cruz",
                "email": "dana.cruz@example.com",
                "password": "a sufficiently long password",
                "role": "poster"
            })),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let user_id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["role"], "poster");
    assert!(created.get("password_hash").is_none());

    let invalid_role = app
        .request(
            Method::POST,
            "/api/v1/users",
            Some(&admin.token),
            Some(json!({
                "name": "Robin Hale",
                "email": "robin.hale@example.com",
                "password": "a sufficiently long password",
                "role": "janitor"
            })),
        )
        .await;
    assert_eq!(invalid_role.status(), StatusCode::BAD_REQUEST);

    let duplicate_email = app
        .request(
            Method::POST,
            "/api/v1/users",
            Some(&admin.token),
            Some(json!({
                "name": "Dana Cruz II",
                "email": "dana.cruz@example.com",
                "password": "a sufficiently long password",
                "role": "requester"
            })),
        )
        .await;
    assert_eq!(duplicate_email.status(), StatusCode::CONFLICT);

    let updated = expect_json(
        app.request(
            Method::PUT,
            &format!("/api/v1/users/{user_id}"),
            Some(&admin.token),
            Some(json!({ "role": "final_approver" })),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(updated["role"], "final_approver");

    // DELETE deactivates rather than removing the row
    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/users/{user_id}"),
            Some(&admin.token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let after = expect_json(
        app.request(
            Method::GET,
            &format!("/api/v1/users/{user_id}"),
            Some(&admin.token),
            None,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(after["active"], false);

    // Deactivated users can no longer log in
    let login = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({
                "email": "dana.cruz@example.com",
                "password": "a sufficiently long password"
            })),
        )
        .await;
    assert_eq!(login.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn users_change_their_own_password_but_not_others() {
    let app = TestApp::new().await;
    let requester = app.seed_user(Roles::REQUESTER).await;
    let other = app.seed_user(Roles::REQUESTER).await;

    // Wrong current password
    let wrong = app
        .request(
            Method::POST,
            &format!("/api/v1/users/{}/change-password", requester.id),
            Some(&requester.token),
            Some(json!({
                "current_password": "not it",
                "new_password": "another long password"
            })),
        )
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    // Someone else's account
    let forbidden = app
        .request(
            Method::POST,
            &format!("/api/v1/users/{}/change-password", other.id),
            Some(&requester.token),
            Some(json!({
                "current_password": "correct horse battery staple",
                "new_password": "another long password"
            })),
        )
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let ok = app
        .request(
            Method::POST,
            &format!("/api/v1/users/{}/change-password", requester.id),
            Some(&requester.token),
            Some(json!({
                "current_password": "correct horse battery staple",
                "new_password": "another long password"
            })),
        )
        .await;
    let body = response_json(ok).await;
    assert_eq!(body["message"], "Password changed successfully");
}

#[tokio::test]
async fn health_endpoint_reports_database_status() {
    let app = TestApp::new().await;

    let health = expect_json(
        app.request(Method::GET, "/api/v1/health", None, None).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(health["data"]["status"], "healthy");
    assert_eq!(health["data"]["checks"]["database"], "healthy");
}
