//! End-to-end tests for the material request approval workflow:
//! draft → submission → two-stage approval → posting → receipt/transmittal,
//! plus the disapproval, recall, and cancellation side paths and the
//! role gates guarding each transition.

mod common;

use axum::http::{Method, StatusCode};
use common::{expect_json, response_json, TestApp, TestUser};
use matreq_api::auth::Roles;
use serde_json::{json, Value};
use uuid::Uuid;

struct WorkflowFixture {
    app: TestApp,
    admin: TestUser,
    requester: TestUser,
    rec_approver: TestUser,
    final_approver: TestUser,
    poster: TestUser,
    business_unit_id: Uuid,
    department_id: Uuid,
}

impl WorkflowFixture {
    async fn new() -> Self {
        let app = TestApp::new().await;
        let admin = app.seed_admin().await;
        let requester = app.seed_user(Roles::REQUESTER).await;
        let rec_approver = app.seed_user(Roles::RECOMMENDING_APPROVER).await;
        let final_approver = app.seed_user(Roles::FINAL_APPROVER).await;
        let poster = app.seed_user(Roles::POSTER).await;

        let bu = expect_json(
            app.request(
                Method::POST,
                "/api/v1/business-units",
                Some(&admin.token),
                Some(json!({ "code": "MAIN", "name": "Main Plant" })),
            )
            .await,
            StatusCode::CREATED,
        )
        .await;
        let business_unit_id = Uuid::parse_str(bu["id"].as_str().unwrap()).unwrap();

        let dept = expect_json(
            app.request(
                Method::POST,
                &format!("/api/v1/business-units/{business_unit_id}/departments"),
                Some(&admin.token),
                Some(json!({ "code": "MAINT", "name": "Maintenance" })),
            )
            .await,
            StatusCode::CREATED,
        )
        .await;
        let department_id = Uuid::parse_str(dept["id"].as_str().unwrap()).unwrap();

        Self {
            app,
            admin,
            requester,
            rec_approver,
            final_approver,
            poster,
            business_unit_id,
            department_id,
        }
    }

    /// Create a draft with one line item, assigned to both approvers.
    async fn create_draft(&self, request_type: &str) -> Value {
        expect_json(
            self.app
                .request(
                    Method::POST,
                    "/api/v1/material-requests",
                    Some(&self.requester.token),
                    Some(json!({
                        "business_unit_id": self.business_unit_id,
                        "department_id": self.department_id,
                        "request_type": request_type,
                        "required_date": "2026-09-15",
                        "recommending_approver_id": self.rec_approver.id,
                        "final_approver_id": self.final_approver.id,
                        "freight": "15.00",
                        "discount": "5.00",
                        "items": [{
                            "item_code": "BRG-6204",
                            "description": "Deep groove ball bearing",
                            "unit_of_measure": "pc",
                            "quantity": "4",
                            "unit_price": "120.50"
                        }]
                    })),
                )
                .await,
            StatusCode::CREATED,
        )
        .await
    }

    async fn transition(
        &self,
        request_id: &str,
        action: &str,
        token: &str,
        body: Option<Value>,
    ) -> axum::http::Response<axum::body::Body> {
        self.app
            .request(
                Method::POST,
                &format!("/api/v1/material-requests/{request_id}/{action}"),
                Some(token),
                body,
            )
            .await
    }
}

#[tokio::test]
async fn full_item_lifecycle_reaches_received() {
    let fx = WorkflowFixture::new().await;

    let draft = fx.create_draft("ITEM").await;
    assert_eq!(draft["status"], "DRAFT");
    assert_eq!(draft["doc_number"], "MR-MAIN-000001");
    // 4 × 120.50 + 15.00 − 5.00
    assert_eq!(draft["total"], "492.00");
    let id = draft["id"].as_str().unwrap().to_string();

    let submitted = expect_json(
        fx.transition(&id, "submit", &fx.requester.token, None).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(submitted["status"], "FOR_REC_APPROVAL");

    let recommended = expect_json(
        fx.transition(&id, "recommend-approve", &fx.rec_approver.token, None)
            .await,
        StatusCode::OK,
    )
    .await;
    // A final approver is assigned, so the document forwards to the second stage
    assert_eq!(recommended["status"], "FOR_FINAL_APPROVAL");

    let approved = expect_json(
        fx.transition(&id, "final-approve", &fx.final_approver.token, None)
            .await,
        StatusCode::OK,
    )
    .await;
    // auto_post defaults to true
    assert_eq!(approved["status"], "FOR_POSTING");
    assert!(approved["approved_date"].is_string());

    let posted = expect_json(
        fx.transition(&id, "post", &fx.poster.token, None).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(posted["status"], "POSTED");
    assert!(posted["posted_date"].is_string());

    let received = expect_json(
        fx.transition(&id, "receive", &fx.poster.token, None).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(received["status"], "RECEIVED");

    // Version climbed once per transition
    assert!(received["version"].as_i64().unwrap() > draft["version"].as_i64().unwrap());
}

#[tokio::test]
async fn service_requests_transmit_and_reject_receive() {
    let fx = WorkflowFixture::new().await;

    let draft = fx.create_draft("SERVICE").await;
    let id = draft["id"].as_str().unwrap().to_string();

    fx.transition(&id, "submit", &fx.requester.token, None).await;
    fx.transition(&id, "recommend-approve", &fx.rec_approver.token, None)
        .await;
    fx.transition(&id, "final-approve", &fx.final_approver.token, None)
        .await;
    fx.transition(&id, "post", &fx.poster.token, None).await;

    // A SERVICE request cannot be received
    let response = fx.transition(&id, "receive", &fx.poster.token, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let transmitted = expect_json(
        fx.transition(&id, "transmit", &fx.poster.token, None).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(transmitted["status"], "TRANSMITTED");
}

#[tokio::test]
async fn recommending_approval_without_final_approver_goes_straight_to_posting() {
    let fx = WorkflowFixture::new().await;

    let draft = expect_json(
        fx.app
            .request(
                Method::POST,
                "/api/v1/material-requests",
                Some(&fx.requester.token),
                Some(json!({
                    "business_unit_id": fx.business_unit_id,
                    "department_id": fx.department_id,
                    "request_type": "ITEM",
                    "required_date": "2026-09-15",
                    "recommending_approver_id": fx.rec_approver.id,
                    "items": [{
                        "description": "Uncataloged spare part",
                        "unit_of_measure": "pc",
                        "quantity": "1",
                        "unit_price": "10.00"
                    }]
                })),
            )
            .await,
        StatusCode::CREATED,
    )
    .await;
    let id = draft["id"].as_str().unwrap().to_string();

    fx.transition(&id, "submit", &fx.requester.token, None).await;

    let recommended = expect_json(
        fx.transition(&id, "recommend-approve", &fx.rec_approver.token, None)
            .await,
        StatusCode::OK,
    )
    .await;
    // First-stage sign-off is terminal when no second stage is routed
    assert_eq!(recommended["status"], "FOR_POSTING");
    assert!(recommended["approved_date"].is_string());
}

#[tokio::test]
async fn disapproval_recall_and_resubmission() {
    let fx = WorkflowFixture::new().await;

    let draft = fx.create_draft("ITEM").await;
    let id = draft["id"].as_str().unwrap().to_string();

    fx.transition(&id, "submit", &fx.requester.token, None).await;

    // A reason is mandatory
    let response = fx
        .transition(
            &id,
            "disapprove",
            &fx.rec_approver.token,
            Some(json!({ "reason": "   " })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let disapproved = expect_json(
        fx.transition(
            &id,
            "disapprove",
            &fx.rec_approver.token,
            Some(json!({ "reason": "wrong cost center" })),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(disapproved["status"], "DISAPPROVED");
    assert_eq!(disapproved["disapproval_reason"], "wrong cost center");

    // The requester pulls it back, edits, and resubmits
    let recalled = expect_json(
        fx.transition(&id, "recall", &fx.requester.token, None).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(recalled["status"], "FOR_EDIT");

    let updated = expect_json(
        fx.app
            .request(
                Method::PUT,
                &format!("/api/v1/material-requests/{id}"),
                Some(&fx.requester.token),
                Some(json!({ "remarks": "moved to maintenance budget" })),
            )
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(updated["remarks"], "moved to maintenance budget");

    let resubmitted = expect_json(
        fx.transition(&id, "submit", &fx.requester.token, None).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(resubmitted["status"], "FOR_REC_APPROVAL");
    // Resubmission clears the old reason
    assert!(resubmitted["disapproval_reason"].is_null());
}

#[tokio::test]
async fn role_gates_reject_wrong_actors() {
    let fx = WorkflowFixture::new().await;

    let draft = fx.create_draft("ITEM").await;
    let id = draft["id"].as_str().unwrap().to_string();

    // Only the owner may submit
    let response = fx.transition(&id, "submit", &fx.poster.token, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    fx.transition(&id, "submit", &fx.requester.token, None).await;

    // The poster's token lacks the recommend permission entirely
    let response = fx
        .transition(&id, "recommend-approve", &fx.poster.token, None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Another recommending approver holds the role but is not assigned
    let other_approver = fx.app.seed_user(Roles::RECOMMENDING_APPROVER).await;
    let response = fx
        .transition(&id, "recommend-approve", &other_approver.token, None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admins pass every gate
    let recommended = expect_json(
        fx.transition(&id, "recommend-approve", &fx.admin.token, None)
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(recommended["status"], "FOR_FINAL_APPROVAL");

    // No token at all
    let response = fx
        .app
        .request(
            Method::POST,
            &format!("/api/v1/material-requests/{id}/final-approve"),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_transitions_are_rejected() {
    let fx = WorkflowFixture::new().await;

    let draft = fx.create_draft("ITEM").await;
    let id = draft["id"].as_str().unwrap().to_string();

    // Cannot post a draft
    let response = fx.transition(&id, "post", &fx.poster.token, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Cannot approve a draft
    let response = fx
        .transition(&id, "recommend-approve", &fx.rec_approver.token, None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    fx.transition(&id, "submit", &fx.requester.token, None).await;

    // Cannot submit twice
    let response = fx.transition(&id, "submit", &fx.requester.token, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submit_requires_a_line_item() {
    let fx = WorkflowFixture::new().await;

    let draft = expect_json(
        fx.app
            .request(
                Method::POST,
                "/api/v1/material-requests",
                Some(&fx.requester.token),
                Some(json!({
                    "business_unit_id": fx.business_unit_id,
                    "department_id": fx.department_id,
                    "request_type": "ITEM",
                    "required_date": "2026-09-15",
                    "items": []
                })),
            )
            .await,
        StatusCode::CREATED,
    )
    .await;
    let id = draft["id"].as_str().unwrap().to_string();

    let response = fx.transition(&id, "submit", &fx.requester.token, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn final_approval_can_defer_posting() {
    let fx = WorkflowFixture::new().await;

    let draft = fx.create_draft("ITEM").await;
    let id = draft["id"].as_str().unwrap().to_string();

    fx.transition(&id, "submit", &fx.requester.token, None).await;
    fx.transition(&id, "recommend-approve", &fx.rec_approver.token, None)
        .await;

    let approved = expect_json(
        fx.transition(
            &id,
            "final-approve",
            &fx.final_approver.token,
            Some(json!({ "auto_post": false })),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(approved["status"], "FINAL_APPROVED");

    // The poster pushes it into the queue later
    let queued = expect_json(
        fx.transition(&id, "queue-posting", &fx.poster.token, None)
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(queued["status"], "FOR_POSTING");
}

#[tokio::test]
async fn cancel_is_blocked_after_posting_pipeline_begins() {
    let fx = WorkflowFixture::new().await;

    let draft = fx.create_draft("ITEM").await;
    let id = draft["id"].as_str().unwrap().to_string();

    fx.transition(&id, "submit", &fx.requester.token, None).await;
    fx.transition(&id, "recommend-approve", &fx.rec_approver.token, None)
        .await;
    fx.transition(&id, "final-approve", &fx.final_approver.token, None)
        .await;

    // FOR_POSTING is past the point of no return
    let response = fx.transition(&id, "cancel", &fx.requester.token, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancelled_draft_stays_cancelled() {
    let fx = WorkflowFixture::new().await;

    let draft = fx.create_draft("ITEM").await;
    let id = draft["id"].as_str().unwrap().to_string();

    let cancelled = expect_json(
        fx.transition(&id, "cancel", &fx.requester.token, None).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(cancelled["status"], "CANCELLED");

    let response = fx.transition(&id, "submit", &fx.requester.token, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn line_item_edits_keep_the_total_in_step() {
    let fx = WorkflowFixture::new().await;

    let draft = fx.create_draft("ITEM").await;
    let id = draft["id"].as_str().unwrap().to_string();
    assert_eq!(draft["total"], "492.00");

    // Add a second line: 2 × 30.00
    let with_second = expect_json(
        fx.app
            .request(
                Method::POST,
                &format!("/api/v1/material-requests/{id}/items"),
                Some(&fx.requester.token),
                Some(json!({
                    "description": "Grease cartridge",
                    "unit_of_measure": "pc",
                    "quantity": "2",
                    "unit_price": "30.00"
                })),
            )
            .await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(with_second["total"], "552.00");
    let items = with_second["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    let second_id = items
        .iter()
        .find(|item| item["description"] == "Grease cartridge")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Removing it restores the original total
    let without_second = expect_json(
        fx.app
            .request(
                Method::DELETE,
                &format!("/api/v1/material-requests/{id}/items/{second_id}"),
                Some(&fx.requester.token),
                None,
            )
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(without_second["total"], "492.00");

    // Items are frozen once submitted
    fx.transition(&id, "submit", &fx.requester.token, None).await;
    let response = fx
        .app
        .request(
            Method::POST,
            &format!("/api/v1/material-requests/{id}/items"),
            Some(&fx.requester.token),
            Some(json!({
                "description": "Late addition",
                "unit_of_measure": "pc",
                "quantity": "1",
                "unit_price": "1.00"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn document_numbers_increment_per_business_unit() {
    let fx = WorkflowFixture::new().await;

    let first = fx.create_draft("ITEM").await;
    let second = fx.create_draft("ITEM").await;
    assert_eq!(first["doc_number"], "MR-MAIN-000001");
    assert_eq!(second["doc_number"], "MR-MAIN-000002");

    // A different business unit starts its own series
    let bu = expect_json(
        fx.app
            .request(
                Method::POST,
                "/api/v1/business-units",
                Some(&fx.admin.token),
                Some(json!({ "code": "WEST", "name": "West Plant" })),
            )
            .await,
        StatusCode::CREATED,
    )
    .await;
    let west_id = bu["id"].as_str().unwrap();
    let dept = expect_json(
        fx.app
            .request(
                Method::POST,
                &format!("/api/v1/business-units/{west_id}/departments"),
                Some(&fx.admin.token),
                Some(json!({ "code": "OPS", "name": "Operations" })),
            )
            .await,
        StatusCode::CREATED,
    )
    .await;

    let west_draft = expect_json(
        fx.app
            .request(
                Method::POST,
                "/api/v1/material-requests",
                Some(&fx.requester.token),
                Some(json!({
                    "business_unit_id": west_id,
                    "department_id": dept["id"],
                    "request_type": "ITEM",
                    "required_date": "2026-09-15",
                    "items": [{
                        "description": "Pallet jack",
                        "unit_of_measure": "pc",
                        "quantity": "1",
                        "unit_price": "850.00"
                    }]
                })),
            )
            .await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(west_draft["doc_number"], "MR-WEST-000001");
}

#[tokio::test]
async fn list_filters_by_status_and_business_unit() {
    let fx = WorkflowFixture::new().await;

    let draft = fx.create_draft("ITEM").await;
    let submitted_id = draft["id"].as_str().unwrap().to_string();
    fx.transition(&submitted_id, "submit", &fx.requester.token, None)
        .await;
    fx.create_draft("ITEM").await;

    let listed = expect_json(
        fx.app
            .request(
                Method::GET,
                &format!(
                    "/api/v1/material-requests?business_unit_id={}&status=FOR_REC_APPROVAL",
                    fx.business_unit_id
                ),
                Some(&fx.requester.token),
                None,
            )
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["requests"][0]["id"], submitted_id.as_str());

    let all = expect_json(
        fx.app
            .request(
                Method::GET,
                &format!(
                    "/api/v1/material-requests?business_unit_id={}",
                    fx.business_unit_id
                ),
                Some(&fx.requester.token),
                None,
            )
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(all["total"], 2);
}

#[tokio::test]
async fn drafts_can_be_deleted_but_submitted_requests_cannot() {
    let fx = WorkflowFixture::new().await;

    let draft = fx.create_draft("ITEM").await;
    let id = draft["id"].as_str().unwrap().to_string();

    let response = fx
        .app
        .request(
            Method::DELETE,
            &format!("/api/v1/material-requests/{id}"),
            Some(&fx.requester.token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let second = fx.create_draft("ITEM").await;
    let second_id = second["id"].as_str().unwrap().to_string();
    fx.transition(&second_id, "submit", &fx.requester.token, None)
        .await;

    let response = fx
        .app
        .request(
            Method::DELETE,
            &format!("/api/v1/material-requests/{second_id}"),
            Some(&fx.requester.token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("only DRAFT requests can be deleted"));
}
