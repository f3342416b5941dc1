//! The approval workflow for material requests.
//!
//! Status moves forward along
//! `DRAFT → FOR_REC_APPROVAL → (REC_APPROVED) → FOR_FINAL_APPROVAL →
//! FINAL_APPROVED → FOR_POSTING → POSTED → RECEIVED | TRANSMITTED`,
//! with `DISAPPROVED`, `FOR_EDIT`, and `CANCELLED` as the only side exits.
//! Every operation runs in one database transaction: guard checks first,
//! then the row update, so a rejected caller never leaves a partial write.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{consts as perm, AuthUser, Roles},
    db::DbPool,
    entities::material_request::{
        ActiveModel as RequestActiveModel, Entity as RequestEntity, Model as RequestModel,
        RequestStatus, RequestType,
    },
    entities::material_request_item::{self, Entity as ItemEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::material_requests::MaterialRequestResponse,
};

/// Whether a single status hop is part of the workflow graph.
///
/// This covers every edge, including the automatic forwarding hops
/// (`REC_APPROVED → FOR_FINAL_APPROVAL | FOR_POSTING` and
/// `FINAL_APPROVED → FOR_POSTING`) that run inside the same transaction as
/// the sign-off that triggered them.
pub fn is_valid_transition(from: RequestStatus, to: RequestStatus) -> bool {
    use RequestStatus::*;
    match (from, to) {
        // Submission
        (Draft, ForRecApproval) => true,
        (ForEdit, ForRecApproval) => true,

        // First-stage sign-off and its automatic forwarding
        (ForRecApproval, RecApproved) => true,
        (RecApproved, ForFinalApproval) => true,
        (RecApproved, ForPosting) => true,

        // Second-stage sign-off and its automatic forwarding
        (ForFinalApproval, FinalApproved) => true,
        (FinalApproved, ForPosting) => true,

        // Posting pipeline
        (ForPosting, Posted) => true,
        (Posted, Received) => true,
        (Posted, Transmitted) => true,

        // Disapproval at either approval stage
        (ForRecApproval, Disapproved) => true,
        (ForFinalApproval, Disapproved) => true,

        // Recall for edit
        (ForRecApproval, ForEdit) => true,
        (Disapproved, ForEdit) => true,

        // Cancellation before the posting pipeline
        (Draft, Cancelled) => true,
        (ForEdit, Cancelled) => true,
        (ForRecApproval, Cancelled) => true,
        (Disapproved, Cancelled) => true,

        _ => false,
    }
}

/// Service applying workflow transitions to material requests.
#[derive(Clone)]
pub struct ApprovalService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ApprovalService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    async fn emit(&self, event: Event) {
        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, "Failed to send domain event");
            }
        }
    }

    async fn emit_status_change(
        &self,
        request_id: Uuid,
        old_status: RequestStatus,
        new_status: RequestStatus,
    ) {
        self.emit(Event::RequestStatusChanged {
            request_id,
            old_status: old_status.to_string(),
            new_status: new_status.to_string(),
        })
        .await;
    }

    /// Submit a draft (or recalled) request for recommending approval.
    ///
    /// Requires at least one line item; clears any previous disapproval
    /// reason so the document re-enters the pipeline clean.
    #[instrument(skip(self, caller), fields(request_id = %request_id))]
    pub async fn submit(
        &self,
        request_id: Uuid,
        caller: &AuthUser,
    ) -> Result<MaterialRequestResponse, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let request = load_request(&txn, request_id).await?;
        ensure_owner(&request, caller)?;
        let from = ensure_transition(&request, RequestStatus::ForRecApproval)?;

        let item_count = ItemEntity::find()
            .filter(material_request_item::Column::RequestId.eq(request_id))
            .count(&txn)
            .await?;
        if item_count == 0 {
            return Err(ServiceError::ValidationError(
                "a request needs at least one line item before submission".to_string(),
            ));
        }

        let mut active: RequestActiveModel = request.into();
        active.disapproval_reason = Set(None);
        let updated =
            apply_transition(&txn, active, RequestStatus::ForRecApproval).await?;

        txn.commit().await?;

        info!(request_id = %request_id, "Request submitted for recommending approval");
        self.emit(Event::RequestSubmitted(request_id)).await;
        self.emit_status_change(request_id, from, RequestStatus::ForRecApproval)
            .await;

        Ok(updated.into())
    }

    /// First-stage sign-off.
    ///
    /// Lands on `REC_APPROVED` and auto-forwards in the same transaction:
    /// to `FOR_FINAL_APPROVAL` when a final approver is assigned, otherwise
    /// straight to `FOR_POSTING` with the approval date set.
    #[instrument(skip(self, caller), fields(request_id = %request_id))]
    pub async fn recommend_approve(
        &self,
        request_id: Uuid,
        caller: &AuthUser,
    ) -> Result<MaterialRequestResponse, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let request = load_request(&txn, request_id).await?;
        let caller_id = ensure_stage_approver(
            &request,
            caller,
            Roles::RECOMMENDING_APPROVER,
            perm::REQUESTS_APPROVE_RECOMMEND,
            request.recommending_approver_id,
        )?;
        let from = ensure_transition(&request, RequestStatus::RecApproved)?;

        let landing = if request.final_approver_id.is_some() {
            RequestStatus::ForFinalApproval
        } else {
            RequestStatus::ForPosting
        };

        let mut active: RequestActiveModel = request.into();
        active.recommending_approver_id = Set(Some(caller_id));
        if landing == RequestStatus::ForPosting {
            active.approved_date = Set(Some(Utc::now().date_naive()));
        }
        let updated = apply_transition(&txn, active, landing).await?;

        txn.commit().await?;

        info!(request_id = %request_id, landing = %landing, "Recommending approval granted");
        self.emit(Event::RequestRecommended(request_id)).await;
        self.emit_status_change(request_id, from, landing).await;

        Ok(updated.into())
    }

    /// Second-stage sign-off. With `auto_post` (the default on the HTTP
    /// surface) the document moves straight into the posting queue.
    #[instrument(skip(self, caller), fields(request_id = %request_id, auto_post))]
    pub async fn final_approve(
        &self,
        request_id: Uuid,
        caller: &AuthUser,
        auto_post: bool,
    ) -> Result<MaterialRequestResponse, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let request = load_request(&txn, request_id).await?;
        let caller_id = ensure_stage_approver(
            &request,
            caller,
            Roles::FINAL_APPROVER,
            perm::REQUESTS_APPROVE_FINAL,
            request.final_approver_id,
        )?;
        let from = ensure_transition(&request, RequestStatus::FinalApproved)?;

        let landing = if auto_post {
            RequestStatus::ForPosting
        } else {
            RequestStatus::FinalApproved
        };

        let mut active: RequestActiveModel = request.into();
        active.final_approver_id = Set(Some(caller_id));
        active.approved_date = Set(Some(Utc::now().date_naive()));
        let updated = apply_transition(&txn, active, landing).await?;

        txn.commit().await?;

        info!(request_id = %request_id, landing = %landing, "Final approval granted");
        self.emit(Event::RequestApproved(request_id)).await;
        self.emit_status_change(request_id, from, landing).await;

        Ok(updated.into())
    }

    /// Push a `FINAL_APPROVED` document into the posting queue when the
    /// approver opted out of auto-posting.
    #[instrument(skip(self, caller), fields(request_id = %request_id))]
    pub async fn queue_for_posting(
        &self,
        request_id: Uuid,
        caller: &AuthUser,
    ) -> Result<MaterialRequestResponse, ServiceError> {
        self.simple_transition(
            request_id,
            caller,
            RequestStatus::ForPosting,
            StageGate::Poster,
        )
        .await
    }

    /// Disapprove at either approval stage. The reason is mandatory and is
    /// stored on the document.
    #[instrument(skip(self, caller, reason), fields(request_id = %request_id))]
    pub async fn disapprove(
        &self,
        request_id: Uuid,
        caller: &AuthUser,
        reason: String,
    ) -> Result<MaterialRequestResponse, ServiceError> {
        let reason = reason.trim().to_string();
        if reason.is_empty() {
            return Err(ServiceError::ValidationError(
                "a disapproval reason is required".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let request = load_request(&txn, request_id).await?;
        let status = request.status()?;

        // The approver for the stage the document currently sits in
        match status {
            RequestStatus::ForRecApproval => {
                ensure_stage_approver(
                    &request,
                    caller,
                    Roles::RECOMMENDING_APPROVER,
                    perm::REQUESTS_APPROVE_RECOMMEND,
                    request.recommending_approver_id,
                )?;
            }
            RequestStatus::ForFinalApproval => {
                ensure_stage_approver(
                    &request,
                    caller,
                    Roles::FINAL_APPROVER,
                    perm::REQUESTS_APPROVE_FINAL,
                    request.final_approver_id,
                )?;
            }
            other => {
                return Err(ServiceError::InvalidStatus(format!(
                    "cannot disapprove a request in status {other}"
                )));
            }
        }

        let mut active: RequestActiveModel = request.into();
        active.disapproval_reason = Set(Some(reason.clone()));
        let updated = apply_transition(&txn, active, RequestStatus::Disapproved).await?;

        txn.commit().await?;

        info!(request_id = %request_id, "Request disapproved");
        self.emit(Event::RequestDisapproved { request_id, reason })
            .await;
        self.emit_status_change(request_id, status, RequestStatus::Disapproved)
            .await;

        Ok(updated.into())
    }

    /// Pull a pending or disapproved request back for editing.
    #[instrument(skip(self, caller), fields(request_id = %request_id))]
    pub async fn recall_for_edit(
        &self,
        request_id: Uuid,
        caller: &AuthUser,
    ) -> Result<MaterialRequestResponse, ServiceError> {
        let response = self
            .simple_transition(request_id, caller, RequestStatus::ForEdit, StageGate::Owner)
            .await?;
        self.emit(Event::RequestRecalled(request_id)).await;
        Ok(response)
    }

    /// Post a request, marking it committed and stamping the posting date.
    #[instrument(skip(self, caller), fields(request_id = %request_id))]
    pub async fn post(
        &self,
        request_id: Uuid,
        caller: &AuthUser,
    ) -> Result<MaterialRequestResponse, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let request = load_request(&txn, request_id).await?;
        ensure_role(caller, Roles::POSTER, perm::REQUESTS_POST)?;
        let from = ensure_transition(&request, RequestStatus::Posted)?;

        let mut active: RequestActiveModel = request.into();
        active.posted_date = Set(Some(Utc::now().date_naive()));
        let updated = apply_transition(&txn, active, RequestStatus::Posted).await?;

        txn.commit().await?;

        info!(request_id = %request_id, "Request posted");
        self.emit(Event::RequestPosted(request_id)).await;
        self.emit_status_change(request_id, from, RequestStatus::Posted)
            .await;

        Ok(updated.into())
    }

    /// Close out a posted ITEM request as received.
    #[instrument(skip(self, caller), fields(request_id = %request_id))]
    pub async fn receive(
        &self,
        request_id: Uuid,
        caller: &AuthUser,
    ) -> Result<MaterialRequestResponse, ServiceError> {
        let response = self
            .close_posted(request_id, caller, RequestType::Item, RequestStatus::Received)
            .await?;
        self.emit(Event::RequestReceived(request_id)).await;
        Ok(response)
    }

    /// Close out a posted SERVICE request as transmitted.
    #[instrument(skip(self, caller), fields(request_id = %request_id))]
    pub async fn transmit(
        &self,
        request_id: Uuid,
        caller: &AuthUser,
    ) -> Result<MaterialRequestResponse, ServiceError> {
        let response = self
            .close_posted(
                request_id,
                caller,
                RequestType::Service,
                RequestStatus::Transmitted,
            )
            .await?;
        self.emit(Event::RequestTransmitted(request_id)).await;
        Ok(response)
    }

    /// Cancel a request before it enters the posting pipeline.
    #[instrument(skip(self, caller), fields(request_id = %request_id))]
    pub async fn cancel(
        &self,
        request_id: Uuid,
        caller: &AuthUser,
    ) -> Result<MaterialRequestResponse, ServiceError> {
        let response = self
            .simple_transition(
                request_id,
                caller,
                RequestStatus::Cancelled,
                StageGate::Owner,
            )
            .await?;
        self.emit(Event::RequestCancelled(request_id)).await;
        Ok(response)
    }

    async fn close_posted(
        &self,
        request_id: Uuid,
        caller: &AuthUser,
        expected_type: RequestType,
        landing: RequestStatus,
    ) -> Result<MaterialRequestResponse, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let request = load_request(&txn, request_id).await?;
        ensure_role(caller, Roles::POSTER, perm::REQUESTS_POST)?;
        let from = ensure_transition(&request, landing)?;

        let request_type = request.request_type()?;
        if request_type != expected_type {
            return Err(ServiceError::InvalidOperation(format!(
                "a {request_type} request cannot move to {landing}"
            )));
        }

        let updated = apply_transition(&txn, request.into(), landing).await?;

        txn.commit().await?;

        info!(request_id = %request_id, landing = %landing, "Posted request closed out");
        self.emit_status_change(request_id, from, landing).await;

        Ok(updated.into())
    }

    async fn simple_transition(
        &self,
        request_id: Uuid,
        caller: &AuthUser,
        landing: RequestStatus,
        gate: StageGate,
    ) -> Result<MaterialRequestResponse, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let request = load_request(&txn, request_id).await?;
        match gate {
            StageGate::Owner => ensure_owner(&request, caller)?,
            StageGate::Poster => ensure_role(caller, Roles::POSTER, perm::REQUESTS_POST)?,
        }
        let from = ensure_transition(&request, landing)?;

        let updated = apply_transition(&txn, request.into(), landing).await?;

        txn.commit().await?;

        info!(request_id = %request_id, from = %from, landing = %landing, "Request transitioned");
        self.emit_status_change(request_id, from, landing).await;

        Ok(updated.into())
    }
}

enum StageGate {
    Owner,
    Poster,
}

async fn load_request<C: ConnectionTrait>(
    conn: &C,
    request_id: Uuid,
) -> Result<RequestModel, ServiceError> {
    RequestEntity::find_by_id(request_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Material request {request_id} not found")))
}

/// Owner gate: the requester, or an admin.
fn ensure_owner(request: &RequestModel, caller: &AuthUser) -> Result<(), ServiceError> {
    if caller.is_admin() {
        return Ok(());
    }
    let caller_id = caller
        .id()
        .map_err(|_| ServiceError::Unauthorized("invalid token subject".to_string()))?;
    if request.requested_by != caller_id {
        return Err(ServiceError::Forbidden(
            "only the requester may perform this action".to_string(),
        ));
    }
    Ok(())
}

/// Role gate without stage assignment.
fn ensure_role(caller: &AuthUser, role: &str, permission: &str) -> Result<(), ServiceError> {
    if caller.is_admin() {
        return Ok(());
    }
    if !caller.has_role(role) || !caller.has_permission(permission) {
        return Err(ServiceError::Forbidden(format!(
            "the {role} role is required for this action"
        )));
    }
    Ok(())
}

/// Stage-approver gate: the caller must hold the stage's role, and when the
/// document names an approver for the stage, must be that approver. When no
/// approver is assigned, any holder of the role may act and is recorded as
/// the approver. Returns the caller's id for that recording.
fn ensure_stage_approver(
    request: &RequestModel,
    caller: &AuthUser,
    role: &str,
    permission: &str,
    assigned: Option<Uuid>,
) -> Result<Uuid, ServiceError> {
    let caller_id = caller
        .id()
        .map_err(|_| ServiceError::Unauthorized("invalid token subject".to_string()))?;

    if caller.is_admin() {
        return Ok(assigned.unwrap_or(caller_id));
    }

    if !caller.has_role(role) || !caller.has_permission(permission) {
        return Err(ServiceError::Forbidden(format!(
            "the {role} role is required for this action"
        )));
    }
    if let Some(assigned_id) = assigned {
        if assigned_id != caller_id {
            warn!(
                request_id = %request.id,
                assigned = %assigned_id,
                caller = %caller_id,
                "Caller is not the assigned approver"
            );
            return Err(ServiceError::Forbidden(
                "only the assigned approver may act on this request".to_string(),
            ));
        }
    }
    Ok(caller_id)
}

/// Validate that the document may move toward `target` from its current
/// status, returning the current status.
fn ensure_transition(
    request: &RequestModel,
    target: RequestStatus,
) -> Result<RequestStatus, ServiceError> {
    let from = request.status()?;
    if !is_valid_transition(from, target) {
        return Err(ServiceError::InvalidStatus(format!(
            "cannot transition from {from} to {target}"
        )));
    }
    Ok(from)
}

async fn apply_transition<C: ConnectionTrait>(
    conn: &C,
    mut active: RequestActiveModel,
    landing: RequestStatus,
) -> Result<RequestModel, ServiceError> {
    let version = *active.version.as_ref();
    active.status = Set(landing.to_string());
    active.version = Set(version + 1);
    active.updated_at = Set(Some(Utc::now()));
    Ok(active.update(conn).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{role_permissions, Roles};
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn auth_user(id: Uuid, role: &str) -> AuthUser {
        AuthUser {
            user_id: id.to_string(),
            name: None,
            email: None,
            roles: vec![role.to_string()],
            permissions: role_permissions(role),
            token_id: "test".to_string(),
        }
    }

    fn request_model(requested_by: Uuid, status: RequestStatus) -> RequestModel {
        let now = Utc::now();
        RequestModel {
            id: Uuid::new_v4(),
            doc_number: "MR-MAIN-000001".to_string(),
            series: 1,
            request_type: RequestType::Item.to_string(),
            status: status.to_string(),
            business_unit_id: Uuid::new_v4(),
            department_id: Uuid::new_v4(),
            requested_by,
            recommending_approver_id: None,
            final_approver_id: None,
            prepared_date: now.date_naive(),
            required_date: now.date_naive(),
            approved_date: None,
            posted_date: None,
            freight: dec!(0),
            discount: dec!(0),
            total: dec!(0),
            disapproval_reason: None,
            remarks: None,
            created_at: now,
            updated_at: Some(now),
            version: 1,
        }
    }

    // Forward path
    #[test_case(RequestStatus::Draft, RequestStatus::ForRecApproval, true)]
    #[test_case(RequestStatus::ForEdit, RequestStatus::ForRecApproval, true)]
    #[test_case(RequestStatus::ForRecApproval, RequestStatus::RecApproved, true)]
    #[test_case(RequestStatus::RecApproved, RequestStatus::ForFinalApproval, true)]
    #[test_case(RequestStatus::RecApproved, RequestStatus::ForPosting, true)]
    #[test_case(RequestStatus::ForFinalApproval, RequestStatus::FinalApproved, true)]
    #[test_case(RequestStatus::FinalApproved, RequestStatus::ForPosting, true)]
    #[test_case(RequestStatus::ForPosting, RequestStatus::Posted, true)]
    #[test_case(RequestStatus::Posted, RequestStatus::Received, true)]
    #[test_case(RequestStatus::Posted, RequestStatus::Transmitted, true)]
    // Side exits
    #[test_case(RequestStatus::ForRecApproval, RequestStatus::Disapproved, true)]
    #[test_case(RequestStatus::ForFinalApproval, RequestStatus::Disapproved, true)]
    #[test_case(RequestStatus::ForRecApproval, RequestStatus::ForEdit, true)]
    #[test_case(RequestStatus::Disapproved, RequestStatus::ForEdit, true)]
    #[test_case(RequestStatus::Draft, RequestStatus::Cancelled, true)]
    #[test_case(RequestStatus::ForRecApproval, RequestStatus::Cancelled, true)]
    // Monotonicity: no skipping or moving backwards
    #[test_case(RequestStatus::Draft, RequestStatus::Posted, false)]
    #[test_case(RequestStatus::Draft, RequestStatus::ForFinalApproval, false)]
    #[test_case(RequestStatus::ForRecApproval, RequestStatus::Draft, false)]
    #[test_case(RequestStatus::Posted, RequestStatus::Cancelled, false)]
    #[test_case(RequestStatus::Posted, RequestStatus::Draft, false)]
    #[test_case(RequestStatus::Received, RequestStatus::Posted, false)]
    #[test_case(RequestStatus::Cancelled, RequestStatus::ForRecApproval, false)]
    #[test_case(RequestStatus::FinalApproved, RequestStatus::Disapproved, false)]
    fn transition_table(from: RequestStatus, to: RequestStatus, expected: bool) {
        assert_eq!(is_valid_transition(from, to), expected);
    }

    #[test]
    fn terminal_statuses_have_no_outgoing_edges() {
        use strum::IntoEnumIterator;
        for terminal in [
            RequestStatus::Received,
            RequestStatus::Transmitted,
            RequestStatus::Cancelled,
        ] {
            for target in RequestStatus::iter() {
                assert!(
                    !is_valid_transition(terminal, target),
                    "{terminal} must not transition to {target}"
                );
            }
        }
    }

    #[test]
    fn owner_gate_rejects_other_users() {
        let owner = Uuid::new_v4();
        let request = request_model(owner, RequestStatus::Draft);

        assert!(ensure_owner(&request, &auth_user(owner, Roles::REQUESTER)).is_ok());
        assert!(ensure_owner(&request, &auth_user(Uuid::new_v4(), Roles::REQUESTER)).is_err());
        // Admins bypass ownership
        assert!(ensure_owner(&request, &auth_user(Uuid::new_v4(), Roles::ADMIN)).is_ok());
    }

    #[test]
    fn stage_gate_requires_role_and_assignment() {
        let approver = Uuid::new_v4();
        let mut request = request_model(Uuid::new_v4(), RequestStatus::ForRecApproval);
        request.recommending_approver_id = Some(approver);

        // The assigned approver with the right role passes
        assert!(ensure_stage_approver(
            &request,
            &auth_user(approver, Roles::RECOMMENDING_APPROVER),
            Roles::RECOMMENDING_APPROVER,
            perm::REQUESTS_APPROVE_RECOMMEND,
            request.recommending_approver_id,
        )
        .is_ok());

        // Right role, wrong person
        assert!(ensure_stage_approver(
            &request,
            &auth_user(Uuid::new_v4(), Roles::RECOMMENDING_APPROVER),
            Roles::RECOMMENDING_APPROVER,
            perm::REQUESTS_APPROVE_RECOMMEND,
            request.recommending_approver_id,
        )
        .is_err());

        // Right person, wrong role
        assert!(ensure_stage_approver(
            &request,
            &auth_user(approver, Roles::REQUESTER),
            Roles::RECOMMENDING_APPROVER,
            perm::REQUESTS_APPROVE_RECOMMEND,
            request.recommending_approver_id,
        )
        .is_err());

        // Unassigned stage: any holder of the role may act
        request.recommending_approver_id = None;
        assert!(ensure_stage_approver(
            &request,
            &auth_user(Uuid::new_v4(), Roles::RECOMMENDING_APPROVER),
            Roles::RECOMMENDING_APPROVER,
            perm::REQUESTS_APPROVE_RECOMMEND,
            None,
        )
        .is_ok());
    }

    #[test]
    fn ensure_transition_reports_current_status() {
        let request = request_model(Uuid::new_v4(), RequestStatus::Draft);
        assert_eq!(
            ensure_transition(&request, RequestStatus::ForRecApproval).unwrap(),
            RequestStatus::Draft
        );

        let err = ensure_transition(&request, RequestStatus::Posted).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidStatus(_)));
    }
}
