use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::business_unit::Entity as BusinessUnitEntity,
    entities::department::Entity as DepartmentEntity,
    entities::material_request::{
        self, ActiveModel as RequestActiveModel, Entity as RequestEntity, Model as RequestModel,
        RequestStatus, RequestType,
    },
    entities::material_request_item::{
        self, ActiveModel as ItemActiveModel, Entity as ItemEntity, Model as ItemModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Request/Response types for the material request service

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateItemInput {
    /// Catalog code; omit for items not yet cataloged.
    pub item_code: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Description is required"))]
    pub description: String,
    #[validate(length(min = 1, max = 16, message = "Unit of measure is required"))]
    pub unit_of_measure: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateMaterialRequestRequest {
    pub business_unit_id: Uuid,
    pub department_id: Uuid,
    pub request_type: RequestType,
    pub required_date: NaiveDate,
    pub recommending_approver_id: Option<Uuid>,
    pub final_approver_id: Option<Uuid>,
    pub freight: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub remarks: Option<String>,
    #[validate]
    #[serde(default)]
    pub items: Vec<CreateItemInput>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateMaterialRequestRequest {
    pub required_date: Option<NaiveDate>,
    pub recommending_approver_id: Option<Uuid>,
    pub final_approver_id: Option<Uuid>,
    pub freight: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub remarks: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemResponse {
    pub id: Uuid,
    pub request_id: Uuid,
    pub item_code: Option<String>,
    pub description: String,
    pub unit_of_measure: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl From<ItemModel> for ItemResponse {
    fn from(model: ItemModel) -> Self {
        Self {
            id: model.id,
            request_id: model.request_id,
            item_code: model.item_code,
            description: model.description,
            unit_of_measure: model.unit_of_measure,
            quantity: model.quantity,
            unit_price: model.unit_price,
            line_total: model.line_total,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MaterialRequestResponse {
    pub id: Uuid,
    pub doc_number: String,
    pub series: i64,
    pub request_type: String,
    pub status: String,
    pub business_unit_id: Uuid,
    pub department_id: Uuid,
    pub requested_by: Uuid,
    pub recommending_approver_id: Option<Uuid>,
    pub final_approver_id: Option<Uuid>,
    pub prepared_date: NaiveDate,
    pub required_date: NaiveDate,
    pub approved_date: Option<NaiveDate>,
    pub posted_date: Option<NaiveDate>,
    pub freight: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub disapproval_reason: Option<String>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemResponse>>,
}

impl From<RequestModel> for MaterialRequestResponse {
    fn from(model: RequestModel) -> Self {
        Self {
            id: model.id,
            doc_number: model.doc_number,
            series: model.series,
            request_type: model.request_type,
            status: model.status,
            business_unit_id: model.business_unit_id,
            department_id: model.department_id,
            requested_by: model.requested_by,
            recommending_approver_id: model.recommending_approver_id,
            final_approver_id: model.final_approver_id,
            prepared_date: model.prepared_date,
            required_date: model.required_date,
            approved_date: model.approved_date,
            posted_date: model.posted_date,
            freight: model.freight,
            discount: model.discount,
            total: model.total,
            disapproval_reason: model.disapproval_reason,
            remarks: model.remarks,
            created_at: model.created_at,
            updated_at: model.updated_at,
            version: model.version,
            items: None,
        }
    }
}

impl MaterialRequestResponse {
    pub fn with_items(model: RequestModel, items: Vec<ItemModel>) -> Self {
        let mut response: Self = model.into();
        response.items = Some(items.into_iter().map(ItemResponse::from).collect());
        response
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MaterialRequestListResponse {
    pub requests: Vec<MaterialRequestResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Optional filters for list queries.
#[derive(Debug, Default, Deserialize)]
pub struct RequestFilters {
    pub business_unit_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub status: Option<RequestStatus>,
    pub requested_by: Option<Uuid>,
}

/// total = Σ(quantity × unit_price) + freight − discount
pub fn compute_total(line_totals: &[Decimal], freight: Decimal, discount: Decimal) -> Decimal {
    line_totals.iter().copied().sum::<Decimal>() + freight - discount
}

pub fn line_total(quantity: Decimal, unit_price: Decimal) -> Decimal {
    quantity * unit_price
}

/// Service for managing material request documents and their line items.
///
/// Status transitions live in [`crate::services::approval::ApprovalService`];
/// this service only ever touches documents in an editable status.
#[derive(Clone)]
pub struct MaterialRequestService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl MaterialRequestService {
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

    /// Creates a new material request in DRAFT status, assigning the next
    /// document number in the business unit's series.
    #[instrument(skip(self, request, caller), fields(business_unit_id = %request.business_unit_id))]
    pub async fn create_request(
        &self,
        request: CreateMaterialRequestRequest,
        caller: &AuthUser,
    ) -> Result<MaterialRequestResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        let requester_id = caller
            .id()
            .map_err(|_| ServiceError::Unauthorized("invalid token subject".to_string()))?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let today = now.date_naive();
        let request_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for request creation");
            ServiceError::DatabaseError(e)
        })?;

        let business_unit = BusinessUnitEntity::find_by_id(request.business_unit_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Business unit not found".to_string()))?;
        if !business_unit.active {
            return Err(ServiceError::ValidationError(
                "Business unit is inactive".to_string(),
            ));
        }

        let dept = DepartmentEntity::find_by_id(request.department_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Department not found".to_string()))?;
        if dept.business_unit_id != business_unit.id {
            return Err(ServiceError::ValidationError(
                "Department does not belong to the business unit".to_string(),
            ));
        }

        // Next series number for this business unit
        let series = RequestEntity::find()
            .filter(material_request::Column::BusinessUnitId.eq(business_unit.id))
            .order_by_desc(material_request::Column::Series)
            .one(&txn)
            .await?
            .map(|latest| latest.series + 1)
            .unwrap_or(1);
        let doc_number = format!("MR-{}-{:06}", business_unit.code, series);

        let freight = request.freight.unwrap_or_default();
        let discount = request.discount.unwrap_or_default();

        let mut line_totals = Vec::with_capacity(request.items.len());
        for item in &request.items {
            validate_item_amounts(item.quantity, item.unit_price)?;
            line_totals.push(line_total(item.quantity, item.unit_price));
        }
        let total = compute_total(&line_totals, freight, discount);

        let request_active_model = RequestActiveModel {
            id: Set(request_id),
            doc_number: Set(doc_number),
            series: Set(series),
            request_type: Set(request.request_type.to_string()),
            status: Set(RequestStatus::Draft.to_string()),
            business_unit_id: Set(business_unit.id),
            department_id: Set(dept.id),
            requested_by: Set(requester_id),
            recommending_approver_id: Set(request.recommending_approver_id),
            final_approver_id: Set(request.final_approver_id),
            prepared_date: Set(today),
            required_date: Set(request.required_date),
            approved_date: Set(None),
            posted_date: Set(None),
            freight: Set(freight),
            discount: Set(discount),
            total: Set(total),
            disapproval_reason: Set(None),
            remarks: Set(request.remarks),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            version: Set(1),
        };

        let request_model = request_active_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, request_id = %request_id, "Failed to create material request");
            ServiceError::DatabaseError(e)
        })?;

        let mut item_models = Vec::with_capacity(request.items.len());
        for (item, line_total) in request.items.into_iter().zip(line_totals) {
            let item_active_model = ItemActiveModel {
                id: Set(Uuid::new_v4()),
                request_id: Set(request_id),
                item_code: Set(item.item_code),
                description: Set(item.description),
                unit_of_measure: Set(item.unit_of_measure),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                line_total: Set(line_total),
                ..Default::default()
            };
            item_models.push(item_active_model.insert(&txn).await?);
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, request_id = %request_id, "Failed to commit request creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            request_id = %request_id,
            doc_number = %request_model.doc_number,
            "Material request created"
        );
        self.emit(Event::RequestCreated(request_id)).await;

        Ok(MaterialRequestResponse::with_items(
            request_model,
            item_models,
        ))
    }

    /// Retrieves a material request with its line items.
    #[instrument(skip(self), fields(request_id = %request_id))]
    pub async fn get_request(
        &self,
        request_id: Uuid,
    ) -> Result<Option<MaterialRequestResponse>, ServiceError> {
        let db = &*self.db_pool;

        let Some(request_model) = RequestEntity::find_by_id(request_id).one(db).await? else {
            return Ok(None);
        };

        let items = ItemEntity::find()
            .filter(material_request_item::Column::RequestId.eq(request_id))
            .order_by_asc(material_request_item::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(Some(MaterialRequestResponse::with_items(
            request_model,
            items,
        )))
    }

    /// Lists material requests with pagination and optional filters.
    #[instrument(skip(self, filters))]
    pub async fn list_requests(
        &self,
        filters: RequestFilters,
        page: u64,
        per_page: u64,
    ) -> Result<MaterialRequestListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = RequestEntity::find();
        if let Some(bu) = filters.business_unit_id {
            query = query.filter(material_request::Column::BusinessUnitId.eq(bu));
        }
        if let Some(dept) = filters.department_id {
            query = query.filter(material_request::Column::DepartmentId.eq(dept));
        }
        if let Some(status) = filters.status {
            query = query.filter(material_request::Column::Status.eq(status.to_string()));
        }
        if let Some(requester) = filters.requested_by {
            query = query.filter(material_request::Column::RequestedBy.eq(requester));
        }

        let paginator = query
            .order_by_desc(material_request::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await?;
        let requests = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(MaterialRequestListResponse {
            requests: requests
                .into_iter()
                .map(MaterialRequestResponse::from)
                .collect(),
            total,
            page,
            per_page,
        })
    }

    /// Updates the editable header fields of a DRAFT / FOR_EDIT request and
    /// recomputes the document total.
    #[instrument(skip(self, update, caller), fields(request_id = %request_id))]
    pub async fn update_request(
        &self,
        request_id: Uuid,
        update: UpdateMaterialRequestRequest,
        caller: &AuthUser,
    ) -> Result<MaterialRequestResponse, ServiceError> {
        update
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let request_model = find_editable_owned(&txn, request_id, caller).await?;

        let mut active: RequestActiveModel = request_model.into();
        if let Some(required_date) = update.required_date {
            active.required_date = Set(required_date);
        }
        if let Some(approver) = update.recommending_approver_id {
            active.recommending_approver_id = Set(Some(approver));
        }
        if let Some(approver) = update.final_approver_id {
            active.final_approver_id = Set(Some(approver));
        }
        if let Some(freight) = update.freight {
            validate_non_negative("freight", freight)?;
            active.freight = Set(freight);
        }
        if let Some(discount) = update.discount {
            validate_non_negative("discount", discount)?;
            active.discount = Set(discount);
        }
        if let Some(remarks) = update.remarks {
            active.remarks = Set(Some(remarks));
        }

        let updated = touch_and_update(&txn, active).await?;
        let updated = recompute_total(&txn, updated).await?;

        txn.commit().await?;

        info!(request_id = %request_id, "Material request updated");
        self.emit(Event::RequestUpdated(request_id)).await;

        Ok(updated.into())
    }

    /// Deletes a request while it is still a draft.
    #[instrument(skip(self, caller), fields(request_id = %request_id))]
    pub async fn delete_request(
        &self,
        request_id: Uuid,
        caller: &AuthUser,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let request_model = RequestEntity::find_by_id(request_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Material request not found".to_string()))?;

        ensure_owner(&request_model, caller)?;
        let status = request_model.status()?;
        if status != RequestStatus::Draft {
            return Err(ServiceError::InvalidStatus(format!(
                "only DRAFT requests can be deleted (current status: {status})"
            )));
        }

        ItemEntity::delete_many()
            .filter(material_request_item::Column::RequestId.eq(request_id))
            .exec(&txn)
            .await?;
        RequestEntity::delete_by_id(request_id).exec(&txn).await?;

        txn.commit().await?;

        info!(request_id = %request_id, "Material request deleted");
        self.emit(Event::RequestDeleted(request_id)).await;

        Ok(())
    }

    /// Adds a line item to an editable request and recomputes the total.
    #[instrument(skip(self, item, caller), fields(request_id = %request_id))]
    pub async fn add_item(
        &self,
        request_id: Uuid,
        item: CreateItemInput,
        caller: &AuthUser,
    ) -> Result<MaterialRequestResponse, ServiceError> {
        item.validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        validate_item_amounts(item.quantity, item.unit_price)?;

        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let request_model = find_editable_owned(&txn, request_id, caller).await?;

        let item_active_model = ItemActiveModel {
            id: Set(Uuid::new_v4()),
            request_id: Set(request_id),
            item_code: Set(item.item_code),
            description: Set(item.description),
            unit_of_measure: Set(item.unit_of_measure),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            line_total: Set(line_total(item.quantity, item.unit_price)),
            ..Default::default()
        };
        item_active_model.insert(&txn).await?;

        let updated = touch_and_update(&txn, request_model.into()).await?;
        let updated = recompute_total(&txn, updated).await?;
        let items = items_of(&txn, request_id).await?;

        txn.commit().await?;

        self.emit(Event::RequestUpdated(request_id)).await;
        Ok(MaterialRequestResponse::with_items(updated, items))
    }

    /// Updates a line item on an editable request and recomputes the total.
    #[instrument(skip(self, item, caller), fields(request_id = %request_id, item_id = %item_id))]
    pub async fn update_item(
        &self,
        request_id: Uuid,
        item_id: Uuid,
        item: CreateItemInput,
        caller: &AuthUser,
    ) -> Result<MaterialRequestResponse, ServiceError> {
        item.validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        validate_item_amounts(item.quantity, item.unit_price)?;

        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let request_model = find_editable_owned(&txn, request_id, caller).await?;

        let existing = ItemEntity::find_by_id(item_id)
            .one(&txn)
            .await?
            .filter(|row| row.request_id == request_id)
            .ok_or_else(|| ServiceError::NotFound("Line item not found".to_string()))?;

        let mut active: ItemActiveModel = existing.into();
        active.item_code = Set(item.item_code);
        active.description = Set(item.description);
        active.unit_of_measure = Set(item.unit_of_measure);
        active.quantity = Set(item.quantity);
        active.unit_price = Set(item.unit_price);
        active.line_total = Set(line_total(item.quantity, item.unit_price));
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await?;

        let updated = touch_and_update(&txn, request_model.into()).await?;
        let updated = recompute_total(&txn, updated).await?;
        let items = items_of(&txn, request_id).await?;

        txn.commit().await?;

        self.emit(Event::RequestUpdated(request_id)).await;
        Ok(MaterialRequestResponse::with_items(updated, items))
    }

    /// Removes a line item from an editable request and recomputes the total.
    #[instrument(skip(self, caller), fields(request_id = %request_id, item_id = %item_id))]
    pub async fn remove_item(
        &self,
        request_id: Uuid,
        item_id: Uuid,
        caller: &AuthUser,
    ) -> Result<MaterialRequestResponse, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let request_model = find_editable_owned(&txn, request_id, caller).await?;

        let existing = ItemEntity::find_by_id(item_id)
            .one(&txn)
            .await?
            .filter(|row| row.request_id == request_id)
            .ok_or_else(|| ServiceError::NotFound("Line item not found".to_string()))?;
        ItemEntity::delete_by_id(existing.id).exec(&txn).await?;

        let updated = touch_and_update(&txn, request_model.into()).await?;
        let updated = recompute_total(&txn, updated).await?;
        let items = items_of(&txn, request_id).await?;

        txn.commit().await?;

        self.emit(Event::RequestUpdated(request_id)).await;
        Ok(MaterialRequestResponse::with_items(updated, items))
    }

    /// Line items for a request, without the header.
    pub async fn list_items(&self, request_id: Uuid) -> Result<Vec<ItemResponse>, ServiceError> {
        let db = &*self.db_pool;
        let items = items_of(db, request_id).await?;
        Ok(items.into_iter().map(ItemResponse::from).collect())
    }
}

fn validate_non_negative(field: &str, value: Decimal) -> Result<(), ServiceError> {
    if value < Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "{field} must not be negative"
        )));
    }
    Ok(())
}

fn validate_item_amounts(quantity: Decimal, unit_price: Decimal) -> Result<(), ServiceError> {
    if quantity <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "quantity must be positive".to_string(),
        ));
    }
    validate_non_negative("unit_price", unit_price)
}

fn ensure_owner(request: &RequestModel, caller: &AuthUser) -> Result<(), ServiceError> {
    if caller.is_admin() {
        return Ok(());
    }
    let caller_id = caller
        .id()
        .map_err(|_| ServiceError::Unauthorized("invalid token subject".to_string()))?;
    if request.requested_by != caller_id {
        return Err(ServiceError::Forbidden(
            "only the requester may modify this request".to_string(),
        ));
    }
    Ok(())
}

async fn find_editable_owned<C: ConnectionTrait>(
    conn: &C,
    request_id: Uuid,
    caller: &AuthUser,
) -> Result<RequestModel, ServiceError> {
    let request_model = RequestEntity::find_by_id(request_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Material request not found".to_string()))?;

    ensure_owner(&request_model, caller)?;

    let status = request_model.status()?;
    if !status.is_editable() {
        return Err(ServiceError::InvalidStatus(format!(
            "request is not editable in status {status}"
        )));
    }

    Ok(request_model)
}

async fn items_of<C: ConnectionTrait>(
    conn: &C,
    request_id: Uuid,
) -> Result<Vec<ItemModel>, ServiceError> {
    Ok(ItemEntity::find()
        .filter(material_request_item::Column::RequestId.eq(request_id))
        .order_by_asc(material_request_item::Column::CreatedAt)
        .all(conn)
        .await?)
}

async fn touch_and_update<C: ConnectionTrait>(
    conn: &C,
    mut active: RequestActiveModel,
) -> Result<RequestModel, ServiceError> {
    let version = *active.version.as_ref();
    active.version = Set(version + 1);
    active.updated_at = Set(Some(Utc::now()));
    Ok(active.update(conn).await?)
}

/// Recompute `total` from the persisted line items and the header's freight
/// and discount, inside the caller's transaction.
async fn recompute_total<C: ConnectionTrait>(
    conn: &C,
    request_model: RequestModel,
) -> Result<RequestModel, ServiceError> {
    let items = items_of(conn, request_model.id).await?;
    let line_totals: Vec<Decimal> = items.iter().map(|i| i.line_total).collect();
    let total = compute_total(&line_totals, request_model.freight, request_model.discount);

    if total == request_model.total {
        return Ok(request_model);
    }

    let mut active: RequestActiveModel = request_model.into();
    active.total = Set(total);
    Ok(active.update(conn).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn total_includes_freight_and_discount() {
        let lines = vec![dec!(100.00), dec!(49.50)];
        assert_eq!(
            compute_total(&lines, dec!(10.00), dec!(4.50)),
            dec!(155.00)
        );
    }

    #[test]
    fn total_of_empty_request_is_freight_minus_discount() {
        assert_eq!(compute_total(&[], dec!(5.00), dec!(2.00)), dec!(3.00));
    }

    #[test]
    fn line_total_is_quantity_times_price() {
        assert_eq!(line_total(dec!(3), dec!(19.99)), dec!(59.97));
    }

    #[test]
    fn item_amount_validation() {
        assert!(validate_item_amounts(dec!(1), dec!(0)).is_ok());
        assert!(validate_item_amounts(dec!(0), dec!(1)).is_err());
        assert!(validate_item_amounts(dec!(-1), dec!(1)).is_err());
        assert!(validate_item_amounts(dec!(1), dec!(-0.01)).is_err());
    }
}
