use crate::{
    db::DbPool,
    entities::business_unit::{
        self, ActiveModel as BusinessUnitActiveModel, Entity as BusinessUnitEntity,
        Model as BusinessUnitModel,
    },
    entities::department,
    entities::material_request,
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBusinessUnitRequest {
    #[validate(length(min = 1, max = 16, message = "Code is required"))]
    pub code: String,
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateBusinessUnitRequest {
    #[validate(length(min = 1, max = 120, message = "Name must not be empty"))]
    pub name: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BusinessUnitListResponse {
    pub business_units: Vec<BusinessUnitModel>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// CRUD over business units, the top-level organizational scope.
#[derive(Clone)]
pub struct BusinessUnitService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl BusinessUnitService {
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

    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create(
        &self,
        request: CreateBusinessUnitRequest,
    ) -> Result<BusinessUnitModel, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let code = request.code.trim().to_uppercase();

        let existing = BusinessUnitEntity::find()
            .filter(business_unit::Column::Code.eq(code.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "business unit code {code} already exists"
            )));
        }

        let id = Uuid::new_v4();
        let model = BusinessUnitActiveModel {
            id: Set(id),
            code: Set(code),
            name: Set(request.name),
            active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(business_unit_id = %id, code = %model.code, "Business unit created");
        self.emit(Event::BusinessUnitCreated(id)).await;

        Ok(model)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<BusinessUnitModel>, ServiceError> {
        Ok(BusinessUnitEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<BusinessUnitListResponse, ServiceError> {
        let paginator = BusinessUnitEntity::find()
            .order_by_asc(business_unit::Column::Code)
            .paginate(&*self.db_pool, per_page);

        let total = paginator.num_items().await?;
        let business_units = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(BusinessUnitListResponse {
            business_units,
            total,
            page,
            per_page,
        })
    }

    #[instrument(skip(self, request), fields(business_unit_id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateBusinessUnitRequest,
    ) -> Result<BusinessUnitModel, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let existing = BusinessUnitEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Business unit not found".to_string()))?;

        let mut active: BusinessUnitActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(is_active) = request.active {
            active.active = Set(is_active);
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(db).await?;

        info!(business_unit_id = %id, "Business unit updated");
        self.emit(Event::BusinessUnitUpdated(id)).await;

        Ok(updated)
    }

    /// Delete a business unit that has no departments or requests.
    #[instrument(skip(self), fields(business_unit_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        BusinessUnitEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Business unit not found".to_string()))?;

        let department_count = department::Entity::find()
            .filter(department::Column::BusinessUnitId.eq(id))
            .count(db)
            .await?;
        if department_count > 0 {
            return Err(ServiceError::Conflict(
                "business unit still has departments".to_string(),
            ));
        }

        let request_count = material_request::Entity::find()
            .filter(material_request::Column::BusinessUnitId.eq(id))
            .count(db)
            .await?;
        if request_count > 0 {
            return Err(ServiceError::Conflict(
                "business unit still has material requests".to_string(),
            ));
        }

        BusinessUnitEntity::delete_by_id(id).exec(db).await?;

        info!(business_unit_id = %id, "Business unit deleted");
        self.emit(Event::BusinessUnitDeleted(id)).await;

        Ok(())
    }
}
