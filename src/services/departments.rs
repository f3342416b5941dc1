use crate::{
    db::DbPool,
    entities::business_unit::Entity as BusinessUnitEntity,
    entities::department::{
        self, ActiveModel as DepartmentActiveModel, Entity as DepartmentEntity,
        Model as DepartmentModel,
    },
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
pub struct CreateDepartmentRequest {
    #[validate(length(min = 1, max = 16, message = "Code is required"))]
    pub code: String,
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateDepartmentRequest {
    #[validate(length(min = 1, max = 120, message = "Name must not be empty"))]
    pub name: Option<String>,
    pub active: Option<bool>,
}

/// CRUD over departments inside a business unit.
#[derive(Clone)]
pub struct DepartmentService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl DepartmentService {
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

    #[instrument(skip(self, request), fields(business_unit_id = %business_unit_id, code = %request.code))]
    pub async fn create(
        &self,
        business_unit_id: Uuid,
        request: CreateDepartmentRequest,
    ) -> Result<DepartmentModel, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        BusinessUnitEntity::find_by_id(business_unit_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Business unit not found".to_string()))?;

        let code = request.code.trim().to_uppercase();
        let existing = DepartmentEntity::find()
            .filter(department::Column::BusinessUnitId.eq(business_unit_id))
            .filter(department::Column::Code.eq(code.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "department code {code} already exists in this business unit"
            )));
        }

        let id = Uuid::new_v4();
        let model = DepartmentActiveModel {
            id: Set(id),
            business_unit_id: Set(business_unit_id),
            code: Set(code),
            name: Set(request.name),
            active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(department_id = %id, code = %model.code, "Department created");
        self.emit(Event::DepartmentCreated(id)).await;

        Ok(model)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<DepartmentModel>, ServiceError> {
        Ok(DepartmentEntity::find_by_id(id).one(&*self.db_pool).await?)
    }

    #[instrument(skip(self), fields(business_unit_id = %business_unit_id))]
    pub async fn list_for_business_unit(
        &self,
        business_unit_id: Uuid,
    ) -> Result<Vec<DepartmentModel>, ServiceError> {
        Ok(DepartmentEntity::find()
            .filter(department::Column::BusinessUnitId.eq(business_unit_id))
            .order_by_asc(department::Column::Code)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, request), fields(department_id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateDepartmentRequest,
    ) -> Result<DepartmentModel, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let existing = DepartmentEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Department not found".to_string()))?;

        let mut active: DepartmentActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(is_active) = request.active {
            active.active = Set(is_active);
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(db).await?;

        info!(department_id = %id, "Department updated");
        self.emit(Event::DepartmentUpdated(id)).await;

        Ok(updated)
    }

    /// Delete a department that has no material requests.
    #[instrument(skip(self), fields(department_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        DepartmentEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Department not found".to_string()))?;

        let request_count = material_request::Entity::find()
            .filter(material_request::Column::DepartmentId.eq(id))
            .count(db)
            .await?;
        if request_count > 0 {
            return Err(ServiceError::Conflict(
                "department still has material requests".to_string(),
            ));
        }

        DepartmentEntity::delete_by_id(id).exec(db).await?;

        info!(department_id = %id, "Department deleted");
        self.emit(Event::DepartmentDeleted(id)).await;

        Ok(())
    }
}
