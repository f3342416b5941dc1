use crate::{
    auth::{self, Roles},
    db::DbPool,
    entities::user::{self, ActiveModel as UserActiveModel, Entity as UserEntity, Model as UserModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub role: String,
    pub business_unit_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 120, message = "Name must not be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    pub role: Option<String>,
    pub business_unit_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// User payload without the password hash.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub business_unit_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<UserModel> for UserResponse {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            business_unit_id: model.business_unit_id,
            department_id: model.department_id,
            active: model.active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// User management: creation with argon2 hashing, profile updates,
/// deactivation, and password changes.
#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl UserService {
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

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create_user(
        &self,
        request: CreateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        if !Roles::is_valid(&request.role) {
            return Err(ServiceError::ValidationError(format!(
                "unknown role: {}",
                request.role
            )));
        }

        let db = &*self.db_pool;

        let existing = UserEntity::find()
            .filter(user::Column::Email.eq(request.email.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "email {} is already registered",
                request.email
            )));
        }

        let password_hash = auth::hash_password(&request.password)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;

        let id = Uuid::new_v4();
        let model = UserActiveModel {
            id: Set(id),
            name: Set(request.name),
            email: Set(request.email),
            password_hash: Set(password_hash),
            role: Set(request.role),
            business_unit_id: Set(request.business_unit_id),
            department_id: Set(request.department_id),
            active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(user_id = %id, role = %model.role, "User created");
        self.emit(Event::UserCreated(id)).await;

        Ok(model.into())
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserResponse>, ServiceError> {
        Ok(UserEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .map(UserResponse::from))
    }

    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<UserListResponse, ServiceError> {
        let paginator = UserEntity::find()
            .order_by_asc(user::Column::Email)
            .paginate(&*self.db_pool, per_page);

        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(UserListResponse {
            users: users.into_iter().map(UserResponse::from).collect(),
            total,
            page,
            per_page,
        })
    }

    #[instrument(skip(self, request), fields(user_id = %id))]
    pub async fn update_user(
        &self,
        id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        if let Some(role) = &request.role {
            if !Roles::is_valid(role) {
                return Err(ServiceError::ValidationError(format!("unknown role: {role}")));
            }
        }

        let db = &*self.db_pool;
        let existing = UserEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        if let Some(email) = &request.email {
            let clash = UserEntity::find()
                .filter(user::Column::Email.eq(email.clone()))
                .filter(user::Column::Id.ne(id))
                .one(db)
                .await?;
            if clash.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "email {email} is already registered"
                )));
            }
        }

        let mut active: UserActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(email) = request.email {
            active.email = Set(email);
        }
        if let Some(role) = request.role {
            active.role = Set(role);
        }
        if let Some(bu) = request.business_unit_id {
            active.business_unit_id = Set(Some(bu));
        }
        if let Some(dept) = request.department_id {
            active.department_id = Set(Some(dept));
        }
        if let Some(is_active) = request.active {
            active.active = Set(is_active);
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(db).await?;

        info!(user_id = %id, "User updated");
        self.emit(Event::UserUpdated(id)).await;

        Ok(updated.into())
    }

    /// Deactivate rather than delete: requests keep their requester FK.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn deactivate_user(&self, id: Uuid) -> Result<UserResponse, ServiceError> {
        let db = &*self.db_pool;
        let existing = UserEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        let mut active: UserActiveModel = existing.into();
        active.active = Set(false);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(db).await?;

        info!(user_id = %id, "User deactivated");
        self.emit(Event::UserDeactivated(id)).await;

        Ok(updated.into())
    }

    #[instrument(skip(self, request), fields(user_id = %id))]
    pub async fn change_password(
        &self,
        id: Uuid,
        request: ChangePasswordRequest,
    ) -> Result<(), ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let existing = UserEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        let matches = auth::verify_password(&request.current_password, &existing.password_hash)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;
        if !matches {
            return Err(ServiceError::Unauthorized(
                "current password is incorrect".to_string(),
            ));
        }

        let password_hash = auth::hash_password(&request.new_password)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;

        let mut active: UserActiveModel = existing.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Some(Utc::now()));
        active.update(db).await?;

        info!(user_id = %id, "Password changed");
        self.emit(Event::PasswordChanged(id)).await;

        Ok(())
    }
}
