use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter as StrumEnumIter, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of a material request.
///
/// Stored as its SCREAMING_SNAKE_CASE string in the `status` column; the
/// approval service owns which transitions between these are legal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    StrumEnumIter,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Draft,
    ForRecApproval,
    RecApproved,
    ForFinalApproval,
    FinalApproved,
    ForPosting,
    Posted,
    Received,
    Transmitted,
    Cancelled,
    Disapproved,
    ForEdit,
}

impl RequestStatus {
    /// Statuses in which the document header and line items may still be edited.
    pub fn is_editable(self) -> bool {
        matches!(self, Self::Draft | Self::ForEdit)
    }

    /// Terminal statuses: no further transition leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Received | Self::Transmitted | Self::Cancelled)
    }
}

/// Whether the request procures goods or services.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    Item,
    Service,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "material_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(
        min = 1,
        max = 50,
        message = "Document number must be between 1 and 50 characters"
    ))]
    pub doc_number: String,

    /// Per-business-unit monotonic sequence the document number is derived from.
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
}

impl Model {
    /// Parse the stored status string. A value outside `RequestStatus` means
    /// the row was written by something other than this service layer.
    pub fn status(&self) -> Result<RequestStatus, DbErr> {
        self.status
            .parse()
            .map_err(|_| DbErr::Custom(format!("unknown request status: {}", self.status)))
    }

    pub fn request_type(&self) -> Result<RequestType, DbErr> {
        self.request_type
            .parse()
            .map_err(|_| DbErr::Custom(format!("unknown request type: {}", self.request_type)))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::material_request_item::Entity")]
    Items,
    #[sea_orm(
        belongs_to = "super::business_unit::Entity",
        from = "Column::BusinessUnitId",
        to = "super::business_unit::Column::Id"
    )]
    BusinessUnit,
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id"
    )]
    Department,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RequestedBy",
        to = "super::user::Column::Id"
    )]
    Requester,
}

impl Related<super::material_request_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::business_unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BusinessUnit.def()
    }
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requester.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        // Timestamps and version are managed by the service layer so that they
        // move inside the same transaction as status changes.
        Ok(self)
    }
}
