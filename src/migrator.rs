use anyhow::Result;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::prelude::*;
use std::time::Duration;
use tracing::{error, info};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_business_units_table::Migration),
            Box::new(m20240301_000002_create_departments_table::Migration),
            Box::new(m20240301_000003_create_users_table::Migration),
            Box::new(m20240301_000004_create_material_requests_table::Migration),
            Box::new(m20240301_000005_create_material_request_items_table::Migration),
            Box::new(m20240301_000006_create_refresh_tokens_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_business_units_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_business_units_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BusinessUnits::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BusinessUnits::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BusinessUnits::Code)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(BusinessUnits::Name).string().not_null())
                        .col(
                            ColumnDef::new(BusinessUnits::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(BusinessUnits::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BusinessUnits::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BusinessUnits::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum BusinessUnits {
        Table,
        Id,
        Code,
        Name,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_departments_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_departments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Departments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Departments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Departments::BusinessUnitId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Departments::Code).string().not_null())
                        .col(ColumnDef::new(Departments::Name).string().not_null())
                        .col(
                            ColumnDef::new(Departments::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Departments::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Departments::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_departments_business_unit_id")
                        .table(Departments::Table)
                        .col(Departments::BusinessUnitId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Departments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Departments {
        Table,
        Id,
        BusinessUnitId,
        Code,
        Name,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000003_create_users_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(
                            ColumnDef::new(Users::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::Role).string().not_null())
                        .col(ColumnDef::new(Users::BusinessUnitId).uuid().null())
                        .col(ColumnDef::new(Users::DepartmentId).uuid().null())
                        .col(
                            ColumnDef::new(Users::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Users::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_email")
                        .table(Users::Table)
                        .col(Users::Email)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Users {
        Table,
        Id,
        Name,
        Email,
        PasswordHash,
        Role,
        BusinessUnitId,
        DepartmentId,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000004_create_material_requests_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_material_requests_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MaterialRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MaterialRequests::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialRequests::DocNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialRequests::Series)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialRequests::RequestType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MaterialRequests::Status).string().not_null())
                        .col(
                            ColumnDef::new(MaterialRequests::BusinessUnitId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialRequests::DepartmentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialRequests::RequestedBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialRequests::RecommendingApproverId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(MaterialRequests::FinalApproverId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(MaterialRequests::PreparedDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialRequests::RequiredDate)
                                .date()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MaterialRequests::ApprovedDate).date().null())
                        .col(ColumnDef::new(MaterialRequests::PostedDate).date().null())
                        .col(
                            ColumnDef::new(MaterialRequests::Freight)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(MaterialRequests::Discount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(MaterialRequests::Total)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(MaterialRequests::DisapprovalReason)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(MaterialRequests::Remarks).string().null())
                        .col(
                            ColumnDef::new(MaterialRequests::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialRequests::UpdatedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(MaterialRequests::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_material_requests_business_unit_id")
                        .table(MaterialRequests::Table)
                        .col(MaterialRequests::BusinessUnitId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_material_requests_status")
                        .table(MaterialRequests::Table)
                        .col(MaterialRequests::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_material_requests_doc_number")
                        .table(MaterialRequests::Table)
                        .col(MaterialRequests::BusinessUnitId)
                        .col(MaterialRequests::DocNumber)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MaterialRequests::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum MaterialRequests {
        Table,
        Id,
        DocNumber,
        Series,
        RequestType,
        Status,
        BusinessUnitId,
        DepartmentId,
        RequestedBy,
        RecommendingApproverId,
        FinalApproverId,
        PreparedDate,
        RequiredDate,
        ApprovedDate,
        PostedDate,
        Freight,
        Discount,
        Total,
        DisapprovalReason,
        Remarks,
        CreatedAt,
        UpdatedAt,
        Version,
    }
}

mod m20240301_000005_create_material_request_items_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_material_request_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MaterialRequestItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MaterialRequestItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialRequestItems::RequestId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialRequestItems::ItemCode)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(MaterialRequestItems::Description)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialRequestItems::UnitOfMeasure)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialRequestItems::Quantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialRequestItems::UnitPrice)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(MaterialRequestItems::LineTotal)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(MaterialRequestItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialRequestItems::UpdatedAt)
                                .timestamp()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_material_request_items_request_id")
                        .table(MaterialRequestItems::Table)
                        .col(MaterialRequestItems::RequestId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MaterialRequestItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum MaterialRequestItems {
        Table,
        Id,
        RequestId,
        ItemCode,
        Description,
        UnitOfMeasure,
        Quantity,
        UnitPrice,
        LineTotal,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000006_create_refresh_tokens_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000006_create_refresh_tokens_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(RefreshTokens::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RefreshTokens::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RefreshTokens::UserId).uuid().not_null())
                        .col(
                            ColumnDef::new(RefreshTokens::TokenId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(RefreshTokens::ExpiresAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RefreshTokens::Revoked)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(RefreshTokens::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_refresh_tokens_user_id")
                        .table(RefreshTokens::Table)
                        .col(RefreshTokens::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RefreshTokens::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum RefreshTokens {
        Table,
        Id,
        UserId,
        TokenId,
        ExpiresAt,
        Revoked,
        CreatedAt,
    }
}

// Database migration CLI runner
pub async fn run_migration(db_url: &str) -> Result<()> {
    info!("Setting up database connection for migrations");

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;

    info!("Running database migrations");

    match Migrator::up(&db, None).await {
        Ok(_) => {
            info!("Migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Migration failed: {}", e);
            Err(e.into())
        }
    }
}
