pub mod business_units;
pub mod common;
pub mod departments;
pub mod material_requests;
pub mod users;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub material_requests: Arc<crate::services::material_requests::MaterialRequestService>,
    pub approval: Arc<crate::services::approval::ApprovalService>,
    pub business_units: Arc<crate::services::business_units::BusinessUnitService>,
    pub departments: Arc<crate::services::departments::DepartmentService>,
    pub users: Arc<crate::services::users::UserService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let material_requests = Arc::new(
            crate::services::material_requests::MaterialRequestService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            ),
        );
        let approval = Arc::new(crate::services::approval::ApprovalService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let business_units = Arc::new(crate::services::business_units::BusinessUnitService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let departments = Arc::new(crate::services::departments::DepartmentService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let users = Arc::new(crate::services::users::UserService::new(
            db_pool,
            Some(event_sender),
        ));

        Self {
            material_requests,
            approval,
            business_units,
            departments,
            users,
        }
    }
}
