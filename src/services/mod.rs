// Core services
pub mod approval;
pub mod business_units;
pub mod departments;
pub mod material_requests;
pub mod users;
