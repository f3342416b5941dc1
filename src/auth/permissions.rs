/*!
 * # Permissions Module
 *
 * Permission strings are `resource:action`. Each role maps to a fixed
 * permission set; admins pass every permission check in the middleware.
 */

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Role names stored in the `users.role` column and carried in JWT claims.
pub struct Roles;

impl Roles {
    pub const REQUESTER: &'static str = "requester";
    pub const RECOMMENDING_APPROVER: &'static str = "recommending_approver";
    pub const FINAL_APPROVER: &'static str = "final_approver";
    pub const POSTER: &'static str = "poster";
    pub const ADMIN: &'static str = "admin";

    pub fn all() -> [&'static str; 5] {
        [
            Self::REQUESTER,
            Self::RECOMMENDING_APPROVER,
            Self::FINAL_APPROVER,
            Self::POSTER,
            Self::ADMIN,
        ]
    }

    pub fn is_valid(role: &str) -> bool {
        Self::all().contains(&role)
    }
}

/// Common permission string constants for compile-time safety
pub mod consts {
    // Material requests
    pub const REQUESTS_READ: &str = "requests:read";
    pub const REQUESTS_CREATE: &str = "requests:create";
    pub const REQUESTS_UPDATE: &str = "requests:update";
    pub const REQUESTS_SUBMIT: &str = "requests:submit";
    pub const REQUESTS_APPROVE_RECOMMEND: &str = "requests:approve-recommend";
    pub const REQUESTS_APPROVE_FINAL: &str = "requests:approve-final";
    pub const REQUESTS_DISAPPROVE: &str = "requests:disapprove";
    pub const REQUESTS_POST: &str = "requests:post";
    pub const REQUESTS_CANCEL: &str = "requests:cancel";

    // Organization
    pub const BUSINESS_UNITS_READ: &str = "business-units:read";
    pub const BUSINESS_UNITS_MANAGE: &str = "business-units:manage";
    pub const DEPARTMENTS_READ: &str = "departments:read";
    pub const DEPARTMENTS_MANAGE: &str = "departments:manage";

    // Users
    pub const USERS_MANAGE: &str = "users:manage";
}

use consts::*;

lazy_static! {
    static ref ROLE_PERMISSIONS: HashMap<&'static str, Vec<&'static str>> = {
        let mut map = HashMap::new();
        map.insert(
            Roles::REQUESTER,
            vec![
                REQUESTS_READ,
                REQUESTS_CREATE,
                REQUESTS_UPDATE,
                REQUESTS_SUBMIT,
                REQUESTS_CANCEL,
                BUSINESS_UNITS_READ,
                DEPARTMENTS_READ,
            ],
        );
        map.insert(
            Roles::RECOMMENDING_APPROVER,
            vec![
                REQUESTS_READ,
                REQUESTS_APPROVE_RECOMMEND,
                REQUESTS_DISAPPROVE,
                BUSINESS_UNITS_READ,
                DEPARTMENTS_READ,
            ],
        );
        map.insert(
            Roles::FINAL_APPROVER,
            vec![
                REQUESTS_READ,
                REQUESTS_APPROVE_FINAL,
                REQUESTS_DISAPPROVE,
                BUSINESS_UNITS_READ,
                DEPARTMENTS_READ,
            ],
        );
        map.insert(
            Roles::POSTER,
            vec![
                REQUESTS_READ,
                REQUESTS_POST,
                BUSINESS_UNITS_READ,
                DEPARTMENTS_READ,
            ],
        );
        // Admin passes checks by role, but an explicit set keeps tokens
        // self-describing for clients that render capabilities.
        map.insert(
            Roles::ADMIN,
            vec![
                REQUESTS_READ,
                REQUESTS_CREATE,
                REQUESTS_UPDATE,
                REQUESTS_SUBMIT,
                REQUESTS_APPROVE_RECOMMEND,
                REQUESTS_APPROVE_FINAL,
                REQUESTS_DISAPPROVE,
                REQUESTS_POST,
                REQUESTS_CANCEL,
                BUSINESS_UNITS_READ,
                BUSINESS_UNITS_MANAGE,
                DEPARTMENTS_READ,
                DEPARTMENTS_MANAGE,
                USERS_MANAGE,
            ],
        );
        map
    };
}

/// Permissions granted to a role; unknown roles get none.
pub fn role_permissions(role: &str) -> Vec<String> {
    ROLE_PERMISSIONS
        .get(role)
        .map(|perms| perms.iter().map(|p| p.to_string()).collect())
        .unwrap_or_default()
}
