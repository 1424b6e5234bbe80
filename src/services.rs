pub mod auth;
pub mod catalog_service;
pub mod permission_tree;
pub mod rbac_service;
pub mod schedule_service;
pub mod seed_service;
pub mod tenancy_service;
pub mod user_service;
