pub mod auth;
pub mod catalog;
pub mod rbac;
pub mod schedules;
pub mod tenancy;
pub mod users;
