pub mod auth;
pub mod catalog;
pub mod rbac;
pub mod schedule;
pub mod tenancy;
