pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod schedule_repo;
pub use schedule_repo::ScheduleRepository;
