// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::common;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::rbac::my_sidebar,
        handlers::users::create_user,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::toggle_user,

        // --- Catalog ---
        handlers::catalog::create_section,
        handlers::catalog::list_sections,
        handlers::catalog::get_section,
        handlers::catalog::update_section,
        handlers::catalog::toggle_section,
        handlers::catalog::create_module,
        handlers::catalog::list_modules,
        handlers::catalog::get_module,
        handlers::catalog::update_module,
        handlers::catalog::toggle_module,
        handlers::catalog::create_submodule,
        handlers::catalog::list_submodules,
        handlers::catalog::get_submodule,
        handlers::catalog::update_submodule,
        handlers::catalog::toggle_submodule,
        handlers::catalog::create_action,
        handlers::catalog::list_actions,
        handlers::catalog::get_action,
        handlers::catalog::update_action,
        handlers::catalog::toggle_action,
        handlers::catalog::create_allowed_action,
        handlers::catalog::list_allowed_actions,
        handlers::catalog::get_allowed_action,
        handlers::catalog::delete_allowed_action,

        // --- Tenancy ---
        handlers::tenancy::create_tenant,
        handlers::tenancy::list_tenants,
        handlers::tenancy::get_tenant,
        handlers::tenancy::update_tenant,
        handlers::tenancy::toggle_tenant,
        handlers::tenancy::create_subsidiary,
        handlers::tenancy::list_subsidiaries,
        handlers::tenancy::get_subsidiary,
        handlers::tenancy::update_subsidiary,
        handlers::tenancy::toggle_subsidiary,

        // --- RBAC ---
        handlers::rbac::create_role,
        handlers::rbac::list_roles,
        handlers::rbac::get_role,
        handlers::rbac::update_role,
        handlers::rbac::toggle_role,
        handlers::rbac::seed_role_permissions,
        handlers::rbac::list_role_permissions,
        handlers::rbac::role_sidebar,
        handlers::rbac::configuration_tree,
        handlers::rbac::create_role_permission,
        handlers::rbac::delete_role_permission,

        // --- Schedules ---
        handlers::schedules::list_subsidiary_schedules,
        handlers::schedules::create_subsidiary_schedule,
        handlers::schedules::update_subsidiary_schedule,
        handlers::schedules::toggle_subsidiary_schedule,
        handlers::schedules::list_user_schedules,
        handlers::schedules::create_user_schedule,
        handlers::schedules::update_user_schedule,
        handlers::schedules::toggle_user_schedule,
    ),
    components(
        schemas(
            common::pagination::SortOrder,

            // --- Auth ---
            models::auth::User,
            models::auth::CallerIdentity,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,

            // --- Catalog ---
            models::catalog::Section,
            models::catalog::Module,
            models::catalog::Submodule,
            models::catalog::PermissionAction,
            models::catalog::AllowedAction,
            models::catalog::AllowedActionView,
            models::catalog::SectionDetail,
            models::catalog::ModuleDetail,
            models::catalog::CreateSectionPayload,
            models::catalog::UpdateSectionPayload,
            models::catalog::CreateModulePayload,
            models::catalog::UpdateModulePayload,
            models::catalog::CreateSubmodulePayload,
            models::catalog::UpdateSubmodulePayload,
            models::catalog::ActionPayload,
            models::catalog::CreateAllowedActionPayload,

            // --- TENANCY ---
            models::tenancy::Tenant,
            models::tenancy::Subsidiary,
            models::tenancy::SubsidiaryType,
            models::tenancy::CreateTenantPayload,
            models::tenancy::UpdateTenantPayload,
            models::tenancy::CreateSubsidiaryPayload,
            models::tenancy::UpdateSubsidiaryPayload,

            // --- RBAC ---
            models::rbac::RoleTemplate,
            models::rbac::Role,
            models::rbac::PermissionLevel,
            models::rbac::RolePermission,
            models::rbac::RolePermissionDetail,
            models::rbac::SidebarSection,
            models::rbac::SidebarModule,
            models::rbac::SidebarSubmodule,
            models::rbac::ConfigSection,
            models::rbac::ConfigModule,
            models::rbac::ConfigSubmodule,
            models::rbac::ActionRef,
            models::rbac::CreateRolePayload,
            models::rbac::UpdateRolePayload,
            models::rbac::CreateRolePermissionPayload,
            models::rbac::SeedResult,

            // --- Schedules ---
            models::schedule::Weekday,
            models::schedule::Schedule,
            models::schedule::ScheduleWindow,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação"),
        (name = "Users", description = "Usuários e Perfil"),
        (name = "Catalog", description = "Seções, Módulos, Submódulos, Ações e Lista Branca"),
        (name = "Tenancy", description = "Empresas e Filiais"),
        (name = "RBAC", description = "Controle de Acesso (Cargos e Permissões)"),
        (name = "Schedules", description = "Horários de Filiais e Usuários")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
