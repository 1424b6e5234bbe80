// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    let catalog_routes = Router::new()
        .route(
            "/sections",
            post(handlers::catalog::create_section).get(handlers::catalog::list_sections),
        )
        .route(
            "/sections/{id}",
            get(handlers::catalog::get_section).put(handlers::catalog::update_section),
        )
        .route("/sections/{id}/status", patch(handlers::catalog::toggle_section))
        .route(
            "/modules",
            post(handlers::catalog::create_module).get(handlers::catalog::list_modules),
        )
        .route(
            "/modules/{id}",
            get(handlers::catalog::get_module).put(handlers::catalog::update_module),
        )
        .route("/modules/{id}/status", patch(handlers::catalog::toggle_module))
        .route(
            "/submodules",
            post(handlers::catalog::create_submodule).get(handlers::catalog::list_submodules),
        )
        .route(
            "/submodules/{id}",
            get(handlers::catalog::get_submodule).put(handlers::catalog::update_submodule),
        )
        .route("/submodules/{id}/status", patch(handlers::catalog::toggle_submodule))
        .route(
            "/actions",
            post(handlers::catalog::create_action).get(handlers::catalog::list_actions),
        )
        .route(
            "/actions/{id}",
            get(handlers::catalog::get_action).put(handlers::catalog::update_action),
        )
        .route("/actions/{id}/status", patch(handlers::catalog::toggle_action))
        .route(
            "/allowed-actions",
            post(handlers::catalog::create_allowed_action).get(handlers::catalog::list_allowed_actions),
        )
        .route(
            "/allowed-actions/{id}",
            get(handlers::catalog::get_allowed_action).delete(handlers::catalog::delete_allowed_action),
        );

    let tenancy_routes = Router::new()
        .route(
            "/tenants",
            post(handlers::tenancy::create_tenant).get(handlers::tenancy::list_tenants),
        )
        .route(
            "/tenants/{id}",
            get(handlers::tenancy::get_tenant).put(handlers::tenancy::update_tenant),
        )
        .route("/tenants/{id}/status", patch(handlers::tenancy::toggle_tenant))
        .route(
            "/subsidiaries",
            post(handlers::tenancy::create_subsidiary).get(handlers::tenancy::list_subsidiaries),
        )
        .route(
            "/subsidiaries/{id}",
            get(handlers::tenancy::get_subsidiary).put(handlers::tenancy::update_subsidiary),
        )
        .route("/subsidiaries/{id}/status", patch(handlers::tenancy::toggle_subsidiary))
        .route(
            "/subsidiaries/{id}/schedules",
            get(handlers::schedules::list_subsidiary_schedules)
                .post(handlers::schedules::create_subsidiary_schedule),
        )
        .route(
            "/subsidiary-schedules/{id}",
            put(handlers::schedules::update_subsidiary_schedule),
        )
        .route(
            "/subsidiary-schedules/{id}/status",
            patch(handlers::schedules::toggle_subsidiary_schedule),
        );

    let rbac_routes = Router::new()
        .route("/roles", post(handlers::rbac::create_role).get(handlers::rbac::list_roles))
        .route("/roles/{id}", get(handlers::rbac::get_role).put(handlers::rbac::update_role))
        .route("/roles/{id}/status", patch(handlers::rbac::toggle_role))
        .route("/roles/{id}/permissions", get(handlers::rbac::list_role_permissions))
        .route("/roles/{id}/permissions/seed", post(handlers::rbac::seed_role_permissions))
        .route("/roles/{id}/sidebar", get(handlers::rbac::role_sidebar))
        .route("/roles/{id}/configuration", get(handlers::rbac::configuration_tree))
        .route("/role-permissions", post(handlers::rbac::create_role_permission))
        .route("/role-permissions/{id}", delete(handlers::rbac::delete_role_permission));

    let user_routes = Router::new()
        .route("/users/me", get(handlers::auth::get_me))
        .route("/users/me/sidebar", get(handlers::rbac::my_sidebar))
        .route("/users", post(handlers::users::create_user).get(handlers::users::list_users))
        .route("/users/{id}", get(handlers::users::get_user).put(handlers::users::update_user))
        .route("/users/{id}/status", patch(handlers::users::toggle_user))
        .route(
            "/users/{id}/schedules",
            get(handlers::schedules::list_user_schedules).post(handlers::schedules::create_user_schedule),
        )
        .route("/user-schedules/{id}", put(handlers::schedules::update_user_schedule))
        .route("/user-schedules/{id}/status", patch(handlers::schedules::toggle_user_schedule));

    // Tudo abaixo exige um Bearer válido
    let protected_routes = Router::new()
        .nest("/catalog", catalog_routes)
        .merge(tenancy_routes)
        .merge(rbac_routes)
        .merge(user_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
