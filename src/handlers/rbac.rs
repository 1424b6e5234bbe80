// src/handlers/rbac.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{ListQuery, Page},
    },
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::rbac::{
        ConfigSection, CreateRolePayload, CreateRolePermissionPayload, Role, RolePermission,
        RolePermissionDetail, SeedResult, SidebarSection, UpdateRolePayload,
    },
};

// POST /api/roles
#[utoipa::path(
    post,
    path = "/api/roles",
    tag = "RBAC",
    request_body = CreateRolePayload,
    responses(
        (status = 201, description = "Cargo criado (permissões do template já semeadas)", body = Role),
        (status = 400, description = "Filial de outra empresa, template reservado ou limite de cargos"),
        (status = 409, description = "Nome já usado nesta filial")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<CreateRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    let role = app_state.rbac_service.create_role(&caller, payload).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

// GET /api/roles
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "RBAC",
    params(ListQuery),
    responses((status = 200, description = "Cargos paginados", body = Page<Role>)),
    security(("api_jwt" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.rbac_service.list_roles(&caller, &query).await?;
    Ok(Json(page))
}

// GET /api/roles/{id}
#[utoipa::path(
    get,
    path = "/api/roles/{id}",
    tag = "RBAC",
    params(("id" = Uuid, Path, description = "ID do Cargo")),
    responses((status = 200, description = "Cargo", body = Role)),
    security(("api_jwt" = []))
)]
pub async fn get_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let role = app_state.rbac_service.get_role(&caller, id).await?;
    Ok(Json(role))
}

// PUT /api/roles/{id}
#[utoipa::path(
    put,
    path = "/api/roles/{id}",
    tag = "RBAC",
    request_body = UpdateRolePayload,
    params(("id" = Uuid, Path, description = "ID do Cargo")),
    responses((status = 200, description = "Cargo renomeado", body = Role)),
    security(("api_jwt" = []))
)]
pub async fn update_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    let role = app_state.rbac_service.update_role(&caller, id, payload).await?;
    Ok(Json(role))
}

// PATCH /api/roles/{id}/status
#[utoipa::path(
    patch,
    path = "/api/roles/{id}/status",
    tag = "RBAC",
    params(("id" = Uuid, Path, description = "ID do Cargo")),
    responses((status = 200, description = "Status invertido e propagado aos usuários do cargo", body = Role)),
    security(("api_jwt" = []))
)]
pub async fn toggle_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let role = app_state.rbac_service.toggle_role(&caller, id).await?;
    Ok(Json(role))
}

// POST /api/roles/{id}/permissions/seed
#[utoipa::path(
    post,
    path = "/api/roles/{id}/permissions/seed",
    tag = "RBAC",
    params(("id" = Uuid, Path, description = "ID do Cargo")),
    responses((status = 200, description = "Permissões do template reaplicadas (duplicadas ignoradas)", body = SeedResult)),
    security(("api_jwt" = []))
)]
pub async fn seed_role_permissions(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let result = app_state.rbac_service.seed_role_permissions(&caller, id).await?;
    Ok(Json(result))
}

// GET /api/roles/{id}/permissions
#[utoipa::path(
    get,
    path = "/api/roles/{id}/permissions",
    tag = "RBAC",
    params(("id" = Uuid, Path, description = "ID do Cargo")),
    responses((status = 200, description = "Permissões do cargo com nomes resolvidos", body = Vec<RolePermissionDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_role_permissions(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let permissions = app_state.rbac_service.list_permissions(&caller, id).await?;
    Ok(Json(permissions))
}

// GET /api/roles/{id}/sidebar
#[utoipa::path(
    get,
    path = "/api/roles/{id}/sidebar",
    tag = "RBAC",
    params(("id" = Uuid, Path, description = "ID do Cargo")),
    responses((status = 200, description = "Menu navegável do cargo (ação ver)", body = Vec<SidebarSection>)),
    security(("api_jwt" = []))
)]
pub async fn role_sidebar(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let sidebar = app_state.rbac_service.sidebar(&caller, id).await?;
    Ok(Json(sidebar))
}

// GET /api/users/me/sidebar
#[utoipa::path(
    get,
    path = "/api/users/me/sidebar",
    tag = "Users",
    responses((status = 200, description = "Menu do cargo de quem está logado", body = Vec<SidebarSection>)),
    security(("api_jwt" = []))
)]
pub async fn my_sidebar(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let sidebar = app_state.rbac_service.sidebar(&caller, caller.role_id).await?;
    Ok(Json(sidebar))
}

// GET /api/roles/{id}/configuration
#[utoipa::path(
    get,
    path = "/api/roles/{id}/configuration",
    tag = "RBAC",
    params(("id" = Uuid, Path, description = "ID do Cargo")),
    responses((status = 200, description = "Árvore de ações concedíveis ao cargo", body = Vec<ConfigSection>)),
    security(("api_jwt" = []))
)]
pub async fn configuration_tree(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let tree = app_state.rbac_service.configuration_tree(&caller, id).await?;
    Ok(Json(tree))
}

// POST /api/role-permissions
#[utoipa::path(
    post,
    path = "/api/role-permissions",
    tag = "RBAC",
    request_body = CreateRolePermissionPayload,
    responses(
        (status = 201, description = "Permissão concedida", body = RolePermission),
        (status = 400, description = "Hierarquia inconsistente ou ação não liberada para o alvo"),
        (status = 409, description = "Permissão já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_role_permission(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<CreateRolePermissionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let permission = app_state.rbac_service.create_permission(&caller, payload).await?;
    Ok((StatusCode::CREATED, Json(permission)))
}

// DELETE /api/role-permissions/{id}
#[utoipa::path(
    delete,
    path = "/api/role-permissions/{id}",
    tag = "RBAC",
    params(("id" = Uuid, Path, description = "ID da Permissão")),
    responses((status = 204, description = "Permissão revogada")),
    security(("api_jwt" = []))
)]
pub async fn delete_role_permission(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.rbac_service.delete_permission(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
