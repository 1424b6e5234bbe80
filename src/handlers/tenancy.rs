// src/handlers/tenancy.rs

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
    middleware::{auth::AuthenticatedUser, rbac::RequireSystemAdmin},
    models::tenancy::{
        CreateSubsidiaryPayload, CreateTenantPayload, Subsidiary, Tenant, UpdateSubsidiaryPayload,
        UpdateTenantPayload,
    },
};

// =============================================================================
//  TENANTS (somente System.Admin)
// =============================================================================

// POST /api/tenants
#[utoipa::path(
    post,
    path = "/api/tenants",
    tag = "Tenancy",
    request_body = CreateTenantPayload,
    responses(
        (status = 201, description = "Empresa criada", body = Tenant),
        (status = 403, description = "Apenas o administrador do sistema"),
        (status = 409, description = "Nome já utilizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tenant(
    State(app_state): State<AppState>,
    RequireSystemAdmin(caller): RequireSystemAdmin,
    Json(payload): Json<CreateTenantPayload>,
) -> Result<impl IntoResponse, AppError> {
    let tenant = app_state.tenant_service.create_tenant(&caller, payload).await?;
    Ok((StatusCode::CREATED, Json(tenant)))
}

// GET /api/tenants
#[utoipa::path(
    get,
    path = "/api/tenants",
    tag = "Tenancy",
    params(ListQuery),
    responses((status = 200, description = "Empresas paginadas (GLOBAL fica de fora)", body = Page<Tenant>)),
    security(("api_jwt" = []))
)]
pub async fn list_tenants(
    State(app_state): State<AppState>,
    RequireSystemAdmin(caller): RequireSystemAdmin,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.tenant_service.list_tenants(&caller, &query).await?;
    Ok(Json(page))
}

// GET /api/tenants/{id}
#[utoipa::path(
    get,
    path = "/api/tenants/{id}",
    tag = "Tenancy",
    params(("id" = Uuid, Path, description = "ID da Empresa")),
    responses((status = 200, description = "Empresa", body = Tenant)),
    security(("api_jwt" = []))
)]
pub async fn get_tenant(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let tenant = app_state.tenant_service.get_tenant(&caller, id).await?;
    Ok(Json(tenant))
}

// PUT /api/tenants/{id}
#[utoipa::path(
    put,
    path = "/api/tenants/{id}",
    tag = "Tenancy",
    request_body = UpdateTenantPayload,
    params(("id" = Uuid, Path, description = "ID da Empresa")),
    responses((status = 200, description = "Empresa atualizada", body = Tenant)),
    security(("api_jwt" = []))
)]
pub async fn update_tenant(
    State(app_state): State<AppState>,
    RequireSystemAdmin(caller): RequireSystemAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTenantPayload>,
) -> Result<impl IntoResponse, AppError> {
    let tenant = app_state.tenant_service.update_tenant(&caller, id, payload).await?;
    Ok(Json(tenant))
}

// PATCH /api/tenants/{id}/status
#[utoipa::path(
    patch,
    path = "/api/tenants/{id}/status",
    tag = "Tenancy",
    params(("id" = Uuid, Path, description = "ID da Empresa")),
    responses(
        (status = 200, description = "Status invertido e propagado a filiais, cargos e usuários", body = Tenant),
        (status = 500, description = "Falha na propagação; nada foi alterado")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_tenant(
    State(app_state): State<AppState>,
    RequireSystemAdmin(caller): RequireSystemAdmin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let tenant = app_state.tenant_service.toggle_tenant(&caller, id).await?;
    Ok(Json(tenant))
}

// =============================================================================
//  FILIAIS
// =============================================================================

// POST /api/subsidiaries
#[utoipa::path(
    post,
    path = "/api/subsidiaries",
    tag = "Tenancy",
    request_body = CreateSubsidiaryPayload,
    responses(
        (status = 201, description = "Filial criada", body = Subsidiary),
        (status = 400, description = "Limite de filiais atingido"),
        (status = 409, description = "Nome já usado nesta empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_subsidiary(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<CreateSubsidiaryPayload>,
) -> Result<impl IntoResponse, AppError> {
    let subsidiary = app_state.tenant_service.create_subsidiary(&caller, payload).await?;
    Ok((StatusCode::CREATED, Json(subsidiary)))
}

// GET /api/subsidiaries
#[utoipa::path(
    get,
    path = "/api/subsidiaries",
    tag = "Tenancy",
    params(ListQuery),
    responses((status = 200, description = "Filiais paginadas", body = Page<Subsidiary>)),
    security(("api_jwt" = []))
)]
pub async fn list_subsidiaries(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.tenant_service.list_subsidiaries(&caller, &query).await?;
    Ok(Json(page))
}

// GET /api/subsidiaries/{id}
#[utoipa::path(
    get,
    path = "/api/subsidiaries/{id}",
    tag = "Tenancy",
    params(("id" = Uuid, Path, description = "ID da Filial")),
    responses((status = 200, description = "Filial", body = Subsidiary)),
    security(("api_jwt" = []))
)]
pub async fn get_subsidiary(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let subsidiary = app_state.tenant_service.get_subsidiary(&caller, id).await?;
    Ok(Json(subsidiary))
}

// PUT /api/subsidiaries/{id}
#[utoipa::path(
    put,
    path = "/api/subsidiaries/{id}",
    tag = "Tenancy",
    request_body = UpdateSubsidiaryPayload,
    params(("id" = Uuid, Path, description = "ID da Filial")),
    responses((status = 200, description = "Filial atualizada", body = Subsidiary)),
    security(("api_jwt" = []))
)]
pub async fn update_subsidiary(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSubsidiaryPayload>,
) -> Result<impl IntoResponse, AppError> {
    let subsidiary = app_state.tenant_service.update_subsidiary(&caller, id, payload).await?;
    Ok(Json(subsidiary))
}

// PATCH /api/subsidiaries/{id}/status
#[utoipa::path(
    patch,
    path = "/api/subsidiaries/{id}/status",
    tag = "Tenancy",
    params(("id" = Uuid, Path, description = "ID da Filial")),
    responses((status = 200, description = "Status invertido e propagado a cargos e usuários", body = Subsidiary)),
    security(("api_jwt" = []))
)]
pub async fn toggle_subsidiary(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let subsidiary = app_state.tenant_service.toggle_subsidiary(&caller, id).await?;
    Ok(Json(subsidiary))
}
