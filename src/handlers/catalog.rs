// src/handlers/catalog.rs

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
    middleware::rbac::RequireSystemAdmin,
    models::catalog::{
        ActionPayload, AllowedAction, AllowedActionView, CreateAllowedActionPayload, CreateModulePayload,
        CreateSectionPayload, CreateSubmodulePayload, Module, ModuleDetail, PermissionAction, Section,
        SectionDetail, Submodule, UpdateModulePayload, UpdateSectionPayload, UpdateSubmodulePayload,
    },
};

// =============================================================================
//  SEÇÕES
// =============================================================================

// POST /api/catalog/sections
#[utoipa::path(
    post,
    path = "/api/catalog/sections",
    tag = "Catalog",
    request_body = CreateSectionPayload,
    responses(
        (status = 201, description = "Seção criada", body = Section),
        (status = 409, description = "Já existe uma seção com esse nome")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_section(
    State(app_state): State<AppState>,
    _admin: RequireSystemAdmin,
    Json(payload): Json<CreateSectionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let section = app_state.catalog_service.create_section(payload).await?;
    Ok((StatusCode::CREATED, Json(section)))
}

// GET /api/catalog/sections
#[utoipa::path(
    get,
    path = "/api/catalog/sections",
    tag = "Catalog",
    params(ListQuery),
    responses((status = 200, description = "Seções paginadas", body = Page<Section>)),
    security(("api_jwt" = []))
)]
pub async fn list_sections(
    State(app_state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.catalog_service.list_sections(&query).await?;
    Ok(Json(page))
}

// GET /api/catalog/sections/{id}
#[utoipa::path(
    get,
    path = "/api/catalog/sections/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID da Seção")),
    responses(
        (status = 200, description = "Seção com módulos e submódulos", body = SectionDetail),
        (status = 404, description = "Seção não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_section(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.catalog_service.section_detail(id).await?;
    Ok(Json(detail))
}

// PUT /api/catalog/sections/{id}
#[utoipa::path(
    put,
    path = "/api/catalog/sections/{id}",
    tag = "Catalog",
    request_body = UpdateSectionPayload,
    params(("id" = Uuid, Path, description = "ID da Seção")),
    responses((status = 200, description = "Seção atualizada", body = Section)),
    security(("api_jwt" = []))
)]
pub async fn update_section(
    State(app_state): State<AppState>,
    _admin: RequireSystemAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSectionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let section = app_state.catalog_service.update_section(id, payload).await?;
    Ok(Json(section))
}

// PATCH /api/catalog/sections/{id}/status
#[utoipa::path(
    patch,
    path = "/api/catalog/sections/{id}/status",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID da Seção")),
    responses((status = 200, description = "Status invertido", body = Section)),
    security(("api_jwt" = []))
)]
pub async fn toggle_section(
    State(app_state): State<AppState>,
    _admin: RequireSystemAdmin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let section = app_state.catalog_service.toggle_section(id).await?;
    Ok(Json(section))
}

// =============================================================================
//  MÓDULOS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/catalog/modules",
    tag = "Catalog",
    request_body = CreateModulePayload,
    responses(
        (status = 201, description = "Módulo criado", body = Module),
        (status = 409, description = "Nome já usado nesta seção")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_module(
    State(app_state): State<AppState>,
    _admin: RequireSystemAdmin,
    Json(payload): Json<CreateModulePayload>,
) -> Result<impl IntoResponse, AppError> {
    let module = app_state.catalog_service.create_module(payload).await?;
    Ok((StatusCode::CREATED, Json(module)))
}

#[utoipa::path(
    get,
    path = "/api/catalog/modules",
    tag = "Catalog",
    params(ListQuery),
    responses((status = 200, description = "Módulos paginados (filtro por sectionId)", body = Page<Module>)),
    security(("api_jwt" = []))
)]
pub async fn list_modules(
    State(app_state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.catalog_service.list_modules(&query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/catalog/modules/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID do Módulo")),
    responses((status = 200, description = "Módulo com submódulos", body = ModuleDetail)),
    security(("api_jwt" = []))
)]
pub async fn get_module(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.catalog_service.module_detail(id).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    put,
    path = "/api/catalog/modules/{id}",
    tag = "Catalog",
    request_body = UpdateModulePayload,
    params(("id" = Uuid, Path, description = "ID do Módulo")),
    responses((status = 200, description = "Módulo atualizado", body = Module)),
    security(("api_jwt" = []))
)]
pub async fn update_module(
    State(app_state): State<AppState>,
    _admin: RequireSystemAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateModulePayload>,
) -> Result<impl IntoResponse, AppError> {
    let module = app_state.catalog_service.update_module(id, payload).await?;
    Ok(Json(module))
}

#[utoipa::path(
    patch,
    path = "/api/catalog/modules/{id}/status",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID do Módulo")),
    responses((status = 200, description = "Status invertido", body = Module)),
    security(("api_jwt" = []))
)]
pub async fn toggle_module(
    State(app_state): State<AppState>,
    _admin: RequireSystemAdmin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let module = app_state.catalog_service.toggle_module(id).await?;
    Ok(Json(module))
}

// =============================================================================
//  SUBMÓDULOS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/catalog/submodules",
    tag = "Catalog",
    request_body = CreateSubmodulePayload,
    responses((status = 201, description = "Submódulo criado", body = Submodule)),
    security(("api_jwt" = []))
)]
pub async fn create_submodule(
    State(app_state): State<AppState>,
    _admin: RequireSystemAdmin,
    Json(payload): Json<CreateSubmodulePayload>,
) -> Result<impl IntoResponse, AppError> {
    let submodule = app_state.catalog_service.create_submodule(payload).await?;
    Ok((StatusCode::CREATED, Json(submodule)))
}

#[utoipa::path(
    get,
    path = "/api/catalog/submodules",
    tag = "Catalog",
    params(ListQuery),
    responses((status = 200, description = "Submódulos paginados (filtro por moduleId)", body = Page<Submodule>)),
    security(("api_jwt" = []))
)]
pub async fn list_submodules(
    State(app_state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.catalog_service.list_submodules(&query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/catalog/submodules/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID do Submódulo")),
    responses((status = 200, description = "Submódulo", body = Submodule)),
    security(("api_jwt" = []))
)]
pub async fn get_submodule(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let submodule = app_state.catalog_service.get_submodule(id).await?;
    Ok(Json(submodule))
}

#[utoipa::path(
    put,
    path = "/api/catalog/submodules/{id}",
    tag = "Catalog",
    request_body = UpdateSubmodulePayload,
    params(("id" = Uuid, Path, description = "ID do Submódulo")),
    responses((status = 200, description = "Submódulo atualizado", body = Submodule)),
    security(("api_jwt" = []))
)]
pub async fn update_submodule(
    State(app_state): State<AppState>,
    _admin: RequireSystemAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSubmodulePayload>,
) -> Result<impl IntoResponse, AppError> {
    let submodule = app_state.catalog_service.update_submodule(id, payload).await?;
    Ok(Json(submodule))
}

#[utoipa::path(
    patch,
    path = "/api/catalog/submodules/{id}/status",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID do Submódulo")),
    responses((status = 200, description = "Status invertido", body = Submodule)),
    security(("api_jwt" = []))
)]
pub async fn toggle_submodule(
    State(app_state): State<AppState>,
    _admin: RequireSystemAdmin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let submodule = app_state.catalog_service.toggle_submodule(id).await?;
    Ok(Json(submodule))
}

// =============================================================================
//  AÇÕES
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/catalog/actions",
    tag = "Catalog",
    request_body = ActionPayload,
    responses(
        (status = 201, description = "Ação criada", body = PermissionAction),
        (status = 409, description = "Ação já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_action(
    State(app_state): State<AppState>,
    _admin: RequireSystemAdmin,
    Json(payload): Json<ActionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let action = app_state.catalog_service.create_action(payload).await?;
    Ok((StatusCode::CREATED, Json(action)))
}

#[utoipa::path(
    get,
    path = "/api/catalog/actions",
    tag = "Catalog",
    params(ListQuery),
    responses((status = 200, description = "Ações paginadas", body = Page<PermissionAction>)),
    security(("api_jwt" = []))
)]
pub async fn list_actions(
    State(app_state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.catalog_service.list_actions(&query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/catalog/actions/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID da Ação")),
    responses((status = 200, description = "Ação", body = PermissionAction)),
    security(("api_jwt" = []))
)]
pub async fn get_action(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let action = app_state.catalog_service.get_action(id).await?;
    Ok(Json(action))
}

#[utoipa::path(
    put,
    path = "/api/catalog/actions/{id}",
    tag = "Catalog",
    request_body = ActionPayload,
    params(("id" = Uuid, Path, description = "ID da Ação")),
    responses((status = 200, description = "Ação renomeada", body = PermissionAction)),
    security(("api_jwt" = []))
)]
pub async fn update_action(
    State(app_state): State<AppState>,
    _admin: RequireSystemAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<ActionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let action = app_state.catalog_service.update_action(id, payload).await?;
    Ok(Json(action))
}

#[utoipa::path(
    patch,
    path = "/api/catalog/actions/{id}/status",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID da Ação")),
    responses((status = 200, description = "Status invertido", body = PermissionAction)),
    security(("api_jwt" = []))
)]
pub async fn toggle_action(
    State(app_state): State<AppState>,
    _admin: RequireSystemAdmin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let action = app_state.catalog_service.toggle_action(id).await?;
    Ok(Json(action))
}

// =============================================================================
//  LISTA BRANCA (AllowedAction)
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/catalog/allowed-actions",
    tag = "Catalog",
    request_body = CreateAllowedActionPayload,
    responses(
        (status = 201, description = "Ação liberada para o alvo", body = AllowedAction),
        (status = 400, description = "moduleId e submoduleId juntos, ou nenhum"),
        (status = 409, description = "Par ação x alvo já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_allowed_action(
    State(app_state): State<AppState>,
    _admin: RequireSystemAdmin,
    Json(payload): Json<CreateAllowedActionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let allowed = app_state.catalog_service.create_allowed_action(payload).await?;
    Ok((StatusCode::CREATED, Json(allowed)))
}

#[utoipa::path(
    get,
    path = "/api/catalog/allowed-actions",
    tag = "Catalog",
    params(ListQuery),
    responses((status = 200, description = "Lista branca paginada", body = Page<AllowedActionView>)),
    security(("api_jwt" = []))
)]
pub async fn list_allowed_actions(
    State(app_state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.catalog_service.list_allowed_actions(&query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/catalog/allowed-actions/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID da AllowedAction")),
    responses((status = 200, description = "Par ação x alvo", body = AllowedAction)),
    security(("api_jwt" = []))
)]
pub async fn get_allowed_action(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let allowed = app_state.catalog_service.get_allowed_action(id).await?;
    Ok(Json(allowed))
}

#[utoipa::path(
    delete,
    path = "/api/catalog/allowed-actions/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID da AllowedAction")),
    responses(
        (status = 204, description = "Removida"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_allowed_action(
    State(app_state): State<AppState>,
    _admin: RequireSystemAdmin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.catalog_service.delete_allowed_action(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
