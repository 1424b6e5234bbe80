// src/handlers/schedules.rs
//
// Horários de filiais e de usuários. As duas famílias de rotas são finas:
// só escolhem o `ScheduleOwner` e delegam ao mesmo serviço.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::schedule::{Schedule, ScheduleOwner, SchedulePayload},
};

// =============================================================================
//  FILIAL
// =============================================================================

// GET /api/subsidiaries/{id}/schedules
#[utoipa::path(
    get,
    path = "/api/subsidiaries/{id}/schedules",
    tag = "Schedules",
    params(("id" = Uuid, Path, description = "ID da Filial")),
    responses((status = 200, description = "Horários da filial", body = Vec<Schedule>)),
    security(("api_jwt" = []))
)]
pub async fn list_subsidiary_schedules(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(subsidiary_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let schedules = app_state
        .schedule_service
        .list(&caller, ScheduleOwner::Subsidiary, subsidiary_id)
        .await?;
    Ok(Json(schedules))
}

// POST /api/subsidiaries/{id}/schedules
#[utoipa::path(
    post,
    path = "/api/subsidiaries/{id}/schedules",
    tag = "Schedules",
    request_body = SchedulePayload,
    params(("id" = Uuid, Path, description = "ID da Filial")),
    responses(
        (status = 201, description = "Horário criado", body = Schedule),
        (status = 400, description = "Fechamento antes da abertura ou dias invertidos"),
        (status = 409, description = "Janela idêntica já cadastrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_subsidiary_schedule(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(subsidiary_id): Path<Uuid>,
    Json(payload): Json<SchedulePayload>,
) -> Result<impl IntoResponse, AppError> {
    let schedule = app_state
        .schedule_service
        .create(&caller, ScheduleOwner::Subsidiary, subsidiary_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

// PUT /api/subsidiary-schedules/{id}
#[utoipa::path(
    put,
    path = "/api/subsidiary-schedules/{id}",
    tag = "Schedules",
    request_body = SchedulePayload,
    params(("id" = Uuid, Path, description = "ID do Horário")),
    responses((status = 200, description = "Horário atualizado", body = Schedule)),
    security(("api_jwt" = []))
)]
pub async fn update_subsidiary_schedule(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SchedulePayload>,
) -> Result<impl IntoResponse, AppError> {
    let schedule = app_state
        .schedule_service
        .update(&caller, ScheduleOwner::Subsidiary, id, payload)
        .await?;
    Ok(Json(schedule))
}

// PATCH /api/subsidiary-schedules/{id}/status
#[utoipa::path(
    patch,
    path = "/api/subsidiary-schedules/{id}/status",
    tag = "Schedules",
    params(("id" = Uuid, Path, description = "ID do Horário")),
    responses((status = 200, description = "Status invertido", body = Schedule)),
    security(("api_jwt" = []))
)]
pub async fn toggle_subsidiary_schedule(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let schedule = app_state
        .schedule_service
        .toggle(&caller, ScheduleOwner::Subsidiary, id)
        .await?;
    Ok(Json(schedule))
}

// =============================================================================
//  USUÁRIO
// =============================================================================

// GET /api/users/{id}/schedules
#[utoipa::path(
    get,
    path = "/api/users/{id}/schedules",
    tag = "Schedules",
    params(("id" = Uuid, Path, description = "ID do Usuário")),
    responses((status = 200, description = "Horários do usuário", body = Vec<Schedule>)),
    security(("api_jwt" = []))
)]
pub async fn list_user_schedules(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let schedules = app_state.schedule_service.list(&caller, ScheduleOwner::User, user_id).await?;
    Ok(Json(schedules))
}

// POST /api/users/{id}/schedules
#[utoipa::path(
    post,
    path = "/api/users/{id}/schedules",
    tag = "Schedules",
    request_body = SchedulePayload,
    params(("id" = Uuid, Path, description = "ID do Usuário")),
    responses(
        (status = 201, description = "Horário criado", body = Schedule),
        (status = 409, description = "Janela idêntica já cadastrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user_schedule(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<SchedulePayload>,
) -> Result<impl IntoResponse, AppError> {
    let schedule = app_state
        .schedule_service
        .create(&caller, ScheduleOwner::User, user_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

// PUT /api/user-schedules/{id}
#[utoipa::path(
    put,
    path = "/api/user-schedules/{id}",
    tag = "Schedules",
    request_body = SchedulePayload,
    params(("id" = Uuid, Path, description = "ID do Horário")),
    responses((status = 200, description = "Horário atualizado", body = Schedule)),
    security(("api_jwt" = []))
)]
pub async fn update_user_schedule(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SchedulePayload>,
) -> Result<impl IntoResponse, AppError> {
    let schedule = app_state
        .schedule_service
        .update(&caller, ScheduleOwner::User, id, payload)
        .await?;
    Ok(Json(schedule))
}

// PATCH /api/user-schedules/{id}/status
#[utoipa::path(
    patch,
    path = "/api/user-schedules/{id}/status",
    tag = "Schedules",
    params(("id" = Uuid, Path, description = "ID do Horário")),
    responses((status = 200, description = "Status invertido", body = Schedule)),
    security(("api_jwt" = []))
)]
pub async fn toggle_user_schedule(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let schedule = app_state.schedule_service.toggle(&caller, ScheduleOwner::User, id).await?;
    Ok(Json(schedule))
}
