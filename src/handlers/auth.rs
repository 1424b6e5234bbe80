// src/handlers/auth.rs

use axum::{extract::State, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{AuthResponse, CallerIdentity, LoginUserPayload},
};

// Handler de login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Token JWT", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas"),
        (status = 403, description = "Conta inativa"),
        (status = 409, description = "Usuário existe em mais de uma filial; informe subsidiaryId")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginUserPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    let token = app_state.auth_service.login_user(payload).await?;
    Ok(Json(AuthResponse { token }))
}

// Handler da rota protegida /me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses((status = 200, description = "Identidade contida no token", body = CallerIdentity)),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(caller): AuthenticatedUser) -> Json<CallerIdentity> {
    Json(caller)
}
