// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{common::error::AppError, middleware::auth::AuthenticatedUser, models::auth::CallerIdentity};

/// Guardião das rotas de administração do sistema (tenants e catálogo).
///
/// Depende do `auth_guard` ter rodado antes; sem identidade a resposta é 401,
/// com identidade de outro cargo é 403.
#[derive(Debug, Clone)]
pub struct RequireSystemAdmin(pub CallerIdentity);

impl<S> FromRequestParts<S> for RequireSystemAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(caller) = AuthenticatedUser::from_request_parts(parts, state).await?;
        caller.ensure_system_admin()?;
        Ok(RequireSystemAdmin(caller))
    }
}
