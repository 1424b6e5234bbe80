// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::models::rbac::SYSTEM_ADMIN_ROLE_ID;

pub const SYSTEM_ADMIN_USERNAME: &str = "system.admin";

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[schema(example = "luis")]
    pub username: String,
    #[serde(skip_serializing)]
    pub username_key: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub role_id: Uuid,
    pub subsidiary_id: Uuid,
    /// Nulo apenas para o system.admin
    pub tenant_id: Option<Uuid>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identidade de quem chama, extraída de um token já verificado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallerIdentity {
    pub id: Uuid,
    pub username: String,
    pub role_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub subsidiary_id: Uuid,
}

impl CallerIdentity {
    pub fn is_system_admin(&self) -> bool {
        self.role_id == SYSTEM_ADMIN_ROLE_ID
    }

    /// Pode operar sobre dados do tenant informado?
    pub fn can_access_tenant(&self, tenant_id: Uuid) -> bool {
        self.is_system_admin() || self.tenant_id == Some(tenant_id)
    }

    pub fn ensure_system_admin(&self) -> Result<(), AppError> {
        if self.is_system_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Operação restrita ao administrador do sistema.".into()))
        }
    }

    pub fn ensure_tenant(&self, tenant_id: Uuid) -> Result<(), AppError> {
        if self.can_access_tenant(tenant_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden("O registro pertence a outra empresa.".into()))
        }
    }

    /// Escopo forçado das listagens: o system admin escolhe, os demais ficam no próprio tenant.
    pub fn scoped_tenant(&self, requested: Option<Uuid>) -> Option<Uuid> {
        if self.is_system_admin() {
            requested
        } else {
            self.tenant_id
        }
    }
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: Uuid, // Subject (ID do usuário)
    pub username: String,
    pub role_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub subsidiary_id: Uuid,
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

impl From<Claims> for CallerIdentity {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            role_id: claims.role_id,
            tenant_id: claims.tenant_id,
            subsidiary_id: claims.subsidiary_id,
        }
    }
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginUserPayload {
    #[validate(length(min = 1, message = "O usuário é obrigatório."))]
    #[schema(example = "system.admin")]
    pub username: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    /// Necessário quando o mesmo usuário existe em mais de uma filial
    pub subsidiary_id: Option<Uuid>,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 3, max = 60, message = "O usuário deve ter entre 3 e 60 caracteres."))]
    #[schema(example = "luis")]
    pub username: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    pub role_id: Uuid,
    pub subsidiary_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(length(min = 3, max = 60, message = "O usuário deve ter entre 3 e 60 caracteres."))]
    pub username: Option<String>,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: Option<String>,
    pub role_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role_id: Uuid, tenant_id: Option<Uuid>) -> CallerIdentity {
        CallerIdentity {
            id: Uuid::new_v4(),
            username: "luis".into(),
            role_id,
            tenant_id,
            subsidiary_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn system_admin_sees_every_tenant() {
        let admin = caller(SYSTEM_ADMIN_ROLE_ID, None);
        let other = Uuid::new_v4();
        assert!(admin.is_system_admin());
        assert!(admin.can_access_tenant(other));
        assert_eq!(admin.scoped_tenant(Some(other)), Some(other));
        assert_eq!(admin.scoped_tenant(None), None);
    }

    #[test]
    fn tenant_user_is_pinned_to_own_tenant() {
        let own = Uuid::new_v4();
        let user = caller(Uuid::new_v4(), Some(own));
        assert!(!user.is_system_admin());
        assert!(user.can_access_tenant(own));
        assert!(!user.can_access_tenant(Uuid::new_v4()));
        assert_eq!(user.scoped_tenant(Some(Uuid::new_v4())), Some(own));
        assert!(matches!(user.ensure_system_admin(), Err(AppError::Forbidden(_))));
        assert!(matches!(user.ensure_tenant(Uuid::new_v4()), Err(AppError::Forbidden(_))));
        assert!(user.ensure_tenant(own).is_ok());
    }

    #[test]
    fn password_hash_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            username: "luis".into(),
            username_key: "luis".into(),
            password_hash: "$2b$12$secret".into(),
            role_id: Uuid::new_v4(),
            subsidiary_id: Uuid::new_v4(),
            tenant_id: None,
            status: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("usernameKey").is_none());
        assert_eq!(json["username"], "luis");
    }
}
