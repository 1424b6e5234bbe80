// src/services/user_service.rs

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        normalize::{keyed_name, NameKind},
        pagination::{ListQuery, Page},
    },
    db::{RbacRepository, TenantRepository, UserRepository},
    models::{
        auth::{CallerIdentity, CreateUserPayload, UpdateUserPayload, User},
        rbac::Role,
        tenancy::GLOBAL_TENANT_ID,
    },
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    rbac_repo: RbacRepository,
    tenant_repo: TenantRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(
        user_repo: UserRepository,
        rbac_repo: RbacRepository,
        tenant_repo: TenantRepository,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, rbac_repo, tenant_repo, pool }
    }

    /// Cria o usuário na filial. O nome de usuário é único por filial, não globalmente.
    pub async fn create_user(&self, caller: &CallerIdentity, payload: CreateUserPayload) -> Result<User, AppError> {
        payload.validate()?;

        let subsidiary = self
            .tenant_repo
            .find_subsidiary(&self.pool, payload.subsidiary_id)
            .await?
            .ok_or_else(|| AppError::not_found("Filial"))?;
        caller.ensure_tenant(subsidiary.tenant_id)?;
        if subsidiary.tenant_id == GLOBAL_TENANT_ID {
            return Err(AppError::Integrity("A filial GLOBAL só aceita o usuário de sistema.".into()));
        }

        let role = self.role_in_subsidiary(payload.role_id, subsidiary.id).await?;

        let (username, username_key) = keyed_name(&payload.username, NameKind::Username, "username")?;
        if self
            .user_repo
            .find_in_subsidiary(subsidiary.id, &username_key)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!("O usuário '{username}' já existe nesta filial.")));
        }

        // 1. Hashing (fora da transação, não toca no banco)
        let password_hash = hash_password(&payload.password).await?;

        let mut tx = self.pool.begin().await?;
        let tenant = self.tenant_repo.lock_tenant(&mut *tx, subsidiary.tenant_id).await?;
        let existing = self.user_repo.count_users(&mut *tx, tenant.id).await?;
        if existing >= i64::from(tenant.max_users) {
            return Err(AppError::CapacityExceeded(format!(
                "A empresa já atingiu o limite de {} usuário(s).",
                tenant.max_users
            )));
        }
        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                &username,
                &username_key,
                &password_hash,
                role.id,
                subsidiary.id,
                Some(tenant.id),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, subsidiary_id = %subsidiary.id, "Usuário criado: {}", user.username);
        Ok(user)
    }

    pub async fn update_user(
        &self,
        caller: &CallerIdentity,
        id: Uuid,
        payload: UpdateUserPayload,
    ) -> Result<User, AppError> {
        payload.validate()?;
        let mut user = self.get_user(caller, id).await?;

        if let Some(raw) = payload.username.as_deref() {
            let (username, username_key) = keyed_name(raw, NameKind::Username, "username")?;
            if let Some(other) = self
                .user_repo
                .find_in_subsidiary(user.subsidiary_id, &username_key)
                .await?
            {
                if other.id != id {
                    return Err(AppError::Conflict(format!("O usuário '{username}' já existe nesta filial.")));
                }
            }
            user.username = username;
            user.username_key = username_key;
        }
        if let Some(role_id) = payload.role_id {
            if user.tenant_id.is_none() {
                return Err(AppError::Integrity("O cargo do usuário de sistema não pode mudar.".into()));
            }
            user.role_id = self.role_in_subsidiary(role_id, user.subsidiary_id).await?.id;
        }
        if let Some(password) = payload.password.as_deref() {
            user.password_hash = hash_password(password).await?;
        }

        self.user_repo.update_user(&self.pool, &user).await
    }

    /// Usuários não têm descendentes: a troca de status não propaga.
    pub async fn toggle_user(&self, caller: &CallerIdentity, id: Uuid) -> Result<User, AppError> {
        let user = self.get_user(caller, id).await?;
        if user.tenant_id.is_none() {
            return Err(AppError::Integrity("O usuário de sistema não pode ser desativado.".into()));
        }
        self.user_repo
            .toggle_status(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Usuário"))
    }

    pub async fn get_user(&self, caller: &CallerIdentity, id: Uuid) -> Result<User, AppError> {
        let user = self
            .user_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Usuário"))?;
        match user.tenant_id {
            Some(tenant_id) => caller.ensure_tenant(tenant_id)?,
            None => caller.ensure_system_admin()?,
        }
        Ok(user)
    }

    pub async fn list_users(&self, caller: &CallerIdentity, query: &ListQuery) -> Result<Page<User>, AppError> {
        let tenant_id = caller.scoped_tenant(query.tenant_id);
        let (data, total) = self.user_repo.list_users(query, tenant_id).await?;
        Ok(Page::new(data, total, query))
    }

    /// O cargo precisa existir e pertencer à mesma filial do usuário.
    async fn role_in_subsidiary(&self, role_id: Uuid, subsidiary_id: Uuid) -> Result<Role, AppError> {
        let role = self
            .rbac_repo
            .find_role(&self.pool, role_id)
            .await?
            .ok_or_else(|| AppError::not_found("Cargo"))?;
        if role.subsidiary_id != subsidiary_id {
            return Err(AppError::Integrity("O cargo não pertence à filial do usuário.".into()));
        }
        Ok(role)
    }
}
