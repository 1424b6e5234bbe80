// src/services/schedule_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ScheduleRepository, TenantRepository, UserRepository},
    models::{
        auth::CallerIdentity,
        schedule::{Schedule, ScheduleOwner, SchedulePayload},
    },
};

/// Horários de filiais e de usuários; o mesmo fluxo serve os dois donos.
#[derive(Clone)]
pub struct ScheduleService {
    repo: ScheduleRepository,
    tenant_repo: TenantRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl ScheduleService {
    pub fn new(
        repo: ScheduleRepository,
        tenant_repo: TenantRepository,
        user_repo: UserRepository,
        pool: PgPool,
    ) -> Self {
        Self { repo, tenant_repo, user_repo, pool }
    }

    /// O dono existe e o chamador pode mexer nele?
    async fn ensure_owner(&self, caller: &CallerIdentity, owner: ScheduleOwner, owner_id: Uuid) -> Result<(), AppError> {
        match owner {
            ScheduleOwner::Subsidiary => {
                let subsidiary = self
                    .tenant_repo
                    .find_subsidiary(&self.pool, owner_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Filial"))?;
                caller.ensure_tenant(subsidiary.tenant_id)
            }
            ScheduleOwner::User => {
                let user = self
                    .user_repo
                    .find_by_id(&self.pool, owner_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Usuário"))?;
                match user.tenant_id {
                    Some(tenant_id) => caller.ensure_tenant(tenant_id),
                    None => caller.ensure_system_admin(),
                }
            }
        }
    }

    async fn get(&self, caller: &CallerIdentity, owner: ScheduleOwner, id: Uuid) -> Result<Schedule, AppError> {
        let schedule = self
            .repo
            .find(owner, id)
            .await?
            .ok_or_else(|| AppError::not_found(owner.label()))?;
        self.ensure_owner(caller, owner, schedule.owner_id).await?;
        Ok(schedule)
    }

    pub async fn list(
        &self,
        caller: &CallerIdentity,
        owner: ScheduleOwner,
        owner_id: Uuid,
    ) -> Result<Vec<Schedule>, AppError> {
        self.ensure_owner(caller, owner, owner_id).await?;
        self.repo.list_by_owner(owner, owner_id).await
    }

    pub async fn create(
        &self,
        caller: &CallerIdentity,
        owner: ScheduleOwner,
        owner_id: Uuid,
        payload: SchedulePayload,
    ) -> Result<Schedule, AppError> {
        payload.validate()?;
        self.ensure_owner(caller, owner, owner_id).await?;

        if self.repo.window_exists(owner, owner_id, &payload, None).await? {
            return Err(AppError::Conflict(format!("{} já cadastrado.", owner.label())));
        }

        self.repo.create(&self.pool, owner, owner_id, &payload).await
    }

    pub async fn update(
        &self,
        caller: &CallerIdentity,
        owner: ScheduleOwner,
        id: Uuid,
        payload: SchedulePayload,
    ) -> Result<Schedule, AppError> {
        payload.validate()?;
        let current = self.get(caller, owner, id).await?;

        // Duplicado é outra linha com a mesma janela, nunca a própria
        if self
            .repo
            .window_exists(owner, current.owner_id, &payload, Some(id))
            .await?
        {
            return Err(AppError::Conflict(format!("{} já cadastrado.", owner.label())));
        }

        self.repo.update(&self.pool, owner, id, &payload).await
    }

    pub async fn toggle(&self, caller: &CallerIdentity, owner: ScheduleOwner, id: Uuid) -> Result<Schedule, AppError> {
        self.get(caller, owner, id).await?;
        self.repo
            .toggle_status(owner, id)
            .await?
            .ok_or_else(|| AppError::not_found(owner.label()))
    }
}
