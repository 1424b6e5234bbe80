// src/services/tenancy_service.rs

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        normalize::{keyed_name, NameKind},
        pagination::{ListQuery, Page},
    },
    db::TenantRepository,
    models::{
        auth::CallerIdentity,
        tenancy::{
            CreateSubsidiaryPayload, CreateTenantPayload, Subsidiary, Tenant, UpdateSubsidiaryPayload,
            UpdateTenantPayload, GLOBAL_SUBSIDIARY_ID, GLOBAL_TENANT_ID,
        },
    },
};

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    pool: PgPool, // Usamos a pool para iniciar transações
}

impl TenantService {
    /// Cria uma nova instância do serviço de tenancy.
    pub fn new(tenant_repo: TenantRepository, pool: PgPool) -> Self {
        Self { tenant_repo, pool }
    }

    // =========================================================================
    //  TENANTS
    // =========================================================================

    pub async fn create_tenant(&self, caller: &CallerIdentity, payload: CreateTenantPayload) -> Result<Tenant, AppError> {
        caller.ensure_system_admin()?;
        payload.validate()?;
        let (name, name_key) = keyed_name(&payload.name, NameKind::Tenant, "name")?;

        if self.tenant_repo.find_tenant_by_key(&name_key).await?.is_some() {
            return Err(AppError::Conflict(format!("Já existe uma empresa chamada '{name}'.")));
        }

        let tenant = self
            .tenant_repo
            .create_tenant(
                &self.pool,
                None,
                &name,
                &name_key,
                (payload.max_subsidiaries, payload.max_users, payload.max_roles),
            )
            .await?;

        tracing::info!(tenant_id = %tenant.id, "Empresa criada: {}", tenant.name);
        Ok(tenant)
    }

    pub async fn update_tenant(
        &self,
        caller: &CallerIdentity,
        id: Uuid,
        payload: UpdateTenantPayload,
    ) -> Result<Tenant, AppError> {
        caller.ensure_system_admin()?;
        payload.validate()?;
        let mut tenant = self.get_tenant(caller, id).await?;
        reject_global_tenant(&tenant)?;

        if let Some(raw) = payload.name.as_deref() {
            let (name, name_key) = keyed_name(raw, NameKind::Tenant, "name")?;
            if let Some(other) = self.tenant_repo.find_tenant_by_key(&name_key).await? {
                if other.id != id {
                    return Err(AppError::Conflict(format!("Já existe uma empresa chamada '{name}'.")));
                }
            }
            tenant.name = name;
            tenant.name_key = name_key;
        }
        if let Some(max) = payload.max_subsidiaries {
            tenant.max_subsidiaries = max;
        }
        if let Some(max) = payload.max_users {
            tenant.max_users = max;
        }
        if let Some(max) = payload.max_roles {
            tenant.max_roles = max;
        }

        self.tenant_repo.update_tenant(&self.pool, &tenant).await
    }

    /// Inverte o status do tenant e propaga para filiais, cargos e usuários numa única transação.
    pub async fn toggle_tenant(&self, caller: &CallerIdentity, id: Uuid) -> Result<Tenant, AppError> {
        caller.ensure_system_admin()?;
        let current = self.get_tenant(caller, id).await?;
        reject_global_tenant(&current)?;

        let mut tx = self.pool.begin().await?;
        let tenant = self
            .tenant_repo
            .toggle_tenant_status(&mut *tx, id)
            .await?;
        self.tenant_repo
            .cascade_tenant_status(&mut *tx, id, tenant.status)
            .await
            .map_err(|e| cascade_failure("empresa", e))?;
        tx.commit().await?;

        tracing::info!(tenant_id = %id, status = tenant.status, "Status da empresa propagado");
        Ok(tenant)
    }

    pub async fn get_tenant(&self, caller: &CallerIdentity, id: Uuid) -> Result<Tenant, AppError> {
        let tenant = self
            .tenant_repo
            .find_tenant(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Empresa"))?;
        caller.ensure_tenant(tenant.id)?;
        Ok(tenant)
    }

    pub async fn list_tenants(&self, caller: &CallerIdentity, query: &ListQuery) -> Result<Page<Tenant>, AppError> {
        caller.ensure_system_admin()?;
        let (data, total) = self.tenant_repo.list_tenants(query).await?;
        Ok(Page::new(data, total, query))
    }

    // =========================================================================
    //  FILIAIS
    // =========================================================================

    pub async fn create_subsidiary(
        &self,
        caller: &CallerIdentity,
        payload: CreateSubsidiaryPayload,
    ) -> Result<Subsidiary, AppError> {
        payload.validate()?;
        let tenant = self.get_tenant(caller, payload.tenant_id).await?;
        reject_global_tenant(&tenant)?;
        let (name, name_key) = keyed_name(&payload.name, NameKind::Subsidiary, "name")?;

        if self.tenant_repo.find_subsidiary_by_key(tenant.id, &name_key).await?.is_some() {
            return Err(AppError::Conflict(format!("A filial '{name}' já existe nesta empresa.")));
        }

        let mut tx = self.pool.begin().await?;
        let tenant = self.tenant_repo.lock_tenant(&mut *tx, tenant.id).await?;
        let existing = self.tenant_repo.count_subsidiaries(&mut *tx, tenant.id).await?;
        if existing >= i64::from(tenant.max_subsidiaries) {
            return Err(AppError::CapacityExceeded(format!(
                "A empresa já atingiu o limite de {} filial(is).",
                tenant.max_subsidiaries
            )));
        }
        let subsidiary = self
            .tenant_repo
            .create_subsidiary(
                &mut *tx,
                None,
                tenant.id,
                &name,
                &name_key,
                payload.subsidiary_type,
                payload.allow_negative_stock,
            )
            .await?;
        tx.commit().await?;

        tracing::info!(subsidiary_id = %subsidiary.id, tenant_id = %tenant.id, "Filial criada: {}", subsidiary.name);
        Ok(subsidiary)
    }

    pub async fn update_subsidiary(
        &self,
        caller: &CallerIdentity,
        id: Uuid,
        payload: UpdateSubsidiaryPayload,
    ) -> Result<Subsidiary, AppError> {
        payload.validate()?;
        let mut subsidiary = self.get_subsidiary(caller, id).await?;
        reject_global_subsidiary(&subsidiary)?;

        if let Some(raw) = payload.name.as_deref() {
            let (name, name_key) = keyed_name(raw, NameKind::Subsidiary, "name")?;
            if let Some(other) = self
                .tenant_repo
                .find_subsidiary_by_key(subsidiary.tenant_id, &name_key)
                .await?
            {
                if other.id != id {
                    return Err(AppError::Conflict(format!("A filial '{name}' já existe nesta empresa.")));
                }
            }
            subsidiary.name = name;
            subsidiary.name_key = name_key;
        }
        if let Some(kind) = payload.subsidiary_type {
            subsidiary.subsidiary_type = kind;
        }
        if let Some(allow) = payload.allow_negative_stock {
            subsidiary.allow_negative_stock = allow;
        }

        self.tenant_repo.update_subsidiary(&self.pool, &subsidiary).await
    }

    /// Inverte o status da filial e propaga para seus cargos e usuários.
    pub async fn toggle_subsidiary(&self, caller: &CallerIdentity, id: Uuid) -> Result<Subsidiary, AppError> {
        let current = self.get_subsidiary(caller, id).await?;
        reject_global_subsidiary(&current)?;

        let mut tx = self.pool.begin().await?;
        let subsidiary = self
            .tenant_repo
            .toggle_subsidiary_status(&mut *tx, id)
            .await?;
        self.tenant_repo
            .cascade_subsidiary_status(&mut *tx, id, subsidiary.status)
            .await
            .map_err(|e| cascade_failure("filial", e))?;
        tx.commit().await?;

        tracing::info!(subsidiary_id = %id, status = subsidiary.status, "Status da filial propagado");
        Ok(subsidiary)
    }

    pub async fn get_subsidiary(&self, caller: &CallerIdentity, id: Uuid) -> Result<Subsidiary, AppError> {
        let subsidiary = self
            .tenant_repo
            .find_subsidiary(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Filial"))?;
        caller.ensure_tenant(subsidiary.tenant_id)?;
        Ok(subsidiary)
    }

    pub async fn list_subsidiaries(
        &self,
        caller: &CallerIdentity,
        query: &ListQuery,
    ) -> Result<Page<Subsidiary>, AppError> {
        let tenant_id = caller.scoped_tenant(query.tenant_id);
        let (data, total) = self.tenant_repo.list_subsidiaries(query, tenant_id).await?;
        Ok(Page::new(data, total, query))
    }
}

fn reject_global_tenant(tenant: &Tenant) -> Result<(), AppError> {
    if tenant.is_global() {
        return Err(AppError::Integrity("A empresa GLOBAL é reservada ao sistema.".into()));
    }
    Ok(())
}

fn reject_global_subsidiary(subsidiary: &Subsidiary) -> Result<(), AppError> {
    if subsidiary.id == GLOBAL_SUBSIDIARY_ID || subsidiary.tenant_id == GLOBAL_TENANT_ID {
        return Err(AppError::Integrity("A filial GLOBAL é reservada ao sistema.".into()));
    }
    Ok(())
}

/// Qualquer falha na etapa de propagação derruba a transação inteira.
pub(crate) fn cascade_failure(parent: &str, e: AppError) -> AppError {
    tracing::error!("Falha ao propagar status da {}: {:?}", parent, e);
    AppError::CascadeFailure(format!("não foi possível propagar o status da {parent}"))
}
