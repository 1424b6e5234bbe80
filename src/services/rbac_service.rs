// src/services/rbac_service.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        normalize::{keyed_name, NameKind},
        pagination::{ListQuery, Page},
    },
    db::{CatalogRepository, RbacRepository, TenantRepository},
    models::{
        auth::CallerIdentity,
        catalog::AllowedTarget,
        rbac::{
            ConfigSection, CreateRolePayload, CreateRolePermissionPayload, PermissionTarget, Role,
            RolePermission, RolePermissionDetail, RoleTemplate, SeedResult, SidebarSection,
            UpdateRolePayload, SYSTEM_ADMIN_ROLE_ID,
        },
        tenancy::GLOBAL_TENANT_ID,
    },
    services::{
        permission_tree::{
            build_configuration_tree, build_sidebar, plan_role_permissions, template_uses_hidden_sections,
        },
        tenancy_service::cascade_failure,
    },
};

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
    tenant_repo: TenantRepository,
    catalog_repo: CatalogRepository,
    pool: PgPool,
}

impl RbacService {
    pub fn new(
        repo: RbacRepository,
        tenant_repo: TenantRepository,
        catalog_repo: CatalogRepository,
        pool: PgPool,
    ) -> Self {
        Self { repo, tenant_repo, catalog_repo, pool }
    }

    // =========================================================================
    //  CARGOS
    // =========================================================================

    /// Cria o cargo e, se o template não for CUSTOM, já semeia as permissões na mesma transação.
    pub async fn create_role(&self, caller: &CallerIdentity, payload: CreateRolePayload) -> Result<Role, AppError> {
        payload.validate()?;
        caller.ensure_tenant(payload.tenant_id)?;

        if payload.template == RoleTemplate::SystemAdmin || payload.tenant_id == GLOBAL_TENANT_ID {
            return Err(AppError::Integrity("O cargo de sistema é reservado e não pode ser criado.".into()));
        }

        let tenant = self
            .tenant_repo
            .find_tenant(&self.pool, payload.tenant_id)
            .await?
            .ok_or_else(|| AppError::not_found("Empresa"))?;
        let subsidiary = self
            .tenant_repo
            .find_subsidiary(&self.pool, payload.subsidiary_id)
            .await?
            .ok_or_else(|| AppError::not_found("Filial"))?;

        // Relação inconsistente, não duplicidade
        if subsidiary.tenant_id != tenant.id {
            return Err(AppError::Integrity("A filial não pertence à empresa informada.".into()));
        }

        let (name, name_key) = keyed_name(&payload.name, NameKind::Role, "name")?;
        if self
            .repo
            .find_role_by_key(tenant.id, subsidiary.id, &name_key)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!("Já existe o cargo '{name}' nesta filial.")));
        }

        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        let tenant = self.tenant_repo.lock_tenant(&mut *tx, tenant.id).await?;
        let existing = self.repo.count_roles(&mut *tx, tenant.id).await?;
        if existing >= i64::from(tenant.max_roles) {
            return Err(AppError::CapacityExceeded(format!(
                "A empresa já atingiu o limite de {} cargo(s).",
                tenant.max_roles
            )));
        }

        // 2. Cria o Cargo
        let role = self
            .repo
            .create_role(&mut *tx, None, tenant.id, subsidiary.id, &name, &name_key, payload.template)
            .await?;

        // 3. Semeia as permissões do template
        let inserted = self.seed_template(&mut tx, &role).await?;

        // 4. Commit
        tx.commit().await?;

        tracing::info!(role_id = %role.id, template = ?role.template, inserted, "Cargo criado: {}", role.name);
        Ok(role)
    }

    /// Só o nome muda; o template é fixo desde a criação.
    pub async fn update_role(
        &self,
        caller: &CallerIdentity,
        id: Uuid,
        payload: UpdateRolePayload,
    ) -> Result<Role, AppError> {
        payload.validate()?;
        let role = self.get_role(caller, id).await?;
        reject_system_role(&role)?;

        let (name, name_key) = keyed_name(&payload.name, NameKind::Role, "name")?;
        if let Some(other) = self
            .repo
            .find_role_by_key(role.tenant_id, role.subsidiary_id, &name_key)
            .await?
        {
            if other.id != id {
                return Err(AppError::Conflict(format!("Já existe o cargo '{name}' nesta filial.")));
            }
        }

        self.repo.rename_role(&self.pool, id, &name, &name_key).await
    }

    /// Inverte o status do cargo e leva junto os usuários do mesmo (cargo, tenant, filial).
    pub async fn toggle_role(&self, caller: &CallerIdentity, id: Uuid) -> Result<Role, AppError> {
        let current = self.get_role(caller, id).await?;
        reject_system_role(&current)?;

        let mut tx = self.pool.begin().await?;
        let role = self.repo.toggle_role_status(&mut *tx, id).await?;
        let users = self
            .repo
            .cascade_role_status(&mut *tx, &role)
            .await
            .map_err(|e| cascade_failure("cargo", e))?;
        tx.commit().await?;

        tracing::info!(role_id = %id, status = role.status, users, "Status do cargo propagado");
        Ok(role)
    }

    pub async fn get_role(&self, caller: &CallerIdentity, id: Uuid) -> Result<Role, AppError> {
        let role = self
            .repo
            .find_role(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Cargo"))?;
        caller.ensure_tenant(role.tenant_id)?;
        Ok(role)
    }

    pub async fn list_roles(&self, caller: &CallerIdentity, query: &ListQuery) -> Result<Page<Role>, AppError> {
        let tenant_id = caller.scoped_tenant(query.tenant_id);
        let (data, total) = self.repo.list_roles(query, tenant_id).await?;
        Ok(Page::new(data, total, query))
    }

    // =========================================================================
    //  SEEDING EM MASSA
    // =========================================================================

    /// Insere (pulando duplicadas) as concessões do template do cargo. Roda dentro da
    /// transação do chamador: ou entram todas, ou nenhuma.
    pub(crate) async fn seed_template(&self, conn: &mut PgConnection, role: &Role) -> Result<u64, AppError> {
        if role.template == RoleTemplate::Custom {
            return Ok(0);
        }
        let rows = self.catalog_repo.list_catalog_rows(&mut *conn).await?;
        let grants = plan_role_permissions(role.template, &rows);
        self.repo.insert_grants(&mut *conn, role.id, role.tenant_id, &grants).await
    }

    /// Reexecuta o seed do template. Idempotente: a segunda chamada insere zero linhas.
    pub async fn seed_role_permissions(&self, caller: &CallerIdentity, role_id: Uuid) -> Result<SeedResult, AppError> {
        let role = self.get_role(caller, role_id).await?;
        if role.template == RoleTemplate::SystemAdmin {
            caller.ensure_system_admin()?;
        }

        let mut tx = self.pool.begin().await?;
        let inserted = self.seed_template(&mut tx, &role).await?;
        tx.commit().await?;

        tracing::info!(role_id = %role.id, inserted, "Permissões do template aplicadas");
        Ok(SeedResult { role_id: role.id, inserted })
    }

    // =========================================================================
    //  PERMISSÕES AVULSAS
    // =========================================================================

    /// Concessão avulsa: valida hierarquia e lista branca, e rejeita duplicadas com Conflict.
    pub async fn create_permission(
        &self,
        caller: &CallerIdentity,
        payload: CreateRolePermissionPayload,
    ) -> Result<RolePermission, AppError> {
        let target = PermissionTarget::from_ids(payload.section_id, payload.module_id, payload.submodule_id)?;
        let role = self.get_role(caller, payload.role_id).await?;
        reject_system_role(&role)?;

        self.catalog_repo
            .find_action(&self.pool, payload.action_id)
            .await?
            .ok_or_else(|| AppError::not_found("Ação"))?;
        self.ensure_hierarchy(target).await?;

        let allowed = match target {
            PermissionTarget::Section { section_id } => {
                self.catalog_repo
                    .is_action_allowed_in_section(&self.pool, payload.action_id, section_id)
                    .await?
            }
            PermissionTarget::Module { module_id, .. } => {
                self.catalog_repo
                    .is_action_allowed_in_module(&self.pool, payload.action_id, module_id)
                    .await?
            }
            PermissionTarget::Submodule { submodule_id, .. } => {
                self.catalog_repo
                    .is_action_allowed(&self.pool, payload.action_id, AllowedTarget::Submodule(submodule_id))
                    .await?
            }
        };
        if !allowed {
            return Err(AppError::Integrity("A ação não está liberada para o alvo informado.".into()));
        }

        if self.repo.permission_exists(role.id, payload.action_id, target).await? {
            return Err(AppError::Conflict("O cargo já possui esta permissão.".into()));
        }

        let row = self
            .repo
            .insert_permission(&self.pool, &role, payload.action_id, target)
            .await?;
        RolePermission::try_from(row)
    }

    /// Módulo dentro da seção, submódulo dentro do módulo.
    async fn ensure_hierarchy(&self, target: PermissionTarget) -> Result<(), AppError> {
        let section_id = target.section_id();
        self.catalog_repo
            .find_section(&self.pool, section_id)
            .await?
            .ok_or_else(|| AppError::not_found("Seção"))?;

        if let Some(module_id) = target.module_id() {
            let module = self
                .catalog_repo
                .find_module(&self.pool, module_id)
                .await?
                .ok_or_else(|| AppError::not_found("Módulo"))?;
            if module.section_id != section_id {
                return Err(AppError::Integrity("O módulo não pertence à seção informada.".into()));
            }
        }

        if let (Some(module_id), Some(submodule_id)) = (target.module_id(), target.submodule_id()) {
            let submodule = self
                .catalog_repo
                .find_submodule(&self.pool, submodule_id)
                .await?
                .ok_or_else(|| AppError::not_found("Submódulo"))?;
            if submodule.module_id != module_id {
                return Err(AppError::Integrity("O submódulo não pertence ao módulo informado.".into()));
            }
        }
        Ok(())
    }

    pub async fn delete_permission(&self, caller: &CallerIdentity, id: Uuid) -> Result<(), AppError> {
        let row = self
            .repo
            .find_permission(id)
            .await?
            .ok_or_else(|| AppError::not_found("Permissão"))?;
        caller.ensure_tenant(row.tenant_id)?;
        if row.role_id == SYSTEM_ADMIN_ROLE_ID {
            caller.ensure_system_admin()?;
        }

        self.repo.delete_permission(id).await?;
        Ok(())
    }

    // =========================================================================
    //  CONSULTAS DE RESOLUÇÃO
    // =========================================================================

    /// Lista achatada das permissões do cargo, com nomes.
    pub async fn list_permissions(
        &self,
        caller: &CallerIdentity,
        role_id: Uuid,
    ) -> Result<Vec<RolePermissionDetail>, AppError> {
        let role = self.get_role(caller, role_id).await?;
        self.repo.list_permission_details(role.id).await
    }

    /// Árvore de navegação do cargo (apenas "ver").
    pub async fn sidebar(&self, caller: &CallerIdentity, role_id: Uuid) -> Result<Vec<SidebarSection>, AppError> {
        let role = self.get_role(caller, role_id).await?;
        let rows = self.repo.list_sidebar_rows(role.id).await?;
        Ok(build_sidebar(rows))
    }

    /// Catálogo com as ações permitidas, independente do que o cargo possui.
    pub async fn configuration_tree(
        &self,
        caller: &CallerIdentity,
        role_id: Uuid,
    ) -> Result<Vec<ConfigSection>, AppError> {
        let role = self.get_role(caller, role_id).await?;
        let rows = self.catalog_repo.list_catalog_rows(&self.pool).await?;
        Ok(build_configuration_tree(rows, template_uses_hidden_sections(role.template)))
    }
}

fn reject_system_role(role: &Role) -> Result<(), AppError> {
    if role.id == SYSTEM_ADMIN_ROLE_ID || role.template == RoleTemplate::SystemAdmin {
        return Err(AppError::Integrity("O cargo de sistema não pode ser alterado.".into()));
    }
    Ok(())
}
