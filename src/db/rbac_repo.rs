// src/db/rbac_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{
    db_utils::{fetch_page, push_name_and_status},
    error::AppError,
    normalize::NameKind,
    pagination::ListQuery,
};
use crate::models::catalog::ACTION_VIEW;
use crate::models::rbac::{
    PermissionGrant, PermissionTarget, Role, RolePermissionDetail, RolePermissionRow, RoleTemplate,
    SidebarRow,
};

const ROLE_SORT: [(&str, &str); 4] = [
    ("name", "name_key"),
    ("template", "template"),
    ("createdAt", "created_at"),
    ("status", "status"),
];

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CARGOS
    // =========================================================================

    pub async fn find_role<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(role)
    }

    pub async fn find_role_by_key(
        &self,
        tenant_id: Uuid,
        subsidiary_id: Uuid,
        name_key: &str,
    ) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            SELECT * FROM roles
            WHERE tenant_id = $1 AND subsidiary_id = $2 AND lower(name_key) = lower($3)
            "#,
        )
        .bind(tenant_id)
        .bind(subsidiary_id)
        .bind(name_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    pub async fn count_roles<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_one(executor)
            .await?;
        Ok(total)
    }

    // 1. Criar o Cargo
    #[allow(clippy::too_many_arguments)]
    pub async fn create_role<'e, E>(
        &self,
        executor: E,
        id: Option<Uuid>,
        tenant_id: Uuid,
        subsidiary_id: Uuid,
        name: &str,
        name_key: &str,
        template: RoleTemplate,
    ) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (id, tenant_id, subsidiary_id, name, name_key, template)
            VALUES (COALESCE($1, gen_random_uuid()), $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(subsidiary_id)
        .bind(name)
        .bind(name_key)
        .bind(template)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, format!("Já existe o cargo '{name}' nesta filial.")))
    }

    pub async fn rename_role<'e, E>(&self, executor: E, id: Uuid, name: &str, name_key: &str) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>(
            "UPDATE roles SET name = $2, name_key = $3, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(name_key)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, format!("Já existe o cargo '{name}' nesta filial.")))
    }

    /// Inverte o status no próprio UPDATE: o lock da linha serializa toggles concorrentes.
    pub async fn toggle_role_status<'e, E>(&self, executor: E, id: Uuid) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>(
            "UPDATE roles SET status = NOT status, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(role)
    }

    /// Usuários do cargo dentro do mesmo escopo (tenant, filial) recebem o status do cargo.
    pub async fn cascade_role_status<'e, E>(&self, executor: E, role: &Role) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE users SET status = $4, updated_at = NOW()
            WHERE role_id = $1 AND tenant_id = $2 AND subsidiary_id = $3
            "#,
        )
        .bind(role.id)
        .bind(role.tenant_id)
        .bind(role.subsidiary_id)
        .bind(role.status)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_roles(
        &self,
        query: &ListQuery,
        tenant_id: Option<Uuid>,
    ) -> Result<(Vec<Role>, i64), AppError> {
        let pattern = query.search_pattern(NameKind::Role);
        let status = query.status;
        let subsidiary_id = query.subsidiary_id;
        fetch_page(
            &self.pool,
            "*",
            "roles",
            |qb| {
                push_name_and_status(qb, "name_key", pattern.as_deref(), status);
                if let Some(tenant_id) = tenant_id {
                    qb.push(" AND tenant_id = ").push_bind(tenant_id);
                }
                if let Some(subsidiary_id) = subsidiary_id {
                    qb.push(" AND subsidiary_id = ").push_bind(subsidiary_id);
                }
            },
            &query.order_by(&ROLE_SORT, "name_key"),
            query,
        )
        .await
    }

    // =========================================================================
    //  PERMISSÕES DO CARGO
    // =========================================================================

    /// Inserção em massa usando UNNEST; duplicadas são ignoradas. Retorna quantas entraram.
    pub async fn insert_grants<'e, E>(
        &self,
        executor: E,
        role_id: Uuid,
        tenant_id: Uuid,
        grants: &[PermissionGrant],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if grants.is_empty() {
            return Ok(0);
        }

        let mut action_ids = Vec::with_capacity(grants.len());
        let mut section_ids = Vec::with_capacity(grants.len());
        let mut module_ids: Vec<Option<Uuid>> = Vec::with_capacity(grants.len());
        let mut submodule_ids: Vec<Option<Uuid>> = Vec::with_capacity(grants.len());
        for grant in grants {
            action_ids.push(grant.action_id);
            section_ids.push(grant.target.section_id());
            module_ids.push(grant.target.module_id());
            submodule_ids.push(grant.target.submodule_id());
        }

        let result = sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, tenant_id, action_id, section_id, module_id, submodule_id)
            SELECT $1, $2, g.action_id, g.section_id, g.module_id, g.submodule_id
            FROM UNNEST($3::uuid[], $4::uuid[], $5::uuid[], $6::uuid[])
                 AS g(action_id, section_id, module_id, submodule_id)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(tenant_id)
        .bind(&action_ids)
        .bind(&section_ids)
        .bind(&module_ids)
        .bind(&submodule_ids)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Concessão avulsa: duplicada vira Conflict.
    pub async fn insert_permission<'e, E>(
        &self,
        executor: E,
        role: &Role,
        action_id: Uuid,
        target: PermissionTarget,
    ) -> Result<RolePermissionRow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, RolePermissionRow>(
            r#"
            INSERT INTO role_permissions (role_id, tenant_id, action_id, section_id, module_id, submodule_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, role_id, action_id, tenant_id, section_id, module_id, submodule_id, created_at
            "#,
        )
        .bind(role.id)
        .bind(role.tenant_id)
        .bind(action_id)
        .bind(target.section_id())
        .bind(target.module_id())
        .bind(target.submodule_id())
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "O cargo já possui esta permissão."))
    }

    pub async fn permission_exists(
        &self,
        role_id: Uuid,
        action_id: Uuid,
        target: PermissionTarget,
    ) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM role_permissions
                WHERE role_id = $1 AND action_id = $2 AND section_id = $3
                  AND module_id IS NOT DISTINCT FROM $4
                  AND submodule_id IS NOT DISTINCT FROM $5
            )
            "#,
        )
        .bind(role_id)
        .bind(action_id)
        .bind(target.section_id())
        .bind(target.module_id())
        .bind(target.submodule_id())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn find_permission(&self, id: Uuid) -> Result<Option<RolePermissionRow>, AppError> {
        let row = sqlx::query_as::<_, RolePermissionRow>(
            r#"
            SELECT id, role_id, action_id, tenant_id, section_id, module_id, submodule_id, created_at
            FROM role_permissions WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_permission(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM role_permissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Lista achatada com os nomes resolvidos.
    pub async fn list_permission_details(&self, role_id: Uuid) -> Result<Vec<RolePermissionDetail>, AppError> {
        let rows = sqlx::query_as::<_, RolePermissionDetail>(
            r#"
            SELECT
                rp.id, rp.role_id, rp.action_id, a.name AS action_name,
                rp.section_id, s.name AS section_name,
                rp.module_id, m.name AS module_name,
                rp.submodule_id, sm.name AS submodule_name
            FROM role_permissions rp
            JOIN permission_actions a ON a.id = rp.action_id
            JOIN sections s ON s.id = rp.section_id
            LEFT JOIN modules m ON m.id = rp.module_id
            LEFT JOIN submodules sm ON sm.id = rp.submodule_id
            WHERE rp.role_id = $1
            ORDER BY s.display_order, s.name_key, m.name_key NULLS FIRST, sm.name_key NULLS FIRST, a.name_key
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Concessões "ver" do cargo em forma plana; a árvore é montada no serviço.
    pub async fn list_sidebar_rows(&self, role_id: Uuid) -> Result<Vec<SidebarRow>, AppError> {
        let rows = sqlx::query_as::<_, SidebarRow>(
            r#"
            SELECT
                s.id AS section_id, s.name AS section_name, s.display_order AS section_order,
                m.id AS module_id, m.name AS module_name, m.route AS module_route, m.icon_name AS module_icon,
                sm.id AS submodule_id, sm.name AS submodule_name, sm.route AS submodule_route
            FROM role_permissions rp
            JOIN permission_actions a ON a.id = rp.action_id
            JOIN sections s ON s.id = rp.section_id AND s.status
            LEFT JOIN modules m ON m.id = rp.module_id AND m.status
            LEFT JOIN submodules sm ON sm.id = rp.submodule_id AND sm.status
            WHERE rp.role_id = $1 AND a.name_key = $2
              AND (rp.module_id IS NULL OR m.id IS NOT NULL)
              AND (rp.submodule_id IS NULL OR sm.id IS NOT NULL)
            ORDER BY s.display_order, s.name_key, m.name_key NULLS FIRST, sm.name_key NULLS FIRST
            "#,
        )
        .bind(role_id)
        .bind(ACTION_VIEW)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
