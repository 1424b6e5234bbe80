// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{
    db_utils::{fetch_page, push_name_and_status},
    error::AppError,
    normalize::NameKind,
    pagination::ListQuery,
};
use crate::models::tenancy::{Subsidiary, SubsidiaryType, Tenant, GLOBAL_TENANT_ID};

const TENANT_SORT: [(&str, &str); 3] = [
    ("name", "name_key"),
    ("createdAt", "created_at"),
    ("status", "status"),
];
const SUBSIDIARY_SORT: [(&str, &str); 4] = [
    ("name", "name_key"),
    ("type", "subsidiary_type"),
    ("createdAt", "created_at"),
    ("status", "status"),
];

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  TENANTS
    // =========================================================================

    pub async fn find_tenant<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Tenant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(tenant)
    }

    /// Trava a linha do tenant até o fim da transação; criações que contam limites passam por aqui.
    pub async fn lock_tenant<'e, E>(&self, executor: E, id: Uuid) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::not_found("Empresa"))
    }

    pub async fn find_tenant_by_key(&self, name_key: &str) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE lower(name_key) = lower($1)")
            .bind(name_key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tenant)
    }

    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        id: Option<Uuid>,
        name: &str,
        name_key: &str,
        limits: (i32, i32, i32),
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (max_subsidiaries, max_users, max_roles) = limits;
        sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (id, name, name_key, max_subsidiaries, max_users, max_roles)
            VALUES (COALESCE($1, gen_random_uuid()), $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(name_key)
        .bind(max_subsidiaries)
        .bind(max_users)
        .bind(max_roles)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, format!("Já existe uma empresa chamada '{name}'.")))
    }

    pub async fn update_tenant<'e, E>(&self, executor: E, tenant: &Tenant) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>(
            r#"
            UPDATE tenants
            SET name = $2, name_key = $3,
                max_subsidiaries = $4, max_users = $5, max_roles = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.name_key)
        .bind(tenant.max_subsidiaries)
        .bind(tenant.max_users)
        .bind(tenant.max_roles)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, format!("Já existe uma empresa chamada '{}'.", tenant.name))
        })
    }

    /// Inverte o status no próprio UPDATE: o lock da linha serializa toggles concorrentes.
    pub async fn toggle_tenant_status<'e, E>(&self, executor: E, id: Uuid) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            "UPDATE tenants SET status = NOT status, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(tenant)
    }

    pub async fn list_tenants(&self, query: &ListQuery) -> Result<(Vec<Tenant>, i64), AppError> {
        let pattern = query.search_pattern(NameKind::Tenant);
        let status = query.status;
        fetch_page(
            &self.pool,
            "*",
            "tenants",
            |qb| {
                // O tenant GLOBAL não aparece para ninguém
                qb.push(" AND id <> ").push_bind(GLOBAL_TENANT_ID);
                push_name_and_status(qb, "name_key", pattern.as_deref(), status);
            },
            &query.order_by(&TENANT_SORT, "name_key"),
            query,
        )
        .await
    }

    // =========================================================================
    //  FILIAIS
    // =========================================================================

    pub async fn find_subsidiary<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Subsidiary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let subsidiary = sqlx::query_as::<_, Subsidiary>("SELECT * FROM subsidiaries WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(subsidiary)
    }

    pub async fn find_subsidiary_by_key(&self, tenant_id: Uuid, name_key: &str) -> Result<Option<Subsidiary>, AppError> {
        let subsidiary = sqlx::query_as::<_, Subsidiary>(
            "SELECT * FROM subsidiaries WHERE tenant_id = $1 AND lower(name_key) = lower($2)",
        )
        .bind(tenant_id)
        .bind(name_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(subsidiary)
    }

    pub async fn count_subsidiaries<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subsidiaries WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_one(executor)
            .await?;
        Ok(total)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_subsidiary<'e, E>(
        &self,
        executor: E,
        id: Option<Uuid>,
        tenant_id: Uuid,
        name: &str,
        name_key: &str,
        subsidiary_type: SubsidiaryType,
        allow_negative_stock: bool,
    ) -> Result<Subsidiary, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Subsidiary>(
            r#"
            INSERT INTO subsidiaries (id, tenant_id, name, name_key, subsidiary_type, allow_negative_stock)
            VALUES (COALESCE($1, gen_random_uuid()), $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(name)
        .bind(name_key)
        .bind(subsidiary_type)
        .bind(allow_negative_stock)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, format!("A filial '{name}' já existe nesta empresa.")))
    }

    pub async fn update_subsidiary<'e, E>(&self, executor: E, subsidiary: &Subsidiary) -> Result<Subsidiary, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Subsidiary>(
            r#"
            UPDATE subsidiaries
            SET name = $2, name_key = $3, subsidiary_type = $4, allow_negative_stock = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(subsidiary.id)
        .bind(&subsidiary.name)
        .bind(&subsidiary.name_key)
        .bind(subsidiary.subsidiary_type)
        .bind(subsidiary.allow_negative_stock)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, format!("A filial '{}' já existe nesta empresa.", subsidiary.name))
        })
    }

    /// Inverte o status no próprio UPDATE: o lock da linha serializa toggles concorrentes.
    pub async fn toggle_subsidiary_status<'e, E>(&self, executor: E, id: Uuid) -> Result<Subsidiary, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let subsidiary = sqlx::query_as::<_, Subsidiary>(
            "UPDATE subsidiaries SET status = NOT status, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(subsidiary)
    }

    pub async fn list_subsidiaries(
        &self,
        query: &ListQuery,
        tenant_id: Option<Uuid>,
    ) -> Result<(Vec<Subsidiary>, i64), AppError> {
        let pattern = query.search_pattern(NameKind::Subsidiary);
        let status = query.status;
        fetch_page(
            &self.pool,
            "*",
            "subsidiaries",
            |qb| {
                push_name_and_status(qb, "name_key", pattern.as_deref(), status);
                if let Some(tenant_id) = tenant_id {
                    qb.push(" AND tenant_id = ").push_bind(tenant_id);
                }
            },
            &query.order_by(&SUBSIDIARY_SORT, "name_key"),
            query,
        )
        .await
    }

    // =========================================================================
    //  CASCATA DE STATUS
    // =========================================================================

    /// Propaga o status do tenant para filiais, cargos e usuários.
    pub async fn cascade_tenant_status<'e, E>(&self, executor: E, tenant_id: Uuid, status: bool) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Um único statement com CTEs: tudo ou nada dentro da transação do chamador
        sqlx::query(
            r#"
            WITH s AS (
                UPDATE subsidiaries SET status = $2, updated_at = NOW() WHERE tenant_id = $1
            ), r AS (
                UPDATE roles SET status = $2, updated_at = NOW() WHERE tenant_id = $1
            )
            UPDATE users SET status = $2, updated_at = NOW() WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id)
        .bind(status)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Propaga o status da filial para seus cargos e usuários.
    pub async fn cascade_subsidiary_status<'e, E>(
        &self,
        executor: E,
        subsidiary_id: Uuid,
        status: bool,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            WITH r AS (
                UPDATE roles SET status = $2, updated_at = NOW() WHERE subsidiary_id = $1
            )
            UPDATE users SET status = $2, updated_at = NOW() WHERE subsidiary_id = $1
            "#,
        )
        .bind(subsidiary_id)
        .bind(status)
        .execute(executor)
        .await?;
        Ok(())
    }
}
