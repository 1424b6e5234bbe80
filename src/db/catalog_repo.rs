// src/db/catalog_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{
    db_utils::{fetch_page, push_name_and_status},
    error::AppError,
    normalize::NameKind,
    pagination::ListQuery,
};
use crate::models::catalog::{
    AllowedAction, AllowedActionView, AllowedTarget, Module, PermissionAction, Section, Submodule,
};
use crate::models::rbac::CatalogRow;

const SECTION_SORT: [(&str, &str); 4] = [
    ("name", "name_key"),
    ("order", "display_order"),
    ("createdAt", "created_at"),
    ("status", "status"),
];
const NAMED_SORT: [(&str, &str); 3] = [
    ("name", "name_key"),
    ("createdAt", "created_at"),
    ("status", "status"),
];

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  SEÇÕES
    // =========================================================================

    pub async fn find_section<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Section>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let section = sqlx::query_as::<_, Section>("SELECT * FROM sections WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(section)
    }

    pub async fn find_section_by_key(&self, name_key: &str) -> Result<Option<Section>, AppError> {
        let section = sqlx::query_as::<_, Section>("SELECT * FROM sections WHERE lower(name_key) = lower($1)")
            .bind(name_key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(section)
    }

    pub async fn create_section<'e, E>(
        &self,
        executor: E,
        name: &str,
        name_key: &str,
        display_order: i32,
        visibility: bool,
    ) -> Result<Section, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Section>(
            r#"
            INSERT INTO sections (name, name_key, display_order, visibility)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(name_key)
        .bind(display_order)
        .bind(visibility)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, format!("Já existe uma seção chamada '{name}'.")))
    }

    pub async fn update_section<'e, E>(
        &self,
        executor: E,
        section: &Section,
    ) -> Result<Section, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Section>(
            r#"
            UPDATE sections
            SET name = $2, name_key = $3, display_order = $4, visibility = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(section.id)
        .bind(&section.name)
        .bind(&section.name_key)
        .bind(section.display_order)
        .bind(section.visibility)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, format!("Já existe uma seção chamada '{}'.", section.name))
        })
    }

    /// Upsert idempotente usado pelo seed.
    pub async fn upsert_section<'e, E>(
        &self,
        executor: E,
        name: &str,
        name_key: &str,
        display_order: i32,
        visibility: bool,
    ) -> Result<Section, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let section = sqlx::query_as::<_, Section>(
            r#"
            INSERT INTO sections (name, name_key, display_order, visibility)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name_key) DO UPDATE SET name_key = EXCLUDED.name_key
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(name_key)
        .bind(display_order)
        .bind(visibility)
        .fetch_one(executor)
        .await?;
        Ok(section)
    }

    pub async fn toggle_section_status<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Section>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let section = sqlx::query_as::<_, Section>(
            "UPDATE sections SET status = NOT status, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(section)
    }

    pub async fn list_sections(&self, query: &ListQuery) -> Result<(Vec<Section>, i64), AppError> {
        let pattern = query.search_pattern(NameKind::Catalog);
        let status = query.status;
        fetch_page(
            &self.pool,
            "*",
            "sections",
            |qb| push_name_and_status(qb, "name_key", pattern.as_deref(), status),
            &query.order_by(&SECTION_SORT, "display_order"),
            query,
        )
        .await
    }

    // =========================================================================
    //  MÓDULOS
    // =========================================================================

    pub async fn find_module<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Module>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let module = sqlx::query_as::<_, Module>("SELECT * FROM modules WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(module)
    }

    pub async fn find_module_by_key(&self, section_id: Uuid, name_key: &str) -> Result<Option<Module>, AppError> {
        let module = sqlx::query_as::<_, Module>(
            "SELECT * FROM modules WHERE section_id = $1 AND lower(name_key) = lower($2)",
        )
        .bind(section_id)
        .bind(name_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(module)
    }

    pub async fn create_module<'e, E>(
        &self,
        executor: E,
        section_id: Uuid,
        name: &str,
        name_key: &str,
        route: Option<&str>,
        icon_name: &str,
    ) -> Result<Module, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Module>(
            r#"
            INSERT INTO modules (section_id, name, name_key, route, icon_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(section_id)
        .bind(name)
        .bind(name_key)
        .bind(route)
        .bind(icon_name)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, format!("Já existe o módulo '{name}' nesta seção.")))
    }

    pub async fn update_module<'e, E>(&self, executor: E, module: &Module) -> Result<Module, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Module>(
            r#"
            UPDATE modules
            SET name = $2, name_key = $3, route = $4, icon_name = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(module.id)
        .bind(&module.name)
        .bind(&module.name_key)
        .bind(&module.route)
        .bind(&module.icon_name)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, format!("Já existe o módulo '{}' nesta seção.", module.name))
        })
    }

    pub async fn upsert_module<'e, E>(
        &self,
        executor: E,
        section_id: Uuid,
        name: &str,
        name_key: &str,
        route: Option<&str>,
        icon_name: &str,
    ) -> Result<Module, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let module = sqlx::query_as::<_, Module>(
            r#"
            INSERT INTO modules (section_id, name, name_key, route, icon_name)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (section_id, name_key) DO UPDATE SET name_key = EXCLUDED.name_key
            RETURNING *
            "#,
        )
        .bind(section_id)
        .bind(name)
        .bind(name_key)
        .bind(route)
        .bind(icon_name)
        .fetch_one(executor)
        .await?;
        Ok(module)
    }

    pub async fn toggle_module_status<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Module>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let module = sqlx::query_as::<_, Module>(
            "UPDATE modules SET status = NOT status, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(module)
    }

    pub async fn list_modules_of_section(&self, section_id: Uuid) -> Result<Vec<Module>, AppError> {
        let modules = sqlx::query_as::<_, Module>(
            "SELECT * FROM modules WHERE section_id = $1 ORDER BY name_key",
        )
        .bind(section_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(modules)
    }

    pub async fn list_modules(&self, query: &ListQuery) -> Result<(Vec<Module>, i64), AppError> {
        let pattern = query.search_pattern(NameKind::Catalog);
        let status = query.status;
        let section_id = query.section_id;
        fetch_page(
            &self.pool,
            "*",
            "modules",
            |qb| {
                push_name_and_status(qb, "name_key", pattern.as_deref(), status);
                if let Some(section_id) = section_id {
                    qb.push(" AND section_id = ").push_bind(section_id);
                }
            },
            &query.order_by(&NAMED_SORT, "name_key"),
            query,
        )
        .await
    }

    // =========================================================================
    //  SUBMÓDULOS
    // =========================================================================

    pub async fn find_submodule<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Submodule>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let submodule = sqlx::query_as::<_, Submodule>("SELECT * FROM submodules WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(submodule)
    }

    pub async fn find_submodule_by_key(&self, module_id: Uuid, name_key: &str) -> Result<Option<Submodule>, AppError> {
        let submodule = sqlx::query_as::<_, Submodule>(
            "SELECT * FROM submodules WHERE module_id = $1 AND lower(name_key) = lower($2)",
        )
        .bind(module_id)
        .bind(name_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(submodule)
    }

    pub async fn create_submodule<'e, E>(
        &self,
        executor: E,
        module_id: Uuid,
        name: &str,
        name_key: &str,
        route: &str,
    ) -> Result<Submodule, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Submodule>(
            r#"
            INSERT INTO submodules (module_id, name, name_key, route)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(module_id)
        .bind(name)
        .bind(name_key)
        .bind(route)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, format!("Já existe o submódulo '{name}' neste módulo.")))
    }

    pub async fn update_submodule<'e, E>(&self, executor: E, submodule: &Submodule) -> Result<Submodule, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Submodule>(
            r#"
            UPDATE submodules
            SET name = $2, name_key = $3, route = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(submodule.id)
        .bind(&submodule.name)
        .bind(&submodule.name_key)
        .bind(&submodule.route)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, format!("Já existe o submódulo '{}' neste módulo.", submodule.name))
        })
    }

    pub async fn upsert_submodule<'e, E>(
        &self,
        executor: E,
        module_id: Uuid,
        name: &str,
        name_key: &str,
        route: &str,
    ) -> Result<Submodule, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let submodule = sqlx::query_as::<_, Submodule>(
            r#"
            INSERT INTO submodules (module_id, name, name_key, route)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (module_id, name_key) DO UPDATE SET name_key = EXCLUDED.name_key
            RETURNING *
            "#,
        )
        .bind(module_id)
        .bind(name)
        .bind(name_key)
        .bind(route)
        .fetch_one(executor)
        .await?;
        Ok(submodule)
    }

    pub async fn toggle_submodule_status<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Submodule>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let submodule = sqlx::query_as::<_, Submodule>(
            "UPDATE submodules SET status = NOT status, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(submodule)
    }

    pub async fn list_submodules_of_modules(&self, module_ids: &[Uuid]) -> Result<Vec<Submodule>, AppError> {
        let submodules = sqlx::query_as::<_, Submodule>(
            "SELECT * FROM submodules WHERE module_id = ANY($1) ORDER BY name_key",
        )
        .bind(module_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(submodules)
    }

    pub async fn list_submodules(&self, query: &ListQuery) -> Result<(Vec<Submodule>, i64), AppError> {
        let pattern = query.search_pattern(NameKind::Catalog);
        let status = query.status;
        let module_id = query.module_id;
        fetch_page(
            &self.pool,
            "*",
            "submodules",
            |qb| {
                push_name_and_status(qb, "name_key", pattern.as_deref(), status);
                if let Some(module_id) = module_id {
                    qb.push(" AND module_id = ").push_bind(module_id);
                }
            },
            &query.order_by(&NAMED_SORT, "name_key"),
            query,
        )
        .await
    }

    // =========================================================================
    //  AÇÕES
    // =========================================================================

    pub async fn find_action<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<PermissionAction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let action = sqlx::query_as::<_, PermissionAction>("SELECT * FROM permission_actions WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(action)
    }

    pub async fn find_action_by_key(&self, name_key: &str) -> Result<Option<PermissionAction>, AppError> {
        let action = sqlx::query_as::<_, PermissionAction>(
            "SELECT * FROM permission_actions WHERE lower(name_key) = lower($1)",
        )
        .bind(name_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(action)
    }

    pub async fn create_action<'e, E>(&self, executor: E, name: &str, name_key: &str) -> Result<PermissionAction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, PermissionAction>(
            "INSERT INTO permission_actions (name, name_key) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(name_key)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, format!("A ação '{name}' já existe.")))
    }

    pub async fn update_action<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        name_key: &str,
    ) -> Result<PermissionAction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, PermissionAction>(
            r#"
            UPDATE permission_actions SET name = $2, name_key = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(name_key)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, format!("A ação '{name}' já existe.")))
    }

    pub async fn upsert_action<'e, E>(&self, executor: E, name: &str, name_key: &str) -> Result<PermissionAction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let action = sqlx::query_as::<_, PermissionAction>(
            r#"
            INSERT INTO permission_actions (name, name_key) VALUES ($1, $2)
            ON CONFLICT (name_key) DO UPDATE SET name_key = EXCLUDED.name_key
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(name_key)
        .fetch_one(executor)
        .await?;
        Ok(action)
    }

    pub async fn toggle_action_status<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<PermissionAction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let action = sqlx::query_as::<_, PermissionAction>(
            "UPDATE permission_actions SET status = NOT status, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(action)
    }

    pub async fn list_actions(&self, query: &ListQuery) -> Result<(Vec<PermissionAction>, i64), AppError> {
        let pattern = query.search_pattern(NameKind::Catalog);
        let status = query.status;
        fetch_page(
            &self.pool,
            "*",
            "permission_actions",
            |qb| push_name_and_status(qb, "name_key", pattern.as_deref(), status),
            &query.order_by(&NAMED_SORT, "name_key"),
            query,
        )
        .await
    }

    // =========================================================================
    //  ALLOWED ACTIONS (lista branca)
    // =========================================================================

    pub async fn find_allowed_action(&self, id: Uuid) -> Result<Option<AllowedAction>, AppError> {
        let allowed = sqlx::query_as::<_, AllowedAction>("SELECT * FROM allowed_actions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(allowed)
    }

    pub async fn create_allowed_action<'e, E>(
        &self,
        executor: E,
        action_id: Uuid,
        target: AllowedTarget,
    ) -> Result<AllowedAction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, AllowedAction>(
            r#"
            INSERT INTO allowed_actions (action_id, module_id, submodule_id, composite_key)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(action_id)
        .bind(target.module_id())
        .bind(target.submodule_id())
        .bind(target.composite_key(action_id))
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Esta ação já está liberada para o alvo informado."))
    }

    /// Versão do seed: duplicatas são ignoradas. Retorna se inseriu.
    pub async fn ensure_allowed_action<'e, E>(
        &self,
        executor: E,
        action_id: Uuid,
        target: AllowedTarget,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO allowed_actions (action_id, module_id, submodule_id, composite_key)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (composite_key) DO NOTHING
            "#,
        )
        .bind(action_id)
        .bind(target.module_id())
        .bind(target.submodule_id())
        .bind(target.composite_key(action_id))
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_allowed_action(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM allowed_actions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_allowed_actions(&self, query: &ListQuery) -> Result<(Vec<AllowedActionView>, i64), AppError> {
        let pattern = query.search_pattern(NameKind::Catalog);
        let module_id = query.module_id;
        fetch_page(
            &self.pool,
            "id, action_id, action_name, module_id, module_name, submodule_id, submodule_name",
            r#"(
                SELECT aa.id, aa.action_id, a.name AS action_name, a.name_key AS action_key,
                       aa.module_id, m.name AS module_name,
                       aa.submodule_id, sm.name AS submodule_name,
                       COALESCE(aa.module_id, sm.module_id) AS owner_module_id,
                       aa.created_at
                FROM allowed_actions aa
                JOIN permission_actions a ON a.id = aa.action_id
                LEFT JOIN modules m ON m.id = aa.module_id
                LEFT JOIN submodules sm ON sm.id = aa.submodule_id
            ) AS v"#,
            |qb| {
                if let Some(pattern) = pattern.as_deref() {
                    qb.push(" AND action_key ILIKE ").push_bind(pattern.to_string());
                }
                if let Some(module_id) = module_id {
                    qb.push(" AND owner_module_id = ").push_bind(module_id);
                }
            },
            &query.order_by(&[("action", "action_key"), ("createdAt", "created_at")], "created_at"),
            query,
        )
        .await
    }

    /// A ação está liberada para o módulo/submódulo?
    pub async fn is_action_allowed<'e, E>(
        &self,
        executor: E,
        action_id: Uuid,
        target: AllowedTarget,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM allowed_actions WHERE composite_key = $1)",
        )
        .bind(target.composite_key(action_id))
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    /// A ação está liberada no módulo ou em algum de seus submódulos?
    pub async fn is_action_allowed_in_module<'e, E>(
        &self,
        executor: E,
        action_id: Uuid,
        module_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM allowed_actions aa
                LEFT JOIN submodules sm ON sm.id = aa.submodule_id
                WHERE aa.action_id = $1 AND COALESCE(aa.module_id, sm.module_id) = $2
            )
            "#,
        )
        .bind(action_id)
        .bind(module_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    /// A ação está liberada em algum módulo/submódulo da seção?
    pub async fn is_action_allowed_in_section<'e, E>(
        &self,
        executor: E,
        action_id: Uuid,
        section_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM allowed_actions aa
                LEFT JOIN submodules sm ON sm.id = aa.submodule_id
                JOIN modules m ON m.id = COALESCE(aa.module_id, sm.module_id)
                WHERE aa.action_id = $1 AND m.section_id = $2
            )
            "#,
        )
        .bind(action_id)
        .bind(section_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    /// Catálogo ativo achatado com as ações liberadas (no submódulo se existir, senão no módulo).
    pub async fn list_catalog_rows<'e, E>(&self, executor: E) -> Result<Vec<CatalogRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, CatalogRow>(
            r#"
            SELECT
                s.id AS section_id, s.name AS section_name, s.name_key AS section_key,
                s.display_order AS section_order, s.visibility AS section_visibility,
                m.id AS module_id, m.name AS module_name, m.name_key AS module_key,
                sm.id AS submodule_id, sm.name AS submodule_name,
                a.id AS action_id, a.name AS action_name, a.name_key AS action_key
            FROM sections s
            JOIN modules m ON m.section_id = s.id AND m.status
            LEFT JOIN submodules sm ON sm.module_id = m.id AND sm.status
            LEFT JOIN allowed_actions aa
                   ON (sm.id IS NOT NULL AND aa.submodule_id = sm.id)
                   OR (sm.id IS NULL AND aa.module_id = m.id)
            LEFT JOIN permission_actions a ON a.id = aa.action_id AND a.status
            WHERE s.status
            ORDER BY s.display_order, s.name_key, m.name_key, sm.name_key NULLS FIRST, a.name_key
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }
}
