// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{
    db_utils::{fetch_page, push_name_and_status},
    error::AppError,
    normalize::NameKind,
    pagination::ListQuery,
};
use crate::models::auth::User;

const USER_SORT: [(&str, &str); 3] = [
    ("username", "username_key"),
    ("createdAt", "created_at"),
    ("status", "status"),
];

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe_user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(maybe_user)
    }

    /// Todos os usuários com a chave informada; filtra pela filial quando ela vem.
    /// No login mais de um resultado significa ambiguidade.
    pub async fn find_by_username_key(
        &self,
        username_key: &str,
        subsidiary_id: Option<Uuid>,
    ) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE lower(username_key) = lower($1)
              AND ($2::uuid IS NULL OR subsidiary_id = $2)
            ORDER BY created_at
            "#,
        )
        .bind(username_key)
        .bind(subsidiary_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn find_in_subsidiary(&self, subsidiary_id: Uuid, username_key: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE subsidiary_id = $1 AND lower(username_key) = lower($2)",
        )
        .bind(subsidiary_id)
        .bind(username_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_system_user<'e, E>(&self, executor: E) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE tenant_id IS NULL")
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    pub async fn count_users<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_one(executor)
            .await?;
        Ok(total)
    }

    // Cria um novo usuário no banco de dados
    // Com tratamento de erro específico para as chaves únicas.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        username: &str,
        username_key: &str,
        password_hash: &str,
        role_id: Uuid,
        subsidiary_id: Uuid,
        tenant_id: Option<Uuid>,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, username_key, password_hash, role_id, subsidiary_id, tenant_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(username_key)
        .bind(password_hash)
        .bind(role_id)
        .bind(subsidiary_id)
        .bind(tenant_id)
        .fetch_one(executor)
        .await
        .map_err(|e| map_user_violation(e, username))?;

        Ok(user)
    }

    pub async fn update_user<'e, E>(&self, executor: E, user: &User) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = $2, username_key = $3, password_hash = $4, role_id = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.username_key)
        .bind(&user.password_hash)
        .bind(user.role_id)
        .fetch_one(executor)
        .await
        .map_err(|e| map_user_violation(e, &user.username))
    }

    pub async fn toggle_status<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET status = NOT status, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(user)
    }

    pub async fn list_users(
        &self,
        query: &ListQuery,
        tenant_id: Option<Uuid>,
    ) -> Result<(Vec<User>, i64), AppError> {
        let pattern = query.search_pattern(NameKind::Username);
        let status = query.status;
        let subsidiary_id = query.subsidiary_id;
        let role_id = query.role_id;
        fetch_page(
            &self.pool,
            "*",
            "users",
            |qb| {
                push_name_and_status(qb, "username_key", pattern.as_deref(), status);
                if let Some(tenant_id) = tenant_id {
                    qb.push(" AND tenant_id = ").push_bind(tenant_id);
                }
                if let Some(subsidiary_id) = subsidiary_id {
                    qb.push(" AND subsidiary_id = ").push_bind(subsidiary_id);
                }
                if let Some(role_id) = role_id {
                    qb.push(" AND role_id = ").push_bind(role_id);
                }
            },
            &query.order_by(&USER_SORT, "username_key"),
            query,
        )
        .await
    }
}

fn map_user_violation(e: sqlx::Error, username: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(constraint) = db_err.constraint() {
                return match constraint {
                    "users_subsidiary_username_key" => {
                        AppError::Conflict(format!("O usuário '{username}' já existe nesta filial."))
                    }
                    "idx_users_single_system_user" => {
                        AppError::Conflict("Já existe um usuário de sistema.".into())
                    }
                    // Fallback (caso adicione outras chaves únicas no futuro)
                    other => AppError::Conflict(format!("Violação de unicidade: {other}")),
                };
            }
        }
    }
    e.into()
}
