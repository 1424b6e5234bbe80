// src/db/schedule_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::schedule::{Schedule, ScheduleOwner, ScheduleWindow};

/// Um repositório para as duas tabelas de horário; o dono decide tabela e coluna.
#[derive(Clone)]
pub struct ScheduleRepository {
    pool: PgPool,
}

fn select_columns(owner: ScheduleOwner) -> String {
    format!(
        "id, {} AS owner_id, start_day, end_day, opening_hour, closing_hour, status, created_at, updated_at",
        owner.owner_column()
    )
}

impl ScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, owner: ScheduleOwner, id: Uuid) -> Result<Option<Schedule>, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", select_columns(owner), owner.table());
        let schedule = sqlx::query_as::<_, Schedule>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(schedule)
    }

    pub async fn list_by_owner(&self, owner: ScheduleOwner, owner_id: Uuid) -> Result<Vec<Schedule>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = $1 ORDER BY start_day, opening_hour",
            select_columns(owner),
            owner.table(),
            owner.owner_column()
        );
        let schedules = sqlx::query_as::<_, Schedule>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(schedules)
    }

    /// Existe outra janela idêntica para o mesmo dono? `except` ignora o próprio registro no update.
    pub async fn window_exists(
        &self,
        owner: ScheduleOwner,
        owner_id: Uuid,
        window: &ScheduleWindow,
        except: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let sql = format!(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM {} WHERE {} = $1
                  AND start_day = $2 AND end_day = $3
                  AND opening_hour = $4 AND closing_hour = $5
                  AND ($6::uuid IS NULL OR id <> $6)
            )
            "#,
            owner.table(),
            owner.owner_column()
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(owner_id)
            .bind(window.start_day)
            .bind(window.end_day)
            .bind(window.opening_hour)
            .bind(window.closing_hour)
            .bind(except)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        owner: ScheduleOwner,
        owner_id: Uuid,
        window: &ScheduleWindow,
    ) -> Result<Schedule, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO {} ({}, start_day, end_day, opening_hour, closing_hour)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            owner.table(),
            owner.owner_column(),
            select_columns(owner)
        );
        sqlx::query_as::<_, Schedule>(&sql)
            .bind(owner_id)
            .bind(window.start_day)
            .bind(window.end_day)
            .bind(window.opening_hour)
            .bind(window.closing_hour)
            .fetch_one(executor)
            .await
            .map_err(|e| AppError::from_unique_violation(e, format!("{} já cadastrado.", owner.label())))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        owner: ScheduleOwner,
        id: Uuid,
        window: &ScheduleWindow,
    ) -> Result<Schedule, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE {}
            SET start_day = $2, end_day = $3, opening_hour = $4, closing_hour = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            owner.table(),
            select_columns(owner)
        );
        sqlx::query_as::<_, Schedule>(&sql)
            .bind(id)
            .bind(window.start_day)
            .bind(window.end_day)
            .bind(window.opening_hour)
            .bind(window.closing_hour)
            .fetch_one(executor)
            .await
            .map_err(|e| AppError::from_unique_violation(e, format!("{} já cadastrado.", owner.label())))
    }

    pub async fn toggle_status(&self, owner: ScheduleOwner, id: Uuid) -> Result<Option<Schedule>, AppError> {
        let sql = format!(
            "UPDATE {} SET status = NOT status, updated_at = NOW() WHERE id = $1 RETURNING {}",
            owner.table(),
            select_columns(owner)
        );
        let schedule = sqlx::query_as::<_, Schedule>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(schedule)
    }
}
