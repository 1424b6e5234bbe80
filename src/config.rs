// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, str::FromStr, time::Duration};

use crate::{
    db::{CatalogRepository, RbacRepository, ScheduleRepository, TenantRepository, UserRepository},
    services::{
        auth::AuthService, catalog_service::CatalogService, rbac_service::RbacService,
        schedule_service::ScheduleService, seed_service::SeedService, tenancy_service::TenantService,
        user_service::UserService,
    },
};

/// Configuração lida do ambiente (um `.env` é carregado se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub jwt_expiration_hours: i64,
    pub seed_on_startup: bool,
    pub system_admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout: Duration::from_secs(parse_or("DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            jwt_expiration_hours: parse_or("JWT_EXPIRATION_HOURS", 168)?,
            seed_on_startup: parse_or("SEED_ON_STARTUP", false)?,
            system_admin_password: env::var("SYSTEM_ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} inválida ({raw}): {e}")),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub catalog_service: CatalogService,
    pub tenant_service: TenantService,
    pub rbac_service: RbacService,
    pub user_service: UserService,
    pub schedule_service: ScheduleService,
    pub seed_service: SeedService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, config.jwt_secret.clone(), config.jwt_expiration_hours))
    }

    /// Monta o gráfico de dependências sobre uma pool já criada (testes usam uma pool preguiçosa).
    pub fn from_pool(db_pool: PgPool, jwt_secret: String, jwt_expiration_hours: i64) -> Self {
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let user_repo = UserRepository::new(db_pool.clone());
        let schedule_repo = ScheduleRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo.clone(), jwt_secret, jwt_expiration_hours);
        let catalog_service = CatalogService::new(catalog_repo.clone(), db_pool.clone());
        let tenant_service = TenantService::new(tenant_repo.clone(), db_pool.clone());
        let rbac_service = RbacService::new(
            rbac_repo.clone(),
            tenant_repo.clone(),
            catalog_repo.clone(),
            db_pool.clone(),
        );
        let user_service = UserService::new(
            user_repo.clone(),
            rbac_repo.clone(),
            tenant_repo.clone(),
            db_pool.clone(),
        );
        let schedule_service = ScheduleService::new(
            schedule_repo,
            tenant_repo.clone(),
            user_repo.clone(),
            db_pool.clone(),
        );
        let seed_service = SeedService::new(
            catalog_repo,
            tenant_repo,
            rbac_repo,
            user_repo,
            rbac_service.clone(),
            db_pool.clone(),
        );

        Self {
            db_pool,
            auth_service,
            catalog_service,
            tenant_service,
            rbac_service,
            user_service,
            schedule_service,
            seed_service,
        }
    }
}
