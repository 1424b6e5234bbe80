// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        normalize::{normalize, NameKind},
    },
    db::UserRepository,
    models::auth::{CallerIdentity, Claims, LoginUserPayload, User},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    token_ttl_hours: i64,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, token_ttl_hours: i64) -> Self {
        Self { user_repo, jwt_secret, token_ttl_hours }
    }

    /// Login por usuário + senha. O mesmo usuário pode existir em mais de uma filial:
    /// nesse caso a filial precisa vir no payload.
    pub async fn login_user(&self, payload: LoginUserPayload) -> Result<String, AppError> {
        payload.validate()?;
        let username_key = normalize(&payload.username, NameKind::Username);

        let mut candidates = self
            .user_repo
            .find_by_username_key(&username_key, payload.subsidiary_id)
            .await?;

        let user = match candidates.len() {
            0 => return Err(AppError::InvalidCredentials),
            1 => candidates.remove(0),
            _ => {
                return Err(AppError::Conflict(
                    "Usuário presente em mais de uma filial; informe a filial.".into(),
                ))
            }
        };

        // Executa a verificação em um thread separado
        if !verify_password(&payload.password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }
        if !user.status {
            return Err(AppError::InactiveAccount);
        }

        tracing::info!(user_id = %user.id, "Login efetuado");
        self.create_token(&user)
    }

    pub fn validate_token(&self, token: &str) -> Result<CallerIdentity, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims.into())
    }

    pub fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.token_ttl_hours);

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role_id: user.role_id,
            tenant_id: user.tenant_id,
            subsidiary_id: user.subsidiary_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        // Usa '?' para um tratamento de erro mais limpo
        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

/// bcrypt é caro: roda fora do runtime assíncrono.
pub(crate) async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

pub(crate) async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    fn service() -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        AuthService::new(UserRepository::new(pool), "segredo-de-teste".into(), 1)
    }

    fn user(tenant_id: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            username: "luis".into(),
            username_key: "luis".into(),
            password_hash: String::new(),
            role_id: Uuid::new_v4(),
            subsidiary_id: Uuid::new_v4(),
            tenant_id,
            status: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn token_round_trips_identity() {
        let auth = service();
        let tenant = Uuid::new_v4();
        let user = user(Some(tenant));

        let token = auth.create_token(&user).unwrap();
        let caller = auth.validate_token(&token).unwrap();

        assert_eq!(caller.id, user.id);
        assert_eq!(caller.role_id, user.role_id);
        assert_eq!(caller.tenant_id, Some(tenant));
        assert_eq!(caller.subsidiary_id, user.subsidiary_id);
    }

    #[tokio::test]
    async fn foreign_or_garbage_tokens_are_rejected() {
        let auth = service();
        let other = AuthService::new(
            UserRepository::new(PgPoolOptions::new().connect_lazy("postgres://localhost/unused").unwrap()),
            "outro-segredo".into(),
            1,
        );
        let token = other.create_token(&user(None)).unwrap();

        assert!(matches!(auth.validate_token(&token), Err(AppError::InvalidToken)));
        assert!(matches!(auth.validate_token("abc.def.ghi"), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hashed = hash_password("segredo123").await.unwrap();
        assert!(verify_password("segredo123", &hashed).await.unwrap());
        assert!(!verify_password("errada", &hashed).await.unwrap());
    }
}
