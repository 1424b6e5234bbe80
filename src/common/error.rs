// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Tipo de erro único de repositórios, serviços e handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Validações de regra que não vêm de um payload (ex: XOR de alvos)
    #[error("Dados inválidos: {0}")]
    InvalidInput(String),

    #[error("{0} não encontrado")]
    NotFound(String),

    #[error("Conflito: {0}")]
    Conflict(String),

    // Relação inconsistente entre entidades (não é duplicidade)
    #[error("Integridade: {0}")]
    Integrity(String),

    #[error("Limite atingido: {0}")]
    CapacityExceeded(String),

    #[error("Falha ao propagar status: {0}")]
    CascadeFailure(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    #[error("Conta inativa")]
    InactiveAccount,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn not_found(entity: &str) -> Self {
        AppError::NotFound(entity.to_string())
    }

    /// Converte violação de chave única em `Conflict`; o resto segue como erro de banco.
    /// O índice único é a fonte da verdade, a checagem prévia só dá uma mensagem melhor.
    pub fn from_unique_violation(e: sqlx::Error, message: impl Into<String>) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return AppError::Conflict(message.into());
            }
        }
        e.into()
    }

    /// Campo único com a mensagem de erro, no mesmo formato do `validator`.
    pub fn field(field: &'static str, code: &'static str, message: impl Into<String>) -> Self {
        let message: String = message.into();
        let mut err = validator::ValidationError::new(code);
        err.message = Some(message.into());
        let mut errors = validator::ValidationErrors::new();
        errors.add(field, err);
        AppError::ValidationError(errors)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidInput(_)
            | AppError::Integrity(_)
            | AppError::CapacityExceeded(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::InactiveAccount => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Integrity(_) => "integrity",
            AppError::CapacityExceeded(_) => "capacity",
            AppError::CascadeFailure(_) => "cascade_failure",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::Forbidden(_) => "forbidden",
            AppError::InactiveAccount => "inactive_account",
            _ => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        let body = match &self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({
                    "error": code,
                    "message": "Um ou mais campos são inválidos.",
                    "details": details,
                })
            }
            e if status.is_server_error() => {
                // Detalhe só no log; o cliente recebe mensagem genérica.
                match e {
                    AppError::DatabaseError(inner) => tracing::error!("Erro de banco: {:?}", inner),
                    AppError::InternalServerError(inner) => tracing::error!("Erro interno: {:?}", inner),
                    other => tracing::error!("Erro Interno do Servidor: {}", other),
                }
                let message = match e {
                    AppError::CascadeFailure(_) => "Não foi possível propagar o status; nenhuma alteração foi aplicada.",
                    _ => "Ocorreu um erro inesperado.",
                };
                json!({ "error": code, "message": message })
            }
            e => json!({ "error": code, "message": e.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_http_status() {
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::not_found("Cargo").status_code(), StatusCode::NOT_FOUND);
        // Integridade e capacidade são "bad request", distintos de conflito
        assert_eq!(AppError::Integrity("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::CapacityExceeded("x".into()).code(), "capacity");
        assert_eq!(
            AppError::CascadeFailure("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::InactiveAccount.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn field_error_carries_message() {
        let err = AppError::field("closingHour", "order", "fechamento deve ser depois da abertura");
        match err {
            AppError::ValidationError(errors) => {
                let field = errors.field_errors();
                let msgs = field.get("closingHour").expect("campo presente");
                assert_eq!(msgs[0].code, "order");
            }
            other => panic!("esperava ValidationError, veio {other:?}"),
        }
    }

    #[test]
    fn non_database_error_is_not_turned_into_conflict() {
        let err = AppError::from_unique_violation(sqlx::Error::RowNotFound, "duplicado");
        assert!(matches!(err, AppError::DatabaseError(_)));
    }
}
