// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::{uuid, Uuid};
use validator::Validate;

// Tenant e filial reservados que hospedam o System.Admin
pub const GLOBAL_TENANT_ID: Uuid = uuid!("00000000-0000-0000-0000-000000000001");
pub const GLOBAL_SUBSIDIARY_ID: Uuid = uuid!("00000000-0000-0000-0000-000000000002");
pub const GLOBAL_NAME: &str = "GLOBAL";

// ---
// 1. Tenant (a empresa cliente)
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    #[schema(example = "Acme")]
    pub name: String,
    #[serde(skip_serializing)]
    pub name_key: String,
    pub status: bool,
    pub max_subsidiaries: i32,
    pub max_users: i32,
    pub max_roles: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    pub fn is_global(&self) -> bool {
        self.id == GLOBAL_TENANT_ID
    }
}

// Mapeia o CREATE TYPE subsidiary_type do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "subsidiary_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SubsidiaryType {
    Matriz,
    Sucursal,
    Almacen,
    Oficina,
}

// ---
// 2. Subsidiary (filial, depósito, escritório)
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subsidiary {
    pub id: Uuid,
    pub tenant_id: Uuid,
    #[schema(example = "HQ")]
    pub name: String,
    #[serde(skip_serializing)]
    pub name_key: String,
    pub subsidiary_type: SubsidiaryType,
    pub allow_negative_stock: bool,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantPayload {
    #[validate(length(min = 1, max = 120, message = "O nome da empresa é obrigatório."))]
    #[schema(example = "Acme")]
    pub name: String,

    #[serde(default = "default_max_subsidiaries")]
    #[validate(range(min = 1, message = "Deve permitir ao menos uma filial."))]
    pub max_subsidiaries: i32,

    #[serde(default = "default_max_users")]
    #[validate(range(min = 1, message = "Deve permitir ao menos um usuário."))]
    pub max_users: i32,

    #[serde(default = "default_max_roles")]
    #[validate(range(min = 1, message = "Deve permitir ao menos um cargo."))]
    pub max_roles: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTenantPayload {
    #[validate(length(min = 1, max = 120, message = "O nome da empresa é obrigatório."))]
    pub name: Option<String>,
    #[validate(range(min = 1, message = "Deve permitir ao menos uma filial."))]
    pub max_subsidiaries: Option<i32>,
    #[validate(range(min = 1, message = "Deve permitir ao menos um usuário."))]
    pub max_users: Option<i32>,
    #[validate(range(min = 1, message = "Deve permitir ao menos um cargo."))]
    pub max_roles: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubsidiaryPayload {
    pub tenant_id: Uuid,
    #[validate(length(min = 1, max = 120, message = "O nome da filial é obrigatório."))]
    pub name: String,
    pub subsidiary_type: SubsidiaryType,
    #[serde(default)]
    pub allow_negative_stock: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubsidiaryPayload {
    #[validate(length(min = 1, max = 120, message = "O nome da filial é obrigatório."))]
    pub name: Option<String>,
    pub subsidiary_type: Option<SubsidiaryType>,
    pub allow_negative_stock: Option<bool>,
}

fn default_max_subsidiaries() -> i32 {
    1
}

fn default_max_users() -> i32 {
    10
}

fn default_max_roles() -> i32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsidiary_type_rejects_unknown_values() {
        let ok: SubsidiaryType = serde_json::from_str("\"ALMACEN\"").unwrap();
        assert_eq!(ok, SubsidiaryType::Almacen);
        assert!(serde_json::from_str::<SubsidiaryType>("\"FABRICA\"").is_err());
    }

    #[test]
    fn tenant_payload_defaults_limits() {
        let payload: CreateTenantPayload = serde_json::from_str(r#"{"name":"Acme"}"#).unwrap();
        assert_eq!(
            (payload.max_subsidiaries, payload.max_users, payload.max_roles),
            (1, 10, 10)
        );
        assert!(payload.validate().is_ok());

        let payload: CreateTenantPayload =
            serde_json::from_str(r#"{"name":"","maxSubsidiaries":0}"#).unwrap();
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert_eq!(fields.len(), 2);
    }
}
