// src/models/catalog.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

// Verbos canônicos (já normalizados)
pub const ACTION_VIEW: &str = "ver";
pub const ACTION_CREATE: &str = "crear";
pub const ACTION_EDIT: &str = "editar";
pub const ACTION_STATUS: &str = "estado";
pub const ACTION_EXPORT: &str = "exportar";
pub const ACTION_DELETE: &str = "eliminar";

pub const CANONICAL_ACTIONS: [&str; 6] = [
    ACTION_VIEW,
    ACTION_CREATE,
    ACTION_EDIT,
    ACTION_STATUS,
    ACTION_EXPORT,
    ACTION_DELETE,
];

// ---
// 1. Seção (primeiro nível do menu)
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: Uuid,
    #[schema(example = "Ventas")]
    pub name: String,
    #[serde(skip_serializing)]
    pub name_key: String,
    #[serde(rename = "order")]
    pub display_order: i32,
    /// `false` = seção de sistema, reservada ao System.Admin
    pub visibility: bool,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 2. Módulo
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: Uuid,
    pub section_id: Uuid,
    #[schema(example = "Cotizaciones")]
    pub name: String,
    #[serde(skip_serializing)]
    pub name_key: String,
    #[schema(example = "/ventas/cotizaciones")]
    pub route: Option<String>,
    #[schema(example = "receipt")]
    pub icon_name: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 3. Submódulo
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Submodule {
    pub id: Uuid,
    pub module_id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub name_key: String,
    pub route: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionAction {
    pub id: Uuid,
    #[schema(example = "ver")]
    pub name: String,
    #[serde(skip_serializing)]
    pub name_key: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 4. AllowedAction (lista branca ação x módulo/submódulo)
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllowedAction {
    pub id: Uuid,
    pub action_id: Uuid,
    pub module_id: Option<Uuid>,
    pub submodule_id: Option<Uuid>,
    pub composite_key: String,
    pub created_at: DateTime<Utc>,
}

/// Alvo de uma AllowedAction: exatamente um entre módulo e submódulo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllowedTarget {
    Module(Uuid),
    Submodule(Uuid),
}

impl AllowedTarget {
    pub fn from_ids(module_id: Option<Uuid>, submodule_id: Option<Uuid>) -> Result<Self, AppError> {
        match (module_id, submodule_id) {
            (Some(m), None) => Ok(AllowedTarget::Module(m)),
            (None, Some(s)) => Ok(AllowedTarget::Submodule(s)),
            (Some(_), Some(_)) => Err(AppError::field(
                "moduleId",
                "exclusive",
                "Informe moduleId ou submoduleId, não os dois.",
            )),
            (None, None) => Err(AppError::field(
                "moduleId",
                "required",
                "Informe moduleId ou submoduleId.",
            )),
        }
    }

    pub fn module_id(&self) -> Option<Uuid> {
        match self {
            AllowedTarget::Module(id) => Some(*id),
            AllowedTarget::Submodule(_) => None,
        }
    }

    pub fn submodule_id(&self) -> Option<Uuid> {
        match self {
            AllowedTarget::Module(_) => None,
            AllowedTarget::Submodule(id) => Some(*id),
        }
    }

    /// Chave `actionId-moduleId-submoduleId`; o lado ausente fica vazio.
    pub fn composite_key(&self, action_id: Uuid) -> String {
        let module = self.module_id().map(|id| id.to_string()).unwrap_or_default();
        let submodule = self.submodule_id().map(|id| id.to_string()).unwrap_or_default();
        format!("{action_id}-{module}-{submodule}")
    }
}

// --- Detalhes com hierarquia ---

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDetail {
    #[serde(flatten)]
    pub module: Module,
    pub submodules: Vec<Submodule>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionDetail {
    #[serde(flatten)]
    pub section: Section,
    pub modules: Vec<ModuleDetail>,
}

// Linha de AllowedAction já com nomes resolvidos (listagem e árvores)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllowedActionView {
    pub id: Uuid,
    pub action_id: Uuid,
    pub action_name: String,
    pub module_id: Option<Uuid>,
    pub module_name: Option<String>,
    pub submodule_id: Option<Uuid>,
    pub submodule_name: Option<String>,
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSectionPayload {
    #[validate(length(min = 1, max = 80, message = "O nome é obrigatório."))]
    #[schema(example = "Ventas")]
    pub name: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "A ordem não pode ser negativa."))]
    pub order: i32,
    #[serde(default = "default_true")]
    pub visibility: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSectionPayload {
    #[validate(length(min = 1, max = 80, message = "O nome é obrigatório."))]
    pub name: Option<String>,
    #[validate(range(min = 0, message = "A ordem não pode ser negativa."))]
    pub order: Option<i32>,
    pub visibility: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateModulePayload {
    pub section_id: Uuid,
    #[validate(length(min = 1, max = 80, message = "O nome é obrigatório."))]
    pub name: String,
    pub route: Option<String>,
    #[serde(default)]
    pub icon_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModulePayload {
    #[validate(length(min = 1, max = 80, message = "O nome é obrigatório."))]
    pub name: Option<String>,
    pub route: Option<String>,
    pub icon_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmodulePayload {
    pub module_id: Uuid,
    #[validate(length(min = 1, max = 80, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(length(min = 1, message = "A rota é obrigatória."))]
    pub route: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubmodulePayload {
    #[validate(length(min = 1, max = 80, message = "O nome é obrigatório."))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "A rota é obrigatória."))]
    pub route: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionPayload {
    #[validate(length(min = 1, max = 40, message = "O nome é obrigatório."))]
    #[schema(example = "exportar")]
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAllowedActionPayload {
    pub action_id: Uuid,
    pub module_id: Option<Uuid>,
    pub submodule_id: Option<Uuid>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_target_requires_exactly_one_id() {
        let m = Uuid::new_v4();
        let s = Uuid::new_v4();

        assert_eq!(AllowedTarget::from_ids(Some(m), None).unwrap(), AllowedTarget::Module(m));
        assert_eq!(AllowedTarget::from_ids(None, Some(s)).unwrap(), AllowedTarget::Submodule(s));
        assert!(matches!(
            AllowedTarget::from_ids(Some(m), Some(s)),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            AllowedTarget::from_ids(None, None),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn composite_key_distinguishes_levels() {
        let action = Uuid::new_v4();
        let id = Uuid::new_v4();
        let as_module = AllowedTarget::Module(id).composite_key(action);
        let as_submodule = AllowedTarget::Submodule(id).composite_key(action);

        assert_eq!(as_module, format!("{action}-{id}-"));
        assert_eq!(as_submodule, format!("{action}--{id}"));
        assert_ne!(as_module, as_submodule);
    }
}
