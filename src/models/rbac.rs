// src/models/rbac.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::{uuid, Uuid};
use validator::Validate;

use crate::common::error::AppError;

// Cargo reservado do administrador do sistema (tenant/filial GLOBAL)
pub const SYSTEM_ADMIN_ROLE_ID: Uuid = uuid!("00000000-0000-0000-0000-000000000003");
pub const SYSTEM_ADMIN_ROLE_NAME: &str = "System.Admin";
pub const SUPER_ADMIN_ROLE_NAME: &str = "Super.Admin";

/// Define o comportamento do cargo; o nome é só exibição.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "role_template", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleTemplate {
    /// Global, só seções ocultas
    SystemAdmin,
    /// Por filial, todas as seções visíveis
    SuperAdmin,
    Admin,
    Ventas,
    Almacen,
    Vendedor,
    #[default]
    Custom,
}

// O que sai do banco (Tabela roles)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub subsidiary_id: Uuid,
    #[schema(example = "Vendedor")]
    pub name: String,
    #[serde(skip_serializing)]
    pub name_key: String,
    pub template: RoleTemplate,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Nível da hierarquia em que a permissão foi concedida.
///
/// Substitui os três FKs anuláveis: o nível mais específico presente decide a variante,
/// e os níveis acima dele são sempre conhecidos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PermissionTarget {
    Section {
        section_id: Uuid,
    },
    Module {
        section_id: Uuid,
        module_id: Uuid,
    },
    Submodule {
        section_id: Uuid,
        module_id: Uuid,
        submodule_id: Uuid,
    },
}

impl PermissionTarget {
    pub fn from_ids(
        section_id: Uuid,
        module_id: Option<Uuid>,
        submodule_id: Option<Uuid>,
    ) -> Result<Self, AppError> {
        match (module_id, submodule_id) {
            (None, None) => Ok(PermissionTarget::Section { section_id }),
            (Some(module_id), None) => Ok(PermissionTarget::Module { section_id, module_id }),
            (Some(module_id), Some(submodule_id)) => Ok(PermissionTarget::Submodule {
                section_id,
                module_id,
                submodule_id,
            }),
            (None, Some(_)) => Err(AppError::field(
                "moduleId",
                "required",
                "submoduleId exige o moduleId correspondente.",
            )),
        }
    }

    pub fn section_id(&self) -> Uuid {
        match *self {
            PermissionTarget::Section { section_id }
            | PermissionTarget::Module { section_id, .. }
            | PermissionTarget::Submodule { section_id, .. } => section_id,
        }
    }

    pub fn module_id(&self) -> Option<Uuid> {
        match *self {
            PermissionTarget::Section { .. } => None,
            PermissionTarget::Module { module_id, .. }
            | PermissionTarget::Submodule { module_id, .. } => Some(module_id),
        }
    }

    pub fn submodule_id(&self) -> Option<Uuid> {
        match *self {
            PermissionTarget::Submodule { submodule_id, .. } => Some(submodule_id),
            _ => None,
        }
    }

    pub fn level(&self) -> PermissionLevel {
        match self {
            PermissionTarget::Section { .. } => PermissionLevel::Section,
            PermissionTarget::Module { .. } => PermissionLevel::Module,
            PermissionTarget::Submodule { .. } => PermissionLevel::Submodule,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionLevel {
    Section,
    Module,
    Submodule,
}

/// Uma concessão (ação x alvo) ainda sem cargo; unidade do seeding em massa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PermissionGrant {
    pub action_id: Uuid,
    pub target: PermissionTarget,
}

// Linha crua da tabela role_permissions
#[derive(Debug, Clone, FromRow)]
pub struct RolePermissionRow {
    pub id: Uuid,
    pub role_id: Uuid,
    pub action_id: Uuid,
    pub tenant_id: Uuid,
    pub section_id: Uuid,
    pub module_id: Option<Uuid>,
    pub submodule_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RolePermission {
    pub id: Uuid,
    pub role_id: Uuid,
    pub action_id: Uuid,
    pub tenant_id: Uuid,
    pub level: PermissionLevel,
    pub section_id: Uuid,
    pub module_id: Option<Uuid>,
    pub submodule_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<RolePermissionRow> for RolePermission {
    type Error = AppError;

    fn try_from(row: RolePermissionRow) -> Result<Self, Self::Error> {
        let target = PermissionTarget::from_ids(row.section_id, row.module_id, row.submodule_id)?;
        Ok(Self {
            id: row.id,
            role_id: row.role_id,
            action_id: row.action_id,
            tenant_id: row.tenant_id,
            level: target.level(),
            section_id: target.section_id(),
            module_id: target.module_id(),
            submodule_id: target.submodule_id(),
            created_at: row.created_at,
        })
    }
}

// Permissão com os nomes resolvidos (listagem por cargo)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissionDetail {
    pub id: Uuid,
    pub role_id: Uuid,
    pub action_id: Uuid,
    #[schema(example = "ver")]
    pub action_name: String,
    pub section_id: Uuid,
    pub section_name: String,
    pub module_id: Option<Uuid>,
    pub module_name: Option<String>,
    pub submodule_id: Option<Uuid>,
    pub submodule_name: Option<String>,
}

// ---
// Sidebar (somente "ver")
// ---

// Linha plana vinda do banco; a árvore é montada em services::permission_tree
#[derive(Debug, Clone, FromRow)]
pub struct SidebarRow {
    pub section_id: Uuid,
    pub section_name: String,
    pub section_order: i32,
    pub module_id: Option<Uuid>,
    pub module_name: Option<String>,
    pub module_route: Option<String>,
    pub module_icon: Option<String>,
    pub submodule_id: Option<Uuid>,
    pub submodule_name: Option<String>,
    pub submodule_route: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SidebarSubmodule {
    pub id: Uuid,
    pub name: String,
    pub route: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SidebarModule {
    pub id: Uuid,
    pub name: String,
    pub route: Option<String>,
    pub icon_name: Option<String>,
    pub submodules: Vec<SidebarSubmodule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SidebarSection {
    pub id: Uuid,
    pub name: String,
    pub order: i32,
    pub modules: Vec<SidebarModule>,
}

// ---
// Árvore de configuração (ações permitidas, independente do que o cargo possui)
// ---

#[derive(Debug, Clone, FromRow)]
pub struct CatalogRow {
    pub section_id: Uuid,
    pub section_name: String,
    pub section_key: String,
    pub section_order: i32,
    pub section_visibility: bool,
    pub module_id: Uuid,
    pub module_name: String,
    pub module_key: String,
    pub submodule_id: Option<Uuid>,
    pub submodule_name: Option<String>,
    pub action_id: Option<Uuid>,
    pub action_name: Option<String>,
    pub action_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSubmodule {
    pub id: Uuid,
    pub name: String,
    pub actions: Vec<ActionRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigModule {
    pub id: Uuid,
    pub name: String,
    /// Vazio quando o módulo tem submódulos (as ações ficam neles)
    pub actions: Vec<ActionRef>,
    pub submodules: Vec<ConfigSubmodule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSection {
    pub id: Uuid,
    pub name: String,
    pub order: i32,
    pub modules: Vec<ConfigModule>,
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolePayload {
    #[validate(length(min = 1, max = 80, message = "O nome do cargo é obrigatório."))]
    #[schema(example = "Vendedor")]
    pub name: String,
    pub tenant_id: Uuid,
    pub subsidiary_id: Uuid,
    #[serde(default)]
    pub template: RoleTemplate,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRolePayload {
    #[validate(length(min = 1, max = 80, message = "O nome do cargo é obrigatório."))]
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolePermissionPayload {
    pub role_id: Uuid,
    pub action_id: Uuid,
    pub section_id: Uuid,
    pub module_id: Option<Uuid>,
    pub submodule_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeedResult {
    pub role_id: Uuid,
    /// Linhas efetivamente inseridas (duplicadas são ignoradas)
    pub inserted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_picks_most_specific_level() {
        let (s, m, sm) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let t = PermissionTarget::from_ids(s, None, None).unwrap();
        assert_eq!(t.level(), PermissionLevel::Section);
        assert_eq!((t.module_id(), t.submodule_id()), (None, None));

        let t = PermissionTarget::from_ids(s, Some(m), None).unwrap();
        assert_eq!(t.level(), PermissionLevel::Module);

        let t = PermissionTarget::from_ids(s, Some(m), Some(sm)).unwrap();
        assert_eq!(t.level(), PermissionLevel::Submodule);
        assert_eq!((t.section_id(), t.module_id(), t.submodule_id()), (s, Some(m), Some(sm)));
    }

    #[test]
    fn submodule_without_module_is_rejected() {
        let err = PermissionTarget::from_ids(Uuid::new_v4(), None, Some(Uuid::new_v4()));
        assert!(matches!(err, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn template_wire_format() {
        assert_eq!(serde_json::to_string(&RoleTemplate::SuperAdmin).unwrap(), "\"SUPER_ADMIN\"");
        let t: RoleTemplate = serde_json::from_str("\"VENDEDOR\"").unwrap();
        assert_eq!(t, RoleTemplate::Vendedor);
        assert_eq!(RoleTemplate::default(), RoleTemplate::Custom);
    }
}
