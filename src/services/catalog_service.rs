// src/services/catalog_service.rs

use std::collections::HashMap;

use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        normalize::{keyed_name, NameKind},
        pagination::{ListQuery, Page},
    },
    db::CatalogRepository,
    models::catalog::{
        ActionPayload, AllowedAction, AllowedActionView, AllowedTarget, CreateAllowedActionPayload,
        CreateModulePayload, CreateSectionPayload, CreateSubmodulePayload, Module, ModuleDetail,
        PermissionAction, Section, SectionDetail, Submodule, UpdateModulePayload, UpdateSectionPayload,
        UpdateSubmodulePayload,
    },
};

/// Catálogo de seções, módulos, submódulos, ações e a lista branca de ações.
///
/// A troca de status no catálogo não propaga para cargos.
#[derive(Clone)]
pub struct CatalogService {
    repo: CatalogRepository,
    pool: sqlx::PgPool,
}

impl CatalogService {
    pub fn new(repo: CatalogRepository, pool: sqlx::PgPool) -> Self {
        Self { repo, pool }
    }

    // =========================================================================
    //  SEÇÕES
    // =========================================================================

    pub async fn create_section(&self, payload: CreateSectionPayload) -> Result<Section, AppError> {
        payload.validate()?;
        let (name, name_key) = keyed_name(&payload.name, NameKind::Catalog, "name")?;

        if self.repo.find_section_by_key(&name_key).await?.is_some() {
            return Err(AppError::Conflict(format!("Já existe uma seção chamada '{name}'.")));
        }

        let section = self
            .repo
            .create_section(&self.pool, &name, &name_key, payload.order, payload.visibility)
            .await?;
        tracing::info!(section_id = %section.id, "Seção criada: {}", section.name);
        Ok(section)
    }

    pub async fn update_section(&self, id: Uuid, payload: UpdateSectionPayload) -> Result<Section, AppError> {
        payload.validate()?;
        let mut section = self.get_section(id).await?;

        if let Some(raw) = payload.name.as_deref() {
            let (name, name_key) = keyed_name(raw, NameKind::Catalog, "name")?;
            if let Some(other) = self.repo.find_section_by_key(&name_key).await? {
                if other.id != id {
                    return Err(AppError::Conflict(format!("Já existe uma seção chamada '{name}'.")));
                }
            }
            section.name = name;
            section.name_key = name_key;
        }
        if let Some(order) = payload.order {
            section.display_order = order;
        }
        if let Some(visibility) = payload.visibility {
            section.visibility = visibility;
        }

        self.repo.update_section(&self.pool, &section).await
    }

    pub async fn toggle_section(&self, id: Uuid) -> Result<Section, AppError> {
        self.repo
            .toggle_section_status(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Seção"))
    }

    async fn get_section(&self, id: Uuid) -> Result<Section, AppError> {
        self.repo
            .find_section(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Seção"))
    }

    /// Seção com seus módulos e os submódulos de cada um.
    pub async fn section_detail(&self, id: Uuid) -> Result<SectionDetail, AppError> {
        let section = self.get_section(id).await?;
        let modules = self.repo.list_modules_of_section(id).await?;
        let module_ids: Vec<Uuid> = modules.iter().map(|m| m.id).collect();
        let mut by_module: HashMap<Uuid, Vec<Submodule>> = HashMap::new();
        for submodule in self.repo.list_submodules_of_modules(&module_ids).await? {
            by_module.entry(submodule.module_id).or_default().push(submodule);
        }

        let modules = modules
            .into_iter()
            .map(|module| {
                let submodules = by_module.remove(&module.id).unwrap_or_default();
                ModuleDetail { module, submodules }
            })
            .collect();

        Ok(SectionDetail { section, modules })
    }

    pub async fn list_sections(&self, query: &ListQuery) -> Result<Page<Section>, AppError> {
        let (data, total) = self.repo.list_sections(query).await?;
        Ok(Page::new(data, total, query))
    }

    // =========================================================================
    //  MÓDULOS
    // =========================================================================

    pub async fn create_module(&self, payload: CreateModulePayload) -> Result<Module, AppError> {
        payload.validate()?;
        let (name, name_key) = keyed_name(&payload.name, NameKind::Catalog, "name")?;
        self.get_section(payload.section_id).await?;

        if self.repo.find_module_by_key(payload.section_id, &name_key).await?.is_some() {
            return Err(AppError::Conflict(format!("Já existe o módulo '{name}' nesta seção.")));
        }

        let route = payload.route.as_deref().map(str::trim).filter(|r| !r.is_empty());
        let module = self
            .repo
            .create_module(&self.pool, payload.section_id, &name, &name_key, route, payload.icon_name.trim())
            .await?;
        tracing::info!(module_id = %module.id, "Módulo criado: {}", module.name);
        Ok(module)
    }

    pub async fn update_module(&self, id: Uuid, payload: UpdateModulePayload) -> Result<Module, AppError> {
        payload.validate()?;
        let mut module = self.get_module(id).await?;

        if let Some(raw) = payload.name.as_deref() {
            let (name, name_key) = keyed_name(raw, NameKind::Catalog, "name")?;
            if let Some(other) = self.repo.find_module_by_key(module.section_id, &name_key).await? {
                if other.id != id {
                    return Err(AppError::Conflict(format!("Já existe o módulo '{name}' nesta seção.")));
                }
            }
            module.name = name;
            module.name_key = name_key;
        }
        if let Some(route) = payload.route {
            let route = route.trim();
            module.route = (!route.is_empty()).then(|| route.to_string());
        }
        if let Some(icon) = payload.icon_name {
            module.icon_name = icon.trim().to_string();
        }

        self.repo.update_module(&self.pool, &module).await
    }

    pub async fn toggle_module(&self, id: Uuid) -> Result<Module, AppError> {
        self.repo
            .toggle_module_status(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Módulo"))
    }

    async fn get_module(&self, id: Uuid) -> Result<Module, AppError> {
        self.repo
            .find_module(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Módulo"))
    }

    pub async fn module_detail(&self, id: Uuid) -> Result<ModuleDetail, AppError> {
        let module = self.get_module(id).await?;
        let submodules = self.repo.list_submodules_of_modules(&[id]).await?;
        Ok(ModuleDetail { module, submodules })
    }

    pub async fn list_modules(&self, query: &ListQuery) -> Result<Page<Module>, AppError> {
        let (data, total) = self.repo.list_modules(query).await?;
        Ok(Page::new(data, total, query))
    }

    // =========================================================================
    //  SUBMÓDULOS
    // =========================================================================

    pub async fn create_submodule(&self, payload: CreateSubmodulePayload) -> Result<Submodule, AppError> {
        payload.validate()?;
        let (name, name_key) = keyed_name(&payload.name, NameKind::Catalog, "name")?;
        self.get_module(payload.module_id).await?;

        if self.repo.find_submodule_by_key(payload.module_id, &name_key).await?.is_some() {
            return Err(AppError::Conflict(format!("Já existe o submódulo '{name}' neste módulo.")));
        }

        self.repo
            .create_submodule(&self.pool, payload.module_id, &name, &name_key, payload.route.trim())
            .await
    }

    pub async fn update_submodule(&self, id: Uuid, payload: UpdateSubmodulePayload) -> Result<Submodule, AppError> {
        payload.validate()?;
        let mut submodule = self.get_submodule(id).await?;

        if let Some(raw) = payload.name.as_deref() {
            let (name, name_key) = keyed_name(raw, NameKind::Catalog, "name")?;
            if let Some(other) = self.repo.find_submodule_by_key(submodule.module_id, &name_key).await? {
                if other.id != id {
                    return Err(AppError::Conflict(format!("Já existe o submódulo '{name}' neste módulo.")));
                }
            }
            submodule.name = name;
            submodule.name_key = name_key;
        }
        if let Some(route) = payload.route {
            submodule.route = route.trim().to_string();
        }

        self.repo.update_submodule(&self.pool, &submodule).await
    }

    pub async fn toggle_submodule(&self, id: Uuid) -> Result<Submodule, AppError> {
        self.repo
            .toggle_submodule_status(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Submódulo"))
    }

    pub async fn get_submodule(&self, id: Uuid) -> Result<Submodule, AppError> {
        self.repo
            .find_submodule(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Submódulo"))
    }

    pub async fn list_submodules(&self, query: &ListQuery) -> Result<Page<Submodule>, AppError> {
        let (data, total) = self.repo.list_submodules(query).await?;
        Ok(Page::new(data, total, query))
    }

    // =========================================================================
    //  AÇÕES
    // =========================================================================

    pub async fn create_action(&self, payload: ActionPayload) -> Result<PermissionAction, AppError> {
        payload.validate()?;
        let (name, name_key) = keyed_name(&payload.name, NameKind::Catalog, "name")?;

        if self.repo.find_action_by_key(&name_key).await?.is_some() {
            return Err(AppError::Conflict(format!("A ação '{name}' já existe.")));
        }

        self.repo.create_action(&self.pool, &name, &name_key).await
    }

    pub async fn update_action(&self, id: Uuid, payload: ActionPayload) -> Result<PermissionAction, AppError> {
        payload.validate()?;
        self.get_action(id).await?;
        let (name, name_key) = keyed_name(&payload.name, NameKind::Catalog, "name")?;

        if let Some(other) = self.repo.find_action_by_key(&name_key).await? {
            if other.id != id {
                return Err(AppError::Conflict(format!("A ação '{name}' já existe.")));
            }
        }

        self.repo.update_action(&self.pool, id, &name, &name_key).await
    }

    pub async fn toggle_action(&self, id: Uuid) -> Result<PermissionAction, AppError> {
        self.repo
            .toggle_action_status(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Ação"))
    }

    pub async fn get_action(&self, id: Uuid) -> Result<PermissionAction, AppError> {
        self.repo
            .find_action(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Ação"))
    }

    pub async fn list_actions(&self, query: &ListQuery) -> Result<Page<PermissionAction>, AppError> {
        let (data, total) = self.repo.list_actions(query).await?;
        Ok(Page::new(data, total, query))
    }

    // =========================================================================
    //  ALLOWED ACTIONS
    // =========================================================================

    pub async fn create_allowed_action(&self, payload: CreateAllowedActionPayload) -> Result<AllowedAction, AppError> {
        let target = AllowedTarget::from_ids(payload.module_id, payload.submodule_id)?;
        self.get_action(payload.action_id).await?;
        match target {
            AllowedTarget::Module(id) => {
                self.get_module(id).await?;
                // Módulo com submódulos só recebe ações nos submódulos
                if !self.repo.list_submodules_of_modules(&[id]).await?.is_empty() {
                    return Err(AppError::Integrity(
                        "O módulo possui submódulos; libere a ação em um submódulo.".into(),
                    ));
                }
            }
            AllowedTarget::Submodule(id) => {
                self.get_submodule(id).await?;
            }
        }

        if self.repo.is_action_allowed(&self.pool, payload.action_id, target).await? {
            return Err(AppError::Conflict(
                "Esta ação já está liberada para o alvo informado.".into(),
            ));
        }

        self.repo.create_allowed_action(&self.pool, payload.action_id, target).await
    }

    pub async fn get_allowed_action(&self, id: Uuid) -> Result<AllowedAction, AppError> {
        self.repo
            .find_allowed_action(id)
            .await?
            .ok_or_else(|| AppError::not_found("Ação permitida"))
    }

    /// Remove só o vínculo; ação e módulo/submódulo continuam.
    pub async fn delete_allowed_action(&self, id: Uuid) -> Result<(), AppError> {
        if self.repo.delete_allowed_action(id).await? == 0 {
            return Err(AppError::not_found("Ação permitida"));
        }
        Ok(())
    }

    pub async fn list_allowed_actions(&self, query: &ListQuery) -> Result<Page<AllowedActionView>, AppError> {
        let (data, total) = self.repo.list_allowed_actions(query).await?;
        Ok(Page::new(data, total, query))
    }
}
