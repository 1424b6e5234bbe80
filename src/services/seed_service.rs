// src/services/seed_service.rs
//
// Provisionamento idempotente: catálogo padrão, lista branca, GLOBAL e System.Admin.
// Cada passo é upsert ou insert-ignorando-duplicadas; rodar de novo não muda nada.

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        normalize::{display_name, normalize, NameKind},
    },
    db::{CatalogRepository, RbacRepository, TenantRepository, UserRepository},
    models::{
        auth::SYSTEM_ADMIN_USERNAME,
        catalog::{AllowedTarget, CANONICAL_ACTIONS},
        rbac::{RoleTemplate, SYSTEM_ADMIN_ROLE_ID, SYSTEM_ADMIN_ROLE_NAME},
        tenancy::{SubsidiaryType, GLOBAL_NAME, GLOBAL_SUBSIDIARY_ID, GLOBAL_TENANT_ID},
    },
    services::{auth::hash_password, permission_tree::default_allowed_actions, rbac_service::RbacService},
};

struct SeedSection {
    name: &'static str,
    order: i32,
    visibility: bool,
    modules: &'static [SeedModule],
}

struct SeedModule {
    name: &'static str,
    route: Option<&'static str>,
    icon: &'static str,
    /// (nome, rota)
    submodules: &'static [(&'static str, &'static str)],
}

const fn module(name: &'static str, route: &'static str, icon: &'static str) -> SeedModule {
    SeedModule { name, route: Some(route), icon, submodules: &[] }
}

const DEFAULT_CATALOG: &[SeedSection] = &[
    SeedSection {
        name: "Configuración",
        order: 0,
        visibility: false,
        modules: &[
            module("Empresas", "/configuracion/empresas", "building"),
            SeedModule {
                name: "Catálogo",
                route: None,
                icon: "list-tree",
                submodules: &[
                    ("Secciones", "/configuracion/catalogo/secciones"),
                    ("Módulos", "/configuracion/catalogo/modulos"),
                    ("Submódulos", "/configuracion/catalogo/submodulos"),
                    ("Acciones", "/configuracion/catalogo/acciones"),
                ],
            },
        ],
    },
    SeedSection {
        name: "Administración",
        order: 1,
        visibility: true,
        modules: &[
            module("Sucursales", "/administracion/sucursales", "store"),
            module("Roles", "/administracion/roles", "shield"),
            module("Usuarios", "/administracion/usuarios", "users"),
            module("Horarios", "/administracion/horarios", "clock"),
        ],
    },
    SeedSection {
        name: "Ventas",
        order: 2,
        visibility: true,
        modules: &[
            module("Ventas", "/ventas/ventas", "shopping-cart"),
            module("Caja", "/ventas/caja", "wallet"),
            module("Cotizaciones", "/ventas/cotizaciones", "receipt"),
            module("Devoluciones", "/ventas/devoluciones", "rotate-ccw"),
            module("Clientes", "/ventas/clientes", "contact"),
        ],
    },
    SeedSection {
        name: "Almacén",
        order: 3,
        visibility: true,
        modules: &[
            module("Productos", "/almacen/productos", "package"),
            SeedModule {
                name: "Inventario",
                route: None,
                icon: "boxes",
                submodules: &[
                    ("Entradas", "/almacen/inventario/entradas"),
                    ("Salidas", "/almacen/inventario/salidas"),
                    ("Transferencias", "/almacen/inventario/transferencias"),
                ],
            },
        ],
    },
    SeedSection {
        name: "Gastos",
        order: 4,
        visibility: true,
        modules: &[
            module("Gastos", "/gastos/gastos", "banknote"),
            module("Categorías", "/gastos/categorias", "tags"),
        ],
    },
    SeedSection {
        name: "Reportes",
        order: 5,
        visibility: true,
        modules: &[SeedModule {
            name: "Informes",
            route: None,
            icon: "chart-bar",
            submodules: &[
                ("Ventas", "/reportes/informes/ventas"),
                ("Inventario", "/reportes/informes/inventario"),
                ("Gastos", "/reportes/informes/gastos"),
            ],
        }],
    },
];

/// O que mudou numa execução do seed (tudo zero numa reexecução).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub allowed_actions_inserted: u64,
    pub permissions_inserted: u64,
    pub system_user_created: bool,
}

#[derive(Clone)]
pub struct SeedService {
    catalog_repo: CatalogRepository,
    tenant_repo: TenantRepository,
    rbac_repo: RbacRepository,
    user_repo: UserRepository,
    rbac_service: RbacService,
    pool: PgPool,
}

impl SeedService {
    pub fn new(
        catalog_repo: CatalogRepository,
        tenant_repo: TenantRepository,
        rbac_repo: RbacRepository,
        user_repo: UserRepository,
        rbac_service: RbacService,
        pool: PgPool,
    ) -> Self {
        Self { catalog_repo, tenant_repo, rbac_repo, user_repo, rbac_service, pool }
    }

    /// Roda o provisionamento completo numa transação.
    /// `admin_password` só é exigida quando o usuário system.admin ainda não existe.
    pub async fn run(&self, admin_password: Option<&str>) -> Result<SeedReport, AppError> {
        let mut report = SeedReport::default();
        let mut tx = self.pool.begin().await?;

        // 1. Ações canônicas
        let mut actions: HashMap<&'static str, Uuid> = HashMap::new();
        for name in CANONICAL_ACTIONS {
            let action = self.catalog_repo.upsert_action(&mut *tx, name, name).await?;
            actions.insert(name, action.id);
        }

        // 2. Catálogo padrão + 3. lista branca
        for seed in DEFAULT_CATALOG {
            let section = self
                .catalog_repo
                .upsert_section(
                    &mut *tx,
                    seed.name,
                    &normalize(seed.name, NameKind::Catalog),
                    seed.order,
                    seed.visibility,
                )
                .await?;

            for seed_module in seed.modules {
                let module = self
                    .catalog_repo
                    .upsert_module(
                        &mut *tx,
                        section.id,
                        seed_module.name,
                        &normalize(seed_module.name, NameKind::Catalog),
                        seed_module.route,
                        seed_module.icon,
                    )
                    .await?;

                let mut targets = Vec::new();
                for (name, route) in seed_module.submodules {
                    let submodule = self
                        .catalog_repo
                        .upsert_submodule(&mut *tx, module.id, name, &normalize(name, NameKind::Catalog), route)
                        .await?;
                    targets.push(AllowedTarget::Submodule(submodule.id));
                }
                if targets.is_empty() {
                    targets.push(AllowedTarget::Module(module.id));
                }

                let allowed = default_allowed_actions(!seed_module.submodules.is_empty());
                for target in targets {
                    for action_name in allowed {
                        let Some(&action_id) = actions.get(action_name) else {
                            continue;
                        };
                        if self
                            .catalog_repo
                            .ensure_allowed_action(&mut *tx, action_id, target)
                            .await?
                        {
                            report.allowed_actions_inserted += 1;
                        }
                    }
                }
            }
        }

        // 4. Tenant e filial GLOBAL
        if self.tenant_repo.find_tenant(&mut *tx, GLOBAL_TENANT_ID).await?.is_none() {
            self.tenant_repo
                .create_tenant(
                    &mut *tx,
                    Some(GLOBAL_TENANT_ID),
                    GLOBAL_NAME,
                    &normalize(GLOBAL_NAME, NameKind::Tenant),
                    (1, 1, 1),
                )
                .await?;
        }
        if self
            .tenant_repo
            .find_subsidiary(&mut *tx, GLOBAL_SUBSIDIARY_ID)
            .await?
            .is_none()
        {
            self.tenant_repo
                .create_subsidiary(
                    &mut *tx,
                    Some(GLOBAL_SUBSIDIARY_ID),
                    GLOBAL_TENANT_ID,
                    GLOBAL_NAME,
                    &normalize(GLOBAL_NAME, NameKind::Subsidiary),
                    SubsidiaryType::Matriz,
                    false,
                )
                .await?;
        }

        // 5. Cargo System.Admin com id fixo
        let role = match self.rbac_repo.find_role(&mut *tx, SYSTEM_ADMIN_ROLE_ID).await? {
            Some(role) => role,
            None => {
                self.rbac_repo
                    .create_role(
                        &mut *tx,
                        Some(SYSTEM_ADMIN_ROLE_ID),
                        GLOBAL_TENANT_ID,
                        GLOBAL_SUBSIDIARY_ID,
                        SYSTEM_ADMIN_ROLE_NAME,
                        &normalize(SYSTEM_ADMIN_ROLE_NAME, NameKind::Role),
                        RoleTemplate::SystemAdmin,
                    )
                    .await?
            }
        };

        // 6. Permissões das seções ocultas
        report.permissions_inserted = self.rbac_service.seed_template(&mut tx, &role).await?;

        // 7. Usuário system.admin (único sem tenant)
        if self.user_repo.find_system_user(&mut *tx).await?.is_none() {
            let password = admin_password.ok_or_else(|| {
                AppError::InvalidInput("SYSTEM_ADMIN_PASSWORD é obrigatória para criar o system.admin.".into())
            })?;
            let password_hash = hash_password(password).await?;
            self.user_repo
                .create_user(
                    &mut *tx,
                    &display_name(SYSTEM_ADMIN_USERNAME),
                    &normalize(SYSTEM_ADMIN_USERNAME, NameKind::Username),
                    &password_hash,
                    role.id,
                    GLOBAL_SUBSIDIARY_ID,
                    None,
                )
                .await?;
            report.system_user_created = true;
        }

        tx.commit().await?;

        tracing::info!(
            allowed_actions = report.allowed_actions_inserted,
            permissions = report.permissions_inserted,
            system_user_created = report.system_user_created,
            "🌱 Seed concluído"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_catalog_names_are_unique_in_scope() {
        let mut sections = HashSet::new();
        for section in DEFAULT_CATALOG {
            assert!(sections.insert(normalize(section.name, NameKind::Catalog)), "{}", section.name);

            let mut modules = HashSet::new();
            for module in section.modules {
                assert!(modules.insert(normalize(module.name, NameKind::Catalog)), "{}", module.name);

                let mut submodules = HashSet::new();
                for (name, _) in module.submodules {
                    assert!(submodules.insert(normalize(name, NameKind::Catalog)), "{name}");
                }
            }
        }
    }

    #[test]
    fn only_configuration_is_hidden() {
        let hidden: Vec<_> = DEFAULT_CATALOG.iter().filter(|s| !s.visibility).map(|s| s.name).collect();
        assert_eq!(hidden, ["Configuración"]);
    }

    #[test]
    fn modules_without_submodules_have_a_route() {
        for section in DEFAULT_CATALOG {
            for module in section.modules {
                assert!(
                    module.route.is_some() || !module.submodules.is_empty(),
                    "{} sem rota e sem submódulos",
                    module.name
                );
            }
        }
    }

    #[test]
    fn template_sections_exist_in_default_catalog() {
        let keys: HashSet<_> = DEFAULT_CATALOG.iter().map(|s| normalize(s.name, NameKind::Catalog)).collect();
        for name in ["ventas", "almacen"] {
            assert!(keys.contains(name));
        }
    }
}
